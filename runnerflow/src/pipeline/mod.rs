//! Chain building and dispatch.
//!
//! This module provides:
//! - The chain builder and its ordering diagnostics
//! - Dispatch entry points and terminal handlers
//! - The startup route table

mod builder;
mod dispatch;
mod routes;

pub use builder::{adapt, ChainBuilder, OrderingIssue};
pub use dispatch::{Dispatch, FnHandler, TerminalHandler};
pub use routes::RouteTable;
