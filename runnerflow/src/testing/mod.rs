//! Testing utilities for request pipelines.
//!
//! This module provides:
//! - Recording stages and handlers
//! - Stub collaborators
//! - Multipart request fixtures
//! - Response assertions

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_halted, response_text};
pub use fixtures::{multipart_request, MultipartBody};
pub use mocks::{CallLog, FailingArchiveBuilder, RecordingHandler, RecordingStage, StaticResolver};
