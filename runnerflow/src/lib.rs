//! # Runnerflow
//!
//! Composable request pipelines for code-runner HTTP endpoints.
//!
//! A pipeline is an ordered list of stages in front of a terminal handler.
//! Each stage either enriches the per-request context or halts the request
//! with a plain-text error response:
//!
//! - **Method check**: reject anything but the expected HTTP method (405)
//! - **File extraction**: accept exactly one uploaded file, optionally packed
//!   into a single-entry tar archive
//! - **Language**: validate the requested language against an allow-list
//! - **Test and stdin inputs**: resolve server-side paths to file contents
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use runnerflow::prelude::*;
//! use std::sync::Arc;
//!
//! let config = PipelineConfig::from_path("runner.json")?;
//! let table = Arc::new(config.languages.clone());
//! let resolver = Arc::new(config.file_resolver());
//!
//! let run = ChainBuilder::new("run")
//!     .stage(MethodStage::post())
//!     .stage(LanguageStage::from_table(&table))
//!     .stage(FilesStage::tar(table.clone()))
//!     .stage(ResolvedFileStage::stdin(resolver))
//!     .max_form_bytes(config.max_form_bytes)
//!     .build(RunHandler::new());
//!
//! let router = RouteTable::new().route("/run", run)?.into_router();
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod ports;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LanguageTable, PipelineConfig};
    pub use crate::context::{ContextField, IncomingRequest, RequestContext, UploadedFile};
    pub use crate::errors::{ConfigError, FieldConflictError, PipelineError};
    pub use crate::observability::{init_logging, LogFormat};
    pub use crate::pipeline::{adapt, ChainBuilder, Dispatch, FnHandler, RouteTable, TerminalHandler};
    pub use crate::ports::{ArchiveBuilder, FileResolver, LocalFileResolver, TarArchiveBuilder};
    pub use crate::stages::{
        FilesStage, FnStage, LanguageStage, MethodStage, ResolvedFileStage, ResolvedInput, Stage,
        StageResult, UploadMode,
    };
}
