//! Per-request state threaded through a pipeline.
//!
//! This module provides:
//! - The request context accumulated by stages
//! - The incoming request view with a lazily parsed, cached form
//! - Uploaded file descriptors

#[cfg(test)]
mod context_tests;
mod fields;
mod form;
mod request;

pub use fields::{ContextField, RequestContext, UploadedFile};
pub use form::{BodyKind, FormError, ParsedForm, DEFAULT_MAX_FORM_BYTES};
pub use request::IncomingRequest;
