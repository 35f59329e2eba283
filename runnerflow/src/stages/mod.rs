//! Stage trait and implementations.
//!
//! Stages are the fundamental units of a request pipeline. Each one checks
//! part of an incoming request and either forwards an enriched context or
//! halts the chain with a [`PipelineError`].

mod files;
mod language;
mod method;
mod resolved;

pub use files::{FilesStage, UploadMode};
pub use language::LanguageStage;
pub use method::MethodStage;
pub use resolved::{ResolvedFileStage, ResolvedInput};

use crate::context::{ContextField, IncomingRequest, RequestContext};
use crate::errors::PipelineError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Outcome of one stage: the forwarded context, or the halting error.
pub type StageResult = Result<RequestContext, PipelineError>;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Context fields this stage sets.
    fn provides(&self) -> &[ContextField] {
        &[]
    }

    /// Context fields this stage reads and expects an earlier stage to set.
    fn requires(&self) -> &[ContextField] {
        &[]
    }

    /// Applies the stage.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The context built by earlier stages
    /// * `req` - The incoming request
    ///
    /// # Returns
    ///
    /// The enriched context, or the error that halts the chain.
    async fn apply(&self, ctx: RequestContext, req: &mut IncomingRequest) -> StageResult;
}

/// A simple function-based stage.
///
/// The function sees the request line and headers; form access needs a
/// full [`Stage`] implementation.
pub struct FnStage<F>
where
    F: Fn(RequestContext, &IncomingRequest) -> StageResult + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(RequestContext, &IncomingRequest) -> StageResult + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(RequestContext, &IncomingRequest) -> StageResult + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(RequestContext, &IncomingRequest) -> StageResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, ctx: RequestContext, req: &mut IncomingRequest) -> StageResult {
        (self.func)(ctx, &*req)
    }
}
