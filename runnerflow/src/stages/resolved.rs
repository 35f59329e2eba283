//! Test and stdin inputs resolved from server-side paths.

use super::{Stage, StageResult};
use crate::context::{ContextField, IncomingRequest, RequestContext};
use crate::errors::PipelineError;
use crate::ports::FileResolver;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which input a [`ResolvedFileStage`] loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedInput {
    /// The `test` form value, stored as the context test input.
    Test,
    /// The `stdin` form value, stored as the context stdin input.
    Stdin,
}

impl ResolvedInput {
    /// Returns the form field holding the path.
    #[must_use]
    pub const fn form_field(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Stdin => "stdin",
        }
    }

    /// Returns the context field the content is stored in.
    #[must_use]
    pub const fn context_field(self) -> ContextField {
        match self {
            Self::Test => ContextField::Test,
            Self::Stdin => ContextField::Stdin,
        }
    }

    const fn missing_message(self) -> &'static str {
        match self {
            Self::Test => "test path missing.",
            Self::Stdin => "stdin path missing",
        }
    }
}

/// Reads a path from the form and loads its content through a resolver.
#[derive(Clone)]
pub struct ResolvedFileStage {
    input: ResolvedInput,
    resolver: Arc<dyn FileResolver>,
}

impl ResolvedFileStage {
    /// Creates a stage loading `input` through `resolver`.
    #[must_use]
    pub fn new(input: ResolvedInput, resolver: Arc<dyn FileResolver>) -> Self {
        Self { input, resolver }
    }

    /// Creates a stage loading the test input.
    #[must_use]
    pub fn test(resolver: Arc<dyn FileResolver>) -> Self {
        Self::new(ResolvedInput::Test, resolver)
    }

    /// Creates a stage loading the stdin input.
    #[must_use]
    pub fn stdin(resolver: Arc<dyn FileResolver>) -> Self {
        Self::new(ResolvedInput::Stdin, resolver)
    }

    /// Returns which input this stage loads.
    #[must_use]
    pub const fn input(&self) -> ResolvedInput {
        self.input
    }
}

impl fmt::Debug for ResolvedFileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFileStage")
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for ResolvedFileStage {
    fn name(&self) -> &str {
        self.input.form_field()
    }

    fn provides(&self) -> &[ContextField] {
        match self.input {
            ResolvedInput::Test => &[ContextField::Test],
            ResolvedInput::Stdin => &[ContextField::Stdin],
        }
    }

    async fn apply(&self, mut ctx: RequestContext, req: &mut IncomingRequest) -> StageResult {
        let field = self.input.form_field();
        let path = req.form_value(field).await;
        if path.is_empty() {
            return Err(PipelineError::client_input(self.input.missing_message()));
        }

        let content = self.resolver.resolve(&path).await.map_err(|e| {
            PipelineError::upstream(format!("get {field} file error: {e:#}"))
        })?;
        debug!(input = field, path = %path, size = content.len(), "Input resolved");

        match self.input {
            ResolvedInput::Test => ctx.set_test(content)?,
            ResolvedInput::Stdin => ctx.set_stdin(content)?,
        }
        Ok(ctx)
    }
}
