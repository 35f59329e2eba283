//! Mock stages, handlers and collaborators for testing.

use anyhow::anyhow;
use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::{ContextField, IncomingRequest, RequestContext, UploadedFile};
use crate::errors::PipelineError;
use crate::pipeline::TerminalHandler;
use crate::ports::{ArchiveBuilder, FileResolver};
use crate::stages::{Stage, StageResult};

/// An ordered log of stage invocations shared between stages.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns the recorded entries in order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

/// A stage that records each call and optionally halts.
#[derive(Debug, Clone)]
pub struct RecordingStage {
    name: String,
    log: CallLog,
    halt: Option<PipelineError>,
    provides: Vec<ContextField>,
}

impl RecordingStage {
    /// Creates a stage that records into `log` and forwards.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            halt: None,
            provides: Vec::new(),
        }
    }

    /// Makes the stage halt with `error` after recording.
    #[must_use]
    pub fn halting(mut self, error: PipelineError) -> Self {
        self.halt = Some(error);
        self
    }

    /// Declares a provided field, for ordering diagnostics.
    #[must_use]
    pub fn providing(mut self, field: ContextField) -> Self {
        self.provides.push(field);
        self
    }

    /// Returns how many times this stage ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.log
            .entries()
            .iter()
            .filter(|entry| **entry == self.name)
            .count()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn provides(&self) -> &[ContextField] {
        &self.provides
    }

    async fn apply(&self, ctx: RequestContext, _req: &mut IncomingRequest) -> StageResult {
        self.log.record(&self.name);
        match &self.halt {
            Some(error) => Err(error.clone()),
            None => Ok(ctx),
        }
    }
}

/// A terminal handler that records the contexts it receives.
///
/// Clones share the recorded state, so a clone can be handed to the
/// builder while the original is inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    contexts: Arc<Mutex<Vec<RequestContext>>>,
}

impl RecordingHandler {
    /// Creates a new recording handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of handled requests.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.contexts.lock().len()
    }

    /// Returns every received context.
    #[must_use]
    pub fn contexts(&self) -> Vec<RequestContext> {
        self.contexts.lock().clone()
    }

    /// Returns the last received context.
    #[must_use]
    pub fn last_context(&self) -> Option<RequestContext> {
        self.contexts.lock().last().cloned()
    }
}

#[async_trait]
impl TerminalHandler for RecordingHandler {
    async fn handle(&self, ctx: RequestContext, _req: IncomingRequest) -> Response {
        self.contexts.lock().push(ctx);
        (StatusCode::OK, "ok").into_response()
    }
}

/// A resolver serving fixed content from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    files: HashMap<String, Bytes>,
}

impl StaticResolver {
    /// Creates an empty resolver; every lookup fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

#[async_trait]
impl FileResolver for StaticResolver {
    async fn resolve(&self, path: &str) -> anyhow::Result<Bytes> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("open {path}: no such file"))
    }
}

/// An archive builder that always fails.
#[derive(Debug, Clone)]
pub struct FailingArchiveBuilder {
    message: String,
}

impl FailingArchiveBuilder {
    /// Creates a builder failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ArchiveBuilder for FailingArchiveBuilder {
    fn build(&self, _file: &UploadedFile, _entry_name: &str) -> anyhow::Result<Bytes> {
        Err(anyhow!("{}", self.message))
    }
}
