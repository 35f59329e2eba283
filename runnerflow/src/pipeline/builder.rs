//! Chain builder with ordering diagnostics.

use super::dispatch::{Chain, Dispatch, TerminalHandler};
use crate::context::{ContextField, DEFAULT_MAX_FORM_BYTES};
use crate::stages::Stage;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A declaration-order problem found while building a chain.
///
/// Issues are reported, never fixed: the chain still runs the stages in
/// the order they were declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingIssue {
    /// A stage reads a field no earlier stage provides.
    UnmetRequirement {
        /// The stage with the requirement.
        stage: String,
        /// The missing field.
        field: ContextField,
    },
    /// Two stages provide the same field; the later one will halt with 500.
    DuplicateProvider {
        /// The later stage.
        stage: String,
        /// The earlier stage that already provides the field.
        first: String,
        /// The contested field.
        field: ContextField,
    },
}

impl fmt::Display for OrderingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmetRequirement { stage, field } => write!(
                f,
                "stage '{stage}' requires '{field}' but no earlier stage provides it"
            ),
            Self::DuplicateProvider {
                stage,
                first,
                field,
            } => write!(
                f,
                "stage '{stage}' provides '{field}' already provided by '{first}'"
            ),
        }
    }
}

/// Builder for dispatch entry points.
///
/// Stages run in exactly the order they are added. Zero stages is valid:
/// the terminal handler then runs directly.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    /// The chain name, used in logs.
    name: String,
    /// Stages in declaration order.
    stages: Vec<Arc<dyn Stage>>,
    /// Form size bound applied to requests.
    max_form_bytes: usize,
}

impl ChainBuilder {
    /// Creates a new chain builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(self, stage: impl Stage + 'static) -> Self {
        self.stage_arc(Arc::new(stage))
    }

    /// Appends a shared stage.
    #[must_use]
    pub fn stage_arc(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends several stages, keeping their order.
    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Arc<dyn Stage>>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Sets the form size bound.
    #[must_use]
    pub const fn max_form_bytes(mut self, max_form_bytes: usize) -> Self {
        self.max_form_bytes = max_form_bytes;
        self
    }

    /// Returns the chain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Checks the declared order against each stage's field declarations.
    #[must_use]
    pub fn ordering_issues(&self) -> Vec<OrderingIssue> {
        let mut providers: BTreeMap<ContextField, &str> = BTreeMap::new();
        let mut issues = Vec::new();

        for stage in &self.stages {
            for field in stage.requires() {
                if !providers.contains_key(field) {
                    issues.push(OrderingIssue::UnmetRequirement {
                        stage: stage.name().to_string(),
                        field: *field,
                    });
                }
            }
            for field in stage.provides() {
                if let Some(first) = providers.get(field) {
                    issues.push(OrderingIssue::DuplicateProvider {
                        stage: stage.name().to_string(),
                        first: (*first).to_string(),
                        field: *field,
                    });
                } else {
                    providers.insert(*field, stage.name());
                }
            }
        }

        issues
    }

    /// Builds the dispatch entry point.
    ///
    /// Ordering issues are logged as warnings; the chain is built regardless.
    pub fn build(self, handler: impl TerminalHandler + 'static) -> Dispatch {
        self.build_arc(Arc::new(handler))
    }

    /// Builds the dispatch entry point around a shared handler.
    pub fn build_arc(self, handler: Arc<dyn TerminalHandler>) -> Dispatch {
        for issue in self.ordering_issues() {
            warn!(chain = %self.name, %issue, "Stage ordering issue");
        }

        Dispatch::new(Chain {
            name: self.name,
            stages: self.stages,
            handler,
            max_form_bytes: self.max_form_bytes,
        })
    }
}

/// Composes `handler` and `stages` into a dispatch entry point.
///
/// The first stage in `stages` runs first.
pub fn adapt(
    handler: impl TerminalHandler + 'static,
    stages: impl IntoIterator<Item = Arc<dyn Stage>>,
) -> Dispatch {
    ChainBuilder::new("adapted").stages(stages).build(handler)
}
