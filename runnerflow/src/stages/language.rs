//! Language selection.

use super::{Stage, StageResult};
use crate::config::LanguageTable;
use crate::context::{ContextField, IncomingRequest, RequestContext};
use crate::errors::PipelineError;
use async_trait::async_trait;
use std::collections::BTreeSet;

const LANGUAGE_FIELD: &str = "language";

/// Reads the `language` form value and checks it against an allowed set.
#[derive(Debug, Clone)]
pub struct LanguageStage {
    allowed: BTreeSet<String>,
}

impl LanguageStage {
    /// Creates a stage allowing the given languages.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a stage allowing the languages of a table.
    #[must_use]
    pub fn from_table(table: &LanguageTable) -> Self {
        Self::new(table.languages())
    }

    /// Returns true if `language` is allowed.
    #[must_use]
    pub fn allows(&self, language: &str) -> bool {
        self.allowed.contains(language)
    }
}

#[async_trait]
impl Stage for LanguageStage {
    fn name(&self) -> &str {
        "language"
    }

    fn provides(&self) -> &[ContextField] {
        &[ContextField::Language]
    }

    async fn apply(&self, mut ctx: RequestContext, req: &mut IncomingRequest) -> StageResult {
        let language = req.form_value(LANGUAGE_FIELD).await;
        if language.is_empty() {
            return Err(PipelineError::client_input("language param required"));
        }
        if !self.allows(&language) {
            return Err(PipelineError::client_input("language not supported"));
        }

        ctx.set_language(language)?;
        Ok(ctx)
    }
}
