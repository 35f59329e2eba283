//! Uploaded file extraction.

use super::{Stage, StageResult};
use crate::config::LanguageTable;
use crate::context::{ContextField, IncomingRequest, RequestContext};
use crate::errors::PipelineError;
use crate::ports::{ArchiveBuilder, TarArchiveBuilder};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const FILES_FIELD: &str = "files";

/// What the file stage stores in the context.
#[derive(Debug, Clone)]
pub enum UploadMode {
    /// Store the uploaded file list as is.
    Plain,
    /// Wrap the single upload into an archive named after the language.
    ///
    /// Reads the context language, so the language stage must run earlier.
    Archive {
        /// Language to entry-name lookup.
        table: Arc<LanguageTable>,
        /// Archive writer.
        builder: Arc<dyn ArchiveBuilder>,
    },
}

/// Extracts the single file uploaded under the `files` multipart field.
#[derive(Debug, Clone)]
pub struct FilesStage {
    mode: UploadMode,
}

impl FilesStage {
    /// Creates a stage with the given mode.
    #[must_use]
    pub const fn new(mode: UploadMode) -> Self {
        Self { mode }
    }

    /// Creates a stage storing the raw upload.
    #[must_use]
    pub const fn plain() -> Self {
        Self::new(UploadMode::Plain)
    }

    /// Creates an archive-mode stage with a custom archive builder.
    #[must_use]
    pub fn archive(table: Arc<LanguageTable>, builder: Arc<dyn ArchiveBuilder>) -> Self {
        Self::new(UploadMode::Archive { table, builder })
    }

    /// Creates an archive-mode stage writing tar archives.
    #[must_use]
    pub fn tar(table: Arc<LanguageTable>) -> Self {
        Self::archive(table, Arc::new(TarArchiveBuilder::new()))
    }

    /// Returns true in archive mode.
    #[must_use]
    pub const fn is_archive(&self) -> bool {
        matches!(self.mode, UploadMode::Archive { .. })
    }
}

#[async_trait]
impl Stage for FilesStage {
    fn name(&self) -> &str {
        "files"
    }

    fn provides(&self) -> &[ContextField] {
        match self.mode {
            UploadMode::Plain => &[ContextField::UploadedFiles],
            UploadMode::Archive { .. } => &[ContextField::Archive],
        }
    }

    fn requires(&self) -> &[ContextField] {
        match self.mode {
            UploadMode::Plain => &[],
            UploadMode::Archive { .. } => &[ContextField::Language],
        }
    }

    async fn apply(&self, mut ctx: RequestContext, req: &mut IncomingRequest) -> StageResult {
        let files = req
            .multipart_files(FILES_FIELD)
            .await
            .map_err(|e| {
                PipelineError::client_input(format!("could not parse multipart form: {e}"))
            })?
            .ok_or_else(|| PipelineError::client_input("missing files"))?;

        if files.len() != 1 {
            return Err(PipelineError::client_input(
                "we currently support only single file uploads",
            ));
        }

        match &self.mode {
            UploadMode::Plain => {
                debug!(
                    file_name = %files[0].file_name,
                    size = files[0].size(),
                    "Upload accepted"
                );
                ctx.set_uploaded_files(files)?;
            }
            UploadMode::Archive { table, builder } => {
                let language = ctx.language().unwrap_or_default();
                let entry_name = table.entry_name(language).ok_or_else(|| {
                    PipelineError::upstream(format!(
                        "no archive entry name for language {language:?}"
                    ))
                })?;
                let archive = builder
                    .build(&files[0], entry_name)
                    .map_err(|e| PipelineError::upstream(format!("{e:#}")))?;
                debug!(
                    entry_name,
                    size = archive.len(),
                    "Upload archived"
                );
                ctx.set_archive(archive)?;
            }
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{multipart_request, FailingArchiveBuilder, MultipartBody};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use std::io::Read;

    fn request(body: MultipartBody) -> IncomingRequest {
        IncomingRequest::new(multipart_request(Method::POST, "/run", body))
    }

    fn context_with_language(language: &str) -> RequestContext {
        let mut ctx = RequestContext::new();
        ctx.set_language(language).unwrap();
        ctx
    }

    fn tar_stage() -> FilesStage {
        FilesStage::tar(Arc::new(LanguageTable::default()))
    }

    #[tokio::test]
    async fn test_plain_mode_single_file() {
        let mut req = request(MultipartBody::new().file("files", "main.go", "package main"));

        let ctx = FilesStage::plain()
            .apply(RequestContext::new(), &mut req)
            .await
            .unwrap();

        let files = ctx.uploaded_files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "main.go");
        assert!(ctx.archive().is_none());
    }

    #[tokio::test]
    async fn test_missing_files_field() {
        let mut req = request(MultipartBody::new().text("language", "go"));

        let err = FilesStage::plain()
            .apply(RequestContext::new(), &mut req)
            .await
            .unwrap_err();

        assert_eq!(err, PipelineError::client_input("missing files"));
    }

    #[tokio::test]
    async fn test_files_as_plain_value_is_missing() {
        let mut req = request(MultipartBody::new().text("files", "main.go"));

        let err = FilesStage::plain()
            .apply(RequestContext::new(), &mut req)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "missing files");
    }

    #[tokio::test]
    async fn test_multiple_files_rejected() {
        let mut req = request(
            MultipartBody::new()
                .file("files", "a.py", "a")
                .file("files", "b.py", "b"),
        );

        let err = FilesStage::plain()
            .apply(RequestContext::new(), &mut req)
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "we currently support only single file uploads");
    }

    #[tokio::test]
    async fn test_not_multipart_is_parse_error() {
        let mut req = IncomingRequest::new(
            Request::builder()
                .method(Method::POST)
                .uri("/run")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        );

        let err = FilesStage::plain()
            .apply(RequestContext::new(), &mut req)
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("could not parse multipart form: "));
    }

    #[tokio::test]
    async fn test_oversized_body_is_parse_error() {
        let body = MultipartBody::new().file("files", "big.py", vec![b'#'; 4096]);
        let mut req =
            IncomingRequest::with_form_limit(multipart_request(Method::POST, "/run", body), 1024);

        let err = FilesStage::plain()
            .apply(RequestContext::new(), &mut req)
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("could not parse multipart form: "));
    }

    #[tokio::test]
    async fn test_archive_entry_named_after_language() {
        let mut req = request(MultipartBody::new().file("files", "upload.txt", "print(42)"));

        let ctx = tar_stage()
            .apply(context_with_language("python"), &mut req)
            .await
            .unwrap();

        assert!(ctx.uploaded_files().is_none());
        let archive = ctx.archive().unwrap();
        let mut reader = tar::Archive::new(archive.as_ref());
        let mut entry = reader.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_str(), Some("main.py"));
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "print(42)");
    }

    #[tokio::test]
    async fn test_archive_builder_error_is_500() {
        let stage = FilesStage::archive(
            Arc::new(LanguageTable::default()),
            Arc::new(FailingArchiveBuilder::new("tar writer exploded")),
        );
        let mut req = request(MultipartBody::new().file("files", "main.go", "package main"));

        let err = stage
            .apply(context_with_language("go"), &mut req)
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("tar writer exploded"));
    }

    #[tokio::test]
    async fn test_archive_without_language_fails() {
        let mut req = request(MultipartBody::new().file("files", "main.go", "package main"));

        let err = tar_stage()
            .apply(RequestContext::new(), &mut req)
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "no archive entry name for language \"\"");
    }

    #[test]
    fn test_declared_fields() {
        let plain = FilesStage::plain();
        assert!(!plain.is_archive());
        assert_eq!(plain.provides(), &[ContextField::UploadedFiles]);
        assert!(plain.requires().is_empty());

        let archive = tar_stage();
        assert!(archive.is_archive());
        assert_eq!(archive.provides(), &[ContextField::Archive]);
        assert_eq!(archive.requires(), &[ContextField::Language]);
    }
}
