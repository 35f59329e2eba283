//! The request context and the values stages store in it.

use crate::errors::FieldConflictError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A stage-owned field of [`RequestContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    /// Raw uploaded files.
    UploadedFiles,
    /// Single-entry tar archive built from the upload.
    Archive,
    /// Selected language identifier.
    Language,
    /// Resolved test input.
    Test,
    /// Resolved stdin input.
    Stdin,
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UploadedFiles => write!(f, "uploaded_files"),
            Self::Archive => write!(f, "archive"),
            Self::Language => write!(f, "language"),
            Self::Test => write!(f, "test"),
            Self::Stdin => write!(f, "stdin"),
        }
    }
}

/// One file part of a multipart upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field_name: String,
    /// Client-supplied file name.
    pub file_name: String,
    /// Client-supplied content type, if any.
    pub content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    /// Creates a new uploaded file descriptor.
    #[must_use]
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: Bytes,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the file content.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .finish()
    }
}

/// Values validated and extracted by stages for one request.
///
/// Each stage-owned field is written at most once. The upload group
/// (`uploaded_files` and `archive`) counts as one field: once either is
/// set, neither can be written again.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    received_at: DateTime<Utc>,
    uploaded_files: Option<Vec<UploadedFile>>,
    archive: Option<Bytes>,
    language: Option<String>,
    test: Option<Bytes>,
    stdin: Option<Bytes>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Creates an empty context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            received_at: Utc::now(),
            uploaded_files: None,
            archive: None,
            language: None,
            test: None,
            stdin: None,
        }
    }

    /// Returns the request ID used for log correlation.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns when the context was created.
    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Returns the uploaded files, if the file stage ran in plain mode.
    #[must_use]
    pub fn uploaded_files(&self) -> Option<&[UploadedFile]> {
        self.uploaded_files.as_deref()
    }

    /// Returns the archive, if the file stage ran in archive mode.
    #[must_use]
    pub const fn archive(&self) -> Option<&Bytes> {
        self.archive.as_ref()
    }

    /// Returns the selected language.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Returns the resolved test input.
    #[must_use]
    pub const fn test(&self) -> Option<&Bytes> {
        self.test.as_ref()
    }

    /// Returns the resolved stdin input.
    #[must_use]
    pub const fn stdin(&self) -> Option<&Bytes> {
        self.stdin.as_ref()
    }

    /// Returns true if the given field has been set.
    #[must_use]
    pub const fn is_set(&self, field: ContextField) -> bool {
        match field {
            ContextField::UploadedFiles => self.uploaded_files.is_some(),
            ContextField::Archive => self.archive.is_some(),
            ContextField::Language => self.language.is_some(),
            ContextField::Test => self.test.is_some(),
            ContextField::Stdin => self.stdin.is_some(),
        }
    }

    /// Stores the raw uploaded files.
    ///
    /// # Errors
    ///
    /// Returns `FieldConflictError` if the upload group is already set.
    pub fn set_uploaded_files(&mut self, files: Vec<UploadedFile>) -> Result<(), FieldConflictError> {
        self.ensure_upload_group_empty(ContextField::UploadedFiles)?;
        self.uploaded_files = Some(files);
        Ok(())
    }

    /// Stores the archive built from the upload.
    ///
    /// # Errors
    ///
    /// Returns `FieldConflictError` if the upload group is already set.
    pub fn set_archive(&mut self, archive: Bytes) -> Result<(), FieldConflictError> {
        self.ensure_upload_group_empty(ContextField::Archive)?;
        self.archive = Some(archive);
        Ok(())
    }

    /// Stores the selected language.
    ///
    /// # Errors
    ///
    /// Returns `FieldConflictError` if the language is already set.
    pub fn set_language(&mut self, language: impl Into<String>) -> Result<(), FieldConflictError> {
        set_once(&mut self.language, ContextField::Language, language.into())
    }

    /// Stores the resolved test input.
    ///
    /// # Errors
    ///
    /// Returns `FieldConflictError` if the test input is already set.
    pub fn set_test(&mut self, test: Bytes) -> Result<(), FieldConflictError> {
        set_once(&mut self.test, ContextField::Test, test)
    }

    /// Stores the resolved stdin input.
    ///
    /// # Errors
    ///
    /// Returns `FieldConflictError` if the stdin input is already set.
    pub fn set_stdin(&mut self, stdin: Bytes) -> Result<(), FieldConflictError> {
        set_once(&mut self.stdin, ContextField::Stdin, stdin)
    }

    fn ensure_upload_group_empty(&self, field: ContextField) -> Result<(), FieldConflictError> {
        if self.uploaded_files.is_some() || self.archive.is_some() {
            return Err(FieldConflictError::new(field));
        }
        Ok(())
    }
}

fn set_once<T>(slot: &mut Option<T>, field: ContextField, value: T) -> Result<(), FieldConflictError> {
    if slot.is_some() {
        return Err(FieldConflictError::new(field));
    }
    *slot = Some(value);
    Ok(())
}
