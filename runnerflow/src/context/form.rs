//! Request form parsing.
//!
//! A request body is read at most once. The result (values, files, or the
//! parse failure) is cached on the request so every stage sees the same form.

use super::UploadedFile;
use axum::body::Body;
use axum::http::{header, HeaderMap};
use thiserror::Error;

/// Default bound on a request body read as a form: 16 MiB.
pub const DEFAULT_MAX_FORM_BYTES: usize = 16 << 20;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Failure to read a request body as a form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The request is not `multipart/form-data`.
    #[error("request Content-Type isn't multipart/form-data")]
    NotMultipart,

    /// The multipart body is malformed or exceeds the size bound.
    #[error("{0}")]
    Multipart(String),

    /// The body could not be read.
    #[error("could not read request body: {0}")]
    Body(String),
}

/// How the body of a request was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `multipart/form-data`.
    Multipart,
    /// `application/x-www-form-urlencoded`.
    UrlEncoded,
    /// Anything else; only the query string contributes values.
    Other,
}

/// Values and files read from one request.
///
/// Body values precede query values, so a body value wins on lookup.
#[derive(Debug, Clone)]
pub struct ParsedForm {
    kind: BodyKind,
    values: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl ParsedForm {
    /// Returns how the body was interpreted.
    #[must_use]
    pub const fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Returns the first value for `name`, if any.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the files sent under `name`, or `None` if no such field exists.
    #[must_use]
    pub fn files(&self, name: &str) -> Option<Vec<UploadedFile>> {
        let files: Vec<UploadedFile> = self
            .files
            .iter()
            .filter(|file| file.field_name == name)
            .cloned()
            .collect();
        if files.is_empty() {
            None
        } else {
            Some(files)
        }
    }

    /// Returns the number of file parts.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Reads the body according to its content type and appends query values.
pub(crate) async fn parse(
    headers: &HeaderMap,
    query: Option<&str>,
    body: Body,
    max_bytes: usize,
) -> Result<ParsedForm, FormError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let mut form = match mime.as_str() {
        MULTIPART_FORM_DATA => parse_multipart(content_type, body, max_bytes).await?,
        FORM_URLENCODED => parse_urlencoded(body, max_bytes).await?,
        _ => ParsedForm {
            kind: BodyKind::Other,
            values: Vec::new(),
            files: Vec::new(),
        },
    };

    if let Some(query) = query {
        form.values.extend(decode_pairs(query.as_bytes()));
    }

    Ok(form)
}

async fn parse_multipart(
    content_type: &str,
    body: Body,
    max_bytes: usize,
) -> Result<ParsedForm, FormError> {
    let boundary =
        multer::parse_boundary(content_type).map_err(|e| FormError::Multipart(e.to_string()))?;
    let constraints = multer::Constraints::new()
        .size_limit(
            multer::SizeLimit::new().whole_stream(u64::try_from(max_bytes).unwrap_or(u64::MAX)),
        );
    let mut multipart =
        multer::Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut values = Vec::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FormError::Multipart(e.to_string()))?
    {
        // Unnamed parts are skipped.
        let Some(name) = field.name().filter(|name| !name.is_empty()).map(ToString::to_string)
        else {
            continue;
        };
        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| FormError::Multipart(e.to_string()))?;

        // Parts without a file name are plain values.
        match file_name {
            Some(file_name) if !file_name.is_empty() => {
                files.push(UploadedFile::new(name, file_name, content_type, data));
            }
            _ => values.push((name, String::from_utf8_lossy(&data).into_owned())),
        }
    }

    Ok(ParsedForm {
        kind: BodyKind::Multipart,
        values,
        files,
    })
}

async fn parse_urlencoded(body: Body, max_bytes: usize) -> Result<ParsedForm, FormError> {
    let bytes = axum::body::to_bytes(body, max_bytes)
        .await
        .map_err(|e| FormError::Body(e.to_string()))?;

    Ok(ParsedForm {
        kind: BodyKind::UrlEncoded,
        values: decode_pairs(&bytes).collect(),
        files: Vec::new(),
    })
}

fn decode_pairs(input: &[u8]) -> impl Iterator<Item = (String, String)> + '_ {
    url::form_urlencoded::parse(input).map(|(key, value)| (key.into_owned(), value.into_owned()))
}
