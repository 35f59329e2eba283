//! The incoming request as seen by stages and terminal handlers.

use super::form::{self, BodyKind, FormError, ParsedForm, DEFAULT_MAX_FORM_BYTES};
use super::UploadedFile;
use axum::body::Body;
use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Method, Uri};
use std::fmt;

/// A live request with a lazily parsed form.
///
/// The body is consumed by the first form access; later accesses reuse the
/// cached result, including a cached parse failure.
pub struct IncomingRequest {
    parts: Parts,
    body: Option<Body>,
    form: Option<Result<ParsedForm, FormError>>,
    max_form_bytes: usize,
}

impl IncomingRequest {
    /// Wraps a request using the default 16 MiB form bound.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self::with_form_limit(request, DEFAULT_MAX_FORM_BYTES)
    }

    /// Wraps a request with a custom form bound.
    #[must_use]
    pub fn with_form_limit(request: Request, max_form_bytes: usize) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            parts,
            body: Some(body),
            form: None,
            max_form_bytes,
        }
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Returns the request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Returns the request extensions.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Returns the bound applied when the body is read as a form.
    #[must_use]
    pub const fn max_form_bytes(&self) -> usize {
        self.max_form_bytes
    }

    /// Returns true once the body has been read as a form.
    #[must_use]
    pub const fn is_form_parsed(&self) -> bool {
        self.form.is_some()
    }

    /// Takes the raw body, if no form access consumed it yet.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Returns the parsed form, reading the body on first access.
    ///
    /// # Errors
    ///
    /// Returns the (cached) `FormError` if the body could not be parsed.
    pub async fn form(&mut self) -> Result<&ParsedForm, FormError> {
        let parsed = match self.form.take() {
            Some(parsed) => parsed,
            None => {
                let body = self.body.take().unwrap_or_else(Body::empty);
                let parsed = form::parse(
                    &self.parts.headers,
                    self.parts.uri.query(),
                    body,
                    self.max_form_bytes,
                )
                .await;
                if let Err(ref err) = parsed {
                    tracing::debug!(error = %err, "Form parse failed");
                }
                parsed
            }
        };
        self.form.insert(parsed).as_ref().map_err(Clone::clone)
    }

    /// Returns the first form value for `name`, or an empty string.
    ///
    /// Parse failures read as an absent value; stages that need the parse
    /// error use [`IncomingRequest::multipart_files`].
    pub async fn form_value(&mut self, name: &str) -> String {
        match self.form().await {
            Ok(form) => form.value(name).unwrap_or_default().to_string(),
            Err(_) => String::new(),
        }
    }

    /// Returns the files uploaded under `name` in a multipart body.
    ///
    /// `Ok(None)` means the body is multipart but has no file part `name`.
    ///
    /// # Errors
    ///
    /// Returns `FormError::NotMultipart` for other bodies, or the parse error.
    pub async fn multipart_files(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<UploadedFile>>, FormError> {
        let form = self.form().await?;
        if form.kind() != BodyKind::Multipart {
            return Err(FormError::NotMultipart);
        }
        Ok(form.files(name))
    }
}

impl fmt::Debug for IncomingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingRequest")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("form_parsed", &self.form.is_some())
            .field("max_form_bytes", &self.max_form_bytes)
            .finish_non_exhaustive()
    }
}
