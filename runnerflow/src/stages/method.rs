//! HTTP method check.

use super::{Stage, StageResult};
use crate::context::{IncomingRequest, RequestContext};
use crate::errors::PipelineError;
use async_trait::async_trait;
use axum::http::Method;

/// Halts with 405 unless the request uses the allowed method.
#[derive(Debug, Clone)]
pub struct MethodStage {
    allowed: Method,
}

impl MethodStage {
    /// Creates a stage accepting only `allowed`.
    #[must_use]
    pub const fn new(allowed: Method) -> Self {
        Self { allowed }
    }

    /// Creates a stage accepting only `POST`.
    #[must_use]
    pub const fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Returns the allowed method.
    #[must_use]
    pub const fn allowed(&self) -> &Method {
        &self.allowed
    }
}

#[async_trait]
impl Stage for MethodStage {
    fn name(&self) -> &str {
        "method"
    }

    async fn apply(&self, ctx: RequestContext, req: &mut IncomingRequest) -> StageResult {
        if *req.method() != self.allowed {
            return Err(PipelineError::method_not_allowed(req.method().as_str()));
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;

    fn request(method: Method) -> IncomingRequest {
        IncomingRequest::new(
            Request::builder()
                .method(method)
                .uri("/run")
                .body(Body::empty())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_matching_method_forwards() {
        let stage = MethodStage::post();
        let mut req = request(Method::POST);

        let ctx = stage.apply(RequestContext::new(), &mut req).await.unwrap();

        assert!(ctx.language().is_none());
        assert!(!req.is_form_parsed());
    }

    #[tokio::test]
    async fn test_mismatch_is_405_naming_method() {
        let stage = MethodStage::post();
        let mut req = request(Method::GET);

        let err = stage.apply(RequestContext::new(), &mut req).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "GET not allowed");
    }

    #[tokio::test]
    async fn test_extension_method() {
        let stage = MethodStage::new(Method::PUT);
        let mut req = request(Method::from_bytes(b"PURGE").unwrap());

        let err = stage.apply(RequestContext::new(), &mut req).await.unwrap_err();

        assert_eq!(err, PipelineError::method_not_allowed("PURGE"));
    }
}
