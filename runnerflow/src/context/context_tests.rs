//! Comprehensive tests for context module.

#[cfg(test)]
mod tests {
    use crate::context::{ContextField, FormError, IncomingRequest, RequestContext, UploadedFile};
    use crate::testing::{multipart_request, MultipartBody};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    fn sample_file(name: &str) -> UploadedFile {
        UploadedFile::new("files", name, None, Bytes::from_static(b"print(1)"))
    }

    #[test]
    fn test_new_context_is_empty() {
        let ctx = RequestContext::new();
        assert!(ctx.uploaded_files().is_none());
        assert!(ctx.archive().is_none());
        assert!(ctx.language().is_none());
        assert!(ctx.test().is_none());
        assert!(ctx.stdin().is_none());
    }

    #[test]
    fn test_contexts_get_distinct_request_ids() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn test_language_set_once() {
        let mut ctx = RequestContext::new();
        ctx.set_language("go").unwrap();

        let err = ctx.set_language("python").unwrap_err();
        assert_eq!(err.field, ContextField::Language);
        assert_eq!(ctx.language(), Some("go"));
    }

    #[test]
    fn test_upload_group_is_exclusive() {
        let mut ctx = RequestContext::new();
        ctx.set_uploaded_files(vec![sample_file("main.py")]).unwrap();

        let err = ctx.set_archive(Bytes::from_static(b"tar")).unwrap_err();
        assert_eq!(err.field, ContextField::Archive);
        assert!(ctx.archive().is_none());
        assert!(ctx.is_set(ContextField::UploadedFiles));
    }

    #[test]
    fn test_archive_then_files_conflicts() {
        let mut ctx = RequestContext::new();
        ctx.set_archive(Bytes::from_static(b"tar")).unwrap();
        assert!(ctx.set_uploaded_files(vec![sample_file("main.go")]).is_err());
    }

    #[test]
    fn test_test_and_stdin_set_once() {
        let mut ctx = RequestContext::new();
        ctx.set_test(Bytes::from_static(b"t")).unwrap();
        ctx.set_stdin(Bytes::from_static(b"s")).unwrap();

        assert!(ctx.set_test(Bytes::from_static(b"t2")).is_err());
        assert!(ctx.set_stdin(Bytes::from_static(b"s2")).is_err());
        assert_eq!(ctx.test().unwrap().as_ref(), b"t");
        assert_eq!(ctx.stdin().unwrap().as_ref(), b"s");
    }

    #[test]
    fn test_uploaded_file_debug_hides_content() {
        let debug = format!("{:?}", sample_file("main.py"));
        assert!(debug.contains("main.py"));
        assert!(debug.contains("size: 8"));
        assert!(!debug.contains("print"));
    }

    #[test]
    fn test_context_field_display() {
        assert_eq!(ContextField::UploadedFiles.to_string(), "uploaded_files");
        assert_eq!(ContextField::Stdin.to_string(), "stdin");
    }

    #[tokio::test]
    async fn test_form_is_parsed_once() {
        let body = MultipartBody::new()
            .text("language", "python")
            .file("files", "main.py", "print(1)");
        let mut req = IncomingRequest::new(multipart_request(Method::POST, "/run", body));

        assert!(!req.is_form_parsed());
        assert_eq!(req.form_value("language").await, "python");
        assert!(req.is_form_parsed());
        assert!(req.take_body().is_none());

        let files = req.multipart_files("files").await.unwrap().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(req.form_value("missing").await, "");
    }

    #[tokio::test]
    async fn test_multipart_files_on_urlencoded_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/run")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("language=go"))
            .unwrap();
        let mut req = IncomingRequest::new(request);

        assert_eq!(req.form_value("language").await, "go");
        assert_eq!(
            req.multipart_files("files").await.unwrap_err(),
            FormError::NotMultipart
        );
    }

    #[tokio::test]
    async fn test_parse_failure_is_cached() {
        let body = MultipartBody::new().file("files", "big.go", vec![b'a'; 2048]);
        let mut req =
            IncomingRequest::with_form_limit(multipart_request(Method::POST, "/run", body), 512);

        assert_eq!(req.form_value("language").await, "");
        let first = req.multipart_files("files").await.unwrap_err();
        let second = req.multipart_files("files").await.unwrap_err();
        assert_eq!(first, second);
    }
}
