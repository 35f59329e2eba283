//! Startup-time route registration.

use super::Dispatch;
use crate::errors::ConfigError;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Dispatch entry points keyed by path, assembled once at startup.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<(String, Dispatch)>,
}

impl RouteTable {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `dispatch` for `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRoute` unless `path` is an absolute
    /// literal path, and `ConfigError::DuplicateRoute` if `path` is already
    /// registered.
    pub fn route(mut self, path: impl Into<String>, dispatch: Dispatch) -> Result<Self, ConfigError> {
        let path = path.into();
        if !is_literal_path(&path) {
            return Err(ConfigError::InvalidRoute { path });
        }
        if self.routes.iter().any(|(existing, _)| *existing == path) {
            return Err(ConfigError::DuplicateRoute { path });
        }
        self.routes.push((path, dispatch));
        Ok(self)
    }

    /// Returns the registered paths in registration order.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.routes.iter().map(|(path, _)| path.as_str()).collect()
    }

    /// Returns the dispatch registered for `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Dispatch> {
        self.routes
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, dispatch)| dispatch)
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Mounts every route on an `axum` router with request tracing.
    pub fn into_router(self) -> Router {
        let mut router = Router::new();
        for (path, dispatch) in self.routes {
            tracing::debug!(path = %path, chain = dispatch.name(), "Mounting route");
            router = router.route_service(&path, dispatch);
        }
        router.layer(TraceLayer::new_for_http())
    }
}

// The router panics at mount time on relative paths and overlapping captures.
fn is_literal_path(path: &str) -> bool {
    path.starts_with('/')
        && path
            .split('/')
            .all(|segment| !segment.starts_with(':') && !segment.starts_with('*'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ChainBuilder;
    use crate::stages::MethodStage;
    use crate::testing::{response_text, RecordingHandler};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use std::panic::AssertUnwindSafe;
    use tower::ServiceExt;

    fn dispatch(name: &str) -> Dispatch {
        ChainBuilder::new(name)
            .stage(MethodStage::post())
            .build(RecordingHandler::new())
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let result = RouteTable::new()
            .route("/run", dispatch("run"))
            .unwrap()
            .route("/run", dispatch("again"));

        assert!(matches!(
            result,
            Err(ConfigError::DuplicateRoute { path }) if path == "/run"
        ));
    }

    #[test]
    fn test_relative_route_rejected() {
        let result = RouteTable::new().route("run", dispatch("run"));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidRoute { path }) if path == "run"
        ));
    }

    #[test]
    fn test_pattern_routes_rejected() {
        for path in ["", "/run/:id", "/files/*rest"] {
            let result = RouteTable::new().route(path, dispatch("run"));
            assert!(
                matches!(result, Err(ConfigError::InvalidRoute { .. })),
                "{path:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_accepted_routes_mount() {
        let table = RouteTable::new()
            .route("/", dispatch("root"))
            .unwrap()
            .route("/run", dispatch("run"))
            .unwrap()
            .route("/v1/compile", dispatch("compile"))
            .unwrap();

        let mounted = std::panic::catch_unwind(AssertUnwindSafe(|| table.into_router()));
        assert!(mounted.is_ok());
    }

    #[test]
    fn test_lookup() {
        let table = RouteTable::new()
            .route("/run", dispatch("run"))
            .unwrap()
            .route("/compile", dispatch("compile"))
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.paths(), vec!["/run", "/compile"]);
        assert_eq!(table.get("/compile").unwrap().name(), "compile");
        assert!(table.get("/missing").is_none());
    }

    #[tokio::test]
    async fn test_router_serves_dispatch() {
        let handler = RecordingHandler::new();
        let dispatch = ChainBuilder::new("run")
            .stage(MethodStage::post())
            .build(handler.clone());
        let router = RouteTable::new().route("/run", dispatch).unwrap().into_router();

        let response = router
            .clone()
            .oneshot(Request::builder().method("GET").uri("/run").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, body) = response_text(response).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, "GET not allowed\n");
        assert_eq!(handler.call_count(), 0);

        let response = router
            .oneshot(Request::builder().method("POST").uri("/run").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(handler.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let router = RouteTable::new()
            .route("/run", dispatch("run"))
            .unwrap()
            .into_router();

        let response = router
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
