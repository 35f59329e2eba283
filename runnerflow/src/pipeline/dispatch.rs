//! Dispatch entry points and terminal handlers.

use crate::context::{IncomingRequest, RequestContext};
use crate::stages::Stage;
use async_trait::async_trait;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, info, info_span, Instrument};

/// Business logic run after every stage passed.
///
/// The returned response is the success response; the pipeline itself never
/// writes one.
#[async_trait]
pub trait TerminalHandler: Send + Sync {
    /// Handles a fully validated request.
    async fn handle(&self, ctx: RequestContext, req: IncomingRequest) -> Response;
}

/// An async function-based terminal handler.
pub struct FnHandler<F> {
    func: F,
}

impl<F, Fut> FnHandler<F>
where
    F: Fn(RequestContext, IncomingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send,
{
    /// Creates a new function-based handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> TerminalHandler for FnHandler<F>
where
    F: Fn(RequestContext, IncomingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send,
{
    async fn handle(&self, ctx: RequestContext, req: IncomingRequest) -> Response {
        (self.func)(ctx, req).await
    }
}

pub(crate) struct Chain {
    pub(crate) name: String,
    pub(crate) stages: Vec<Arc<dyn Stage>>,
    pub(crate) handler: Arc<dyn TerminalHandler>,
    pub(crate) max_form_bytes: usize,
}

/// A composed chain of stages and its terminal handler.
///
/// Cloning is cheap; clones share the same immutable chain. Each call runs
/// the stages in declaration order against a fresh [`RequestContext`].
#[derive(Clone)]
pub struct Dispatch {
    chain: Arc<Chain>,
}

impl Dispatch {
    pub(crate) fn new(chain: Chain) -> Self {
        Self {
            chain: Arc::new(chain),
        }
    }

    /// Returns the chain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.chain.name
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.chain.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.chain.stages.len()
    }

    /// Serves one request.
    pub async fn serve(&self, request: Request) -> Response {
        let req = IncomingRequest::with_form_limit(request, self.chain.max_form_bytes);
        self.run(req).await
    }

    /// Runs the chain against an already wrapped request.
    pub async fn run(&self, mut req: IncomingRequest) -> Response {
        let mut ctx = RequestContext::new();
        let span = info_span!(
            "dispatch",
            chain = %self.chain.name,
            request_id = %ctx.request_id(),
            method = %req.method(),
            path = %req.uri().path(),
        );

        async move {
            for stage in &self.chain.stages {
                ctx = match stage.apply(ctx, &mut req).await {
                    Ok(next) => {
                        debug!(stage = stage.name(), "Stage passed");
                        next
                    }
                    Err(err) => {
                        info!(
                            stage = stage.name(),
                            status = err.status().as_u16(),
                            kind = err.kind(),
                            error = %err,
                            "Chain halted"
                        );
                        return err.into_response();
                    }
                };
            }

            let response = self.chain.handler.handle(ctx, req).await;
            debug!(status = response.status().as_u16(), "Handler completed");
            response
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("name", &self.chain.name)
            .field("stages", &self.stage_names())
            .field("max_form_bytes", &self.chain.max_form_bytes)
            .finish_non_exhaustive()
    }
}

impl tower::Service<Request> for Dispatch {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let dispatch = self.clone();
        Box::pin(async move { Ok(dispatch.serve(request).await) })
    }
}
