use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body;
use context::SessionContext;
use http::{Request, Response, header};
use session_api::{ApiClient, RequestCredentials};
use tower::Layer;

/// Enriches every inbound page request with a [`SessionContext`].
///
/// The layer resolves the caller's identity through the backend exactly once,
/// writes the resulting context into the request extensions and hands control
/// to the inner service unconditionally. Identity lookup failures degrade to
/// the anonymous context instead of failing the request.
#[derive(Clone)]
pub struct SessionLayer(Arc<SessionLayerInner>);

struct SessionLayerInner {
    api: ApiClient,
}

impl SessionLayer {
    pub fn new(api: ApiClient) -> Self {
        Self(Arc::new(SessionLayerInner { api }))
    }
}

impl<Service> Layer<Service> for SessionLayer
where
    Service: Send + Clone,
{
    type Service = SessionService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        SessionService {
            next,
            layer: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SessionService<Service> {
    next: Service,
    layer: Arc<SessionLayerInner>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for SessionService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    Service::Error: Display + 'static,
    ReqBody: http_body::Body + Send + 'static,
{
    type Response = Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let layer = self.layer.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            let credentials = match parts.headers.get(header::COOKIE).and_then(|value| value.to_str().ok()) {
                Some(cookies) => RequestCredentials::from_cookie_header(cookies),
                None => RequestCredentials::empty(),
            };

            let api = layer.api.scoped(Arc::new(credentials));
            let session = resolve_session(&api).await;

            parts.extensions.insert(session);

            next.call(Request::from_parts(parts, body)).await
        })
    }
}

/// One awaited identity lookup per request.
///
/// "No session" and a failed lookup both produce the anonymous shape, so
/// downstream rendering never sees a half-populated context and never fails
/// because the identity service did. Hard failures only leave a log line.
async fn resolve_session(api: &ApiClient) -> SessionContext {
    match api.current_identity().await {
        Ok(Some(identity)) => SessionContext::from(identity),
        Ok(None) => SessionContext::anonymous(),
        Err(error) => {
            log::error!("Failed to resolve session identity, continuing anonymously: {error}");
            SessionContext::anonymous()
        }
    }
}
