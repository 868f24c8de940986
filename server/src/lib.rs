//! HTTP transport for a [`wrap_core::App`].
//!
//! # Design
//! axum owns the socket. Every request, whatever its method or path, lands
//! in one fallback handler that turns it into a [`HttpRequest`], runs the
//! app's handler chain on the blocking pool and copies the recorded
//! status, headers and JSON body back out.
//!
//! Every answer is JSON, including the ones the adapter gives on its own:
//! an unsupported method (404), a body over [`ServerConfig::body_limit`]
//! (413) and a missed deadline (408).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use wrap_core::{
    render_error, App, Error, ErrorBody, HttpRequest, HttpResponse, Outbound, Target,
};

const HTTP_BASE: &str = "http://app.http";

/// Per-request deadlines and limits.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// How long a client may take to send the request body.
    pub read_timeout: Duration,
    /// How long one request may take from start to finished response.
    pub write_timeout: Duration,
    /// Largest request body read into memory, in bytes.
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
            body_limit: 2 * 1024 * 1024,
        }
    }
}

#[derive(Clone)]
struct Shared {
    app: Arc<App>,
    config: ServerConfig,
}

pub fn router(app: Arc<App>, config: ServerConfig) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(Shared { app, config })
        .layer(TraceLayer::new_for_http())
}

pub async fn run(listener: TcpListener, app: Arc<App>, config: ServerConfig) -> std::io::Result<()> {
    run_until(listener, app, config, std::future::pending()).await
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn run_until<F>(
    listener: TcpListener,
    app: Arc<App>,
    config: ServerConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(app, config))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn dispatch(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let deadline = shared.config.write_timeout;
    match tokio::time::timeout(deadline, call(shared, &method, &uri, &headers, body)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%method, %uri, "response not ready in time");
            answer(StatusCode::REQUEST_TIMEOUT, "request timeout")
        }
    }
}

async fn call(
    shared: Shared,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Body,
) -> Response {
    let limited = Limited::new(body, shared.config.body_limit);
    let body = match tokio::time::timeout(shared.config.read_timeout, limited.collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(err)) if err.is::<LengthLimitError>() => {
            tracing::warn!(%method, %uri, limit = shared.config.body_limit, "request body too large");
            return answer(StatusCode::PAYLOAD_TOO_LARGE, "payload too large");
        }
        Ok(Err(err)) => {
            return rendered(&Error::bad_request("could not read request body", err.to_string()))
        }
        Err(_) => {
            tracing::warn!(%method, %uri, "request body not received in time");
            return answer(StatusCode::REQUEST_TIMEOUT, "request timeout");
        }
    };

    let request = match build_request(method, uri, headers, body) {
        Ok(request) => request,
        Err(err) => return rendered(&err),
    };

    let app = shared.app;
    let handled =
        tokio::task::spawn_blocking(move || app.handle(request.into(), HttpResponse::new().into()))
            .await;
    match handled {
        Ok(response) => into_axum(HttpResponse::from(response.into_recorded())),
        Err(err) => rendered(&Error::internal("internal server error", err.to_string())),
    }
}

fn build_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<HttpRequest, Error> {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let target = Target::parse(&format!("{HTTP_BASE}{path_and_query}"))
        .map_err(|e| Error::bad_request("bad request", format!("url {uri}: {e}")))?;
    let mut request = HttpRequest::new(method.as_str(), target, body.to_vec()).map_err(|e| {
        Error::not_found("not found", format!("url: {} not found: {e}", uri.path()))
    })?;
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    Ok(request)
}

/// Answer without running any handler.
fn rendered(err: &Error) -> Response {
    let mut response = HttpResponse::new();
    render_error(&mut response, err);
    into_axum(response)
}

/// A transport-level failure outside the handler error taxonomy, in the
/// same `{"message": ...}` shape.
fn answer(status: StatusCode, message: &str) -> Response {
    let mut response = HttpResponse::new();
    response.set_status(status.as_u16());
    let body = ErrorBody {
        code: None,
        message: message.to_string(),
    };
    if let Err(err) = response.write(&body) {
        tracing::error!(%err, "failed to write adapter response");
    }
    into_axum(response)
}

fn into_axum(response: HttpResponse) -> Response {
    let (status, headers, body) = response.into_parts();
    let mut out = Response::new(Body::from(body));
    *out.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                out.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(%name, %value, "dropping invalid response header"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrap_core::Inbound;

    #[test]
    fn default_deadlines_and_limit() {
        let config = ServerConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.body_limit, 2 * 1024 * 1024);
    }

    #[test]
    fn adapter_answers_are_json() {
        let out = answer(StatusCode::REQUEST_TIMEOUT, "request timeout");
        assert_eq!(out.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            out.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn unresolved_method_is_not_found() {
        let err = build_request(
            &Method::PATCH,
            &Uri::from_static("/user/1"),
            &HeaderMap::new(),
            Bytes::new(),
        )
        .unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn query_becomes_flags_and_headers_are_kept() {
        let mut headers = HeaderMap::new();
        headers.insert("x-token", HeaderValue::from_static("abc"));
        let request = build_request(
            &Method::GET,
            &Uri::from_static("/user/1?verbose=true"),
            &headers,
            Bytes::from_static(b"{}"),
        )
        .unwrap();
        assert_eq!(request.path().segments(), ["user", "1"]);
        assert_eq!(request.flags().get("verbose"), Some("true"));
        assert_eq!(request.header("X-Token"), Some("abc"));
        assert_eq!(request.body(), b"{}");
    }

    #[test]
    fn into_axum_copies_status_headers_and_body() {
        let mut response = HttpResponse::new();
        render_error(&mut response, &Error::unprocessable_entity(7, "bad field"));
        let out = into_axum(response);
        assert_eq!(out.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            out.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
