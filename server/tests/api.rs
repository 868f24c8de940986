
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use bytes::Bytes;
use http_body::Frame;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use wrap_core::{App, Ctx, HandlerResult, Outbound};
use wrap_server::{router, ServerConfig};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Account {
    id: u64,
    username: String,
}

#[derive(Deserialize)]
struct NewAccount {
    username: String,
}

fn root(c: &mut Ctx) -> HandlerResult {
    match c.next() {
        "user" => {
            c.advance_and_dispatch(users);
            Ok(())
        }
        "slow" => {
            std::thread::sleep(Duration::from_millis(300));
            c.json("late")
        }
        "cors" => {
            c.response_mut().enable_cors("*", "GET", "Content-Type");
            c.json("ok")
        }
        _ => Err(c.not_found()),
    }
}

fn users(c: &mut Ctx) -> HandlerResult {
    if !c.next().is_empty() {
        c.advance_and_dispatch(|c| {
            let id: u64 = c.current().parse().map_err(|_| c.bad_request())?;
            c.read(move |c| {
                let verbose = c.flags().get("verbose") == Some("true");
                let username = if verbose { format!("user number {id}") } else { format!("user-{id}") };
                c.json(&Account { id, username })
            });
            c.delete(|c| {
                c.no_content();
                Ok(())
            });
            c.resolve();
            Ok(())
        });
        return Ok(());
    }
    c.create(|c| {
        let input: NewAccount = c.bind()?;
        if input.username.is_empty() {
            return Err(c.unprocessable_entity(7, "bad field"));
        }
        c.response_mut().set_status(201);
        c.json(&Account {
            id: 2,
            username: input.username,
        })
    });
    c.resolve();
    Ok(())
}

fn service() -> axum::Router {
    router(
        App::builder().default_handler(root).build(),
        ServerConfig::default(),
    )
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- read ---

#[tokio::test]
async fn get_maps_to_read() {
    let resp = service().oneshot(empty_request("GET", "/user/42")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let account: Account = body_json(resp).await;
    assert_eq!(account.id, 42);
    assert_eq!(account.username, "user-42");
}

#[tokio::test]
async fn query_string_reaches_handlers_as_flags() {
    let resp = service()
        .oneshot(empty_request("GET", "/user/5?verbose=true"))
        .await
        .unwrap();

    let account: Account = body_json(resp).await;
    assert_eq!(account.username, "user number 5");
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() {
    let resp = service().oneshot(empty_request("GET", "/user/abc")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "message": "bad request" }));
}

// --- create ---

#[tokio::test]
async fn post_maps_to_create() {
    let resp = service()
        .oneshot(json_request("POST", "/user", r#"{"username":"bob"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let account: Account = body_json(resp).await;
    assert_eq!(
        account,
        Account {
            id: 2,
            username: "bob".into()
        }
    );
}

#[tokio::test]
async fn validation_error_carries_code() {
    let resp = service()
        .oneshot(json_request("POST", "/user", r#"{"username":""}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "code": 7, "message": "bad field" }));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let resp = service()
        .oneshot(json_request("POST", "/user", "not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "could not decode request body");
}

// --- delete ---

#[tokio::test]
async fn delete_returns_204_with_empty_body() {
    let resp = service().oneshot(empty_request("DELETE", "/user/3")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

// --- fallbacks ---

#[tokio::test]
async fn unknown_path_is_404() {
    let resp = service().oneshot(empty_request("GET", "/nowhere")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "message": "not found" }));
}

#[tokio::test]
async fn unmatched_verb_falls_through_to_not_found() {
    let resp = service()
        .oneshot(json_request("PUT", "/user/3", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_method_never_reaches_handlers() {
    let resp = service().oneshot(empty_request("PATCH", "/user/3")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "not found");
}

#[tokio::test]
async fn handler_headers_are_copied_out() {
    let resp = service().oneshot(empty_request("GET", "/cors")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn app_without_handlers_answers_404_everywhere() {
    let resp = router(App::new(), ServerConfig::default())
        .oneshot(empty_request("GET", "/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- limits and deadlines ---

/// A request body that never delivers a frame.
struct Stalled;

impl http_body::Body for Stalled {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Pending
    }
}

fn service_with(config: ServerConfig) -> axum::Router {
    router(App::builder().default_handler(root).build(), config)
}

async fn assert_json_error(resp: axum::response::Response, status: StatusCode, message: &str) {
    assert_eq!(resp.status(), status);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "message": message }));
}

#[tokio::test]
async fn stalled_body_times_out_with_json() {
    let config = ServerConfig {
        read_timeout: Duration::from_millis(50),
        ..ServerConfig::default()
    };
    let req = Request::builder()
        .method("POST")
        .uri("/user")
        .body(Body::new(Stalled))
        .unwrap();
    let resp = service_with(config).oneshot(req).await.unwrap();

    assert_json_error(resp, StatusCode::REQUEST_TIMEOUT, "request timeout").await;
}

#[tokio::test]
async fn slow_handler_times_out_with_json() {
    let config = ServerConfig {
        write_timeout: Duration::from_millis(50),
        ..ServerConfig::default()
    };
    let resp = service_with(config)
        .oneshot(empty_request("GET", "/slow"))
        .await
        .unwrap();

    assert_json_error(resp, StatusCode::REQUEST_TIMEOUT, "request timeout").await;
}

#[tokio::test]
async fn oversized_body_is_rejected_before_dispatch() {
    let config = ServerConfig {
        body_limit: 16,
        ..ServerConfig::default()
    };
    let resp = service_with(config)
        .oneshot(json_request(
            "POST",
            "/user",
            r#"{"username":"a name well past sixteen bytes"}"#,
        ))
        .await
        .unwrap();

    assert_json_error(resp, StatusCode::PAYLOAD_TOO_LARGE, "payload too large").await;
}

#[tokio::test]
async fn body_at_the_limit_is_accepted() {
    let body = r#"{"username":"bob"}"#;
    let config = ServerConfig {
        body_limit: body.len(),
        ..ServerConfig::default()
    };
    let resp = service_with(config)
        .oneshot(json_request("POST", "/user", body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
}
