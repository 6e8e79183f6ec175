use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, EXPECTED_TOKEN};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn auth_request(token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/x")
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_describes_form_post() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo?page=2")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header("X-Trace", "abc")
                .body("a=1&b=two".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.query.as_deref(), Some("page=2"));
    assert_eq!(echo.headers["content-type"], "application/x-www-form-urlencoded");
    assert_eq!(echo.headers["x-trace"], "abc");
    assert_eq!(echo.body, "a=1&b=two");
}

#[tokio::test]
async fn echo_joins_repeated_headers() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header("x-tag", "one")
                .header("x-tag", "two")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.headers["x-tag"], "one, two");
    assert!(echo.query.is_none());
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code_and_body() {
    let resp = app().oneshot(get("/status/503?body=overloaded")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(&body_bytes(resp).await[..], b"overloaded");
}

#[tokio::test]
async fn status_defaults_body_to_reason_phrase() {
    let resp = app().oneshot(get("/status/404")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(&body_bytes(resp).await[..], b"Not Found");
}

#[tokio::test]
async fn status_rejects_out_of_range_code() {
    let resp = app().oneshot(get("/status/1000")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- malformed / slow ---

#[tokio::test]
async fn malformed_is_not_json() {
    let resp = app().oneshot(get("/malformed")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
}

#[tokio::test]
async fn slow_eventually_answers() {
    let resp = app().oneshot(get("/slow/10")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["done"], true);
}

// --- auth ---

#[tokio::test]
async fn auth_accepts_expected_token_and_body() {
    let resp = app()
        .oneshot(auth_request(Some(EXPECTED_TOKEN), r#"{"a":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json, serde_json::json!({"ok": true}));
}

#[tokio::test]
async fn auth_rejects_missing_token() {
    let resp = app().oneshot(auth_request(None, r#"{"a":1}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_rejects_wrong_token() {
    let resp = app()
        .oneshot(auth_request(Some("nope"), r#"{"a":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_rejects_unexpected_body() {
    let resp = app()
        .oneshot(auth_request(Some(EXPECTED_TOKEN), r#"{"a":2}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- hits ---

#[tokio::test]
async fn hits_starts_at_zero() {
    let resp = app().oneshot(get("/hits")).await.unwrap();
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["hits"], 0);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
