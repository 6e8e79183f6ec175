use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

/// Bearer token accepted by `POST /v1/x`.
pub const EXPECTED_TOKEN: &str = "tok123";

/// Description of a request as seen by `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Lower-cased header names; repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Number of requests served, excluding `/hits` itself.
pub type Hits = Arc<AtomicU64>;

pub fn app() -> Router {
    let hits: Hits = Arc::new(AtomicU64::new(0));
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", get(status))
        .route("/malformed", get(malformed))
        .route("/slow/{ms}", get(slow))
        .route("/v1/x", post(auth_json))
        .route("/hits", get(hit_count))
        .layer(middleware::from_fn_with_state(hits.clone(), count_hits))
        .with_state(hits)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serve on a random local port from a background thread and return the
/// bound address. The server lives until the process exits.
pub fn spawn() -> Result<SocketAddr, std::io::Error> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::spawn(move || {
        let served = runtime.block_on(async {
            let listener = TcpListener::from_std(std_listener)?;
            run(listener).await
        });
        if let Err(error) = served {
            tracing::error!(%error, "mock server stopped");
        }
    });

    Ok(addr)
}

async fn count_hits(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    if request.uri().path() != "/hits" {
        hits.fetch_add(1, Ordering::Relaxed);
    }
    next.run(request).await
}

async fn hit_count(State(hits): State<Hits>) -> Json<serde_json::Value> {
    Json(json!({ "hits": hits.load(Ordering::Relaxed) }))
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        seen.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: seen,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Respond with `code` and the `body` query parameter as plain text.
async fn status(Path(code): Path<u16>, Query(params): Query<HashMap<String, String>>) -> Response {
    let Ok(status) = StatusCode::from_u16(code) else {
        return (StatusCode::BAD_REQUEST, format!("invalid status code {code}")).into_response();
    };
    let body = params
        .get("body")
        .cloned()
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    (status, body).into_response()
}

async fn malformed() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"ok": tru"#,
    )
        .into_response()
}

async fn slow(Path(ms): Path<u64>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "done": true }))
}

/// Accept only `{"a":1}` sent with the expected bearer token.
async fn auth_json(headers: HeaderMap, body: Bytes) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {EXPECTED_TOKEN}"));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "missing or invalid bearer token").into_response();
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !is_json {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, "expected application/json").into_response();
    }

    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) if value == json!({ "a": 1 }) => Json(json!({ "ok": true })).into_response(),
        Ok(_) => (StatusCode::BAD_REQUEST, "unexpected body").into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "body is not json").into_response(),
    }
}
