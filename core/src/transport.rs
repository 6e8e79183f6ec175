//! The seam between request building and the network.
//!
//! # Design
//! Helpers never talk to a socket directly. They hand an [`HttpRequest`] to a
//! [`Transport`] and get an [`HttpResponse`] back, so tests can swap in a
//! counting or canned transport and callers can bring their own client.
//!
//! [`HttpClient`] is the default transport, backed by a ureq agent. It never
//! turns status codes into errors; status interpretation belongs to the
//! executor. Contexts that can be cancelled run the round trip on a worker
//! thread so the caller can walk away as soon as the flag trips. The
//! abandoned worker drops its response when the server eventually answers.

use std::fmt;
use std::io::Read;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::debug;
use ureq::typestate::WithBody;
use ureq::RequestBuilder;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// How often a waiting caller re-checks its cancellation flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Timeout for cancellable calls that have neither a deadline nor a
/// configured timeout. It bounds how long an abandoned worker thread and its
/// socket can outlive a cancelled call.
pub const CANCELLABLE_FALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Executes one request. Implementations must not retry.
pub trait Transport {
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(ctx, request)
    }
}

/// Default transport: a ureq agent plus [`ClientConfig`].
///
/// Cloning is cheap and clones share the agent's connection pool.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent, config }
    }

    /// Wrap a caller-configured agent. Its status-as-error setting is
    /// overridden per request.
    pub fn from_agent(agent: ureq::Agent, config: ClientConfig) -> Self {
        Self { agent, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Tighter of the configured timeout and what is left of the deadline.
    /// Cancellable calls with neither fall back to
    /// [`CANCELLABLE_FALLBACK_TIMEOUT`].
    fn timeout_for(&self, ctx: &Context) -> Option<Duration> {
        match (self.config.timeout(), ctx.remaining()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (None, None) if ctx.is_cancellable() => Some(CANCELLABLE_FALLBACK_TIMEOUT),
            (a, b) => a.or(b),
        }
    }

    fn send(
        &self,
        request: HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, ureq::Error> {
        let HttpRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        if let Some(user_agent) = &self.config.user_agent {
            if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("user-agent")) {
                headers.push(("user-agent".to_string(), user_agent.clone()));
            }
        }

        let url = url.as_str();
        let mut response = match method {
            HttpMethod::Get => prepare(self.agent.get(url), &headers, timeout).call(),
            HttpMethod::Delete => prepare(self.agent.delete(url), &headers, timeout).call(),
            HttpMethod::Post => send_body(prepare(self.agent.post(url), &headers, timeout), body),
            HttpMethod::Put => send_body(prepare(self.agent.put(url), &headers, timeout), body),
            HttpMethod::Patch => send_body(prepare(self.agent.patch(url), &headers, timeout), body),
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let limit = self.config.max_body_bytes;
        let body = if status == 200 {
            response.body_mut().with_config().limit(limit).read_to_vec()?
        } else {
            // Error bodies are only diagnostics: keep the first `limit` bytes.
            let mut snippet = Vec::new();
            response
                .body_mut()
                .as_reader()
                .take(limit)
                .read_to_end(&mut snippet)
                .map_err(ureq::Error::Io)?;
            snippet
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn execute_cancellable(
        &self,
        ctx: &Context,
        request: HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let client = self.clone();
        thread::Builder::new()
            .name("jsonhttp-request".to_string())
            .spawn(move || {
                // The receiver is gone if the caller cancelled; the response is dropped here.
                let _ = tx.send(client.send(request, timeout));
            })
            .map_err(|e| TransportError::Other(Box::new(e)))?;

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => return result.map_err(|e| classify(ctx, e)),
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(err) = ctx.err() {
                        debug!(reason = %err, "abandoning in-flight request");
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::WorkerLost),
            }
        }
    }
}

impl Transport for HttpClient {
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        let timeout = self.timeout_for(ctx);
        if ctx.is_cancellable() {
            self.execute_cancellable(ctx, request, timeout)
        } else {
            self.send(request, timeout).map_err(|e| classify(ctx, e))
        }
    }
}

fn prepare<B>(
    mut builder: RequestBuilder<B>,
    headers: &[(String, String)],
    timeout: Option<Duration>,
) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let mut config = builder.config().http_status_as_error(false);
    if let Some(timeout) = timeout {
        config = config.timeout_global(Some(timeout));
    }
    config.build()
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    body: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(&bytes[..]),
        None => builder.send_empty(),
    }
}

/// A failure that happens once the context is done is reported as the
/// context's error; the per-request timeout derived from the deadline is the
/// usual cause.
fn classify(ctx: &Context, err: ureq::Error) -> TransportError {
    match ctx.err() {
        Some(done) => {
            debug!(error = %err, "request failed after context finished");
            done
        }
        None => TransportError::Request(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn timeout_prefers_sooner_deadline() {
        let config = ClientConfig::default().with_timeout(Duration::from_secs(30));
        let client = HttpClient::with_config(config);
        let ctx = Context::background().with_timeout(Duration::from_millis(200));
        assert!(client.timeout_for(&ctx).unwrap() <= Duration::from_millis(200));

        let ctx = Context::background();
        assert_eq!(client.timeout_for(&ctx), Some(Duration::from_secs(30)));
    }

    #[test]
    fn no_timeout_without_config_or_deadline() {
        assert_eq!(HttpClient::new().timeout_for(&Context::background()), None);
    }

    #[test]
    fn cancellable_call_without_deadline_gets_fallback_timeout() {
        let (ctx, _handle) = Context::background().with_cancel();
        assert_eq!(
            HttpClient::new().timeout_for(&ctx),
            Some(CANCELLABLE_FALLBACK_TIMEOUT)
        );

        let ctx = ctx.with_timeout(Duration::from_secs(1));
        assert!(HttpClient::new().timeout_for(&ctx).unwrap() <= Duration::from_secs(1));

        let config = ClientConfig::default().with_timeout(Duration::from_secs(2));
        let (ctx, _handle) = Context::background().with_cancel();
        assert_eq!(
            HttpClient::with_config(config).timeout_for(&ctx),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn done_context_short_circuits() {
        let (ctx, handle) = Context::background().with_cancel();
        handle.cancel();
        let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/never");
        let err = HttpClient::new().execute(&ctx, request).unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));

        let ctx = Context::background().with_deadline(Instant::now());
        let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/never");
        let err = HttpClient::new().execute(&ctx, request).unwrap_err();
        assert!(matches!(err, TransportError::DeadlineExceeded));
    }

    #[test]
    fn debug_hides_agent() {
        let rendered = format!("{:?}", HttpClient::new());
        assert!(rendered.starts_with("HttpClient"));
        assert!(rendered.contains("max_body_bytes"));
    }
}
