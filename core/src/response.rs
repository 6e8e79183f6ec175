//! Request execution, status check and JSON decoding.
//!
//! # Design
//! Only status 200 counts as success; 201, 204 and the other 2xx codes fail
//! like any other status. Whether a failing body ends up in the error is
//! chosen per helper through [`ErrorBody`].

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// What to do with the body of a non-200 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBody {
    /// Drop it; the error carries only the status.
    Discard,
    /// Keep it as text in `Error::UnexpectedStatus::body`.
    Capture,
}

/// Send `request` through `client` and decode a 200 response body as `T`.
///
/// A context that is already done fails before the client is called.
pub fn execute_json<T, C>(
    ctx: &Context,
    client: &C,
    request: HttpRequest,
    error_body: ErrorBody,
) -> Result<T, Error>
where
    T: DeserializeOwned,
    C: Transport + ?Sized,
{
    if let Some(err) = ctx.err() {
        return Err(err.into());
    }

    let method = request.method;
    let url = request.url.clone();
    debug!(%method, %url, "sending request");

    let response = client.execute(ctx, request).map_err(|err| {
        warn!(%method, %url, error = %err, "request failed");
        Error::Transport(err)
    })?;

    check_status(&response, error_body).inspect_err(|_| {
        warn!(%method, %url, status = response.status, "unexpected status");
    })?;
    decode(&response)
}

/// Map anything but 200 to `UnexpectedStatus`.
pub fn check_status(response: &HttpResponse, error_body: ErrorBody) -> Result<(), Error> {
    if response.status == 200 {
        return Ok(());
    }
    Err(Error::UnexpectedStatus {
        status: response.status,
        body: match error_body {
            ErrorBody::Capture => Some(response.body_text()),
            ErrorBody::Discard => None,
        },
    })
}

pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, Error> {
    let value = serde_json::from_slice(&response.body).map_err(Error::Decode)?;
    debug!(bytes = response.body.len(), "decoded response");
    Ok(value)
}
