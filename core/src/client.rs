//! Public request helpers.
//!
//! # Design
//! Every helper is one straight line: build the request, execute it through
//! the given [`Transport`], require status 200, decode the body as `T`. None
//! of them retries or keeps state between calls.
//!
//! Caller headers are applied after the helper's own, so a caller can
//! override `content-type` or `authorization`. Since each header replaces any
//! header of the same name, the iteration order of the map does not matter.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::Context;
use crate::error::Error;
use crate::form::Values;
use crate::http::{HttpMethod, HttpRequest};
use crate::request::{new_request, set_bearer, CONTENT_TYPE_JSON};
use crate::response::{execute_json, ErrorBody};
use crate::transport::{HttpClient, Transport};

/// POST `form` to `endpoint` as `application/x-www-form-urlencoded`.
///
/// The body of a non-200 response is not kept in the error.
pub fn post_form<T, C>(ctx: &Context, client: &C, endpoint: &str, form: &Values) -> Result<T, Error>
where
    T: DeserializeOwned,
    C: Transport + ?Sized,
{
    let request = new_request(HttpMethod::Post, endpoint, None, Some(form), None)?;
    execute_json(ctx, client, request, ErrorBody::Discard)
}

/// GET `url` with the given headers.
pub fn get_with_headers<T, C, H, K, V>(
    ctx: &Context,
    client: &C,
    url: &str,
    headers: H,
) -> Result<T, Error>
where
    T: DeserializeOwned,
    C: Transport + ?Sized,
    H: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut request = new_request(HttpMethod::Get, url, None, None, None)?;
    apply_headers(&mut request, headers)?;
    execute_json(ctx, client, request, ErrorBody::Capture)
}

/// POST `form` to `url`, then apply `headers` over the form content type.
pub fn post_form_with_headers<T, C, H, K, V>(
    ctx: &Context,
    client: &C,
    url: &str,
    form: &Values,
    headers: H,
) -> Result<T, Error>
where
    T: DeserializeOwned,
    C: Transport + ?Sized,
    H: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut request = new_request(HttpMethod::Post, url, None, Some(form), None)?;
    apply_headers(&mut request, headers)?;
    execute_json(ctx, client, request, ErrorBody::Capture)
}

/// POST `body` serialized as JSON with `authorization: Bearer <token>`.
///
/// Serialization happens first, so an unserializable body fails with
/// `Error::Encode` before the endpoint is even parsed. The authorization
/// header is sent even when `token` is empty.
pub fn post_json_with_auth<T, B, C>(
    ctx: &Context,
    client: &C,
    endpoint: &str,
    body: &B,
    token: &str,
) -> Result<T, Error>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
    C: Transport + ?Sized,
{
    let json = serde_json::to_vec(body).map_err(Error::Encode)?;

    let mut request = new_request(HttpMethod::Post, endpoint, None, None, None)?;
    request.body = Some(json);
    request.set_header("content-type", CONTENT_TYPE_JSON)?;
    set_bearer(&mut request, token)?;

    execute_json(ctx, client, request, ErrorBody::Capture)
}

/// GET `url` with a fresh, default [`HttpClient`].
///
/// The client is built per call and dropped afterwards, so consecutive calls
/// share no connections. Use [`get_with_headers`] with a long-lived client
/// when that matters.
pub fn http_get<T: DeserializeOwned>(ctx: &Context, url: &str) -> Result<T, Error> {
    let request = new_request(HttpMethod::Get, url, None, None, None)?;
    let client = HttpClient::new();
    execute_json(ctx, &client, request, ErrorBody::Capture)
}

fn apply_headers<H, K, V>(request: &mut HttpRequest, headers: H) -> Result<(), Error>
where
    H: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (name, value) in headers {
        request.set_header(name.as_ref(), value.as_ref())?;
    }
    Ok(())
}
