//! HTTP request and response values passed between the builder, the transport
//! and the decoder.
//!
//! # Design
//! These types describe a single round trip as plain data. The builder
//! produces an `HttpRequest`, a `Transport` turns it into an `HttpResponse`,
//! and the executor interprets the status and body. Keeping them as owned
//! data lets tests build and inspect requests without a network.
//!
//! Header names are stored lower-cased. `set_header` replaces every existing
//! header with the same name, so applying a header map is order-independent.

use std::fmt;
use std::str::FromStr;

use ureq::http::{HeaderName, HeaderValue};

use crate::error::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    /// Parse a method name. Matching is case-sensitive, like the method token
    /// on the wire.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(Error::construction(format!("unsupported method {other:?}"))),
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by [`new_request`](crate::new_request) and consumed by a
/// [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a header, replacing any header with the same name.
    ///
    /// Fails with `RequestConstruction` when the name or value is not valid
    /// HTTP.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            Error::RequestConstruction {
                message: format!("header name {name:?}"),
                source: Some(e.into()),
            }
        })?;
        HeaderValue::from_str(value).map_err(|e| Error::RequestConstruction {
            message: format!("header {:?} value", name.as_str()),
            source: Some(e.into()),
        })?;

        self.headers.retain(|(existing, _)| existing != name.as_str());
        self.headers.push((name.as_str().to_string(), value.to_string()));
        Ok(())
    }

    /// Look up a header value by name (ASCII case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// The body has already been read in full; dropping the value releases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
