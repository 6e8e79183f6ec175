//! Small helpers for JSON-over-HTTP calls.
//!
//! # Overview
//! Each helper performs exactly one round trip: build a request, execute it
//! through a [`Transport`], require status 200, decode the JSON body into the
//! caller's type.
//!
//! | Helper | Method | Body | Extra headers |
//! |---|---|---|---|
//! | [`post_form`] | POST | form-urlencoded | none |
//! | [`get_with_headers`] | GET | none | caller's |
//! | [`post_form_with_headers`] | POST | form-urlencoded | caller's |
//! | [`post_json_with_auth`] | POST | JSON | bearer token |
//! | [`http_get`] | GET | none | none, fresh client per call |
//!
//! # Design
//! - Request building ([`new_request`]) is pure and reports endpoint and
//!   header problems before any I/O.
//! - [`Transport`] is the only place that touches the network. [`HttpClient`]
//!   is the ureq-backed default; tests substitute their own.
//! - [`Context`] carries a deadline and a cancellation flag into every call.
//! - Failures are [`Error`] values naming the phase that failed; nothing is
//!   retried.
//!
//! ```no_run
//! use jsonhttp::{post_json_with_auth, Context, HttpClient};
//! use std::time::Duration;
//!
//! #[derive(serde::Deserialize)]
//! struct Created {
//!     id: u64,
//! }
//!
//! let client = HttpClient::new();
//! let ctx = Context::background().with_timeout(Duration::from_secs(5));
//! let created: Created = post_json_with_auth(
//!     &ctx,
//!     &client,
//!     "https://api.example.com/v1/items",
//!     &serde_json::json!({"name": "widget"}),
//!     "tok123",
//! )?;
//! println!("created {}", created.id);
//! # Ok::<(), jsonhttp::Error>(())
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod form;
pub mod http;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{
    get_with_headers, http_get, post_form, post_form_with_headers, post_json_with_auth,
};
pub use config::ClientConfig;
pub use context::{CancelHandle, Context};
pub use error::{EndpointError, Error, TransportError};
pub use form::Values;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::new_request;
pub use response::{execute_json, ErrorBody};
pub use transport::{HttpClient, Transport};
