//! Request construction.
//!
//! Pure: nothing here touches the network, so every failure it reports is
//! known before a connection is attempted.

use url::Url;

use crate::error::{EndpointError, Error};
use crate::form::Values;
use crate::http::{HttpMethod, HttpRequest};

pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Build a request from an endpoint and optional query, form body and bearer
/// token.
///
/// Query values are appended to any query the endpoint already has. A form
/// body sets `content-type: application/x-www-form-urlencoded`; a token sets
/// `authorization: Bearer <token>`.
pub fn new_request(
    method: HttpMethod,
    endpoint: &str,
    query: Option<&Values>,
    form: Option<&Values>,
    token: Option<&str>,
) -> Result<HttpRequest, Error> {
    let mut url = parse_endpoint(endpoint)?;

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.query_pairs_mut().extend_pairs(query.pairs());
    }

    let mut request = HttpRequest::new(method, url);

    if let Some(form) = form {
        request.body = Some(form.encode().into_bytes());
        request.set_header("content-type", CONTENT_TYPE_FORM)?;
    }

    if let Some(token) = token {
        set_bearer(&mut request, token)?;
    }

    Ok(request)
}

/// Parse an absolute http(s) URL.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, Error> {
    let invalid = |source: EndpointError| Error::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        source,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(e.into()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(EndpointError::UnsupportedScheme(other.to_string()))),
    }
}

pub(crate) fn set_bearer(request: &mut HttpRequest, token: &str) -> Result<(), Error> {
    request.set_header("authorization", &format!("Bearer {token}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_get_has_no_body_or_headers() {
        let endpoint = "https://api.example.com/status";
        let req = new_request(HttpMethod::Get, endpoint, None, None, None).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.example.com/status");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn form_sets_body_and_content_type() {
        let form = Values::from([("grant_type", "client_credentials"), ("scope", "read write")]);
        let endpoint = "https://auth.example.com/token";
        let req = new_request(HttpMethod::Post, endpoint, None, Some(&form), None).unwrap();
        assert_eq!(
            req.body.as_deref(),
            Some(&b"grant_type=client_credentials&scope=read+write"[..])
        );
        assert_eq!(req.header("Content-Type"), Some(CONTENT_TYPE_FORM));
    }

    #[test]
    fn query_is_appended_to_existing_query() {
        let query = Values::from([("b", "2"), ("a", "x y")]);
        let endpoint = "http://localhost/search?keep=1";
        let req = new_request(HttpMethod::Get, endpoint, Some(&query), None, None).unwrap();
        assert_eq!(req.url, "http://localhost/search?keep=1&a=x+y&b=2");
    }

    #[test]
    fn empty_query_leaves_url_alone() {
        let empty = Values::new();
        let endpoint = "http://localhost/path";
        let req = new_request(HttpMethod::Get, endpoint, Some(&empty), None, None).unwrap();
        assert_eq!(req.url, "http://localhost/path");
    }

    #[test]
    fn token_sets_bearer_header() {
        let req =
            new_request(HttpMethod::Get, "http://localhost/", None, None, Some("tok123")).unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer tok123"));
    }

    #[test]
    fn unparseable_endpoint_is_invalid() {
        let err = new_request(HttpMethod::Post, "http://[::1", None, None, None).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidEndpoint {
                source: EndpointError::Parse(_),
                ..
            }
        ));
    }

    #[test]
    fn relative_endpoint_is_invalid() {
        let err = parse_endpoint("/v1/x").unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }

    #[test]
    fn non_http_scheme_is_invalid() {
        let err = parse_endpoint("ftp://files.example.com/").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidEndpoint {
                source: EndpointError::UnsupportedScheme(ref s),
                ..
            } if s == "ftp"
        ));
    }

    #[test]
    fn token_with_newline_fails_construction() {
        let token = Some("a\nb");
        let err = new_request(HttpMethod::Get, "http://localhost/", None, None, token).unwrap_err();
        assert!(matches!(err, Error::RequestConstruction { .. }));
    }
}
