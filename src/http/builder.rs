// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request assembly: URL, body, content type and client defaults

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use url::Url;

use super::client::Client;
use super::content_types;
use super::headers;
use super::multipart::encode_multipart;
use super::params::{self, Payload};
use super::request::{OutboundRequest, RequestContext};
use crate::error::Result;

lazy_static! {
    static ref FORM_BODY: Regex = Regex::new(r"^[\w\[\]]+=.+").unwrap();
}

impl Client {
    /// Assemble the request for `method` and `url` without sending it
    ///
    /// GET parameters become the query string. Other methods carry them as
    /// the body, switching to multipart when a form value is `@file:<path>`.
    pub async fn prepare_request(
        &self,
        method: Method,
        url: &str,
        payload: Payload,
    ) -> Result<OutboundRequest> {
        let settings = self.settings();
        let client_headers = self.headers();
        let configured_type = client_headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let url = join_url(&settings.prefix, url);
        let encoded = params::encode(&payload, configured_type.as_deref())?;

        let mut multipart = false;
        let mut request = if method == Method::GET {
            // Upload markers are not interpreted on GET
            let url = merge_query(&url, &encoded.to_query());
            OutboundRequest::new(method, Url::parse(&url)?)
        } else if let Some(fields) = encoded.upload_fields() {
            let (body, content_type) = encode_multipart(&fields).await?;
            let mut request = OutboundRequest::new(method, Url::parse(&url)?).with_body(body);
            request.set_header(headers::CONTENT_TYPE, &content_type)?;
            multipart = true;
            request
        } else {
            let body = encoded.to_bytes();
            let mut request = OutboundRequest::new(method, Url::parse(&url)?);
            let content_type = configured_type.or_else(|| sniff_content_type(&body).map(str::to_string));
            if let Some(ref content_type) = content_type {
                request.set_header(headers::CONTENT_TYPE, content_type)?;
            }
            request.with_body(body)
        };

        // Context
        request.context = settings
            .context
            .clone()
            .unwrap_or_else(RequestContext::background);

        // Custom headers; a multipart body keeps its own boundary type
        for (name, value) in client_headers.iter() {
            if multipart && *name == CONTENT_TYPE {
                continue;
            }
            request.headers.insert(name.clone(), value.clone());
        }

        // Host header overrides the wire host
        if request.host.is_none() {
            let host = request.header(headers::HOST).map(str::to_string);
            request.host = host.filter(|h| !h.is_empty());
        }

        // Cookies
        if let Some(cookie) = self.cookies().header_value() {
            request.set_header(headers::COOKIE, &cookie)?;
        }

        // Basic auth
        if let Some((ref user, ref pass)) = settings.basic_auth {
            if !user.is_empty() {
                request.set_basic_auth(user, pass)?;
            }
        }

        // User agent
        if let Some(ref agent) = settings.user_agent {
            request.set_header(headers::USER_AGENT, agent)?;
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            body_len = request.body.len(),
            content_type = ?request.content_type(),
            "Prepared request"
        );
        Ok(request)
    }
}

/// Prefix the trimmed path
fn join_url(prefix: &str, path: &str) -> String {
    format!("{}{}", prefix, path.trim())
}

/// Append `query` to `url`, merging with an existing query string
pub fn merge_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

/// Guess the content type of a raw body: JSON, form, or nothing
pub fn sniff_content_type(body: &[u8]) -> Option<&'static str> {
    let first = *body.first()?;
    if (first == b'[' || first == b'{')
        && serde_json::from_slice::<serde::de::IgnoredAny>(body).is_ok()
    {
        return Some(content_types::JSON);
    }
    if FORM_BODY.is_match(&String::from_utf8_lossy(body)) {
        return Some(content_types::FORM);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use crate::error::Error;
    use crate::http::{ClientConfig, RawResponse};
    use crate::network::{SendFailure, Transport};

    struct Echo;

    #[async_trait]
    impl Transport for Echo {
        async fn send(&self, request: &OutboundRequest) -> std::result::Result<RawResponse, SendFailure> {
            Ok(RawResponse::new(StatusCode::OK, HeaderMap::new(), request.url.clone(), ""))
        }
    }

    fn client() -> Client {
        let config = ClientConfig {
            user_agent: String::new(),
            ..ClientConfig::default()
        };
        Client::with_transport(config, Arc::new(Echo))
    }

    #[test]
    fn test_sniff_content_type() {
        assert_eq!(sniff_content_type(br#"{"a":1}"#), Some("application/json"));
        assert_eq!(sniff_content_type(b"[1,2]"), Some("application/json"));
        assert_eq!(sniff_content_type(b"a=1"), Some("application/x-www-form-urlencoded"));
        assert_eq!(sniff_content_type(b"arr[]=1&b=2"), Some("application/x-www-form-urlencoded"));
        assert_eq!(sniff_content_type(b"hello world"), None);
        assert_eq!(sniff_content_type(b"{not json"), None);
        assert_eq!(sniff_content_type(b"a="), None);
        assert_eq!(sniff_content_type(b""), None);
    }

    #[test]
    fn test_merge_query() {
        assert_eq!(merge_query("http://h/p", "a=1"), "http://h/p?a=1");
        assert_eq!(merge_query("http://h/p?x=0", "a=1"), "http://h/p?x=0&a=1");
        assert_eq!(merge_query("http://h/p", ""), "http://h/p");
    }

    #[tokio::test]
    async fn test_get_moves_params_to_query() {
        let client = client();
        let req = client
            .prepare_request(Method::GET, "https://example.com/s?x=0", json!({"q": "rust lang"}).into())
            .await
            .unwrap();
        assert_eq!(req.url.as_str(), "https://example.com/s?x=0&q=rust%20lang");
        assert!(req.body.is_empty());
        assert!(req.content_type().is_none());
    }

    #[tokio::test]
    async fn test_get_ignores_upload_markers() {
        let client = client();
        let req = client
            .prepare_request(Method::GET, "https://example.com/", "f=@file:/nope".into())
            .await
            .unwrap();
        assert_eq!(req.url.query(), Some("f=@file:/nope"));
    }

    #[tokio::test]
    async fn test_prefix_and_trim() {
        let client = client().prefix("https://api.example.com/v1");
        let req = client
            .prepare_request(Method::GET, "  /users  ", Payload::Empty)
            .await
            .unwrap();
        assert_eq!(req.url.as_str(), "https://api.example.com/v1/users");
    }

    #[tokio::test]
    async fn test_content_type_detection_on_post() {
        let client = client();
        let url = "https://example.com/";

        let req = client.prepare_request(Method::POST, url, r#"{"a":1}"#.into()).await.unwrap();
        assert_eq!(req.content_type(), Some("application/json"));
        assert_eq!(req.body.as_ref(), br#"{"a":1}"#);

        let req = client.prepare_request(Method::POST, url, "a=1".into()).await.unwrap();
        assert_eq!(req.content_type(), Some("application/x-www-form-urlencoded"));

        let req = client.prepare_request(Method::POST, url, "hello world".into()).await.unwrap();
        assert!(req.content_type().is_none());
    }

    #[tokio::test]
    async fn test_explicit_content_type_wins() {
        let client = client();
        client.set_content_type("text/plain").unwrap();
        let req = client
            .prepare_request(Method::POST, "https://example.com/", r#"{"a":1}"#.into())
            .await
            .unwrap();
        assert_eq!(req.content_type(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_json_mode_marshals_and_passes_through() {
        let client = client().content_json();
        let url = "https://example.com/";

        let req = client
            .prepare_request(Method::PUT, url, json!({"name": "x"}).into())
            .await
            .unwrap();
        assert_eq!(req.body.as_ref(), br#"{"name":"x"}"#);
        assert_eq!(req.content_type(), Some("application/json"));

        let raw = "{ \"keep\" :  \"spacing\" }";
        let req = client.prepare_request(Method::PUT, url, raw.into()).await.unwrap();
        assert_eq!(req.body.as_ref(), raw.as_bytes());
    }

    #[tokio::test]
    async fn test_xml_mode() {
        let client = client().content_xml();
        let req = client
            .prepare_request(Method::POST, "https://example.com/", json!({"a": {"b": 1}}).into())
            .await
            .unwrap();
        assert_eq!(req.body.as_ref(), b"<a><b>1</b></a>");
        assert_eq!(req.content_type(), Some("application/xml"));
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let client = client();
        client.set_header("X-Api", "1").unwrap();
        client.set_header("Host", "internal.example").unwrap();
        client.set_cookie("b", "2");
        client.set_cookie("a", "1");
        client.set_basic_auth("user", "pass");
        client.set_user_agent("agent/1.0");

        let req = client
            .prepare_request(Method::DELETE, "https://example.com/x", Payload::Empty)
            .await
            .unwrap();
        assert_eq!(req.header("x-api"), Some("1"));
        assert_eq!(req.host.as_deref(), Some("internal.example"));
        assert_eq!(req.header("cookie"), Some("a=1;b=2"));
        assert_eq!(req.header("authorization"), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(req.header("user-agent"), Some("agent/1.0"));
    }

    #[tokio::test]
    async fn test_client_context_is_used() {
        let client = client();
        let ctx = RequestContext::background();
        client.set_context(ctx.clone());
        let req = client
            .prepare_request(Method::GET, "https://example.com/", Payload::Empty)
            .await
            .unwrap();
        ctx.cancel();
        assert!(req.context.is_cancelled());
    }

    #[tokio::test]
    async fn test_multipart_upload_request() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file-bytes").unwrap();
        let client = client();
        client.set_content_type("application/x-www-form-urlencoded").unwrap();

        let payload = json!({
            "name": "report",
            "upload": format!("@file:{}", file.path().display()),
        });
        let req = client
            .prepare_request(Method::POST, "https://example.com/up", payload.into())
            .await
            .unwrap();

        let content_type = req.content_type().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8_lossy(&req.body);
        assert!(body.contains("name=\"name\"\r\n\r\nreport\r\n"));
        assert!(body.contains("\r\n\r\nfile-bytes\r\n"));
    }

    #[tokio::test]
    async fn test_missing_upload_is_construction_error() {
        let client = client();
        let err = assert_err!(
            client
                .post("https://example.com/up", "a=1&f=@file:/no/such/file.txt")
                .await
        );
        assert!(matches!(err, Error::FileNotFound { .. }));
        assert!(err.is_construction());
    }

    #[tokio::test]
    async fn test_empty_payload_post() {
        let client = client();
        let req = assert_ok!(
            client
                .prepare_request(Method::POST, "https://example.com/", Payload::Empty)
                .await
        );
        assert!(req.body.is_empty());
        assert!(req.content_type().is_none());
    }
}
