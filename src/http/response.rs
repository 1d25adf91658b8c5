// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types
//!
//! A [`ClientResponse`] owns the underlying connection until it is consumed:
//! reading the body, calling [`ClientResponse::close`] or dropping it all
//! release the connection, and ownership guarantees it happens once.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

use super::cookie::Cookie;
use super::headers;
use super::request::OutboundRequest;
use crate::error::{Error, Result};

/// Body of a transport response
#[derive(Debug)]
pub enum ResponseBody {
    /// Fully buffered body (custom transports, mocks)
    Buffered(Bytes),
    /// Unread body still attached to a live connection
    Streaming(reqwest::Response),
}

/// Response exactly as the transport produced it
#[derive(Debug)]
pub struct RawResponse {
    /// Response status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Final URL (after redirects)
    pub url: Url,
    /// Response body
    pub body: ResponseBody,
}

impl RawResponse {
    /// Create a response with a buffered body
    pub fn new(status: StatusCode, headers: HeaderMap, url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            url,
            body: ResponseBody::Buffered(body.into()),
        }
    }

    /// Wrap a reqwest response without reading its body
    pub fn from_reqwest(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
            body: ResponseBody::Streaming(response),
        }
    }

    /// Cookies set by this response
    pub fn cookies(&self) -> Vec<Cookie> {
        self.headers
            .get_all(headers::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| Cookie::parse(v, &self.url))
            .collect()
    }

    /// Read the whole body
    pub async fn bytes(self) -> Result<Bytes> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(response) => response.bytes().await.map_err(Error::from),
        }
    }

    /// Release the connection without reading the body
    pub fn release(self) {
        tracing::trace!(url = %self.url, status = %self.status, "Releasing response");
    }
}

/// Snapshot of the request that produced a response
#[derive(Debug, Clone)]
pub struct SentRequest {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Request headers as sent
    pub headers: HeaderMap,
    /// Request body as sent
    pub body: Bytes,
}

impl From<&OutboundRequest> for SentRequest {
    fn from(request: &OutboundRequest) -> Self {
        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        }
    }
}

/// Response returned to callers of the client
#[derive(Debug)]
pub struct ClientResponse {
    raw: RawResponse,
    request: SentRequest,
}

impl ClientResponse {
    /// Pair a transport response with the request that produced it
    pub fn new(raw: RawResponse, request: SentRequest) -> Self {
        Self { raw, request }
    }

    /// Response status
    pub fn status(&self) -> StatusCode {
        self.raw.status
    }

    /// Get status code as u16
    pub fn status_code(&self) -> u16 {
        self.raw.status.as_u16()
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        self.raw.status.is_success()
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.raw.headers
    }

    /// Mutable access for middleware that rewrites responses
    pub fn raw_mut(&mut self) -> &mut RawResponse {
        &mut self.raw
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header(headers::CONTENT_TYPE)
    }

    /// Final URL
    pub fn url(&self) -> &Url {
        &self.raw.url
    }

    /// Cookies set by the response
    pub fn cookies(&self) -> Vec<Cookie> {
        self.raw.cookies()
    }

    /// The request that produced this response
    pub fn request(&self) -> &SentRequest {
        &self.request
    }

    /// Body bytes that were sent with the request
    pub fn request_body(&self) -> &Bytes {
        &self.request.body
    }

    /// Render the sent request for debugging
    pub fn raw_request(&self) -> String {
        let mut out = format!(
            "{} {} HTTP/1.1\r\n",
            self.request.method,
            request_target(&self.request.url)
        );
        if let Some(host) = self.request.url.host_str() {
            if !self.request.headers.contains_key(headers::HOST) {
                out.push_str(&format!("Host: {}\r\n", host));
            }
        }
        for (name, value) in self.request.headers.iter() {
            out.push_str(&format!(
                "{}: {}\r\n",
                name,
                String::from_utf8_lossy(value.as_bytes())
            ));
        }
        out.push_str("\r\n");
        out.push_str(&String::from_utf8_lossy(&self.request.body));
        out
    }

    /// Read the whole body, releasing the connection
    pub async fn bytes(self) -> Result<Bytes> {
        self.raw.bytes().await
    }

    /// Read the body as text
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Other(e.to_string()))
    }

    /// Release the underlying connection without reading the body
    pub fn close(self) {
        self.raw.release();
    }
}

fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
