// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Outbound request representation and its cancellation context

use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::headers;
use crate::error::{Error, Result};

/// Cancellation and deadline scope carried by a request
///
/// Cloning shares the cancellation signal. `child` derives a scope that is
/// cancelled with its parent but can also be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context with an absolute deadline
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child scope, optionally tightening the deadline
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout) {
            (Some(d), Some(t)) => Some(d.min(Instant::now() + t)),
            (None, Some(t)) => Some(Instant::now() + t),
            (d, None) => d,
        };
        Self {
            cancel: self.cancel.child_token(),
            deadline,
        }
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether `cancel` was called on this context or a parent
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Absolute deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error describing why this context is done, or `None` if it is live
    pub fn error(&self) -> Option<Error> {
        if self.cancel.is_cancelled() {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is cancelled or its deadline passes
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => Error::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => Error::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                Error::Cancelled
            }
        }
    }
}

/// A fully assembled request, ready for the middleware chain and transport
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body, buffered once and shared by every attempt
    pub body: Bytes,
    /// Wire `Host` override, independent of the URL authority
    pub host: Option<String>,
    /// Cancellation scope
    pub context: RequestContext,
}

impl OutboundRequest {
    /// Create an empty request with a background context
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            host: None,
            context: RequestContext::background(),
        }
    }

    /// Replace the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the context
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Set a header, overwriting any previous value for the same name
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name =
            HeaderName::try_from(name).map_err(|e| Error::invalid_header(name, e))?;
        let header_value =
            HeaderValue::try_from(value).map_err(|e| Error::invalid_header(name, e))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Get a header value as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the content type
    pub fn content_type(&self) -> Option<&str> {
        self.header(headers::CONTENT_TYPE)
    }

    /// Set HTTP basic authentication credentials
    pub fn set_basic_auth(&mut self, username: &str, password: &str) -> Result<()> {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        self.set_header(headers::AUTHORIZATION, &format!("Basic {}", encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OutboundRequest {
        OutboundRequest::new(Method::POST, Url::parse("https://example.com/path").unwrap())
    }

    #[test]
    fn test_request_headers_overwrite() {
        let mut req = request();
        req.set_header("X-Custom", "one").unwrap();
        req.set_header("x-custom", "two").unwrap();
        assert_eq!(req.header("x-custom"), Some("two"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut req = request();
        let err = req.set_header("bad header", "v").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_basic_auth() {
        let mut req = request();
        req.set_basic_auth("user", "pass").unwrap();
        assert_eq!(req.header("authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn test_background_context_is_live() {
        let ctx = RequestContext::background();
        assert!(ctx.error().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_child_context_cancelled_with_parent() {
        let parent = RequestContext::background();
        let child = parent.child(None);
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(matches!(child.error(), Some(Error::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_deadline_resolves_done() {
        let ctx = RequestContext::with_timeout(Duration::from_secs(5));
        let err = ctx.done().await;
        assert!(matches!(err, Error::DeadlineExceeded));
        assert!(matches!(ctx.error(), Some(Error::DeadlineExceeded)));
    }
}
