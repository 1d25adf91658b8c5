// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Client middleware chain
//!
//! Middleware wraps the network call in a chain of responsibility. Each
//! handler receives the request and a [`Next`] cursor; calling
//! [`Next::run`] invokes the following handler and yields its result. The
//! chain always ends with [`NetworkCall`], which performs the send with retry.
//!
//! `Next::run` may be called more than once from the same handler (to replay
//! a request, for example). The chain does not guard against that, so each
//! extra call is another full trip through the remaining handlers.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use courier::network::{Middleware, Next};
//! use courier::{Client, ClientResponse, OutboundRequest, Result};
//!
//! struct TraceId;
//!
//! #[async_trait]
//! impl Middleware for TraceId {
//!     async fn handle(
//!         &self,
//!         _client: &Client,
//!         mut request: OutboundRequest,
//!         next: Next<'_>,
//!     ) -> Result<ClientResponse> {
//!         request.set_header("x-trace-id", "abc123")?;
//!         next.run(request).await
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::http::{Client, ClientResponse, OutboundRequest};

/// A unit in the client middleware chain
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handle a request, usually by delegating to `next.run`
    async fn handle(
        &self,
        client: &Client,
        request: OutboundRequest,
        next: Next<'_>,
    ) -> Result<ClientResponse>;
}

/// Cursor into the chain: the handler list and the index of the next handler
#[derive(Clone, Copy)]
pub struct Next<'a> {
    client: &'a Client,
    handlers: &'a [Arc<dyn Middleware>],
    cursor: usize,
}

impl<'a> Next<'a> {
    /// Invoke the next handler in the chain
    pub fn run(&self, request: OutboundRequest) -> BoxFuture<'a, Result<ClientResponse>> {
        let Next {
            client,
            handlers,
            cursor,
        } = *self;
        Box::pin(async move {
            let handler = handlers.get(cursor).ok_or(Error::ChainExhausted)?;
            let next = Next {
                client,
                handlers,
                cursor: cursor + 1,
            };
            handler.handle(client, request, next).await
        })
    }

    /// Handlers left to run, including the terminal one
    pub fn remaining(&self) -> usize {
        self.handlers.len().saturating_sub(self.cursor)
    }
}

/// Terminal handler: send with retry
pub struct NetworkCall;

#[async_trait]
impl Middleware for NetworkCall {
    async fn handle(
        &self,
        client: &Client,
        request: OutboundRequest,
        _next: Next<'_>,
    ) -> Result<ClientResponse> {
        client.call_request(request).await
    }
}

/// Immutable handler list with the terminal handler appended
pub struct MiddlewareChain {
    handlers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Build a chain from configured middleware, appending [`NetworkCall`]
    pub fn new(middleware: Vec<Arc<dyn Middleware>>) -> Self {
        let mut handlers = Vec::with_capacity(middleware.len() + 1);
        handlers.extend(middleware);
        handlers.push(Arc::new(NetworkCall) as Arc<dyn Middleware>);
        Self { handlers }
    }

    /// Number of handlers, terminal included
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Always false: the terminal handler is always present
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the request through the chain, starting at the first handler
    pub async fn dispatch(&self, client: &Client, request: OutboundRequest) -> Result<ClientResponse> {
        Next {
            client,
            handlers: &self.handlers,
            cursor: 0,
        }
        .run(request)
        .await
    }
}

/// Header entry for request modification
#[derive(Debug, Clone)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Injects fixed headers into every request, optionally only for some hosts
#[derive(Debug, Clone, Default)]
pub struct HeaderInjector {
    headers: Vec<HeaderEntry>,
    /// Host substrings to inject into (empty = all)
    domains: Vec<String>,
}

impl HeaderInjector {
    /// Create an empty injector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bearer token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.headers.push(HeaderEntry::new(
            "authorization",
            format!("Bearer {}", token.into()),
        ));
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HeaderEntry::new(name, value));
        self
    }

    /// Restrict to specific domains
    pub fn for_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    fn applies_to(&self, request: &OutboundRequest) -> bool {
        if self.domains.is_empty() {
            return true;
        }
        request
            .url
            .host_str()
            .map(|host| self.domains.iter().any(|d| host.contains(d.as_str())))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Middleware for HeaderInjector {
    async fn handle(
        &self,
        _client: &Client,
        mut request: OutboundRequest,
        next: Next<'_>,
    ) -> Result<ClientResponse> {
        if self.applies_to(&request) {
            for header in &self.headers {
                request.set_header(&header.name, &header.value)?;
            }
        }
        next.run(request).await
    }
}

/// Logs every request and its outcome
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    /// Log request bodies
    pub log_bodies: bool,
    /// Only log URLs containing this substring
    pub url_filter: Option<String>,
}

#[async_trait]
impl Middleware for RequestLogger {
    async fn handle(
        &self,
        _client: &Client,
        request: OutboundRequest,
        next: Next<'_>,
    ) -> Result<ClientResponse> {
        let enabled = match self.url_filter {
            Some(ref filter) => request.url.as_str().contains(filter.as_str()),
            None => true,
        };
        if !enabled {
            return next.run(request).await;
        }

        let method = request.method.clone();
        let url = request.url.clone();
        tracing::info!(method = %method, url = %url, "Request");
        if self.log_bodies && !request.body.is_empty() {
            tracing::debug!(body = ?String::from_utf8_lossy(&request.body), "Request body");
        }

        let start = Instant::now();
        let result = next.run(request).await;
        let time_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => {
                tracing::info!(url = %url, status = %response.status(), time_ms, "Response")
            }
            Err(e) => tracing::error!(method = %method, url = %url, time_ms, error = %e, "Request failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;
    use url::Url;

    use crate::http::{ClientConfig, RawResponse};
    use crate::network::{SendFailure, Transport};

    #[derive(Default)]
    struct Counting {
        sends: AtomicU32,
        last: Mutex<Option<OutboundRequest>>,
    }

    #[async_trait]
    impl Transport for Counting {
        async fn send(&self, request: &OutboundRequest) -> std::result::Result<RawResponse, SendFailure> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = Some(request.clone());
            Ok(RawResponse::new(StatusCode::OK, HeaderMap::new(), request.url.clone(), ""))
        }
    }

    /// Appends its tag to a shared trace before and after the rest of the chain
    struct Tag(&'static str, Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Middleware for Tag {
        async fn handle(
            &self,
            _client: &Client,
            request: OutboundRequest,
            next: Next<'_>,
        ) -> Result<ClientResponse> {
            self.1.lock().push(format!("{}>", self.0));
            let result = next.run(request).await;
            self.1.lock().push(format!("<{}", self.0));
            result
        }
    }

    fn client() -> (Client, Arc<Counting>) {
        let transport = Arc::new(Counting::default());
        (Client::with_transport(ClientConfig::default(), transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_terminal_runs_once_per_call() {
        let (client, transport) = client();
        let trace = Arc::new(Mutex::new(Vec::new()));
        client.use_middleware(Tag("a", trace.clone()));
        client.use_middleware(Tag("b", trace.clone()));

        client.get("https://example.com/", ()).await.unwrap();

        assert_eq!(transport.sends.load(Ordering::SeqCst), 1);
        assert_eq!(*trace.lock(), vec!["a>", "b>", "<b", "<a"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_network() {
        struct Deny;

        #[async_trait]
        impl Middleware for Deny {
            async fn handle(
                &self,
                _client: &Client,
                _request: OutboundRequest,
                _next: Next<'_>,
            ) -> Result<ClientResponse> {
                Err(Error::other("denied"))
            }
        }

        let (client, transport) = client();
        client.use_middleware(Deny);

        let err = client.get("https://example.com/", ()).await.unwrap_err();
        assert_eq!(err.to_string(), "denied");
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_calling_next_twice_sends_twice() {
        struct Replay;

        #[async_trait]
        impl Middleware for Replay {
            async fn handle(
                &self,
                _client: &Client,
                request: OutboundRequest,
                next: Next<'_>,
            ) -> Result<ClientResponse> {
                next.run(request.clone()).await?.close();
                next.run(request).await
            }
        }

        let (client, transport) = client();
        client.use_middleware(Replay);

        client.get("https://example.com/", ()).await.unwrap();
        assert_eq!(transport.sends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_running_past_the_end_is_an_error() {
        let (client, _) = client();
        let handlers: Vec<Arc<dyn Middleware>> = Vec::new();
        let next = Next {
            client: &client,
            handlers: &handlers,
            cursor: 0,
        };
        assert_eq!(next.remaining(), 0);

        let request = OutboundRequest::new(
            reqwest::Method::GET,
            Url::parse("https://example.com/").unwrap(),
        );
        let err = next.run(request).await.unwrap_err();
        assert!(matches!(err, Error::ChainExhausted));
    }

    #[test]
    fn test_chain_appends_terminal() {
        let chain = MiddlewareChain::new(vec![Arc::new(RequestLogger::default()) as Arc<dyn Middleware>]);
        assert_eq!(chain.len(), 2);
        assert!(!chain.is_empty());
        assert_eq!(MiddlewareChain::new(Vec::new()).len(), 1);
    }

    #[tokio::test]
    async fn test_header_injector() {
        let (client, transport) = client();
        client.use_middleware(
            HeaderInjector::new()
                .bearer_token("t0k")
                .header("x-env", "test")
                .for_domains(vec!["api.example.com".to_string()]),
        );

        client.get("https://api.example.com/me", ()).await.unwrap();
        {
            let last = transport.last.lock();
            let sent = last.as_ref().unwrap();
            assert_eq!(sent.header("authorization"), Some("Bearer t0k"));
            assert_eq!(sent.header("x-env"), Some("test"));
        }

        client.get("https://other.example.org/", ()).await.unwrap();
        let last = transport.last.lock();
        assert!(last.as_ref().unwrap().header("authorization").is_none());
    }

    #[tokio::test]
    async fn test_middleware_sees_response() {
        struct Status(Arc<Mutex<Option<u16>>>);

        #[async_trait]
        impl Middleware for Status {
            async fn handle(
                &self,
                _client: &Client,
                request: OutboundRequest,
                next: Next<'_>,
            ) -> Result<ClientResponse> {
                let response = next.run(request).await?;
                *self.0.lock() = Some(response.status_code());
                Ok(response)
            }
        }

        let (client, _) = client();
        let seen = Arc::new(Mutex::new(None));
        client.use_middleware(RequestLogger {
            log_bodies: true,
            url_filter: None,
        });
        client.use_middleware(Status(seen.clone()));

        client.post("https://example.com/", "a=1").await.unwrap();
        assert_eq!(*seen.lock(), Some(200));
    }
}
