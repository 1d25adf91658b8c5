// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport abstraction
//!
//! The pipeline never talks to the network directly. It hands each assembled
//! [`OutboundRequest`] to a [`Transport`], which makes testing the retry and
//! middleware logic possible without sockets.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, HOST};
use reqwest::redirect::Policy;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::http::{headers, ClientConfig, OutboundRequest, RawResponse};

/// A failed send, possibly carrying a response that must still be released
#[derive(Debug)]
pub struct SendFailure {
    /// Why the send failed
    pub error: Error,
    /// Response produced despite the failure, if any
    pub response: Option<RawResponse>,
}

impl SendFailure {
    /// A failure without a response
    pub fn new(error: impl Into<Error>) -> Self {
        Self {
            error: error.into(),
            response: None,
        }
    }

    /// A failure that still produced a response
    pub fn with_response(error: impl Into<Error>, response: RawResponse) -> Self {
        Self {
            error: error.into(),
            response: Some(response),
        }
    }
}

impl From<Error> for SendFailure {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}

impl From<reqwest::Error> for SendFailure {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error)
    }
}

/// Executes a single request attempt
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request once
    async fn send(&self, request: &OutboundRequest) -> std::result::Result<RawResponse, SendFailure>;
}

/// Transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    /// Per-attempt timeout from configuration
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a transport from client configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .cookie_store(false); // Browser mode handles cookies itself

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        Ok(Self {
            client: builder.build()?,
            timeout: config.timeout,
        })
    }

    /// Configured timeout, shortened to the context deadline if one is closer
    fn attempt_timeout(&self, request: &OutboundRequest) -> Duration {
        match request.context.deadline() {
            Some(deadline) => self
                .timeout
                .min(deadline.saturating_duration_since(Instant::now())),
            None => self.timeout,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &OutboundRequest) -> std::result::Result<RawResponse, SendFailure> {
        let mut wire_headers = request.headers.clone();

        // Wire host override
        if let Some(ref host) = request.host {
            let value = HeaderValue::try_from(host.as_str())
                .map_err(|e| Error::invalid_header(headers::HOST, e))?;
            wire_headers.insert(HOST, value);
        }

        let timeout = self.attempt_timeout(request);
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(wire_headers)
            .body(request.body.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout_with_url("send", timeout.as_millis() as u64, request.url.as_str())
                } else {
                    Error::from(e)
                }
            })?;
        Ok(RawResponse::from_reqwest(response))
    }
}
