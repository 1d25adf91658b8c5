// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use tracing::Instrument;

use super::content_types;
use super::cookie::{Cookie, CookieStore};
use super::headers;
use super::params::Payload;
use super::request::{OutboundRequest, RequestContext};
use super::response::{ClientResponse, RawResponse, SentRequest};
use super::DEFAULT_USER_AGENT;
use crate::error::{Error, Result};
use crate::network::{Middleware, MiddlewareChain, ReqwestTransport, RetryExecutor, Transport};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string (empty = no User-Agent header)
    pub user_agent: String,
    /// Per-attempt transport timeout
    pub timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Accept invalid certificates (dangerous!)
    pub accept_invalid_certs: bool,
    /// Default headers
    pub default_headers: HeaderMap,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Prefix prepended to every request URL
    pub prefix: String,
    /// Retries after the first attempt
    pub retry_count: u32,
    /// Wait between attempts
    pub retry_interval: Duration,
    /// Capture and replay cookies across calls
    pub browser_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            accept_invalid_certs: false,
            default_headers: HeaderMap::new(),
            proxy: None,
            prefix: String::new(),
            retry_count: 0,
            retry_interval: Duration::from_secs(1),
            browser_mode: false,
        }
    }
}

/// Mutable per-client settings, read by every request
#[derive(Debug, Clone, Default)]
pub(crate) struct ClientSettings {
    pub(crate) prefix: String,
    pub(crate) basic_auth: Option<(String, String)>,
    pub(crate) user_agent: Option<String>,
    pub(crate) retry_count: u32,
    pub(crate) retry_interval: Duration,
    pub(crate) browser_mode: bool,
    pub(crate) context: Option<RequestContext>,
}

/// HTTP client with middleware, retry and browser-mode cookies
///
/// Cloning is cheap and clones share all state. Use [`Client::fork`] for an
/// independent copy.
///
/// Every verb method returns a [`ClientResponse`] that holds a connection
/// until it is read, closed or dropped.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    headers: Arc<RwLock<HeaderMap>>,
    cookies: CookieStore,
    settings: Arc<RwLock<ClientSettings>>,
    middleware: Arc<RwLock<Vec<Arc<dyn Middleware>>>>,
}

impl Client {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_config(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client that sends through a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let settings = ClientSettings {
            prefix: config.prefix,
            basic_auth: None,
            user_agent: Some(config.user_agent).filter(|a| !a.is_empty()),
            retry_count: config.retry_count,
            retry_interval: config.retry_interval,
            browser_mode: config.browser_mode,
            context: None,
        };
        Self {
            transport,
            headers: Arc::new(RwLock::new(config.default_headers)),
            cookies: CookieStore::new(),
            settings: Arc::new(RwLock::new(settings)),
            middleware: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Independent copy: same transport, separate headers, cookies and settings
    pub fn fork(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            headers: Arc::new(RwLock::new(self.headers.read().clone())),
            cookies: self.cookies.deep_clone(),
            settings: Arc::new(RwLock::new(self.settings.read().clone())),
            middleware: Arc::new(RwLock::new(self.middleware.read().clone())),
        }
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    /// Set a default header, replacing any previous value
    pub fn set_header(&self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::try_from(name).map_err(|e| Error::invalid_header(name, e))?;
        let header_value =
            HeaderValue::try_from(value).map_err(|e| Error::invalid_header(name, e))?;
        self.headers.write().insert(header_name, header_value);
        Ok(())
    }

    /// Set multiple default headers
    pub fn set_header_map(&self, headers: &HashMap<String, String>) -> Result<()> {
        for (name, value) in headers {
            self.set_header(name, value)?;
        }
        Ok(())
    }

    /// Set default headers from a raw block of `Name: value` lines
    pub fn set_header_raw(&self, raw: &str) -> Result<()> {
        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.split_once(':') {
                Some((name, value)) => self.set_header(name.trim(), value.trim())?,
                None => return Err(Error::invalid_header(line, "missing ':' separator")),
            }
        }
        Ok(())
    }

    /// Current value of a default header
    pub fn header_value(&self, name: &str) -> Option<String> {
        self.headers
            .read()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Remove a default header
    pub fn remove_header(&self, name: &str) {
        self.headers.write().remove(name);
    }

    /// Snapshot of the default headers
    pub fn headers(&self) -> HeaderMap {
        self.headers.read().clone()
    }

    /// Set the `Content-Type` used for encoding and sending
    pub fn set_content_type(&self, content_type: &str) -> Result<()> {
        self.set_header(headers::CONTENT_TYPE, content_type)
    }

    /// Set a cookie sent with every request
    pub fn set_cookie(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.set(name, value);
    }

    /// Set multiple cookies
    pub fn set_cookie_map(&self, cookies: &HashMap<String, String>) {
        for (name, value) in cookies {
            self.cookies.set(name.clone(), value.clone());
        }
    }

    /// The client's cookie store
    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// Set the URL prefix
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.settings.write().prefix = prefix.into();
    }

    /// Set basic auth credentials
    pub fn set_basic_auth(&self, username: impl Into<String>, password: impl Into<String>) {
        self.settings.write().basic_auth = Some((username.into(), password.into()));
    }

    /// Set the user agent (empty = none)
    pub fn set_user_agent(&self, agent: impl Into<String>) {
        self.settings.write().user_agent = Some(agent.into()).filter(|a| !a.is_empty());
    }

    /// Set the retry budget and the wait between attempts
    pub fn set_retry(&self, count: u32, interval: Duration) {
        let mut settings = self.settings.write();
        settings.retry_count = count;
        settings.retry_interval = interval;
    }

    /// Enable or disable browser mode
    pub fn set_browser_mode(&self, enabled: bool) {
        self.settings.write().browser_mode = enabled;
    }

    /// Whether browser mode is enabled
    pub fn browser_mode(&self) -> bool {
        self.settings.read().browser_mode
    }

    /// Set the context used by every request
    pub fn set_context(&self, context: RequestContext) {
        self.settings.write().context = Some(context);
    }

    /// Append middleware to the chain
    pub fn use_middleware(&self, middleware: impl Middleware + 'static) {
        self.middleware.write().push(Arc::new(middleware));
    }

    /// Number of configured middleware
    pub fn middleware_count(&self) -> usize {
        self.middleware.read().len()
    }

    /// The transport requests are sent through
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn settings(&self) -> ClientSettings {
        self.settings.read().clone()
    }

    // ---------------------------------------------------------------------
    // Chained configuration: each returns a forked client
    // ---------------------------------------------------------------------

    /// Forked client with an extra header
    pub fn header(&self, name: &str, value: &str) -> Result<Self> {
        let client = self.fork();
        client.set_header(name, value)?;
        Ok(client)
    }

    /// Forked client with an extra cookie
    pub fn cookie(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let client = self.fork();
        client.set_cookie(name, value);
        client
    }

    /// Forked client sending JSON
    pub fn content_json(&self) -> Self {
        let client = self.fork();
        client
            .headers
            .write()
            .insert(reqwest::header::CONTENT_TYPE, HeaderValue::from_static(content_types::JSON));
        client
    }

    /// Forked client sending XML
    pub fn content_xml(&self) -> Self {
        let client = self.fork();
        client
            .headers
            .write()
            .insert(reqwest::header::CONTENT_TYPE, HeaderValue::from_static(content_types::XML));
        client
    }

    /// Forked client with a URL prefix
    pub fn prefix(&self, prefix: impl Into<String>) -> Self {
        let client = self.fork();
        client.set_prefix(prefix);
        client
    }

    /// Forked client with basic auth
    pub fn basic_auth(&self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let client = self.fork();
        client.set_basic_auth(username, password);
        client
    }

    /// Forked client with a retry policy
    pub fn retry(&self, count: u32, interval: Duration) -> Self {
        let client = self.fork();
        client.set_retry(count, interval);
        client
    }

    /// Forked client whose requests share a deadline `timeout` from now
    pub fn timeout(&self, timeout: Duration) -> Self {
        let client = self.fork();
        let context = match self.settings.read().context {
            Some(ref parent) => parent.child(Some(timeout)),
            None => RequestContext::with_timeout(timeout),
        };
        client.set_context(context);
        client
    }

    /// Forked client bound to a context
    pub fn context(&self, context: RequestContext) -> Self {
        let client = self.fork();
        client.set_context(context);
        client
    }

    // ---------------------------------------------------------------------
    // Verbs
    // ---------------------------------------------------------------------

    /// Send a GET request; parameters go to the query string
    pub async fn get(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::GET, url, data).await
    }

    /// Send a PUT request
    pub async fn put(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::PUT, url, data).await
    }

    /// Send a POST request
    pub async fn post(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::POST, url, data).await
    }

    /// Send a DELETE request
    pub async fn delete(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::DELETE, url, data).await
    }

    /// Send a HEAD request
    pub async fn head(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::HEAD, url, data).await
    }

    /// Send a PATCH request
    pub async fn patch(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::PATCH, url, data).await
    }

    /// Send a CONNECT request
    pub async fn connect(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::CONNECT, url, data).await
    }

    /// Send an OPTIONS request
    pub async fn options(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::OPTIONS, url, data).await
    }

    /// Send a TRACE request
    pub async fn trace(&self, url: &str, data: impl Into<Payload>) -> Result<ClientResponse> {
        self.do_request(Method::TRACE, url, data).await
    }

    /// Build, dispatch and execute a request
    ///
    /// Uploads use `multipart/form-data`. Otherwise the configured content
    /// type is used, or JSON / form bodies are detected automatically.
    pub async fn do_request(
        &self,
        method: Method,
        url: &str,
        data: impl Into<Payload>,
    ) -> Result<ClientResponse> {
        let request = self.prepare_request(method, url, data.into()).await?;
        let span = tracing::info_span!("http.client", method = %request.method, url = %request.url);
        self.dispatch(request).instrument(span).await
    }

    /// Run an assembled request through middleware and the network
    pub async fn dispatch(&self, request: OutboundRequest) -> Result<ClientResponse> {
        tracing::debug!(headers = ?request.headers, "Dispatching request");
        let middleware = self.middleware.read().clone();
        let result = if middleware.is_empty() {
            self.call_request(request).await
        } else {
            MiddlewareChain::new(middleware).dispatch(self, request).await
        };

        if let Ok(ref response) = result {
            self.reconcile_cookies(&response.cookies());
        }
        result
    }

    /// Send with retry, bypassing middleware
    pub(crate) async fn call_request(&self, request: OutboundRequest) -> Result<ClientResponse> {
        let settings = self.settings();
        let sent = SentRequest::from(&request);
        let executor = RetryExecutor::new(
            self.transport.as_ref(),
            settings.retry_count,
            settings.retry_interval,
        );
        let raw = executor
            .execute(&request, |response: &RawResponse| {
                self.reconcile_cookies(&response.cookies())
            })
            .await?;
        Ok(ClientResponse::new(raw, sent))
    }

    fn reconcile_cookies(&self, cookies: &[Cookie]) {
        if cookies.is_empty() || !self.browser_mode() {
            return;
        }
        self.cookies.reconcile(cookies, Utc::now());
    }
}
