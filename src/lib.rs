// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Courier - Outbound HTTP Request Pipeline
//!
//! An HTTP client that assembles requests from loosely typed parameters and
//! runs them through middleware, bounded retry and browser-style cookie
//! persistence.
//!
//! ## Features
//!
//! - Parameter encoding: form, JSON and XML bodies from structured values
//! - File uploads: `@file:<path>` form values switch to `multipart/form-data`
//! - Content type detection for raw JSON and form bodies
//! - Middleware: chain of responsibility around the network call
//! - Retry: fixed-interval retry bounded by a request context
//! - Browser mode: cookies captured from responses and replayed
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use courier::Client;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new()?.retry(2, Duration::from_millis(500));
//!     client.set_browser_mode(true);
//!
//!     let response = client
//!         .post("https://example.com/login", json!({"user": "alice", "pass": "secret"}))
//!         .await?;
//!     println!("Status: {}", response.status());
//!     response.close();
//!
//!     // The session cookie is replayed automatically
//!     let profile = client.get("https://example.com/profile", ()).await?;
//!     println!("{}", profile.text().await?);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod network;

// Re-exports for convenience

// Errors
pub use error::{Error, Result};

// HTTP
pub use http::{
    Client, ClientConfig, ClientResponse, Cookie, CookieStore, FormField, OutboundRequest,
    Payload, RawResponse, RequestContext,
};

// Network
pub use network::{
    HeaderInjector, Middleware, MiddlewareChain, Next, RequestLogger, ReqwestTransport,
    RetryExecutor, SendFailure, Transport,
};

/// Courier version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
