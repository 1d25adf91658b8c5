// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client layer
//!
//! Provides the client, request assembly, parameter encoding, multipart
//! uploads and browser-mode cookie handling.

mod builder;
mod client;
mod cookie;
pub mod multipart;
pub mod params;
mod request;
mod response;

pub use builder::{merge_query, sniff_content_type};
pub use client::{Client, ClientConfig};
pub use cookie::{Cookie, CookieStore};
pub use multipart::{encode_multipart, MultipartWriter};
pub use params::{encode, EncodedBody, FormField, Payload, FILE_MARKER};
pub use request::{OutboundRequest, RequestContext};
pub use response::{ClientResponse, RawResponse, ResponseBody, SentRequest};

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// Common HTTP headers
pub mod headers {
    pub const AUTHORIZATION: &str = "authorization";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const COOKIE: &str = "cookie";
    pub const HOST: &str = "host";
    pub const SET_COOKIE: &str = "set-cookie";
    pub const USER_AGENT: &str = "user-agent";
}

/// Content types produced by the encoder
pub mod content_types {
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const FORM: &str = "application/x-www-form-urlencoded";
    pub const MULTIPART: &str = "multipart/form-data";
}
