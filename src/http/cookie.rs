// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Session cookie storage for browser mode
//!
//! The store is keyed by cookie name only: the client talks to one logical
//! site per session, and the most recent response wins for every name.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// A single cookie parsed from a `Set-Cookie` header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to
    pub domain: String,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie expired strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(false, |exp| exp < now)
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Parse a Set-Cookie header value
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'));

        // Default domain to request host
        cookie.domain = url.host_str().unwrap_or("").to_string();

        let mut max_age = None;
        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let attr = attr.trim().to_lowercase();
                let val = val.trim();
                match attr.as_str() {
                    "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
                    "path" => cookie.path = val.to_string(),
                    "expires" => cookie.expires = parse_expires(val),
                    "max-age" => max_age = val.parse::<i64>().ok(),
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        // Max-Age takes precedence over Expires
        if let Some(secs) = max_age {
            cookie.expires = if secs <= 0 {
                Some(DateTime::<Utc>::MIN_UTC)
            } else {
                Some(Utc::now() + chrono::Duration::seconds(secs))
            };
        }

        Some(cookie)
    }
}

fn parse_expires(val: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
        return Some(dt.with_timezone(&Utc));
    }
    // Netscape style: "Wed, 21-Oct-2015 07:28:00 GMT"
    NaiveDateTime::parse_from_str(val, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Thread-safe client-scoped cookie store (name -> value)
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    cookies: Arc<DashMap<String, String>>,
}

impl CookieStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cookie value
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Get a cookie value
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).map(|v| v.value().clone())
    }

    /// Remove a cookie
    pub fn remove(&self, name: &str) {
        self.cookies.remove(name);
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Sorted copy of the current contents
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.cookies
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// An independent store holding the same cookies
    pub fn deep_clone(&self) -> Self {
        let store = Self::new();
        for (name, value) in self.snapshot() {
            store.set(name, value);
        }
        store
    }

    /// `Cookie` request header value: `a=1;b=2`, sorted by name
    pub fn header_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.snapshot()
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(";"),
        )
    }

    /// Apply cookies from a response: expired ones are deleted, the rest upserted
    pub fn reconcile<'a>(&self, cookies: impl IntoIterator<Item = &'a Cookie>, now: DateTime<Utc>) {
        for cookie in cookies {
            if cookie.is_expired_at(now) {
                tracing::debug!(name = %cookie.name, "Dropping expired cookie");
                self.cookies.remove(&cookie.name);
            } else {
                self.cookies
                    .insert(cookie.name.clone(), cookie.value.clone());
            }
        }
    }

    /// Export all cookies as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }

    /// Import cookies from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let cookies: BTreeMap<String, String> = serde_json::from_str(json)?;
        let store = CookieStore::new();
        for (name, value) in cookies {
            store.set(name, value);
        }
        Ok(store)
    }
}
