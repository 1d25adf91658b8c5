// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request parameter encoding
//!
//! Turns a caller-supplied [`Payload`] into an [`EncodedBody`] according to the
//! content type configured on the client:
//!
//! - `application/json`: text and bytes pass through untouched, values are
//!   marshaled with serde_json
//! - `application/xml`: same rule, marshaled with [`to_xml`]
//! - anything else: values are flattened into form fields
//!
//! Form fields stay structured (`{name, value}` pairs) until they hit the
//! wire, so upload detection never has to re-parse a rendered body. Only raw
//! text supplied by the caller is split on `&` and `=`, which means such text
//! cannot carry those characters inside a value.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use super::content_types;
use crate::error::{Error, Result};

/// Marker prefix that turns a form value into a file upload
pub const FILE_MARKER: &str = "@file:";

/// A request parameter as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    /// No parameters
    #[default]
    Empty,
    /// Raw text, sent as-is
    Text(String),
    /// Raw bytes, sent as-is
    Bytes(Bytes),
    /// Structured value, flattened or marshaled depending on content type
    Value(Value),
}

impl Payload {
    /// Capture any serializable value
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Payload::Value(serde_json::to_value(value)?))
    }

    /// Whether there is anything to encode
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Empty => true,
            Payload::Text(s) => s.is_empty(),
            Payload::Bytes(b) => b.is_empty(),
            Payload::Value(v) => v.is_null(),
        }
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload::Empty
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&[u8]> for Payload {
    fn from(b: &[u8]) -> Self {
        Payload::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Value(v)
    }
}

/// One `name=value` form pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Upload path, if the value is `@file:<path>` with a non-empty path
    pub fn file_path(&self) -> Option<&str> {
        if self.value.len() > FILE_MARKER.len() {
            self.value.strip_prefix(FILE_MARKER)
        } else {
            None
        }
    }
}

/// How the configured content type steers encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Xml,
    Form,
}

impl ContentKind {
    /// Classify a `Content-Type` header value by its essence
    pub fn from_header(value: Option<&str>) -> Self {
        let essence = value
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());
        match essence.as_deref() {
            Some(content_types::JSON) => ContentKind::Json,
            Some(content_types::XML) => ContentKind::Xml,
            _ => ContentKind::Form,
        }
    }
}

/// Result of parameter encoding; exactly one body shape per request
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedBody {
    /// Nothing to send
    Empty,
    /// JSON or XML document (marshaled or passed through)
    Marshaled(Bytes),
    /// Caller-supplied raw text in form mode
    Text(Bytes),
    /// Structured form fields
    Form(Vec<FormField>),
}

impl EncodedBody {
    /// Whether the encoded body is empty
    pub fn is_empty(&self) -> bool {
        match self {
            EncodedBody::Empty => true,
            EncodedBody::Marshaled(b) | EncodedBody::Text(b) => b.is_empty(),
            EncodedBody::Form(fields) => fields.is_empty(),
        }
    }

    /// Wire form of the body, as sent in a request body or query string
    pub fn to_bytes(&self) -> Bytes {
        match self {
            EncodedBody::Empty => Bytes::new(),
            EncodedBody::Marshaled(b) | EncodedBody::Text(b) => b.clone(),
            EncodedBody::Form(fields) => Bytes::from(render_form(fields)),
        }
    }

    /// Wire form as text
    pub fn to_query(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }

    /// Form fields to upload as multipart, if any field references a file
    pub fn upload_fields(&self) -> Option<Vec<FormField>> {
        let fields = match self {
            EncodedBody::Form(fields) => fields.clone(),
            EncodedBody::Text(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                if !text.contains(FILE_MARKER) {
                    return None;
                }
                parse_form_text(&text)
            }
            _ => return None,
        };
        if fields.iter().any(|f| f.file_path().is_some()) {
            Some(fields)
        } else {
            None
        }
    }
}

/// Encode a payload for the given configured content type
pub fn encode(payload: &Payload, content_type: Option<&str>) -> Result<EncodedBody> {
    if payload.is_empty() {
        return Ok(EncodedBody::Empty);
    }
    match ContentKind::from_header(content_type) {
        ContentKind::Json => marshal(payload, |v| Ok(serde_json::to_vec(v)?)),
        ContentKind::Xml => marshal(payload, |v| Ok(to_xml(v)?.into_bytes())),
        ContentKind::Form => Ok(match payload {
            Payload::Empty => EncodedBody::Empty,
            Payload::Text(s) => EncodedBody::Text(Bytes::from(s.clone())),
            Payload::Bytes(b) => EncodedBody::Text(b.clone()),
            Payload::Value(v) => flatten(v),
        }),
    }
}

fn marshal(payload: &Payload, f: impl Fn(&Value) -> Result<Vec<u8>>) -> Result<EncodedBody> {
    let bytes = match payload {
        Payload::Empty => return Ok(EncodedBody::Empty),
        Payload::Text(s) => Bytes::from(s.clone()),
        Payload::Bytes(b) => b.clone(),
        Payload::Value(v) => Bytes::from(f(v)?),
    };
    Ok(EncodedBody::Marshaled(bytes))
}

fn flatten(value: &Value) -> EncodedBody {
    match value {
        Value::Null => EncodedBody::Empty,
        Value::Object(map) if map.is_empty() => EncodedBody::Empty,
        Value::Object(map) => {
            let mut fields = Vec::with_capacity(map.len());
            for (name, v) in map {
                match v {
                    Value::Array(items) => {
                        for item in items {
                            fields.push(FormField::new(name.clone(), scalar_text(item)));
                        }
                    }
                    other => fields.push(FormField::new(name.clone(), scalar_text(other))),
                }
            }
            EncodedBody::Form(fields)
        }
        other => EncodedBody::Text(Bytes::from(scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Render fields as `a=1&b=2`
///
/// Values are percent-encoded unless some field carries the upload marker,
/// in which case the whole body is left verbatim so the marker survives.
pub fn render_form(fields: &[FormField]) -> String {
    let encode = !fields
        .iter()
        .any(|f| f.name.contains(FILE_MARKER) || f.value.contains(FILE_MARKER));
    fields
        .iter()
        .map(|f| {
            if encode {
                format!("{}={}", f.name, urlencoding::encode(&f.value))
            } else {
                format!("{}={}", f.name, f.value)
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Split raw `a=1&b=2` text into fields on literal `&` and the first `=`
pub fn parse_form_text(text: &str) -> Vec<FormField> {
    text.split('&')
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((name, value)) => FormField::new(name, value),
            None => FormField::new(item, ""),
        })
        .collect()
}

/// Marshal a JSON value as XML
///
/// A single-key object uses its key as the root element, anything else is
/// wrapped in `<doc>`. Arrays repeat the enclosing element name.
pub fn to_xml(value: &Value) -> Result<String> {
    let mut out = String::new();
    match value {
        Value::Object(map) if map.len() == 1 => write_object(map, &mut out)?,
        other => write_element("doc", other, &mut out)?,
    }
    Ok(out)
}

fn write_object(map: &Map<String, Value>, out: &mut String) -> Result<()> {
    for (name, v) in map {
        write_element(name, v, out)?;
    }
    Ok(())
}

fn write_element(name: &str, value: &Value, out: &mut String) -> Result<()> {
    if !is_xml_name(name) {
        return Err(Error::xml(format!("invalid element name '{}'", name)));
    }
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(name, item, out)?;
            }
        }
        Value::Null => out.push_str(&format!("<{}/>", name)),
        Value::Object(map) => {
            out.push_str(&format!("<{}>", name));
            write_object(map, out)?;
            out.push_str(&format!("</{}>", name));
        }
        scalar => {
            out.push_str(&format!("<{}>", name));
            out.push_str(&escape_xml(&scalar_text(scalar)));
            out.push_str(&format!("</{}>", name));
        }
    }
    Ok(())
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
