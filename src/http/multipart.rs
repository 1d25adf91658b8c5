// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! `multipart/form-data` encoding for `@file:` uploads

use std::path::Path;

use bytes::Bytes;
use rand::Rng;

use super::params::FormField;
use crate::error::{Error, Result};

/// Buffered multipart body writer
#[derive(Debug)]
pub struct MultipartWriter {
    boundary: String,
    buffer: Vec<u8>,
    parts: usize,
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartWriter {
    /// Create a writer with a random boundary
    pub fn new() -> Self {
        Self::with_boundary(random_boundary())
    }

    /// Create a writer with a fixed boundary
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buffer: Vec::new(),
            parts: 0,
        }
    }

    /// The boundary separating parts
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value for this body
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    fn begin_part(&mut self, part_headers: &str) {
        if self.parts > 0 {
            self.buffer.extend_from_slice(b"\r\n");
        }
        self.buffer
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.buffer.extend_from_slice(part_headers.as_bytes());
        self.buffer.extend_from_slice(b"\r\n");
        self.parts += 1;
    }

    /// Write a plain form field
    pub fn write_field(&mut self, name: &str, value: &str) {
        self.begin_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n",
            escape_quotes(name)
        ));
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Stream a file into a form-file part named `field`
    ///
    /// The file handle lives only for the duration of the copy.
    pub async fn write_file(&mut self, field: &str, path: &Path) -> Result<()> {
        let mut file = tokio::fs::File::open(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.begin_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n",
            escape_quotes(field),
            escape_quotes(&filename)
        ));
        let copied = tokio::io::copy(&mut file, &mut self.buffer).await?;
        drop(file);
        tracing::debug!(field, path = %path.display(), bytes = copied, "Attached upload");
        Ok(())
    }

    /// Write the closing boundary and return the body
    pub fn finish(mut self) -> Bytes {
        if self.parts > 0 {
            self.buffer.extend_from_slice(b"\r\n");
        }
        self.buffer
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Bytes::from(self.buffer)
    }
}

/// Encode form fields as multipart, uploading every `@file:` reference
///
/// Returns the body and its content type. A missing upload path fails before
/// anything is returned, so no partial body can be sent.
pub async fn encode_multipart(fields: &[FormField]) -> Result<(Bytes, String)> {
    let mut writer = MultipartWriter::new();
    for field in fields {
        match field.file_path() {
            Some(path) => {
                if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                    return Err(Error::FileNotFound {
                        path: path.to_string(),
                    });
                }
                writer.write_file(&field.name, Path::new(path)).await?;
            }
            None => writer.write_field(&field.name, &field.value),
        }
    }
    let content_type = writer.content_type();
    Ok((writer.finish(), content_type))
}

fn random_boundary() -> String {
    let bytes: [u8; 30] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fields_layout() {
        let mut writer = MultipartWriter::with_boundary("XyZ");
        writer.write_field("a", "1");
        writer.write_field("b\"q", "2");
        let body = writer.finish();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            "--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n\
             --XyZ\r\nContent-Disposition: form-data; name=\"b\\\"q\"\r\n\r\n2\r\n--XyZ--\r\n"
        );
    }

    #[test]
    fn test_empty_body() {
        let writer = MultipartWriter::with_boundary("B");
        assert_eq!(writer.finish().as_ref(), b"--B--\r\n");
    }

    #[test]
    fn test_random_boundary() {
        let a = MultipartWriter::new();
        let b = MultipartWriter::new();
        assert_eq!(a.boundary().len(), 60);
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.content_type().starts_with("multipart/form-data; boundary="));
    }

    #[tokio::test]
    async fn test_file_part_bytes_match_source() {
        let content: Vec<u8> = (0u8..=255).chain(b"\r\n--tail".iter().copied()).collect();
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(&content).unwrap();
        let path = file.path().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        let fields = vec![
            FormField::new("note", "hi"),
            FormField::new("upload", format!("@file:{}", path.display())),
        ];
        let (body, content_type) = encode_multipart(&fields).await.unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();

        let header = format!(
            "Content-Disposition: form-data; name=\"upload\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            name
        );
        let start = find(&body, header.as_bytes()).unwrap() + header.len();
        let trailer = format!("\r\n--{}--\r\n", boundary);
        assert!(body.ends_with(trailer.as_bytes()));
        assert_eq!(&body[start..body.len() - trailer.len()], content.as_slice());
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let fields = vec![FormField::new("upload", "@file:/definitely/not/here.txt")];
        let err = encode_multipart(&fields).await.unwrap_err();
        match err {
            Error::FileNotFound { path } => assert_eq!(path, "/definitely/not/here.txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }
}
