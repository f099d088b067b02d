//! Streaming multipart form encoding purpose built for the ZeroFS upload API.
//!
//! Text fields are buffered up front. The file part is always the last part of
//! the form, so its content can be streamed straight from disk between a small
//! buffered head and tail without ever holding the whole file in memory.

use rand::{distr::Alphanumeric, Rng};
use std::io::{self, Cursor, Read};
use std::path::Path;

/// Builds a multipart/form-data request body.
#[derive(Debug)]
pub struct Builder<'a> {
    boundary: String,
    fields: Vec<TextField<'a>>,
}

/// A simple text field.
#[derive(Debug)]
struct TextField<'a> {
    name: &'a str,
    value: &'a str,
}

impl<'a> Builder<'a> {
    /// Creates a new Builder with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Creates a new Builder with the specified boundary.
    /// Useful for testing.
    pub fn with_boundary(boundary: String) -> Self {
        Builder {
            boundary,
            fields: Vec::new(),
        }
    }

    /// Adds a text field to the multipart form.
    pub fn add_text(&mut self, name: &'a str, value: &'a str) {
        self.fields.push(TextField { name, value });
    }

    /// Finishes the form with a streamed file part.
    ///
    /// `content_len` must be the exact number of bytes `content` yields; it is
    /// used to compute the `Content-Length` of the whole body. The reader is
    /// capped at `content_len` bytes.
    pub fn build_with_file<R: Read>(
        self,
        name: &str,
        filename: &str,
        content_type: &str,
        content: R,
        content_len: u64,
    ) -> Body<R> {
        let mut head = Vec::new();
        let boundary_marker = format!("--{}\r\n", self.boundary);

        for field in &self.fields {
            head.extend_from_slice(boundary_marker.as_bytes());
            head.extend_from_slice(b"Content-Disposition: form-data; name=\"");
            head.extend_from_slice(escape_quoted(field.name).as_bytes());
            head.extend_from_slice(b"\"\r\n\r\n");
            head.extend_from_slice(field.value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }

        head.extend_from_slice(boundary_marker.as_bytes());
        head.extend_from_slice(b"Content-Disposition: form-data; name=\"");
        head.extend_from_slice(escape_quoted(name).as_bytes());
        head.extend_from_slice(b"\"; filename=\"");
        head.extend_from_slice(escape_quoted(filename).as_bytes());
        head.extend_from_slice(b"\"\r\n");
        head.extend_from_slice(b"Content-Type: ");
        head.extend_from_slice(content_type.as_bytes());
        head.extend_from_slice(b"\r\n\r\n");

        let tail = format!("\r\n--{}--\r\n", self.boundary).into_bytes();
        let content_length = head.len() as u64 + content_len + tail.len() as u64;

        Body {
            head,
            content: content.take(content_len),
            tail,
            content_length,
            content_type: format!(
                "multipart/form-data; boundary={}",
                self.boundary
            ),
        }
    }
}

/// A multipart/form-data body whose file content is read lazily.
#[derive(Debug)]
pub struct Body<R> {
    head: Vec<u8>,
    content: io::Take<R>,
    tail: Vec<u8>,
    content_length: u64,
    content_type: String,
}

impl<R: Read> Body<R> {
    /// Total length of the encoded body in bytes.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// The value for the `Content-Type` header, e.g.,
    /// `"multipart/form-data; boundary=..."`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Consumes the body, returning a reader over the encoded bytes.
    pub fn into_reader(self) -> impl Read {
        Cursor::new(self.head)
            .chain(self.content)
            .chain(Cursor::new(self.tail))
    }
}

/// Generates a random alphanumeric boundary string of length 30.
pub fn generate_boundary() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

/// Makes a value safe to place inside a quoted header parameter.
fn escape_quoted(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| match c {
            '"' => "%22".to_string(),
            c => c.to_string(),
        })
        .collect()
}

/// Infers a MIME type from a filename extension.
///
/// Defaults to `application/octet-stream` for unknown or non-UTF8 extensions.
pub fn mime_from_filename<P: AsRef<Path>>(path: P) -> &'static str {
    let ext = match path.as_ref().extension().and_then(|s| s.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return "application/octet-stream",
    };

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

// --- Tests ---
