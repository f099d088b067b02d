use ureq::http::{self, HeaderValue, StatusCode};
use ureq::tls::{TlsConfig, TlsProvider};
use ureq::SendBody;

use crate::api::{self, UploadResponse};
use crate::multipart;
use log::{debug, info};
use std::error::Error;
use std::fmt;
use std::io::{self, Read};
use std::time::{Duration, Instant};

// Form field names understood by the ZeroFS upload endpoint.
const FIELD_BUCKET_CODE: &str = "bucket_code";
const FIELD_FILENAME: &str = "filename";
const FIELD_FILE_SIZE: &str = "file_size";
const FIELD_CONTENT_TYPE: &str = "content_type";
const FIELD_NOTE: &str = "note";
const FIELD_FILE: &str = "file";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(3600);
const RESPONSE_LIMIT: u64 = 10 << 20; // 10 MiB

/// Error type for ZeroFS client operations
#[derive(Debug)]
pub enum ClientError {
    /// The request never completed: connection, DNS, TLS or timeout failure
    HttpError(ureq::Error),
    /// The connection dropped while the request body was being sent
    SendInterrupted(ureq::Error),
    /// The server answered with a non-success status
    Status { status: StatusCode, message: String },
    /// Other errors
    Other(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::HttpError(e) => write!(f, "Network error: {}", e),
            ClientError::SendInterrupted(e) => write!(
                f,
                "Network error: {}. The server closed the connection \
                 mid-upload and may have refused it, e.g. because the file \
                 exceeds its size limit",
                e
            ),
            ClientError::Status { status, message } if message.is_empty() => {
                write!(f, "Server responded with {}", status)
            }
            ClientError::Status { status, message } => {
                write!(f, "Server responded with {}: {}", status, message)
            }
            ClientError::Other(s) => write!(f, "Error: {}", s),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::HttpError(e) | ClientError::SendInterrupted(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

impl From<ureq::Error> for ClientError {
    fn from(err: ureq::Error) -> Self {
        ClientError::HttpError(err)
    }
}

impl ClientError {
    /// Classifies an error returned while sending the request. A reset or
    /// broken pipe usually means the server answered early and hung up.
    fn from_send(err: ureq::Error) -> Self {
        let interrupted = matches!(
            &err,
            ureq::Error::Io(e) if matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            )
        );
        if interrupted {
            ClientError::SendInterrupted(err)
        } else {
            ClientError::HttpError(err)
        }
    }
}

/// A single file upload.
pub struct UploadRequest<'a, R> {
    /// Name the file is stored under
    pub filename: &'a str,
    /// Exact number of bytes `content` yields
    pub file_size: u64,
    /// MIME type of the file
    pub content_type: &'a str,
    /// Destination bucket
    pub bucket_code: &'a str,
    /// Optional free-text note, already encoded for the wire
    pub note: Option<&'a str>,
    /// The file content
    pub content: R,
}

/// What the server said about a successful upload.
#[derive(Debug)]
pub struct Uploaded {
    /// The raw response body
    pub text: String,
    /// The decoded body, if it was JSON
    pub response: Option<UploadResponse>,
}

/// Client for the ZeroFS upload API
pub struct Client {
    /// HTTP agent for making requests
    agent: ureq::Agent,
    /// Upload endpoint
    api_url: String,
    /// Authorization header value, if a token was resolved
    auth: Option<HeaderValue>,
}

impl Client {
    /// Create a new client posting to `api_url`, authenticating with `token`
    /// when one is given.
    pub fn new(
        api_url: String,
        token: Option<String>,
    ) -> Result<Self, ClientError> {
        let auth = token
            .map(|token| -> Result<HeaderValue, ClientError> {
                let mut value = HeaderValue::try_from(format!("Bearer {token}"))
                    .map_err(|_| {
                        ClientError::Other(
                            "Token contains characters not allowed in an \
                             HTTP header"
                                .to_string(),
                        )
                    })?;
                value.set_sensitive(true);
                Ok(value)
            })
            .transpose()?;

        let config = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .timeout_global(Some(UPLOAD_TIMEOUT))
            .tls_config(
                TlsConfig::builder()
                    .provider(TlsProvider::NativeTls)
                    .build(),
            )
            .build();
        let agent = ureq::Agent::new_with_config(config);

        Ok(Self {
            agent,
            api_url,
            auth,
        })
    }

    /// Upload a file as one multipart POST to the API URL.
    pub fn upload<R: Read>(
        &self,
        request: UploadRequest<'_, R>,
    ) -> Result<Uploaded, ClientError> {
        let file_size = request.file_size.to_string();

        let mut form = multipart::Builder::new();
        form.add_text(FIELD_BUCKET_CODE, request.bucket_code);
        form.add_text(FIELD_FILENAME, request.filename);
        form.add_text(FIELD_FILE_SIZE, &file_size);
        form.add_text(FIELD_CONTENT_TYPE, request.content_type);
        if let Some(note) = request.note {
            form.add_text(FIELD_NOTE, note);
        }
        let body = form.build_with_file(
            FIELD_FILE,
            request.filename,
            request.content_type,
            request.content,
            request.file_size,
        );

        debug!(
            "POST {} ({} byte body, authenticated: {})",
            self.api_url,
            body.content_length(),
            self.auth.is_some()
        );

        // Start timing the request
        let start_time = Instant::now();

        let mut req = self
            .agent
            .post(&self.api_url)
            .header(http::header::CONTENT_TYPE, body.content_type())
            .header(
                http::header::CONTENT_LENGTH,
                body.content_length().to_string(),
            );
        if let Some(auth) = &self.auth {
            req = req.header(http::header::AUTHORIZATION, auth.clone());
        }

        let mut reader = body.into_reader();
        let response = req
            .send(SendBody::from_reader(&mut reader))
            .map_err(ClientError::from_send)?;

        let status = response.status();
        let body = response
            .into_body()
            .with_config()
            .limit(RESPONSE_LIMIT)
            .read_to_vec();

        info!(
            "upload: request completed in {:?} with status {}",
            start_time.elapsed(),
            status
        );

        if !status.is_success() {
            let message = match body {
                Ok(bytes) => {
                    api::error_message(&String::from_utf8_lossy(&bytes))
                }
                Err(err) => {
                    debug!("Failed to read error response body: {err}");
                    String::new()
                }
            };
            return Err(ClientError::Status { status, message });
        }

        let text = String::from_utf8_lossy(&body?).into_owned();

        let response = serde_json::from_str::<UploadResponse>(&text).ok();
        Ok(Uploaded { text, response })
    }
}

// --- Tests ---
