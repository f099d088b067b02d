use crate::{
    auth,
    cli::{input::UploadFile, progress::UploadProgress},
    client::{Client, UploadRequest, Uploaded},
};
use anyhow::Context;
use base64::{prelude::BASE64_STANDARD, Engine};
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use indicatif::{HumanBytes, MultiProgress};
use log::{debug, error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use ureq::http::Uri;

pub mod input;
mod progress;

/// A CLI tool for uploading files to ZeroFS.
///
/// Uploads are authenticated with `--token`, or with the token stored in an
/// `auth.json` file next to the executable, in the current directory, or in
/// the user config directory. Without a token the upload is anonymous.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    // Parse --verbose and --quiet flags. Default to INFO log level.
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a file
    Upload(UploadArgs),
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Path to the file to upload
    pub file: PathBuf,

    /// Bucket code selecting the destination region (e.g. eu)
    #[arg(long, env = "ZEROFS_BUCKET_CODE")]
    pub bucket_code: String,

    /// Upload endpoint of the API server (e.g. https://zerofs.link/api/)
    #[arg(long, env = "ZEROFS_API_URL", value_parser = parse_api_url)]
    pub api_url: String,

    /// Optional note or description for the file
    #[arg(long)]
    pub note: Option<String>,

    /// Content type of the file (default: inferred from the file extension)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Authentication token (can also be set via `ZEROFS_TOKEN`)
    #[arg(long, env = "ZEROFS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to an `auth.json` token file to use instead of the default
    /// locations
    #[arg(long)]
    pub token_file: Option<PathBuf>,
}

impl Cli {
    pub fn run(
        self,
        progress: &MultiProgress,
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        match self.command {
            Command::Upload(args) => args.run(progress, out),
        }
    }
}

impl UploadArgs {
    /// Upload the file and print what the server returned.
    pub fn run(
        self,
        global_progress: &MultiProgress,
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        // Validate the file before anything touches the network
        let input = UploadFile::open(&self.file)?;
        let content_type = self
            .content_type
            .unwrap_or_else(|| input.content_type().to_string());

        info!("File: {}", input.filename);
        info!("Size: {}", HumanBytes(input.size));
        info!("Bucket code: {}", self.bucket_code);
        info!("API server: {}", self.api_url);

        let token =
            auth::resolve_token(self.token, self.token_file.as_deref());
        match token {
            None => warn!(
                "No authentication token provided. Upload will be anonymous."
            ),
            Some(_) if is_plain_http(&self.api_url) => warn!(
                "Sending the authentication token over unencrypted http."
            ),
            Some(_) => {}
        }

        let note = self
            .note
            .filter(|note| !note.is_empty())
            .map(|note| BASE64_STANDARD.encode(note));

        let client = Client::new(self.api_url.clone(), token)?;

        let progress = UploadProgress::new(global_progress, input.size);
        let result = client.upload(UploadRequest {
            filename: &input.filename,
            file_size: input.size,
            content_type: &content_type,
            bucket_code: &self.bucket_code,
            note: note.as_deref(),
            content: progress.wrap_read(input.file),
        });
        debug!("Sent {} of {} file bytes", progress.position(), input.size);
        drop(progress);

        match result {
            Ok(_) => info!("✓ Upload successful"),
            Err(_) => error!("✗ Upload failed"),
        };

        let uploaded = result?;
        handle_response(&uploaded, &self.api_url, out)
    }
}

/// Prints the references to the uploaded file, one per line.
///
/// Falls back to the raw response body when the server did not answer with
/// a recognized JSON payload.
fn handle_response(
    uploaded: &Uploaded,
    api_url: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut links = Vec::new();
    if let Some(resp) =
        uploaded.response.as_ref().filter(|r| r.has_reference())
    {
        links.extend(resp.url.iter().cloned());
        links.extend(resp.download_url.iter().cloned());
        if let Some(file_id) = &resp.file_id {
            links.push(format!("{}/{}/", site_root(api_url)?, file_id));
        }
    }
    links.dedup();

    if links.is_empty() {
        let text = uploaded.text.trim();
        if text.is_empty() {
            warn!("Server returned an empty response");
            return Ok(());
        }
        links.push(text.to_string());
    }

    for link in links {
        writeln!(out, "{link}").context("Failed to write to stdout")?;
    }
    Ok(())
}

/// The API URL with its last path segment removed, e.g.
/// `https://zerofs.link/api/` becomes `https://zerofs.link`.
fn site_root(api_url: &str) -> anyhow::Result<String> {
    let uri: Uri = api_url
        .parse()
        .with_context(|| format!("Invalid API URL: {api_url}"))?;
    let scheme = uri.scheme_str().unwrap_or("https");
    let authority = uri
        .authority()
        .with_context(|| format!("API URL has no host: {api_url}"))?;
    let path = uri.path().trim_end_matches('/');
    let parent =
        path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("");
    Ok(format!("{scheme}://{authority}{parent}"))
}

/// Whether the URL sends requests unencrypted.
fn is_plain_http(api_url: &str) -> bool {
    api_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| {
            uri.scheme_str().map(|s| s.eq_ignore_ascii_case("http"))
        })
        .unwrap_or(false)
}

/// Accepts absolute `http` and `https` URLs only.
fn parse_api_url(s: &str) -> Result<String, String> {
    let uri: Uri = s.parse().map_err(|e| format!("invalid URL: {e}"))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        _ => return Err("URL must start with http:// or https://".to_string()),
    }
    if uri.authority().is_none() {
        return Err("URL must include a host".to_string());
    }
    Ok(s.to_string())
}
