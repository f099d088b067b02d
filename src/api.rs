//! Wire types for the ZeroFS upload endpoint.

use serde::Deserialize;

#[cfg(test)]
mod tests;

/// Successful upload response.
///
/// The service answers with JSON naming the stored object. All fields are
/// optional since deployments differ in which of them they return.
#[derive(Debug, Default, Deserialize)]
pub struct UploadResponse {
    /// Direct link to the uploaded object
    #[serde(default)]
    pub url: Option<String>,

    /// Download link for the uploaded object
    #[serde(default)]
    pub download_url: Option<String>,

    /// Identifier of the file page, relative to the site root
    #[serde(default, deserialize_with = "string_or_number")]
    pub file_id: Option<String>,
}

impl UploadResponse {
    /// Whether the response names the uploaded object in any way.
    pub fn has_reference(&self) -> bool {
        self.url.is_some()
            || self.download_url.is_some()
            || self.file_id.is_some()
    }
}

/// Error payload returned alongside a non-success status.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.detail).or(self.message)
    }
}

/// Extracts the human-readable message from an error body, falling back to
/// the trimmed body text when it is not a recognized JSON error payload.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(ErrorResponse::into_message)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Accepts `"abc"` as well as `123` for identifiers.
fn string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(de)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
