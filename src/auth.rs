//! Authentication token resolution.
//!
//! The token comes from `--token` (or `ZEROFS_TOKEN`) when given. Otherwise it
//! is read from an `auth.json` credentials file of the form
//! `{"token": "..."}`. The file is looked up next to the running executable,
//! then in the current directory, then in the platform config directory
//! (`~/.config/zerofs/auth.json` on Linux). This tool never writes the file.

use log::{debug, warn};
use serde::Deserialize;
use std::{
    env,
    error::Error,
    fmt, fs, io,
    path::{Path, PathBuf},
};

pub const CREDENTIALS_FILE_NAME: &str = "auth.json";
const APPLICATION: &str = "zerofs";

/// The contents of an `auth.json` credentials file.
#[derive(Deserialize, Default)]
#[cfg_attr(test, derive(Debug, Clone, PartialEq, Eq))]
pub struct Credentials {
    /// Upload token issued by the ZeroFS service.
    pub token: Option<String>,
}

/// Errors that can occur while loading a credentials file.
#[derive(Debug)]
pub enum AuthError {
    /// The credentials file does not exist
    NotFound,
    /// I/O error reading the credentials file
    Io(io::Error),
    /// Failed to deserialize the credentials file
    Deserialize(serde_json::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotFound => write!(f, "Credentials file not found"),
            AuthError::Io(err) => {
                write!(f, "I/O error reading credentials file: {err}")
            }
            AuthError::Deserialize(err) => {
                write!(f, "Failed to parse credentials file: {err}")
            }
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AuthError::Io(err) => Some(err),
            AuthError::Deserialize(err) => Some(err),
            AuthError::NotFound => None,
        }
    }
}

impl From<io::Error> for AuthError {
    fn from(err: io::Error) -> Self {
        AuthError::Io(err)
    }
}

/// Default locations searched for `auth.json`, in priority order.
fn default_credentials_paths() -> Vec<PathBuf> {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = env::current_dir().ok();
    let config_dir = directories::ProjectDirs::from("", "", APPLICATION)
        .map(|dirs| dirs.config_dir().to_path_buf());

    [exe_dir, cwd, config_dir]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CREDENTIALS_FILE_NAME))
        .collect()
}

impl Credentials {
    /// Tries to load credentials from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Credentials, AuthError> {
        debug!("Attempting to load credentials from: {}", path.display());
        let contents = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(ref err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(AuthError::NotFound)
            }
            Err(err) => return Err(AuthError::Io(err)),
        };
        serde_json::from_str::<Credentials>(&contents)
            .map_err(AuthError::Deserialize)
    }

    /// Loads credentials from the first of `paths` that exists.
    ///
    /// A file that exists but cannot be read or parsed is logged and treated
    /// as holding no token; the search stops there.
    pub fn load_first(paths: &[PathBuf]) -> Credentials {
        for path in paths {
            match Credentials::load_from_path(path) {
                Ok(creds) => {
                    debug!("Credentials loaded from: {}", path.display());
                    return creds;
                }
                Err(AuthError::NotFound) => continue,
                Err(err) => {
                    warn!(
                        "Could not load token from {}: {err}",
                        path.display()
                    );
                    return Credentials::default();
                }
            }
        }
        Credentials::default()
    }
}

/// Resolves the token to upload with.
///
/// An explicit token always wins. Otherwise the token is read from
/// `token_file` if given, else from the default `auth.json` locations. Empty
/// tokens count as absent.
pub fn resolve_token(
    explicit: Option<String>,
    token_file: Option<&Path>,
) -> Option<String> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        debug!("Using token from command line");
        return Some(token);
    }

    let paths = match token_file {
        Some(path) => vec![path.to_path_buf()],
        None => default_credentials_paths(),
    };

    Credentials::load_first(&paths)
        .token
        .filter(|t| !t.is_empty())
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_credentials(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(CREDENTIALS_FILE_NAME);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_paths_end_with_file_name() {
        let paths = default_credentials_paths();
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|p| p.ends_with(CREDENTIALS_FILE_NAME)));
    }

    #[test]
    fn test_load_non_existent() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(CREDENTIALS_FILE_NAME);

        let result = Credentials::load_from_path(&path);
        assert!(matches!(result, Err(AuthError::NotFound)));
    }

    #[test]
    fn test_load_token() {
        let temp_dir = tempdir().unwrap();
        let path = write_credentials(&temp_dir, r#"{"token": "T"}"#);

        let creds = Credentials::load_from_path(&path).unwrap();
        assert_eq!(
            creds,
            Credentials {
                token: Some("T".to_string())
            }
        );
    }

    #[test]
    fn test_load_ignores_unknown_fields() {
        let temp_dir = tempdir().unwrap();
        let path = write_credentials(
            &temp_dir,
            r#"{"token": "abc", "user": "someone"}"#,
        );

        let creds = Credentials::load_from_path(&path).unwrap();
        assert_eq!(creds.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_load_malformed() {
        let temp_dir = tempdir().unwrap();
        let path = write_credentials(&temp_dir, "{not json");

        let result = Credentials::load_from_path(&path);
        assert!(matches!(result, Err(AuthError::Deserialize(_))));
    }

    #[test]
    fn test_load_first_skips_missing_files() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");
        let present = write_credentials(&temp_dir, r#"{"token": "second"}"#);

        let creds = Credentials::load_first(&[missing, present]);
        assert_eq!(creds.token.as_deref(), Some("second"));
    }

    #[test]
    fn test_load_first_stops_at_malformed_file() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let bad = write_credentials(&first, "[]");
        let good = write_credentials(&second, r#"{"token": "T"}"#);

        let creds = Credentials::load_first(&[bad, good]);
        assert_eq!(creds, Credentials::default());
    }

    #[test]
    fn test_explicit_token_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let path = write_credentials(&temp_dir, r#"{"token": "from-file"}"#);

        let token = resolve_token(Some("from-flag".to_string()), Some(&path));
        assert_eq!(token.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_token_falls_back_to_file() {
        let temp_dir = tempdir().unwrap();
        let path = write_credentials(&temp_dir, r#"{"token": "T"}"#);

        let token = resolve_token(None, Some(&path));
        assert_eq!(token.as_deref(), Some("T"));
    }

    #[test]
    fn test_no_token_sources() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(CREDENTIALS_FILE_NAME);

        assert_eq!(resolve_token(None, Some(&path)), None);
    }

    #[test]
    fn test_malformed_file_means_no_token() {
        let temp_dir = tempdir().unwrap();
        let path = write_credentials(&temp_dir, r#"{"token": 42}"#);

        assert_eq!(resolve_token(None, Some(&path)), None);
    }

    #[test]
    fn test_empty_tokens_are_absent() {
        let temp_dir = tempdir().unwrap();
        let path = write_credentials(&temp_dir, r#"{"token": ""}"#);

        assert_eq!(resolve_token(Some(String::new()), Some(&path)), None);
    }
}
