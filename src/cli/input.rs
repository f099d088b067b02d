//! Upload file input handling

use anyhow::{bail, Context};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::multipart;

/// A local file that has been checked and opened for upload.
#[derive(Debug)]
pub struct UploadFile {
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
    pub file: File,
}

impl UploadFile {
    /// Opens `path` for upload.
    ///
    /// Fails if the path does not exist, is not a regular file, cannot be
    /// opened for reading, or is empty. Nothing touches the network before
    /// this succeeds.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                bail!("File not found: {}", path.display())
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to access file: {}", path.display())
                })
            }
        };

        if !metadata.is_file() {
            bail!("Not a regular file: {}", path.display());
        }
        if metadata.len() == 0 {
            bail!("Refusing to upload empty file: {}", path.display());
        }

        let file = File::open(path).with_context(|| {
            format!("Failed to open file for reading: {}", path.display())
        })?;

        let path =
            std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| {
                format!("Path has no file name: {}", path.display())
            })?;

        Ok(Self {
            size: metadata.len(),
            path,
            filename,
            file,
        })
    }

    /// The MIME type to declare, unless overridden on the command line.
    pub fn content_type(&self) -> &'static str {
        multipart::mime_from_filename(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_open_regular_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"some notes").unwrap();

        let mut upload = UploadFile::open(&path).unwrap();
        assert_eq!(upload.filename, "notes.txt");
        assert_eq!(upload.size, 10);
        assert_eq!(upload.content_type(), "text/plain");
        assert!(upload.path.is_absolute());

        let mut contents = Vec::new();
        upload.file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"some notes");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.zip");

        let err = UploadFile::open(&path).unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }

    #[test]
    fn test_open_directory() {
        let dir = tempdir().unwrap();

        let err = UploadFile::open(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Not a regular file"));
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let err = UploadFile::open(&path).unwrap_err();
        assert!(err.to_string().contains("empty file"));
    }
}
