//! Upload storage on the local filesystem
//!
//! Files are stored under the configured uploads directory, named by the
//! blake3 hash of their content plus the original extension. Identical
//! uploads therefore land on the same file and re-uploading is harmless.

use crate::app_config::APP_CONFIG;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Create the uploads directory if it doesn't exist.
/// Panics; called once at startup.
pub fn init() {
    let dir = upload_dir();
    fs::create_dir_all(&dir).expect("Failed to create the uploads directory.");
    log::info!("Upload storage initialized at {:?}", dir);
}

pub fn upload_dir() -> PathBuf {
    PathBuf::from(&APP_CONFIG.uploads.directory)
}

/// Write uploaded bytes to storage and return the stored filename.
pub fn store_upload(bytes: &[u8], extension: &str) -> io::Result<String> {
    let hash = blake3::hash(bytes);
    let filename = if extension.is_empty() {
        hash.to_string()
    } else {
        format!("{}.{}", hash, extension)
    };

    let path = upload_dir().join(&filename);
    if !path.exists() {
        fs::write(&path, bytes)?;
    }

    Ok(filename)
}

/// Lowercased extension of a client-supplied filename, stripped of
/// anything that could escape the uploads directory.
pub fn sanitized_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ext.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_lowercase()
        })
        .unwrap_or_default()
}
