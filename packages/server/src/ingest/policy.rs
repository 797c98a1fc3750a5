use std::collections::HashSet;

use crate::config::UploadConfig;
use crate::utils::filename::extension_of;

use super::error::UploadRejection;

/// Allow-lists and limits applied to every upload.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    extensions: HashSet<String>,
    mimes: HashSet<String>,
    max_file_size: u64,
}

impl UploadPolicy {
    pub fn new<E, M>(extensions: E, mimes: M, max_file_size: u64) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        let mimes = mimes
            .into_iter()
            .map(|m| m.as_ref().trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty())
            .collect();

        Self {
            extensions,
            mimes,
            max_file_size,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            &config.allowed_extensions,
            &config.allowed_mimes,
            config.max_file_size,
        )
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Check the client filename and return its allow-listed extension
    /// (lowercase, with leading dot).
    pub fn check_filename(&self, filename: &str) -> Result<String, UploadRejection> {
        if filename.trim().is_empty() {
            return Err(UploadRejection::EmptyName);
        }

        extension_of(filename)
            .filter(|ext| self.extensions.contains(ext))
            .ok_or(UploadRejection::ExtensionNotAllowed)
    }

    pub fn allows_mime(&self, mime: &str) -> bool {
        self.mimes.contains(&mime.to_ascii_lowercase())
    }
}

/// `"PDF"` and `".pdf"` both become `".pdf"`. Entries that could not appear
/// in a storage key are dropped.
fn normalize_extension(raw: &str) -> Option<String> {
    let body = raw.trim().trim_start_matches('.').to_ascii_lowercase();
    let valid = !body.is_empty()
        && body.len() < 16
        && body.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
    if valid {
        Some(format!(".{body}"))
    } else {
        tracing::warn!("Ignoring unusable allowed extension {raw:?}");
        None
    }
}
