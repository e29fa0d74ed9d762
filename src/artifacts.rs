//! Per-identity output tree.
//!
//! ```text
//! <root>/<identity>/profile.jpg            avatar, optional
//! <root>/<identity>/profile.txt            name + source URL + timestamp
//! <root>/<identity>/posts/post_<n>/post_text.txt
//! <root>/<identity>/posts/post_<n>/image_<k>.jpg
//! ```
//!
//! Nothing is created before authentication succeeds; the store is only
//! constructed once an identity (or its placeholder) is known.

use crate::error::{AppError, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ArtifactStore {
    identity_dir: PathBuf,
}

impl ArtifactStore {
    pub fn create(output_root: &Path, identity: &str) -> Result<Self> {
        let identity_dir = output_root.join(sanitize_identity(identity));
        fs::create_dir_all(&identity_dir)
            .map_err(|e| AppError::Storage(format!("Failed to create identity dir: {}", e)))?;
        Ok(Self { identity_dir })
    }

    pub fn avatar_path(&self) -> PathBuf {
        self.identity_dir.join("profile.jpg")
    }

    pub fn write_profile_summary(&self, name: &str, profile_url: &str) -> Result<()> {
        let body = format!(
            "Name: {}\nProfile URL: {}\nScraped: {}\n",
            name,
            profile_url,
            Utc::now().to_rfc3339(),
        );
        fs::write(self.identity_dir.join("profile.txt"), body)
            .map_err(|e| AppError::Storage(format!("Failed to write profile summary: {}", e)))?;
        Ok(())
    }

    pub fn post_dir(&self, ordinal: usize) -> PathBuf {
        self.identity_dir.join("posts").join(format!("post_{}", ordinal))
    }

    pub fn write_post_text(&self, ordinal: usize, text: &str) -> Result<()> {
        let dir = self.post_dir(ordinal);
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Storage(format!("Failed to create post dir: {}", e)))?;
        fs::write(dir.join("post_text.txt"), text)
            .map_err(|e| AppError::Storage(format!("Failed to write post text: {}", e)))?;
        Ok(())
    }

    pub fn image_path(&self, ordinal: usize, image_index: usize) -> PathBuf {
        self.post_dir(ordinal).join(format!("image_{}.jpg", image_index))
    }
}

/// Folder-safe identity: whitespace becomes underscores, path separators are
/// stripped.
pub fn sanitize_identity(identity: &str) -> String {
    let cleaned: String = identity
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| !matches!(c, '/' | '\\' | ':'))
        .collect();
    if cleaned.is_empty() {
        "unknown_user".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_identity() {
        assert_eq!(sanitize_identity("Jane Doe"), "Jane_Doe");
        assert_eq!(sanitize_identity(" a/b\\c: "), "abc");
        assert_eq!(sanitize_identity("   "), "unknown_user");
    }

    #[test]
    fn test_layout_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path(), "Jane Doe").unwrap();

        assert_eq!(store.avatar_path(), dir.path().join("Jane_Doe/profile.jpg"));
        assert_eq!(
            store.image_path(2, 1),
            dir.path().join("Jane_Doe/posts/post_2/image_1.jpg")
        );
    }

    #[test]
    fn test_profile_summary_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path(), "Jane Doe").unwrap();
        store
            .write_profile_summary("Jane Doe", "https://example.com/in/jane-doe/")
            .unwrap();

        let body = std::fs::read_to_string(dir.path().join("Jane_Doe/profile.txt")).unwrap();
        assert!(body.contains("Name: Jane Doe"));
        assert!(body.contains("Profile URL: https://example.com/in/jane-doe/"));
    }

    #[test]
    fn test_post_text_write_creates_post_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path(), "x").unwrap();
        store.write_post_text(3, "hello world").unwrap();

        let body = std::fs::read_to_string(dir.path().join("x/posts/post_3/post_text.txt")).unwrap();
        assert_eq!(body, "hello world");
    }
}
