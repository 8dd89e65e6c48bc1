//! Asset Store - Uploads, Exports, Collision-Free Naming
//!
//! References inside element lists are opaque strings; resolution failure
//! is not an error, only a placeholder-drawing fallback for the renderer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Descriptor returned for a stored upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAsset {
    pub id: String,
    pub url: String,
}

/// Blob store for uploaded packshots and exported creatives.
///
/// Concurrent writers are safe because every stored file gets a fresh
/// uuid-based name; reads are shared.
#[derive(Debug, Clone)]
pub struct AssetStore {
    uploads_dir: PathBuf,
    exports_dir: PathBuf,
}

/// Fresh name for an upload, preserving the original extension.
pub fn unique_filename(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("bin");
    format!("{}.{}", Uuid::new_v4(), ext)
}

impl AssetStore {
    pub fn new(uploads_dir: impl Into<PathBuf>, exports_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            exports_dir: exports_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    /// Store raw upload bytes under a collision-free name.
    pub fn save_upload(&self, contents: &[u8], original_name: &str) -> io::Result<StoredAsset> {
        fs::create_dir_all(&self.uploads_dir)?;
        let name = unique_filename(original_name);
        fs::write(self.uploads_dir.join(&name), contents)?;
        debug!("stored upload {} ({} bytes)", name, contents.len());
        Ok(StoredAsset {
            url: format!("/uploads/{}", name),
            id: name,
        })
    }

    /// Resolve an opaque reference to a stored upload.
    ///
    /// Accepts bare filenames or url-style references; only the final
    /// path component is honored, so references cannot escape the
    /// uploads directory. Absent files resolve to `None`.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let name = reference.rsplit('/').next()?;
        if name.is_empty() {
            return None;
        }
        let path = self.uploads_dir.join(name);
        path.is_file().then_some(path)
    }

    /// Persist exported bytes under a fresh `.jpg` name.
    pub fn save_export(&self, contents: &[u8]) -> io::Result<(String, PathBuf)> {
        fs::create_dir_all(&self.exports_dir)?;
        let name = format!("{}.jpg", Uuid::new_v4());
        let path = self.exports_dir.join(&name);
        fs::write(&path, contents)?;
        Ok((name, path))
    }
}

/// External cutout service contract: succeeds or it doesn't.
///
/// On success the implementation has written a transparent-background
/// image to `output`; on failure callers keep using the original.
pub trait BackgroundRemoval {
    fn remove_background(&self, input: &Path, output: &Path) -> bool;
}

/// Stand-in used when no cutout service is wired up.
pub struct UnavailableBackgroundRemoval;

impl BackgroundRemoval for UnavailableBackgroundRemoval {
    fn remove_background(&self, _input: &Path, _output: &Path) -> bool {
        false
    }
}
