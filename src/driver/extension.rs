//! Bridge extension sources.
//!
//! | Format | Description |
//! |--------|-------------|
//! | Unpacked | Directory containing `manifest.json` |
//! | Packed | `.xpi` or `.zip` archive |
//! | Base64 | Base64-encoded `.xpi` content |

use std::path::{Path, PathBuf};

/// Where the bridge extension is installed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtensionSource {
    /// Unpacked extension directory.
    Unpacked(PathBuf),
    /// Packed `.xpi`/`.zip` archive.
    Packed(PathBuf),
    /// Base64-encoded `.xpi`, for extensions embedded in a binary.
    Base64(String),
}

impl ExtensionSource {
    /// Unpacked extension directory.
    #[inline]
    #[must_use]
    pub fn unpacked(path: impl Into<PathBuf>) -> Self {
        Self::Unpacked(path.into())
    }

    /// Packed archive.
    #[inline]
    #[must_use]
    pub fn packed(path: impl Into<PathBuf>) -> Self {
        Self::Packed(path.into())
    }

    /// Base64-encoded archive.
    #[inline]
    #[must_use]
    pub fn base64(data: impl Into<String>) -> Self {
        Self::Base64(data.into())
    }

    /// Filesystem path, for file-based sources.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Unpacked(path) | Self::Packed(path) => Some(path),
            Self::Base64(_) => None,
        }
    }
}

/// Directories are unpacked extensions; anything else is an archive.
impl From<PathBuf> for ExtensionSource {
    fn from(path: PathBuf) -> Self {
        if path.is_dir() {
            Self::Unpacked(path)
        } else {
            Self::Packed(path)
        }
    }
}

impl From<&str> for ExtensionSource {
    fn from(path: &str) -> Self {
        Self::from(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_detects_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(matches!(
            ExtensionSource::from(dir.path().to_path_buf()),
            ExtensionSource::Unpacked(_)
        ));
        assert!(matches!(
            ExtensionSource::from("/nonexistent/bridge.xpi"),
            ExtensionSource::Packed(_)
        ));
    }

    #[test]
    fn test_path_accessor() {
        assert_eq!(
            ExtensionSource::packed("bridge.xpi").path(),
            Some(Path::new("bridge.xpi"))
        );
        assert_eq!(ExtensionSource::base64("UEsDBBQ").path(), None);
    }
}
