//! Firefox profile preparation.
//!
//! A launched window gets a profile with the bridge extension installed and
//! a `user.js` that keeps Firefox quiet: no first-run UI, no telemetry, no
//! update checks, and unsigned extensions allowed.
//!
//! # Example
//!
//! ```no_run
//! use nav_resolver::driver::{ExtensionSource, Profile};
//!
//! # fn example() -> nav_resolver::Result<()> {
//! let profile = Profile::new_temp()?;
//! profile.write_prefs(&Profile::automation_prefs())?;
//! profile.install_extension(&ExtensionSource::unpacked("./extension"))?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::Value;
use tempfile::TempDir;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{Error, Result};

use super::ExtensionSource;

// ============================================================================
// Constants
// ============================================================================

const USER_JS_HEADER: &str = "// nav-resolver user.js\n// Generated, do not edit.\n\n";

// ============================================================================
// Pref
// ============================================================================

/// Value of a `user.js` preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefValue {
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i32),
    /// String.
    Str(String),
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(&serde_json::to_string(s).map_err(|_| fmt::Error)?),
        }
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for PrefValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// One `user_pref(...)` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pref {
    /// Preference name.
    pub name: String,
    /// Preference value.
    pub value: PrefValue,
}

impl Pref {
    /// Creates a preference.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Renders the `user.js` line.
    #[must_use]
    pub fn to_user_pref_line(&self) -> String {
        format!(
            "user_pref({}, {});",
            PrefValue::Str(self.name.clone()),
            self.value
        )
    }
}

// ============================================================================
// Profile
// ============================================================================

/// A Firefox profile directory.
///
/// Temporary profiles are deleted when dropped; profiles opened with
/// [`from_path`](Self::from_path) persist.
pub struct Profile {
    _temp_dir: Option<TempDir>,
    path: PathBuf,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("path", &self.path)
            .field("temporary", &self._temp_dir.is_some())
            .finish()
    }
}

impl Profile {
    /// Creates a temporary profile.
    ///
    /// # Errors
    ///
    /// [`Error::Profile`] if the directory cannot be created.
    pub fn new_temp() -> Result<Self> {
        let temp_dir = TempDir::with_prefix("nav-resolver-")
            .map_err(|e| Error::profile(format!("Failed to create temp profile: {e}")))?;

        let path = temp_dir.path().to_path_buf();
        debug!(path = %path.display(), "Created temporary profile");

        Ok(Self {
            _temp_dir: Some(temp_dir),
            path,
        })
    }

    /// Uses `path` as the profile, creating it if needed.
    ///
    /// # Errors
    ///
    /// [`Error::Profile`] if the directory cannot be created.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path).map_err(|e| {
            Error::profile(format!(
                "Failed to create profile directory at {}: {e}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "Using profile directory");

        Ok(Self {
            _temp_dir: None,
            path,
        })
    }

    /// Returns the profile directory.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `prefs` to `user.js`, replacing any previous file.
    ///
    /// # Errors
    ///
    /// [`Error::Profile`] if the file cannot be written.
    pub fn write_prefs(&self, prefs: &[Pref]) -> Result<()> {
        let file_path = self.path.join("user.js");

        let mut content = String::from(USER_JS_HEADER);
        for pref in prefs {
            content.push_str(&pref.to_user_pref_line());
            content.push('\n');
        }

        fs::write(&file_path, content).map_err(|e| {
            Error::profile(format!(
                "Failed to write user.js at {}: {e}",
                file_path.display()
            ))
        })?;

        debug!(path = %file_path.display(), pref_count = prefs.len(), "Wrote user.js");
        Ok(())
    }

    /// Preferences for unattended navigation runs.
    #[must_use]
    pub fn automation_prefs() -> Vec<Pref> {
        vec![
            // Bridge extension
            Pref::new("xpinstall.signatures.required", false),
            Pref::new("extensions.autoDisableScopes", 0),
            Pref::new("extensions.webextensions.restrictedDomains", ""),
            Pref::new("security.data_uri.block_toplevel_data_uri_navigations", false),
            // Startup
            Pref::new("browser.startup.page", 0),
            Pref::new("browser.shell.checkDefaultBrowser", false),
            Pref::new("browser.startup.homepage_override.mstone", "ignore"),
            Pref::new("startup.homepage_welcome_url", ""),
            Pref::new("browser.sessionstore.resume_from_crash", false),
            Pref::new("browser.aboutConfig.showWarning", false),
            Pref::new("browser.uitour.enabled", false),
            Pref::new("browser.warnOnQuit", false),
            // Telemetry and updates
            Pref::new("toolkit.telemetry.enabled", false),
            Pref::new("toolkit.telemetry.unified", false),
            Pref::new("datareporting.policy.dataSubmissionEnabled", false),
            Pref::new("datareporting.healthreport.uploadEnabled", false),
            Pref::new("app.update.service.enabled", false),
            Pref::new("extensions.update.enabled", false),
            Pref::new("app.normandy.enabled", false),
            // Popups from click handlers land in the same window
            Pref::new("browser.link.open_newwindow", 1),
            Pref::new("browser.link.open_newwindow.restriction", 0),
            Pref::new("dom.disable_beforeunload", true),
        ]
    }

    /// Installs the bridge extension.
    ///
    /// # Errors
    ///
    /// [`Error::Profile`] if the source is unreadable or has no gecko ID.
    pub fn install_extension(&self, source: &ExtensionSource) -> Result<()> {
        match source {
            ExtensionSource::Unpacked(path) => self.install_unpacked(path),
            ExtensionSource::Packed(path) => self.install_packed(path),
            ExtensionSource::Base64(data) => {
                let bytes = Base64Standard
                    .decode(data)
                    .map_err(|e| Error::profile(format!("Invalid base64 extension data: {e}")))?;

                let temp_dir = TempDir::new()?;
                let xpi = temp_dir.path().join("extension.xpi");
                fs::write(&xpi, bytes)?;
                self.install_packed(&xpi)
            }
        }
    }

    fn install_unpacked(&self, src: &Path) -> Result<()> {
        let extension_id = read_manifest_id(src)?;
        let dest = self.path.join("extensions").join(&extension_id);

        copy_dir_recursive(src, &dest)?;
        debug!(%extension_id, dest = %dest.display(), "Installed extension");
        Ok(())
    }

    fn install_packed(&self, src: &Path) -> Result<()> {
        let file = fs::File::open(src)?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| Error::profile(format!("Invalid extension archive: {e}")))?;

        let extracted = TempDir::new()?;
        archive
            .extract(extracted.path())
            .map_err(|e| Error::profile(format!("Failed to extract extension: {e}")))?;

        self.install_unpacked(extracted.path())
    }
}

// ============================================================================
// Private Helpers
// ============================================================================

/// Reads the gecko ID from `manifest.json`.
fn read_manifest_id(dir: &Path) -> Result<String> {
    let manifest_path = dir.join("manifest.json");
    let content = fs::read_to_string(&manifest_path).map_err(|e| {
        Error::profile(format!(
            "Extension manifest not found at {}: {e}",
            manifest_path.display()
        ))
    })?;

    let json: Value = serde_json::from_str(&content)
        .map_err(|e| Error::profile(format!("Invalid manifest.json: {e}")))?;

    ["/browser_specific_settings/gecko/id", "/applications/gecko/id"]
        .iter()
        .find_map(|pointer| json.pointer(pointer).and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| Error::profile("Extension manifest missing 'gecko.id' field"))
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &dst_path)?;
        } else {
            fs::copy(entry.path(), &dst_path)?;
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
