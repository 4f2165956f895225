//! User settings changed from the command line: the selected email client
//! and whether recipient names go into the URI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MailtoError, Result};

/// An email client application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientApp {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub bundle_id: Option<String>,
}

impl ClientApp {
    pub fn from_bundle_id(bundle_id: &str) -> Self {
        Self {
            bundle_id: Some(bundle_id.to_string()),
            ..Self::default()
        }
    }

    /// An app bundle on disk; the name is the bundle's file name without
    /// `.app`.
    pub fn from_path(path: &Path, bundle_id: Option<String>) -> Self {
        Self {
            name: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
            path: Some(path.to_path_buf()),
            bundle_id,
        }
    }

    /// Label for listings: the name, else the bundle ID.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.bundle_id.as_deref())
            .unwrap_or("(unnamed)")
    }

    /// What to pass to the launcher: the app path, else its name, else
    /// its bundle ID.
    pub fn launch_target(&self) -> Option<String> {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| self.name.clone())
            .or_else(|| self.bundle_id.clone())
    }
}

/// Persisted user state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Explicitly selected client; `None` follows the system default.
    pub client: Option<ClientApp>,
    /// Include recipient names (still subject to the client's rules).
    pub use_names: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client: None,
            use_names: true,
        }
    }
}

/// Storage for [`Settings`].
pub trait SettingsStore {
    fn get(&self) -> &Settings;
    fn set(&mut self, settings: Settings);
    /// Persist the current settings.
    fn save(&self) -> Result<()>;
}

/// Settings that live only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    settings: Settings,
}

impl MemorySettings {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self) -> &Settings {
        &self.settings
    }

    fn set(&mut self, settings: Settings) {
        self.settings = settings;
    }

    fn save(&self) -> Result<()> {
        Ok(())
    }
}

/// Settings kept as JSON in the data directory.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    settings: Settings,
}

impl FileSettings {
    /// Load from `path`, falling back to defaults when the file does not
    /// exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = if path.exists() {
            let data = std::fs::read(&path).map_err(|e| MailtoError::io(&path, e))?;
            let settings = serde_json::from_slice(&data)
                .map_err(|e| MailtoError::Settings(format!("{}: {e}", path.display())))?;
            tracing::info!(path = %path.display(), "Loaded settings");
            settings
        } else {
            Settings::default()
        };
        Ok(Self { path, settings })
    }
}

impl SettingsStore for FileSettings {
    fn get(&self) -> &Settings {
        &self.settings
    }

    fn set(&mut self, settings: Settings) {
        self.settings = settings;
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MailtoError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| MailtoError::Settings(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| MailtoError::io(&self.path, e))?;
        tracing::info!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}
