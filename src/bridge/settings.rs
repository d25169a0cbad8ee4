use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Default location of the persisted settings file.
pub const DEFAULT_SETTINGS_PATH: &str = ".salla-agent.json";

/// User overrides persisted next to the client. Blank values count as unset;
/// anything else is kept exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "agent_api_url", default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(rename = "agent_api_key", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Settings {
    pub fn endpoint(&self) -> Option<&str> {
        non_blank(self.endpoint.as_deref())
    }

    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    /// Drops blank values so they are never written back.
    pub fn normalized(self) -> Self {
        Self {
            endpoint: self.endpoint().map(str::to_string),
            api_key: self.api_key().map(str::to_string),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Local key-value store for the bridge's endpoint override and credential.
///
/// Loading never fails: anything unreadable is treated as "no overrides".
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Settings;

    fn save(&self, settings: &Settings) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}", self.path.display());
                return Settings::default();
            }
            Err(e) => {
                warn!("Failed to read settings from {}: {}", self.path.display(), e);
                return Settings::default();
            }
        };

        match serde_json::from_str::<Settings>(&contents) {
            Ok(settings) => settings.normalized(),
            Err(e) => {
                warn!("Ignoring corrupt settings file {}: {}", self.path.display(), e);
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(&settings.clone().normalized())?;
        std::fs::write(&self.path, json).map_err(|e| {
            Error::settings(format!(
                "Failed to write settings to {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings.normalized()),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Settings {
        self.settings
            .read()
            .map(|settings| settings.clone())
            .unwrap_or_default()
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let mut current = self
            .settings
            .write()
            .map_err(|_| Error::internal("settings lock poisoned"))?;
        *current = settings.clone().normalized();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(&Settings::default())
    }
}
