use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

/// Catalog key for 64-bit hosts.
pub const PLUGIN_CATALOG_KEY_64: &str = "plugin-catalog-64";
/// Catalog key for 32-bit hosts.
pub const PLUGIN_CATALOG_KEY_32: &str = "plugin-catalog-32";

/// The catalog key for this process. The two keys are mutually exclusive so
/// catalogs written by an incompatible host architecture are never loaded.
pub fn plugin_catalog_key() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        PLUGIN_CATALOG_KEY_64
    } else {
        PLUGIN_CATALOG_KEY_32
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Key-value property store the plugin manager persists through.
pub trait SettingsStore {
    fn get_value(&self, key: &str) -> Option<&str>;
    fn set_value(&mut self, key: &str, value: &str);
}

/// File-backed settings store keeping string values in a flat JSON object.
#[derive(Debug, Default)]
pub struct JsonSettings {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl JsonSettings {
    /// A store that never touches disk. Useful for tests and transient
    /// sessions.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let mut config_dir = dirs::config_dir().ok_or_else(|| {
            SettingsError::Read(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no config directory",
            ))
        })?;
        config_dir.push("modula");
        fs::create_dir_all(&config_dir)?;
        config_dir.push("settings.json");
        Ok(config_dir)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettings {
    fn get_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn set_value(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
    }
}
