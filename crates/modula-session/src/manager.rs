use std::sync::Arc;

use thiserror::Error;

use modula_plugin_db::{PluginCatalog, PluginDescription};
use modula_plugin_host::{
    FormatRegistry, PlayConfig, PluginFormat, PluginProcessor, INTERNAL_FORMAT_NAME,
};
use modula_plugin_scanner::DirectoryScanner;

use crate::settings::{plugin_catalog_key, SettingsStore};

/// Failures surfaced by [`PluginManager::create_plugin_instance`]. Always
/// data, never a panic: third-party plugin binaries are untrusted and a bad
/// one must not take the session down.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no backend registered for format {format:?}")]
    FormatUnavailable { format: String },
    #[error("{0}")]
    Instantiation(String),
}

/// Facade owning the format registry, the known-plugin catalog and the
/// process-wide playback configuration.
///
/// The manager is a passive coordinator with one ordering requirement: the
/// registry must be populated (via [`add_default_formats`] or
/// [`add_format`]) before instantiation or internal scanning can succeed for
/// a format.
///
/// [`add_default_formats`]: PluginManager::add_default_formats
/// [`add_format`]: PluginManager::add_format
pub struct PluginManager {
    formats: FormatRegistry,
    catalog: Arc<PluginCatalog>,
    play_config: PlayConfig,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            formats: FormatRegistry::new(),
            catalog: Arc::new(PluginCatalog::new()),
            play_config: PlayConfig::default(),
        }
    }

    /// Registers the baseline backends for this build. Call exactly once;
    /// repeated calls append duplicates.
    pub fn add_default_formats(&mut self) {
        self.formats.add_default_formats();
    }

    pub fn add_format(&mut self, format: Box<dyn PluginFormat>) {
        self.formats.add_format(format);
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn formats_mut(&mut self) -> &mut FormatRegistry {
        &mut self.formats
    }

    pub fn catalog(&self) -> &Arc<PluginCatalog> {
        &self.catalog
    }

    pub fn play_config(&self) -> PlayConfig {
        self.play_config
    }

    /// Updates the playback configuration used by later instantiations.
    /// Instances already created are unaffected.
    pub fn set_play_config(&mut self, sample_rate: f64, block_size: u32) {
        self.play_config = PlayConfig::new(sample_rate, block_size);
    }

    /// Creates a fresh plugin instance for `description`, handing ownership
    /// to the caller. Backend diagnostics are passed through verbatim.
    pub fn create_plugin_instance(
        &self,
        description: &PluginDescription,
    ) -> Result<Box<dyn PluginProcessor>, HostError> {
        let format = self.formats.find_by_name(&description.format).ok_or_else(|| {
            HostError::FormatUnavailable {
                format: description.format.clone(),
            }
        })?;
        format
            .instantiate(description, self.play_config)
            .map_err(|err| HostError::Instantiation(err.to_string()))
    }

    /// Scans the native format's default locations to exhaustion, merging
    /// first-party plugins into the catalog. These ship with the host, so
    /// probing is in-process and needs no pedal file. A no-op when the native
    /// format is not registered.
    pub fn scan_internal_plugins(&self) {
        let Some(format) = self.formats.find_by_name(INTERNAL_FORMAT_NAME) else {
            return;
        };
        let locations = format.default_search_locations();
        let mut scanner = DirectoryScanner::new(
            Arc::clone(&self.catalog),
            format,
            &locations,
            true,
            None,
        );
        while scanner.scan_next_file(false).is_some() {}
        for failure in scanner.failures() {
            log::warn!(
                "internal plugin scan: {}: {}",
                failure.path.display(),
                failure.reason
            );
        }
    }

    /// Persists the catalog under this architecture's key.
    pub fn save_known_plugins(&self, store: &mut dyn SettingsStore) {
        let document = self.catalog.serialize();
        store.set_value(plugin_catalog_key(), &document.to_string());
    }

    /// Restores the catalog from this architecture's key, then re-scans
    /// internal plugins: first-party entries are never persisted reliably
    /// since they can move between builds.
    pub fn restore_known_plugins(&self, store: &dyn SettingsStore) {
        if let Some(raw) = store.get_value(plugin_catalog_key()) {
            match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(document) => {
                    self.catalog.restore(&document);
                }
                Err(err) => {
                    log::warn!("discarding unreadable plugin catalog: {err}");
                }
            }
        }
        self.scan_internal_plugins();
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
