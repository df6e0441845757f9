use std::fmt;
use std::path::{Path, PathBuf};

use modula_plugin_db::PluginDescription;

use crate::config::PlayConfig;
use crate::error::{InstantiateError, ProbeError};

/// A live, runnable plugin created from a description plus playback
/// configuration.
///
/// Ownership transfers to the caller at creation; the manager never retains
/// instances. Callers adapt this capability into their own graph-node
/// abstraction.
pub trait PluginProcessor: Send {
    fn description(&self) -> &PluginDescription;

    /// Reconfigures the processor for a new playback configuration. Called
    /// once by the backend before the instance is handed out.
    fn prepare(&mut self, config: PlayConfig);

    /// Processes one block of interleaved stereo samples in place.
    fn process(&mut self, buffer: &mut [f32]);

    fn reset(&mut self) {}
}

impl fmt::Debug for dyn PluginProcessor + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginProcessor")
            .field("description", self.description())
            .finish()
    }
}

/// Technology-specific adapter capable of scanning for and instantiating
/// plugins of one plugin standard.
///
/// Backends are registered once with the [`FormatRegistry`] and live for the
/// process duration. They are addressed by `name()`, which is also the value
/// stored in [`PluginDescription::format`].
///
/// [`FormatRegistry`]: crate::FormatRegistry
pub trait PluginFormat {
    /// Registered name, matched exactly and case-sensitively.
    fn name(&self) -> &str;

    /// Default locations to search: directories, files, or backend-specific
    /// URIs such as `builtin:`.
    fn default_search_locations(&self) -> Vec<PathBuf>;

    /// Probes one candidate. A candidate may yield zero (not ours), one, or
    /// several descriptions (a file can bundle multiple plugins).
    fn scan_candidate(&self, path: &Path) -> Result<Vec<PluginDescription>, ProbeError>;

    /// Constructs a fresh instance for `description`, prepared with `config`.
    fn instantiate(
        &self,
        description: &PluginDescription,
        config: PlayConfig,
    ) -> Result<Box<dyn PluginProcessor>, InstantiateError>;
}
