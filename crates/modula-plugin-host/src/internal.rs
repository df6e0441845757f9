use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use modula_plugin_db::PluginDescription;

use crate::config::PlayConfig;
use crate::dsp::{GainProcessor, NoiseProcessor, SineProcessor};
use crate::error::{InstantiateError, ProbeError};
use crate::format::{PluginFormat, PluginProcessor};

/// Well-known name of the first-party in-process format.
pub const INTERNAL_FORMAT_NAME: &str = "Modula";

/// URI scheme for plugins that ship bundled with the host.
pub const BUILTIN_SCHEME: &str = "builtin:";

const MANIFEST_EXTENSION: &str = "modplug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DspKind {
    Sine,
    Noise,
    Gain,
}

impl DspKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(Self::Sine),
            "noise" => Some(Self::Noise),
            "gain" => Some(Self::Gain),
            _ => None,
        }
    }
}

struct BuiltinPlugin {
    id: &'static str,
    name: &'static str,
    kind: DspKind,
    is_instrument: bool,
    num_inputs: u32,
    num_outputs: u32,
}

const BUILTINS: &[BuiltinPlugin] = &[
    BuiltinPlugin {
        id: "modula.sine",
        name: "Sine Synth",
        kind: DspKind::Sine,
        is_instrument: true,
        num_inputs: 0,
        num_outputs: 2,
    },
    BuiltinPlugin {
        id: "modula.noise",
        name: "Noise Source",
        kind: DspKind::Noise,
        is_instrument: true,
        num_inputs: 0,
        num_outputs: 2,
    },
    BuiltinPlugin {
        id: "modula.gain",
        name: "Gain Utility",
        kind: DspKind::Gain,
        is_instrument: false,
        num_inputs: 2,
        num_outputs: 2,
    },
];

/// A `*.modplug` manifest may bundle several plugins, each backed by one of
/// the built-in DSP kinds.
#[derive(Debug, Deserialize)]
struct ManifestFile {
    plugins: Vec<ManifestPlugin>,
}

#[derive(Debug, Deserialize)]
struct ManifestPlugin {
    id: String,
    name: String,
    kind: String,
    vendor: Option<String>,
    version: Option<String>,
    is_instrument: Option<bool>,
    num_inputs: Option<u32>,
    num_outputs: Option<u32>,
}

/// The native in-process plugin format.
///
/// Plugins come from two places: the built-in table (addressed through the
/// virtual `builtin:` search location) and user-provided `*.modplug` JSON
/// manifests in the per-user plugin directory, which map named entries onto
/// built-in DSP kinds.
#[derive(Debug, Default)]
pub struct InternalPluginFormat;

impl InternalPluginFormat {
    pub fn new() -> Self {
        Self
    }

    fn builtin_descriptions(&self) -> Vec<PluginDescription> {
        BUILTINS
            .iter()
            .map(|builtin| {
                let mut description = PluginDescription::new(
                    builtin.id,
                    builtin.name,
                    INTERNAL_FORMAT_NAME,
                    format!("{BUILTIN_SCHEME}{}", builtin.id),
                )
                .with_vendor("Modula Labs")
                .with_channels(builtin.num_inputs, builtin.num_outputs);
                description.is_instrument = builtin.is_instrument;
                description
            })
            .collect()
    }

    fn manifest_descriptions(&self, path: &Path) -> Result<Vec<PluginDescription>, ProbeError> {
        let raw = fs::read_to_string(path)?;
        let manifest: ManifestFile = serde_json::from_str(&raw)?;
        let mut descriptions = Vec::new();
        for plugin in manifest.plugins {
            if DspKind::from_name(&plugin.kind).is_none() {
                log::warn!(
                    "skipping {} in {}: unknown kind {:?}",
                    plugin.id,
                    path.display(),
                    plugin.kind
                );
                continue;
            }
            let mut description = PluginDescription::new(
                plugin.id,
                plugin.name,
                INTERNAL_FORMAT_NAME,
                path.display().to_string(),
            )
            .with_channels(plugin.num_inputs.unwrap_or(0), plugin.num_outputs.unwrap_or(2));
            description.vendor = plugin.vendor;
            description.version = plugin.version;
            description.is_instrument = plugin.is_instrument.unwrap_or(false);
            descriptions.push(description);
        }
        Ok(descriptions)
    }

    fn make_processor(
        &self,
        kind: DspKind,
        description: PluginDescription,
        config: PlayConfig,
    ) -> Box<dyn PluginProcessor> {
        let mut processor: Box<dyn PluginProcessor> = match kind {
            DspKind::Sine => Box::new(SineProcessor::new(description)),
            DspKind::Noise => Box::new(NoiseProcessor::new(description)),
            DspKind::Gain => Box::new(GainProcessor::new(description)),
        };
        processor.prepare(config);
        processor
    }

    fn kind_for(&self, description: &PluginDescription) -> Result<DspKind, InstantiateError> {
        if let Some(id) = description.path.strip_prefix(BUILTIN_SCHEME) {
            return BUILTINS
                .iter()
                .find(|builtin| builtin.id == id)
                .map(|builtin| builtin.kind)
                .ok_or_else(|| {
                    InstantiateError::failed(format!("unknown built-in plugin {id:?}"))
                });
        }

        // Manifest-backed plugin: resolve the kind by re-reading the manifest
        // at the stored path. The file may have moved or changed since the
        // scan, so every step reports a diagnostic instead of panicking.
        let raw = fs::read_to_string(&description.path)?;
        let manifest: ManifestFile = serde_json::from_str(&raw)
            .map_err(|err| InstantiateError::failed(format!("invalid manifest: {err}")))?;
        let plugin = manifest
            .plugins
            .into_iter()
            .find(|plugin| plugin.id == description.id)
            .ok_or_else(|| {
                InstantiateError::failed(format!(
                    "plugin {:?} no longer listed in {}",
                    description.id, description.path
                ))
            })?;
        DspKind::from_name(&plugin.kind).ok_or_else(|| {
            InstantiateError::failed(format!("unknown DSP kind {:?}", plugin.kind))
        })
    }
}

impl PluginFormat for InternalPluginFormat {
    fn name(&self) -> &str {
        INTERNAL_FORMAT_NAME
    }

    fn default_search_locations(&self) -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(BUILTIN_SCHEME)];
        if let Some(data_dir) = dirs::data_dir() {
            locations.push(data_dir.join("modula/plugins"));
        }
        locations
    }

    fn scan_candidate(&self, path: &Path) -> Result<Vec<PluginDescription>, ProbeError> {
        if path.to_str().is_some_and(|raw| raw.starts_with(BUILTIN_SCHEME)) {
            return Ok(self.builtin_descriptions());
        }
        let is_manifest = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION));
        if is_manifest {
            self.manifest_descriptions(path)
        } else {
            Ok(Vec::new())
        }
    }

    fn instantiate(
        &self,
        description: &PluginDescription,
        config: PlayConfig,
    ) -> Result<Box<dyn PluginProcessor>, InstantiateError> {
        if description.format != INTERNAL_FORMAT_NAME {
            return Err(InstantiateError::failed(format!(
                "description belongs to format {:?}",
                description.format
            )));
        }
        let kind = self.kind_for(description)?;
        Ok(self.make_processor(kind, description.clone(), config))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn builtin_location_yields_all_builtins() {
        let format = InternalPluginFormat::new();
        let descriptions = format.scan_candidate(Path::new(BUILTIN_SCHEME)).unwrap();
        assert_eq!(descriptions.len(), BUILTINS.len());
        assert!(descriptions.iter().all(|d| d.format == INTERNAL_FORMAT_NAME));
    }

    #[test]
    fn manifest_may_bundle_several_plugins() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("bundle.modplug");
        fs::write(
            &manifest,
            json!({
                "plugins": [
                    { "id": "user.sine", "name": "User Sine", "kind": "sine", "is_instrument": true },
                    { "id": "user.gain", "name": "User Gain", "kind": "gain", "num_inputs": 2 }
                ]
            })
            .to_string(),
        )
        .unwrap();

        let format = InternalPluginFormat::new();
        let descriptions = format.scan_candidate(&manifest).unwrap();
        assert_eq!(descriptions.len(), 2);
        assert!(descriptions[0].is_instrument);
        assert_eq!(descriptions[1].num_inputs, 2);
    }

    #[test]
    fn corrupt_manifest_is_a_probe_error() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("broken.modplug");
        fs::write(&manifest, "this is not json").unwrap();
        let format = InternalPluginFormat::new();
        assert!(format.scan_candidate(&manifest).is_err());
    }

    #[test]
    fn unrelated_files_yield_nothing() {
        let dir = tempdir().unwrap();
        let other = dir.path().join("readme.txt");
        fs::write(&other, "hello").unwrap();
        let format = InternalPluginFormat::new();
        assert!(format.scan_candidate(&other).unwrap().is_empty());
    }

    #[test]
    fn instantiates_builtins() {
        let format = InternalPluginFormat::new();
        let descriptions = format.scan_candidate(Path::new(BUILTIN_SCHEME)).unwrap();
        for description in descriptions {
            let instance = format
                .instantiate(&description, PlayConfig::default())
                .unwrap();
            assert_eq!(instance.description().id, description.id);
        }
    }

    #[test]
    fn instantiates_manifest_backed_plugins() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("bundle.modplug");
        fs::write(
            &manifest,
            json!({
                "plugins": [
                    { "id": "user.noise", "name": "User Noise", "kind": "noise" }
                ]
            })
            .to_string(),
        )
        .unwrap();

        let format = InternalPluginFormat::new();
        let description = format.scan_candidate(&manifest).unwrap().remove(0);
        let mut instance = format
            .instantiate(&description, PlayConfig::new(48_000.0, 128))
            .unwrap();
        let mut buffer = vec![0.0f32; 64];
        instance.process(&mut buffer);
        assert!(buffer.iter().any(|sample| *sample != 0.0));
    }

    #[test]
    fn instantiation_failures_carry_diagnostics() {
        let format = InternalPluginFormat::new();
        let missing =
            PluginDescription::new("nope", "Nope", INTERNAL_FORMAT_NAME, "builtin:nope");
        let err = format
            .instantiate(&missing, PlayConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("nope"));

        let foreign = PluginDescription::new("x", "X", "LV2", "/tmp/x.lv2");
        assert!(format.instantiate(&foreign, PlayConfig::default()).is_err());
    }
}
