//! LV2 format backend, compiled in with the `lv2` cargo feature.
//!
//! Discovery and instantiation go through lilv. Only audio ports are wired;
//! control ports keep their defaults, which is all the manager needs to hand
//! a runnable unit to the graph. Plugins that require host features beyond
//! that fail instantiation with a diagnostic instead of being mis-hosted.

use std::path::{Path, PathBuf};

use lilv::World;

use modula_plugin_db::PluginDescription;

use crate::config::PlayConfig;
use crate::error::{InstantiateError, ProbeError};
use crate::format::{PluginFormat, PluginProcessor};

pub const LV2_FORMAT_NAME: &str = "LV2";

const LV2_CORE_INPUT: &str = "http://lv2plug.in/ns/lv2core#InputPort";
const LV2_CORE_OUTPUT: &str = "http://lv2plug.in/ns/lv2core#OutputPort";
const LV2_CORE_AUDIO: &str = "http://lv2plug.in/ns/lv2core#AudioPort";
const LV2_CORE_CONTROL: &str = "http://lv2plug.in/ns/lv2core#ControlPort";

pub struct Lv2PluginFormat {
    world: World,
}

impl Lv2PluginFormat {
    pub fn new() -> Self {
        Self {
            world: World::with_load_all(),
        }
    }

    fn descriptions_in_bundle(&self, bundle: &Path) -> Vec<PluginDescription> {
        let input_class = self.world.new_uri(LV2_CORE_INPUT);
        let output_class = self.world.new_uri(LV2_CORE_OUTPUT);
        let audio_class = self.world.new_uri(LV2_CORE_AUDIO);

        let bundle_text = bundle.display().to_string();
        let mut descriptions = Vec::new();
        for plugin in self.world.plugins().iter() {
            if !plugin.verify() {
                continue;
            }
            let Some(uri) = plugin.uri().as_uri().map(str::to_owned) else {
                continue;
            };
            let in_bundle = plugin
                .bundle_uri()
                .and_then(|node| node.path().map(|(_host, path)| path))
                .map(|bundle_path| Path::new(bundle_path.trim_end_matches('/')) == bundle)
                .unwrap_or(false);
            if !in_bundle {
                continue;
            }
            let Some(name) = plugin.name().as_str().map(str::to_owned) else {
                continue;
            };

            let mut audio_inputs = 0u32;
            let mut audio_outputs = 0u32;
            for (index, _) in plugin.port_ranges_float().iter().enumerate() {
                let Some(port) = plugin.port_by_index(index) else {
                    continue;
                };
                if !port.is_a(&audio_class) {
                    continue;
                }
                if port.is_a(&input_class) {
                    audio_inputs += 1;
                } else if port.is_a(&output_class) {
                    audio_outputs += 1;
                }
            }

            let mut description =
                PluginDescription::new(uri, name, LV2_FORMAT_NAME, bundle_text.clone())
                    .with_channels(audio_inputs, audio_outputs);
            description.vendor = plugin
                .author_name()
                .and_then(|node| node.as_str().map(str::to_owned));
            description.is_instrument = audio_inputs == 0 && audio_outputs > 0;
            descriptions.push(description);
        }
        descriptions
    }
}

impl Default for Lv2PluginFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginFormat for Lv2PluginFormat {
    fn name(&self) -> &str {
        LV2_FORMAT_NAME
    }

    fn default_search_locations(&self) -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Ok(lv2_path) = std::env::var("LV2_PATH") {
            locations.extend(std::env::split_paths(&lv2_path));
        }
        if let Some(home) = dirs::home_dir() {
            locations.push(home.join(".lv2"));
        }
        locations.push(PathBuf::from("/usr/local/lib/lv2"));
        locations.push(PathBuf::from("/usr/lib/lv2"));
        locations
    }

    fn scan_candidate(&self, path: &Path) -> Result<Vec<PluginDescription>, ProbeError> {
        let is_bundle = path.is_dir()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(".lv2"));
        if !is_bundle {
            return Ok(Vec::new());
        }
        Ok(self.descriptions_in_bundle(path))
    }

    fn instantiate(
        &self,
        description: &PluginDescription,
        config: PlayConfig,
    ) -> Result<Box<dyn PluginProcessor>, InstantiateError> {
        let uri_node = self.world.new_uri(&description.id);
        let plugin = self
            .world
            .plugins()
            .iter()
            .find(|plugin| plugin.uri().as_uri() == uri_node.as_uri())
            .ok_or_else(|| {
                InstantiateError::failed(format!("LV2 plugin {:?} not found", description.id))
            })?;

        let input_class = self.world.new_uri(LV2_CORE_INPUT);
        let output_class = self.world.new_uri(LV2_CORE_OUTPUT);
        let audio_class = self.world.new_uri(LV2_CORE_AUDIO);
        let control_class = self.world.new_uri(LV2_CORE_CONTROL);

        let mut audio_inputs = Vec::new();
        let mut audio_outputs = Vec::new();
        let mut controls = Vec::new();
        for (index, range) in plugin.port_ranges_float().iter().enumerate() {
            let Some(port) = plugin.port_by_index(index) else {
                continue;
            };
            if port.is_a(&audio_class) {
                if port.is_a(&input_class) {
                    audio_inputs.push(index);
                } else if port.is_a(&output_class) {
                    audio_outputs.push(index);
                }
            } else if port.is_a(&control_class) {
                controls.push((index, range.default));
            }
        }

        let features: Vec<&lv2_raw::LV2Feature> = Vec::new();
        let instance = unsafe { plugin.instantiate(config.sample_rate, features) }
            .ok_or_else(|| {
                InstantiateError::failed(format!(
                    "LV2 plugin {:?} refused to instantiate at {} Hz",
                    description.id, config.sample_rate
                ))
            })?;

        let mut processor = Lv2Processor {
            description: description.clone(),
            instance: Some(unsafe { instance.activate() }),
            audio_inputs,
            audio_outputs,
            control_values: controls.iter().map(|(_, default)| *default).collect(),
            control_indices: controls.iter().map(|(index, _)| *index).collect(),
            in_bufs: Vec::new(),
            out_bufs: Vec::new(),
        };
        processor.prepare(config);
        Ok(Box::new(processor))
    }
}

struct Lv2Processor {
    description: PluginDescription,
    instance: Option<lilv::instance::ActiveInstance>,
    audio_inputs: Vec<usize>,
    audio_outputs: Vec<usize>,
    control_values: Vec<f32>,
    control_indices: Vec<usize>,
    in_bufs: Vec<Vec<f32>>,
    out_bufs: Vec<Vec<f32>>,
}

// The instance is only ever driven from one thread at a time; lilv instances
// carry raw pointers, which blocks the auto impl.
unsafe impl Send for Lv2Processor {}

impl PluginProcessor for Lv2Processor {
    fn description(&self) -> &PluginDescription {
        &self.description
    }

    fn prepare(&mut self, config: PlayConfig) {
        let frames = config.block_size as usize;
        self.in_bufs = vec![vec![0.0; frames]; self.audio_inputs.len()];
        self.out_bufs = vec![vec![0.0; frames]; self.audio_outputs.len()];
    }

    fn process(&mut self, buffer: &mut [f32]) {
        let Some(instance) = self.instance.as_mut() else {
            return;
        };
        let frames = (buffer.len() / 2)
            .min(self.in_bufs.first().map_or(usize::MAX, Vec::len))
            .min(self.out_bufs.first().map_or(usize::MAX, Vec::len));

        for (slot, input) in self.in_bufs.iter_mut().enumerate() {
            let channel = slot.min(1);
            for frame in 0..frames {
                input[frame] = buffer[frame * 2 + channel];
            }
        }

        unsafe {
            for (slot, value) in self.control_values.iter_mut().enumerate() {
                instance.connect_port_mut(self.control_indices[slot], value as *mut f32);
            }
            for (slot, input) in self.in_bufs.iter().enumerate() {
                instance.connect_port(self.audio_inputs[slot], input.as_ptr());
            }
            for (slot, output) in self.out_bufs.iter_mut().enumerate() {
                instance.connect_port_mut(self.audio_outputs[slot], output.as_mut_ptr());
            }
            instance.run(frames);
        }

        for frame in 0..frames {
            for channel in 0..2 {
                let slot = channel.min(self.out_bufs.len().saturating_sub(1));
                if let Some(output) = self.out_bufs.get(slot) {
                    buffer[frame * 2 + channel] = output[frame];
                }
            }
        }
    }
}
