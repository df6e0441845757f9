//! Built-in processors shipped with the native format.
//!
//! These are deliberately small: enough to hand a real, running processing
//! unit to the audio graph without pulling the full engine in. All of them
//! work on interleaved stereo blocks.

use std::f32::consts::TAU;

use rand::Rng;

use modula_plugin_db::PluginDescription;

use crate::config::PlayConfig;
use crate::format::PluginProcessor;

/// Minimal sine oscillator, the canonical smoke-test instrument.
pub struct SineProcessor {
    description: PluginDescription,
    frequency: f32,
    amplitude: f32,
    phase: f32,
    phase_delta: f32,
    config: PlayConfig,
}

impl SineProcessor {
    pub fn new(description: PluginDescription) -> Self {
        let mut processor = Self {
            description,
            frequency: 440.0,
            amplitude: 0.5,
            phase: 0.0,
            phase_delta: 0.0,
            config: PlayConfig::default(),
        };
        processor.update_phase_delta();
        processor
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.max(0.0);
        self.update_phase_delta();
    }

    fn update_phase_delta(&mut self) {
        let sample_rate = self.config.sample_rate as f32;
        self.phase_delta = if sample_rate > 0.0 {
            (TAU * self.frequency) / sample_rate
        } else {
            0.0
        };
    }
}

impl PluginProcessor for SineProcessor {
    fn description(&self) -> &PluginDescription {
        &self.description
    }

    fn prepare(&mut self, config: PlayConfig) {
        self.config = config;
        self.update_phase_delta();
    }

    fn process(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_mut(2) {
            let sample = self.phase.sin() * self.amplitude;
            for channel in frame.iter_mut() {
                *channel = sample;
            }
            self.phase += self.phase_delta;
            if self.phase >= TAU {
                self.phase -= TAU;
            }
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// White noise source.
pub struct NoiseProcessor {
    description: PluginDescription,
    amplitude: f32,
}

impl NoiseProcessor {
    pub fn new(description: PluginDescription) -> Self {
        Self {
            description,
            amplitude: 0.25,
        }
    }
}

impl PluginProcessor for NoiseProcessor {
    fn description(&self) -> &PluginDescription {
        &self.description
    }

    fn prepare(&mut self, _config: PlayConfig) {}

    fn process(&mut self, buffer: &mut [f32]) {
        let mut rng = rand::thread_rng();
        for sample in buffer.iter_mut() {
            *sample = rng.gen_range(-1.0..1.0) * self.amplitude;
        }
    }
}

/// Stereo gain utility.
pub struct GainProcessor {
    description: PluginDescription,
    gain: f32,
}

impl GainProcessor {
    pub fn new(description: PluginDescription) -> Self {
        Self {
            description,
            gain: 1.0,
        }
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }
}

impl PluginProcessor for GainProcessor {
    fn description(&self) -> &PluginDescription {
        &self.description
    }

    fn prepare(&mut self, _config: PlayConfig) {}

    fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn description(id: &str) -> PluginDescription {
        PluginDescription::new(id, id, "Modula", format!("builtin:{id}"))
    }

    #[test]
    fn sine_fills_buffer_after_prepare() {
        let mut sine = SineProcessor::new(description("modula.sine"));
        sine.prepare(PlayConfig::new(48_000.0, 64));
        let mut buffer = vec![0.0f32; 128];
        sine.process(&mut buffer);
        assert!(buffer.iter().any(|sample| sample.abs() > 0.0));
    }

    #[test]
    fn sine_writes_identical_samples_to_both_channels() {
        let mut sine = SineProcessor::new(description("modula.sine"));
        sine.prepare(PlayConfig::new(44_100.0, 32));
        let mut buffer = vec![0.0f32; 64];
        sine.process(&mut buffer);
        for frame in buffer.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn gain_scales_in_place() {
        let mut gain = GainProcessor::new(description("modula.gain"));
        gain.set_gain(0.5);
        let mut buffer = vec![1.0f32; 8];
        gain.process(&mut buffer);
        assert_eq!(buffer, vec![0.5f32; 8]);
    }

    #[test]
    fn noise_stays_within_amplitude() {
        let mut noise = NoiseProcessor::new(description("modula.noise"));
        let mut buffer = vec![0.0f32; 256];
        noise.process(&mut buffer);
        assert!(buffer.iter().all(|sample| sample.abs() <= 0.25));
    }
}
