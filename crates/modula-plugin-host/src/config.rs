/// Process-wide playback parameters applied at instantiation time.
///
/// The session facade owns one of these; every instantiation snapshots the
/// current value, so changing it never affects instances already created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayConfig {
    /// Sample rate in hertz.
    pub sample_rate: f64,
    /// Block size in frames.
    pub block_size: u32,
}

impl PlayConfig {
    pub fn new(sample_rate: f64, block_size: u32) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            block_size: 512,
        }
    }
}
