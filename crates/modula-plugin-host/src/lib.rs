//! Format backends for the Modula plugin manager.
//!
//! Each supported plugin technology implements [`PluginFormat`]: it can list
//! its default search locations, probe a candidate file or URI into plugin
//! descriptions, and instantiate a description into a runnable
//! [`PluginProcessor`]. The [`FormatRegistry`] owns the backends for the
//! lifetime of the session and resolves them by name in registration order.

mod config;
mod dsp;
mod error;
mod format;
mod internal;
#[cfg(feature = "lv2")]
mod lv2;
mod registry;

pub use config::PlayConfig;
pub use dsp::{GainProcessor, NoiseProcessor, SineProcessor};
pub use error::{InstantiateError, ProbeError};
pub use format::{PluginFormat, PluginProcessor};
pub use internal::{InternalPluginFormat, BUILTIN_SCHEME, INTERNAL_FORMAT_NAME};
#[cfg(feature = "lv2")]
pub use lv2::{Lv2PluginFormat, LV2_FORMAT_NAME};
pub use registry::FormatRegistry;
