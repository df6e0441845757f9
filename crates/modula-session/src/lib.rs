//! Session-level coordination for Modula: the plugin manager facade and the
//! settings store it persists the plugin catalog through.

mod manager;
mod settings;

pub use manager::*;
pub use settings::*;
