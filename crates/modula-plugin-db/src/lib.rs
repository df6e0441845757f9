//! Plugin descriptions and the known-plugin catalog used by Modula.

mod catalog;
mod description;

pub use catalog::*;
pub use description::*;
