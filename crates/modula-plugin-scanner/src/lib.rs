//! Step-wise plugin discovery scanner with crash containment.

mod probe;
mod scan;

pub use probe::*;
pub use scan::*;
