//! Systems - logic that operates on components

mod fleet;
mod partial;
mod wear;

pub use fleet::*;
pub use partial::*;
pub use wear::*;
