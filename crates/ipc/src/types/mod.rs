//! Type definitions for IPC messages.

mod asset;
mod material;

pub use asset::*;
pub use material::*;
