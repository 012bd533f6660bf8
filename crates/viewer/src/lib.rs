//! Viewer-facing side of the configurator
//!
//! The 3D viewer is an external component reached through [`ModelViewer`].
//! This crate resolves customization targets against its live material list,
//! applies textures and colors, and ties ingestion and viewer together in
//! [`ConfiguratorSession`].

mod color;
mod customize;
mod error;
mod resolver;
mod session;
mod viewer;

pub use color::parse_hex_color;
pub use customize::{Applied, Customizer};
pub use error::{ColorError, CustomizeError, LoadError, ResolveError, ViewerError};
pub use resolver::resolve_targets;
pub use session::{ConfiguratorSession, customization_reply, load_reply};
pub use viewer::ModelViewer;
