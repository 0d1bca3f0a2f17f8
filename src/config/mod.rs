//! Settings file (`kgraph.toml`) discovery and parsing.

pub mod settings;

pub use settings::{Settings, SETTINGS_FILE};
