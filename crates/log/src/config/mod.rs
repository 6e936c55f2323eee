//! Configuration types
//!
//! - `base`: core configuration structs (Config, Format)
//! - `presets`: environment-driven and pre-configured setups

mod base;
mod presets;

pub use base::{Config, Format};
