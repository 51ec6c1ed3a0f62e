//! Configuration for reaching the control surface.
//!
//! A single `appforest.toml` holds the `[control]` table. A missing file
//! means defaults.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_config_toml, parse_config_toml_str, to_toml};
pub use schema::{AppForestConfig, ControlConfig, DEFAULT_MBEAN};
pub use store::{CONFIG_FILE_NAME, ConfigStore};
