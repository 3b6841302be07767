//! Configuration loading helpers
//!
//! - `EnvPrefix` for layered environment overrides (`APP_` + `NAME`)
//! - `load_config_file` for TOML/YAML/JSON files, format chosen by extension
//!
//! # Example
//!
//! ```rust,ignore
//! use tooling::config::{load_config_file, EnvPrefix};
//!
//! let mut config: AppConfig = load_config_file("app.toml")?;
//! let env = EnvPrefix::new("APP_");
//! if let Some(port) = env.parse::<u16>("port")? {
//!     config.port = port;
//! }
//! ```

mod env;
mod file;

pub use env::EnvPrefix;
pub use file::load_config_file;
