//! Configuration module for the Parley runtime.
//!
//! Layered loading (files, environment, overrides) and validation of the
//! parser defaults and logging settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, NamesConfig, ParleyConfig,
    ParserConfig, SeparatorConfig, SeparatorMode, SpanEventConfig,
};
pub use validation::validate_config;
