//! Parley Runtime - configuration, logging and bootstrap for the Parley parser.
//!
//! This crate provides:
//! - Layered configuration loading and validation (`ConfigLoader`, `ParleyConfig`)
//! - Logging configuration (`LoggingBuilder`, `init_from_config`)
//! - The shared registry, separator and names every command parser is
//!   compiled against (`ParserRuntime`)
//!
//! ```ignore
//! use parley_runtime::ParserRuntime;
//!
//! // Loads parley.toml, applies PARLEY_* overrides and installs logging.
//! let runtime = ParserRuntime::new()?;
//! let parser = runtime.compile(&signature)?;
//! ```

pub mod config;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LoggingConfig, ParleyConfig, ParserConfig,
};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};
pub use runtime::{ParserRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
