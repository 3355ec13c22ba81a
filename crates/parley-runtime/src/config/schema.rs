//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use parley_framework::{ClassificationNames, DEFAULT_ASSIGNER, SeparatorKind};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParleyConfig {
    /// Defaults applied to every compiled parser.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Parser
// =============================================================================

/// Parser defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// How values are delimited.
    #[serde(default)]
    pub separator: SeparatorConfig,

    /// The character between a keyword and its value.
    #[serde(default = "default_assigner")]
    pub assigner: char,

    /// Parameter names bound to injected values.
    #[serde(default)]
    pub names: NamesConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            separator: SeparatorConfig::default(),
            assigner: default_assigner(),
            names: NamesConfig::default(),
        }
    }
}

fn default_assigner() -> char {
    DEFAULT_ASSIGNER
}

/// Separator mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeparatorMode {
    /// Whitespace-delimited words, or text between `start` and `end`.
    #[default]
    Quote,
    /// Runs of text between `separator` characters.
    Run,
}

/// Separator settings.
///
/// Only the characters of the selected `mode` are used; keeping them flat
/// lets environment variables override one field at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparatorConfig {
    #[serde(default)]
    pub mode: SeparatorMode,

    /// Opening character in `quote` mode.
    #[serde(default = "default_quote")]
    pub start: char,

    /// Closing character in `quote` mode.
    #[serde(default = "default_quote")]
    pub end: char,

    /// Separator character in `run` mode.
    #[serde(default = "default_run_separator")]
    pub separator: char,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            mode: SeparatorMode::default(),
            start: default_quote(),
            end: default_quote(),
            separator: default_run_separator(),
        }
    }
}

impl SeparatorConfig {
    /// Returns the tokenizer kind this configuration selects.
    pub fn kind(&self) -> SeparatorKind {
        match self.mode {
            SeparatorMode::Quote => SeparatorKind::Encapsulate {
                start: self.start,
                end: self.end,
            },
            SeparatorMode::Run => SeparatorKind::Run(self.separator),
        }
    }
}

fn default_quote() -> char {
    '"'
}

fn default_run_separator() -> char {
    ','
}

/// Parameter names that trigger injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamesConfig {
    #[serde(default = "default_context_names")]
    pub context: Vec<String>,

    #[serde(default = "default_client_names")]
    pub client: Vec<String>,

    #[serde(default = "default_message_names")]
    pub message: Vec<String>,
}

impl Default for NamesConfig {
    fn default() -> Self {
        let names = ClassificationNames::default();
        Self {
            context: names.context,
            client: names.client,
            message: names.message,
        }
    }
}

impl From<&NamesConfig> for ClassificationNames {
    fn from(config: &NamesConfig) -> Self {
        Self {
            context: config.context.clone(),
            client: config.client.clone(),
            message: config.message.clone(),
        }
    }
}

fn default_context_names() -> Vec<String> {
    ClassificationNames::default().context
}

fn default_client_names() -> Vec<String> {
    ClassificationNames::default().client
}

fn default_message_names() -> Vec<String> {
    ClassificationNames::default().message
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Writes to `file_path`.
    File,
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Base level, overridden by `RUST_LOG` when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-target levels, e.g. `parley_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Log file, required when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_kind() {
        let mut config = SeparatorConfig::default();
        assert_eq!(config.kind(), SeparatorKind::default());

        config.mode = SeparatorMode::Run;
        config.separator = ';';
        assert_eq!(config.kind(), SeparatorKind::Run(';'));
    }

    #[test]
    fn test_names_round_trip_through_classification() {
        let config = NamesConfig::default();
        assert_eq!(ClassificationNames::from(&config), ClassificationNames::default());
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::default().as_str(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
