//! Parser bootstrap.
//!
//! [`ParserRuntime`] owns what every command parser of an application
//! shares: the converter registry, the default separator and the injection
//! names. It is built once at startup, extended with the application's own
//! converters, and then compiles one [`ContentParser`] per command.
//!
//! ```rust,ignore
//! use parley_runtime::ParserRuntime;
//!
//! let mut runtime = ParserRuntime::builder()
//!     .config_file("config/parley.toml")
//!     .build()?;
//! runtime.register(EntityConverter::<Members>::build_setting(
//!     "member",
//!     Some(MentionKind::User),
//!     ConverterFlag::USER_DEFAULT,
//!     ConverterFlag::USER_ALL,
//! )?)?;
//!
//! let parser = runtime.compile(&signature)?;
//! ```

use std::path::Path;
use std::sync::Arc;

use parley_framework::{
    ClassificationNames, ContentParser, ConverterRegistry, ConverterSetting, Separator, Signature,
};
use tracing::{debug, info};

use crate::config::{
    ConfigLoader, ConfigResult, ParleyConfig, ParserConfig, validate_config,
};
use crate::logging;

/// Shared state for compiling command parsers.
pub struct ParserRuntime {
    registry: ConverterRegistry,
    separator: Arc<Separator>,
    names: ClassificationNames,
}

impl ParserRuntime {
    /// Creates a runtime from the configuration found in the default
    /// locations, installing the configured logging.
    pub fn new() -> ConfigResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from parser defaults, with the built-in converters
    /// registered.
    ///
    /// Logging is left untouched.
    pub fn from_config(config: &ParserConfig) -> ConfigResult<Self> {
        let registry = ConverterRegistry::with_defaults()?;
        let separator = Separator::shared(config.separator.kind(), config.assigner)?;
        let names = ClassificationNames::from(&config.names);

        debug!(
            separator = ?separator.kind(),
            assigner = %separator.assigner(),
            converters = registry.len(),
            "Parser runtime ready"
        );

        Ok(Self {
            registry,
            separator,
            names,
        })
    }

    /// Registers an application converter.
    pub fn register(&mut self, setting: ConverterSetting) -> ConfigResult<()> {
        self.registry.register(setting)?;
        Ok(())
    }

    /// Compiles the parser for one command.
    pub fn compile(&self, signature: &Signature) -> ConfigResult<ContentParser> {
        let parser = ContentParser::builder(signature)
            .separator(Arc::clone(&self.separator))
            .names(self.names.clone())
            .build(&self.registry)?;
        Ok(parser)
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn separator(&self) -> &Arc<Separator> {
        &self.separator
    }

    pub fn names(&self) -> &ClassificationNames {
        &self.names
    }
}

/// Builder loading configuration before creating a [`ParserRuntime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    init_logging: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ParleyConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Leaves the global `tracing` subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Loads and validates the configuration, then builds the runtime.
    pub fn build(self) -> ConfigResult<ParserRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }
        info!(log_level = %config.logging.level, "Parley configuration applied");

        ParserRuntime::from_config(&config.parser)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeparatorMode;
    use parley_core::CommandContext;
    use parley_framework::{Annotation, SeparatorKind, SignatureParameter};

    fn run_mode() -> ParserConfig {
        let mut config = ParserConfig::default();
        config.separator.mode = SeparatorMode::Run;
        config.separator.separator = ',';
        config.assigner = '=';
        config
    }

    #[test]
    fn test_from_default_config() {
        let runtime = ParserRuntime::from_config(&ParserConfig::default()).unwrap();
        assert_eq!(runtime.registry().len(), 8);
        assert_eq!(runtime.separator().kind(), SeparatorKind::default());
        assert_eq!(runtime.names(), &ClassificationNames::default());
    }

    #[test]
    fn test_separator_is_shared() {
        let a = ParserRuntime::from_config(&run_mode()).unwrap();
        let b = ParserRuntime::from_config(&run_mode()).unwrap();
        assert!(Arc::ptr_eq(a.separator(), b.separator()));
    }

    #[test]
    fn test_invalid_separator_fails() {
        let mut config = run_mode();
        config.assigner = ',';
        assert!(ParserRuntime::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_compile_uses_configured_defaults() {
        let mut config = run_mode();
        config.names.context = vec!["invocation".to_string()];
        let runtime = ParserRuntime::from_config(&config).unwrap();

        let note = runtime
            .compile(
                &Signature::new("note")
                    .parameter(SignatureParameter::positional("invocation"))
                    .parameter(SignatureParameter::positional("title"))
                    .parameter(SignatureParameter::positional("body")),
            )
            .unwrap();
        assert!(note.parameters()[0].is_injected());
        assert!(note.parameters()[2].is_rest());

        let args = note
            .parse(&CommandContext::new("groceries, milk, eggs"))
            .await
            .unwrap();
        assert!(args.get::<CommandContext>(0).is_ok());
        assert_eq!(args.get::<String>(1).unwrap(), "groceries");
        assert_eq!(args.get::<String>(2).unwrap(), "milk, eggs");

        let pin = runtime
            .compile(
                &Signature::new("pin")
                    .parameter(SignatureParameter::positional("title"))
                    .parameter(
                        SignatureParameter::keyword_only("pinned")
                            .annotation(Annotation::of::<bool>())
                            .default(false),
                    ),
            )
            .unwrap();
        let args = pin
            .parse(&CommandContext::new("groceries, pinned= yes"))
            .await
            .unwrap();
        assert_eq!(args.get::<String>(0).unwrap(), "groceries");
        assert!(args.get_keyword::<bool>("pinned").unwrap());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = ParleyConfig::default();
        config.parser.names.client.push("ctx".to_string());

        let result = ParserRuntime::builder()
            .without_env()
            .without_logging()
            .merge(config)
            .build();
        assert!(result.is_err());
    }
}
