//! # Parley
//!
//! Typed command argument parsing for chat bots.
//!
//! A command handler declares its parameters as a [`Signature`]; Parley
//! compiles it once into a [`ContentParser`] and, for every invocation,
//! turns the text after the command name into typed [`Arguments`].
//!
//! ```text
//! "1h30m \"stretch your legs\" loud: yes"
//!     │ Separator           tokens, keywords, quotes
//!     ▼
//! ContentParser           one state per parameter, async converters
//!     │
//!     ▼
//! Arguments               [Duration, String] + { loud: bool }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parley::prelude::*;
//!
//! let runtime = ParserRuntime::new()?;
//! let remind = runtime.compile(
//!     &Signature::new("remind")
//!         .parameter(SignatureParameter::positional("after").annotation(Annotation::of::<Duration>()))
//!         .parameter(SignatureParameter::positional("text")),
//! )?;
//!
//! let (after, text): (Duration, String) = remind.parse(&ctx).await?.extract()?;
//! ```
//!
//! ## Crates
//!
//! - [`core`]: `Value`, `CommandContext`, `ConvertError`
//! - [`framework`]: the tokenizer, converters and parser
//! - [`runtime`]: configuration, logging and the parser bootstrap
//!
//! ## Features
//!
//! - `layer` *(default)*: tower integration (`ContentParserLayer`)
//! - `toml-config` *(default)* / `yaml-config`: configuration file formats
//! - `json-log`: JSON log lines

pub use parley_core as core;
pub use parley_framework as framework;
pub use parley_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use parley::prelude::*;
/// ```
pub mod prelude {
    // Bootstrap
    pub use parley_runtime::{ParleyConfig, ParserRuntime};

    // Declaring commands
    pub use parley_framework::{Annotation, ConverterFlag, Signature, SignatureParameter};

    // Parsing and extraction
    pub use parley_core::{CommandContext, Value};
    pub use parley_framework::{Arguments, ContentParser, FromArguments, ParseError};

    // Custom converters
    pub use parley_core::{ConvertError, ConvertResult, TypeKey};
    pub use parley_framework::{
        ConverterFn, ConverterSetting, EntityConverter, EntityLookup, LookupScope, MentionKind,
        ParameterDetail, PartConverter,
    };

    #[cfg(feature = "layer")]
    pub use parley_framework::ContentParserLayer;

    pub use std::time::Duration;
}
