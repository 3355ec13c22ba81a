//! # Parley Framework
//!
//! The content parsing engine: turns the text after a command name into
//! typed arguments for a handler.
//!
//! This layer provides:
//! - A quote-aware, configurable tokenizer ([`Separator`])
//! - A registry of asynchronous converters keyed by type and name, with
//!   behavior flags ([`ConverterRegistry`], [`ConverterFlag`])
//! - Annotation resolution and parameter classification
//!   ([`Annotation`], [`ContentParserParameter`])
//! - The per-invocation parsing state machine ([`ContentParser`])
//! - Typed extraction of the results ([`Arguments`], [`FromArguments`])
//! - A tower layer running the parser in front of a handler (with `layer`
//!   feature)
//!
//! Parsers are compiled once at startup; every misconfiguration surfaces as a
//! [`ConfigError`] then, never during a parse.

pub mod annotation;
pub mod arguments;
pub mod converter;
pub mod converters;
pub mod error;
pub mod flags;
pub mod parameter;
pub mod parser;
pub mod registry;
pub mod separator;
pub mod signature;

#[cfg(feature = "layer")]
pub mod layer;

pub use annotation::{Annotation, AnnotationPart};
pub use arguments::{Arguments, FromArguments, FromValue};
pub use converter::{ConvertFuture, ConverterFn, InjectConverter, ParseFn, PartConverter};
pub use converters::{EntityConverter, EntityLookup, LookupScope, MentionKind};
pub use error::{
    ConfigError, ConfigResult, ExtractError, ExtractResult, ParseError, ParseResult,
};
pub use flags::ConverterFlag;
pub use parameter::{ClassificationNames, ContentParserParameter, ParameterDetail, ParameterRole};
pub use parser::{ContentParser, ContentParserBuilder, ParameterParsingState, StateStatus};
pub use registry::{ConverterRegistry, ConverterSetting, ConverterSettingBuilder, TypeChecker};
pub use separator::{DEFAULT_ASSIGNER, Separator, SeparatorKind, Token};
pub use signature::{ParameterKind, Signature, SignatureParameter};

#[cfg(feature = "layer")]
pub use layer::{ContentParserLayer, ContentParserService};
