//! Error types for the content parser.
//!
//! Errors fall into two disjoint classes:
//!
//! - [`ConfigError`]: raised while registering converters or compiling a
//!   handler signature into a parser. These happen once at startup and are
//!   fatal; they never occur during a live parse.
//! - [`ParseError`]: raised per invocation when the content cannot satisfy
//!   the handler's parameters. A failed parse yields no arguments at all.

use thiserror::Error;

use crate::flags::ConverterFlag;
use parley_core::ConvertError;

/// Configuration-time errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The converter function does not take the number of arguments its
    /// `requires_part` setting implies (context + detail, plus the token).
    #[error("converter '{converter}' must take {expected} arguments, but takes {found}")]
    ConverterArity {
        converter: String,
        expected: usize,
        found: usize,
    },

    /// A converter declared as not using flags lists supported flags.
    #[error("converter '{converter}' does not use flags but declares supported flags {all:?}")]
    UnusedFlags {
        converter: String,
        all: ConverterFlag,
    },

    /// A converter declared as using flags supports none.
    #[error("converter '{converter}' uses flags but declares no supported flags")]
    EmptyFlags { converter: String },

    /// The default flags of a converter are not a subset of its supported flags.
    #[error("default flags {default:?} of converter '{converter}' exceed its supported flags {all:?}")]
    DefaultFlagsOutOfRange {
        converter: String,
        default: ConverterFlag,
        all: ConverterFlag,
    },

    /// Two converters claim the same type or name.
    #[error("a converter is already registered for '{0}'")]
    DuplicateConverter(String),

    /// No converter is registered for the annotated type.
    #[error("no converter registered for type '{0}'")]
    NoConverterForType(&'static str),

    /// No converter is registered under the annotated name.
    #[error("no converter registered under the name '{0}'")]
    NoConverterForName(String),

    /// Flags given for a parameter share nothing with the converter's
    /// supported flags.
    #[error(
        "flags {requested:?} requested for converter '{converter}' do not intersect its supported flags {supported:?}"
    )]
    DisjointFlags {
        converter: String,
        requested: ConverterFlag,
        supported: ConverterFlag,
    },

    /// An annotation tuple has a length other than 2 or 3.
    #[error("annotation tuples must have 2 or 3 elements, got {0}")]
    AnnotationTupleLength(usize),

    /// An annotation tuple is not shaped `(annotation, description[, name])`.
    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// A multi-type parameter includes a converter that consumes no token.
    #[error(
        "parameter '{parameter}' chains converter '{converter}', which does not consume a token"
    )]
    ChainedInjection {
        parameter: String,
        converter: String,
    },

    /// The separator or assigner configuration is unusable.
    #[error("invalid separator: {0}")]
    InvalidSeparator(String),

    /// The handler signature is malformed.
    #[error("invalid signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },
}

impl ConfigError {
    /// Creates an invalid signature error.
    pub fn signature(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            signature: signature.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Per-invocation parse errors.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// A required parameter could not be satisfied from the content.
    #[error("missing required argument '{parameter}'")]
    MissingArgument { parameter: String },

    /// A converter failed while resolving a parameter.
    #[error("failed to convert argument '{parameter}': {source}")]
    Converter {
        parameter: String,
        #[source]
        source: ConvertError,
    },
}

impl ParseError {
    /// Creates a missing argument error.
    pub fn missing(parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            parameter: parameter.into(),
        }
    }

    /// Returns the name of the parameter the error refers to.
    pub fn parameter(&self) -> &str {
        match self {
            Self::MissingArgument { parameter } | Self::Converter { parameter, .. } => parameter,
        }
    }
}

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised when extracting typed values from parsed
/// [`Arguments`](crate::arguments::Arguments).
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// Fewer positional arguments were parsed than requested.
    #[error("no positional argument at index {0}")]
    MissingPositional(usize),

    /// No keyword argument with this name was parsed.
    #[error("no keyword argument named '{0}'")]
    MissingKeyword(String),

    /// The argument holds a different type.
    #[error("argument {position} has type '{found}', expected '{expected}'")]
    TypeMismatch {
        position: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
