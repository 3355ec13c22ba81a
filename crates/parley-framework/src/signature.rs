//! Handler signatures.
//!
//! A [`Signature`] describes the parameters of a command handler: their
//! names, kinds, annotations, defaults and flag overrides. It is the input of
//! [`ContentParser`](crate::parser::ContentParser) compilation.
//!
//! Parameter kinds follow the usual ordering: positional parameters, then at
//! most one variadic positional parameter, then keyword-only parameters, then
//! at most one keyword catch-all.
//!
//! ```
//! use parley_framework::{Annotation, Signature, SignatureParameter};
//!
//! let signature = Signature::new("ban")
//!     .parameter(SignatureParameter::positional("ctx"))
//!     .parameter(SignatureParameter::positional("days").annotation(Annotation::of::<i64>()))
//!     .parameter(SignatureParameter::positional("reason").default("no reason given".to_string()));
//!
//! assert!(signature.validate().is_ok());
//! ```

use std::any::Any;
use std::collections::HashSet;

use parley_core::Value;

use crate::annotation::Annotation;
use crate::error::{ConfigError, ConfigResult};
use crate::flags::ConverterFlag;

/// How a parameter binds arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParameterKind {
    Positional,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct SignatureParameter {
    name: String,
    kind: ParameterKind,
    annotation: Option<Annotation>,
    default: Option<Value>,
    flags: Option<ConverterFlag>,
}

impl SignatureParameter {
    fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation: None,
            default: None,
            flags: None,
        }
    }

    /// A parameter bound by position or by keyword.
    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Positional)
    }

    /// A parameter bound by keyword only.
    pub fn keyword_only(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::KeywordOnly)
    }

    /// The variadic positional parameter.
    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::VarPositional)
    }

    /// The keyword catch-all parameter.
    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::VarKeyword)
    }

    pub fn annotation(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn default<T: Any + Send + Sync>(self, value: T) -> Self {
        self.default_value(Value::new(value))
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Overrides the converter flags of this parameter.
    pub fn flags(mut self, flags: ConverterFlag) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn annotation_ref(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }

    pub fn default_ref(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn flags_override(&self) -> Option<ConverterFlag> {
        self.flags
    }
}

/// The declared parameters of a command handler.
#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    parameters: Vec<SignatureParameter>,
}

impl Signature {
    /// Creates an empty signature; `name` is used in logs and errors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn parameter(mut self, parameter: SignatureParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[SignatureParameter] {
        &self.parameters
    }

    /// Checks names, kinds and ordering.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        let mut previous = ParameterKind::Positional;

        for parameter in &self.parameters {
            if parameter.name.is_empty() {
                return Err(ConfigError::signature(&self.name, "parameter names cannot be empty"));
            }
            if !seen.insert(parameter.name.as_str()) {
                return Err(ConfigError::signature(
                    &self.name,
                    format!("duplicate parameter '{}'", parameter.name),
                ));
            }

            let variadic = matches!(
                parameter.kind,
                ParameterKind::VarPositional | ParameterKind::VarKeyword
            );
            if parameter.kind < previous || (variadic && parameter.kind == previous) {
                return Err(ConfigError::signature(
                    &self.name,
                    format!(
                        "parameter '{}' ({:?}) cannot follow a {:?} parameter",
                        parameter.name, parameter.kind, previous
                    ),
                ));
            }
            if variadic && parameter.default.is_some() {
                return Err(ConfigError::signature(
                    &self.name,
                    format!("variadic parameter '{}' cannot have a default", parameter.name),
                ));
            }
            previous = parameter.kind;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ordering() {
        let signature = Signature::new("ok")
            .parameter(SignatureParameter::positional("a"))
            .parameter(SignatureParameter::positional("b"))
            .parameter(SignatureParameter::var_positional("rest"))
            .parameter(SignatureParameter::keyword_only("k"))
            .parameter(SignatureParameter::var_keyword("extra"));
        assert!(signature.validate().is_ok());
    }

    #[test]
    fn test_duplicate_names() {
        let signature = Signature::new("dup")
            .parameter(SignatureParameter::positional("a"))
            .parameter(SignatureParameter::keyword_only("a"));
        assert!(matches!(
            signature.validate(),
            Err(ConfigError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_two_variadics() {
        let signature = Signature::new("args")
            .parameter(SignatureParameter::var_positional("a"))
            .parameter(SignatureParameter::var_positional("b"));
        assert!(signature.validate().is_err());

        let signature = Signature::new("kwargs")
            .parameter(SignatureParameter::var_keyword("a"))
            .parameter(SignatureParameter::var_keyword("b"));
        assert!(signature.validate().is_err());
    }

    #[test]
    fn test_positional_after_keyword_only() {
        let signature = Signature::new("order")
            .parameter(SignatureParameter::keyword_only("k"))
            .parameter(SignatureParameter::positional("p"));
        assert!(signature.validate().is_err());
    }

    #[test]
    fn test_variadic_default() {
        let signature =
            Signature::new("x").parameter(SignatureParameter::var_positional("a").default(1_i64));
        assert!(signature.validate().is_err());
    }
}
