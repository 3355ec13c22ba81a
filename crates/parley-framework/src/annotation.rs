//! Parameter annotations.
//!
//! An [`Annotation`] tells the parser how to convert a parameter. It is one of:
//!
//! - a type ([`Annotation::of::<T>()`](Annotation::of)), looked up in the
//!   registry's type table;
//! - a name (`"member"`), looked up in the registry's name table, which also
//!   covers refinement checkers such as `"text_channel"`;
//! - a described annotation, the `(annotation, description[, display_name])`
//!   tuple form;
//! - a set of the above, meaning "try each, first match wins".
//!
//! Every leaf resolves to one [`ParameterDetail`]. More than one detail makes
//! the parameter chained, which is only possible when every converter
//! consumes a token.

use std::fmt;
use std::sync::Arc;

use parley_core::TypeKey;

use crate::error::{ConfigError, ConfigResult};
use crate::flags::ConverterFlag;
use crate::parameter::ParameterDetail;
use crate::registry::ConverterRegistry;

/// How a parameter is converted.
#[derive(Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Converter registered for a type.
    Type(TypeKey),
    /// Converter registered under a name.
    Name(String),
    /// An annotation with a description and an optional display name.
    Described {
        inner: Box<Annotation>,
        description: String,
        display_name: Option<String>,
    },
    /// Alternatives, tried in declaration order.
    Set(Vec<Annotation>),
}

/// One element of the runtime tuple form accepted by
/// [`Annotation::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationPart {
    Annotation(Annotation),
    Text(String),
}

/// A resolvable element of an annotation after flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Leaf {
    Type(TypeKey),
    Name(String),
}

impl Annotation {
    /// Annotates with the converter registered for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    /// Annotates with the converter registered under `name`.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Annotates with several alternatives.
    pub fn set<I, A>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Annotation>,
    {
        Self::Set(alternatives.into_iter().map(Into::into).collect())
    }

    /// Attaches a description.
    pub fn described(self, description: impl Into<String>) -> Self {
        Self::Described {
            inner: Box::new(self.into_inner()),
            description: description.into(),
            display_name: None,
        }
    }

    /// Attaches a description and the name the parameter is shown and
    /// matched by.
    pub fn described_as(self, description: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::Described {
            inner: Box::new(self.into_inner()),
            description: description.into(),
            display_name: Some(display_name.into()),
        }
    }

    /// Builds an annotation from the runtime tuple form
    /// `[annotation, description]` or `[annotation, description, display_name]`.
    pub fn from_parts(parts: Vec<AnnotationPart>) -> ConfigResult<Self> {
        if !(2..=3).contains(&parts.len()) {
            return Err(ConfigError::AnnotationTupleLength(parts.len()));
        }

        let mut parts = parts.into_iter();
        let inner = match parts.next() {
            Some(AnnotationPart::Annotation(annotation)) => annotation,
            Some(AnnotationPart::Text(text)) => Annotation::Name(text),
            None => return Err(ConfigError::AnnotationTupleLength(0)),
        };
        let description = match parts.next() {
            Some(AnnotationPart::Text(text)) => text,
            _ => {
                return Err(ConfigError::InvalidAnnotation(
                    "the second tuple element must be a description".to_string(),
                ));
            }
        };
        let display_name = match parts.next() {
            None => None,
            Some(AnnotationPart::Text(text)) => Some(text),
            Some(AnnotationPart::Annotation(_)) => {
                return Err(ConfigError::InvalidAnnotation(
                    "the third tuple element must be a display name".to_string(),
                ));
            }
        };

        Ok(match display_name {
            Some(display_name) => inner.described_as(description, display_name),
            None => inner.described(description),
        })
    }

    /// Returns the first description found, searching sets depth-first.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Described { description, .. } => Some(description),
            Self::Set(items) => items.iter().find_map(Self::description),
            _ => None,
        }
    }

    /// Returns the first display name found, searching sets depth-first.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Described {
                inner,
                display_name,
                ..
            } => display_name.as_deref().or_else(|| inner.display_name()),
            Self::Set(items) => items.iter().find_map(Self::display_name),
            _ => None,
        }
    }

    fn into_inner(self) -> Self {
        match self {
            Self::Described { inner, .. } => *inner,
            other => other,
        }
    }

    /// Flattens nested sets and descriptions into distinct leaves, keeping
    /// first-seen order.
    fn leaves(&self) -> Vec<Leaf> {
        fn collect(annotation: &Annotation, out: &mut Vec<Leaf>) {
            let leaf = match annotation {
                Annotation::Type(key) => Leaf::Type(*key),
                Annotation::Name(name) => Leaf::Name(name.to_lowercase()),
                Annotation::Described { inner, .. } => return collect(inner, out),
                Annotation::Set(items) => {
                    for item in items {
                        collect(item, out);
                    }
                    return;
                }
            };
            if !out.contains(&leaf) {
                out.push(leaf);
            }
        }

        let mut leaves = Vec::new();
        collect(self, &mut leaves);
        leaves
    }

    /// Resolves the annotation into converter details.
    ///
    /// `flags` is the parameter's flag override; `parameter` only names the
    /// parameter in errors.
    pub fn resolve(
        &self,
        registry: &ConverterRegistry,
        flags: Option<ConverterFlag>,
        parameter: &str,
    ) -> ConfigResult<Vec<ParameterDetail>> {
        let leaves = self.leaves();
        if leaves.is_empty() {
            return Err(ConfigError::InvalidAnnotation(format!(
                "parameter '{parameter}' has an empty annotation set"
            )));
        }

        let mut details = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            let detail = match leaf {
                Leaf::Type(key) => {
                    let setting = registry.lookup_by_type(key)?;
                    let flags = setting.resolve_flags(flags)?;
                    let target = (setting.canonical_type() != key).then_some(key);
                    ParameterDetail::new(setting, flags).with_target_type(target)
                }
                Leaf::Name(name) => {
                    let setting = registry.lookup_by_name(&name)?;
                    let flags = setting.resolve_flags(flags)?;
                    let checker = setting.checker(&name).cloned();
                    ParameterDetail::new(setting, flags).with_checker(checker)
                }
            };

            // Different leaves can name the same converter, as `int` and `i64` do.
            let duplicate = !detail.has_checker()
                && details.iter().any(|existing: &ParameterDetail| {
                    Arc::ptr_eq(existing.setting(), detail.setting())
                        && !existing.has_checker()
                        && existing.target_type() == detail.target_type()
                });
            if !duplicate {
                details.push(detail);
            }
        }

        if details.len() > 1 {
            if let Some(detail) = details.iter().find(|detail| !detail.requires_part()) {
                return Err(ConfigError::ChainedInjection {
                    parameter: parameter.to_string(),
                    converter: detail.setting().name().to_string(),
                });
            }
        }

        Ok(details)
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(key) => write!(f, "{key}"),
            Self::Name(name) => write!(f, "{name:?}"),
            Self::Described {
                inner,
                description,
                display_name,
            } => {
                let mut tuple = f.debug_tuple("");
                tuple.field(inner).field(description);
                if let Some(display_name) = display_name {
                    tuple.field(display_name);
                }
                tuple.finish()
            }
            Self::Set(items) => f.debug_set().entries(items).finish(),
        }
    }
}

impl From<TypeKey> for Annotation {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl From<&str> for Annotation {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Annotation {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<A: Into<Annotation>> From<(A, &str)> for Annotation {
    fn from((annotation, description): (A, &str)) -> Self {
        annotation.into().described(description)
    }
}

impl<A: Into<Annotation>> From<(A, &str, &str)> for Annotation {
    fn from((annotation, description, display_name): (A, &str, &str)) -> Self {
        annotation.into().described_as(description, display_name)
    }
}

impl From<Annotation> for AnnotationPart {
    fn from(annotation: Annotation) -> Self {
        Self::Annotation(annotation)
    }
}

impl From<&str> for AnnotationPart {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::CommandContext;

    #[test]
    fn test_from_parts_length() {
        let err = Annotation::from_parts(vec![Annotation::of::<i64>().into()]).unwrap_err();
        assert!(matches!(err, ConfigError::AnnotationTupleLength(1)));

        let parts = vec![
            Annotation::of::<i64>().into(),
            "a".into(),
            "b".into(),
            "c".into(),
        ];
        assert!(matches!(
            Annotation::from_parts(parts),
            Err(ConfigError::AnnotationTupleLength(4))
        ));

        let parts = vec![Annotation::of::<i64>().into(), Annotation::of::<bool>().into()];
        assert!(matches!(
            Annotation::from_parts(parts),
            Err(ConfigError::InvalidAnnotation(_))
        ));
    }

    #[test]
    fn test_from_parts_described() {
        let annotation = Annotation::from_parts(vec![
            Annotation::of::<i64>().into(),
            "how many".into(),
            "count".into(),
        ])
        .unwrap();
        assert_eq!(annotation.description(), Some("how many"));
        assert_eq!(annotation.display_name(), Some("count"));
        assert_eq!(annotation, Annotation::from((Annotation::of::<i64>(), "how many", "count")));
    }

    #[test]
    fn test_set_flattening() {
        let annotation = Annotation::set([
            Annotation::of::<i64>(),
            Annotation::set([Annotation::name("INT"), Annotation::of::<i64>()]),
            ("int", "duplicate by name").into(),
        ]);
        assert_eq!(
            annotation.leaves(),
            vec![Leaf::Type(TypeKey::of::<i64>()), Leaf::Name("int".to_string())]
        );
    }

    #[test]
    fn test_resolve_chained() {
        let registry = ConverterRegistry::with_defaults().unwrap();
        let details = Annotation::set([Annotation::of::<i64>(), Annotation::of::<String>()])
            .resolve(&registry, None, "value")
            .unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].setting().name(), "int");
        assert_eq!(details[1].setting().name(), "str");
    }

    #[test]
    fn test_resolve_merges_same_converter() {
        let registry = ConverterRegistry::with_defaults().unwrap();
        let details = Annotation::set([Annotation::of::<i64>(), "int".into()])
            .resolve(&registry, None, "value")
            .unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].setting().name(), "int");

        let details = Annotation::set([Annotation::of::<i64>(), "str".into(), Annotation::name("INT")])
            .resolve(&registry, None, "value")
            .unwrap();
        let names: Vec<&str> = details.iter().map(|detail| detail.setting().name()).collect();
        assert_eq!(names, vec!["int", "str"]);
    }

    #[test]
    fn test_nested_description() {
        let annotation = Annotation::set([
            Annotation::of::<i64>(),
            (Annotation::of::<String>(), "how often", "times").into(),
        ]);
        assert_eq!(annotation.description(), Some("how often"));
        assert_eq!(annotation.display_name(), Some("times"));

        let annotation = Annotation::set([
            Annotation::from(("int", "a number")),
            Annotation::from(("str", "some text", "label")),
        ])
        .described("outer");
        assert_eq!(annotation.description(), Some("outer"));
        assert_eq!(annotation.display_name(), Some("label"));

        assert_eq!(Annotation::of::<i64>().display_name(), None);
    }

    #[test]
    fn test_resolve_chained_injection() {
        let registry = ConverterRegistry::with_defaults().unwrap();
        let err = Annotation::set([Annotation::of::<String>(), Annotation::of::<CommandContext>()])
            .resolve(&registry, None, "value")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ChainedInjection { .. }));

        let details = Annotation::of::<CommandContext>()
            .resolve(&registry, None, "ctx")
            .unwrap();
        assert!(!details[0].requires_part());
    }

    #[test]
    fn test_resolve_missing_converter() {
        let registry = ConverterRegistry::with_defaults().unwrap();
        assert!(matches!(
            Annotation::of::<Arc<u8>>().resolve(&registry, None, "x"),
            Err(ConfigError::NoConverterForType(_))
        ));
        assert!(matches!(
            Annotation::name("nope").resolve(&registry, None, "x"),
            Err(ConfigError::NoConverterForName(_))
        ));
        assert!(matches!(
            Annotation::Set(Vec::new()).resolve(&registry, None, "x"),
            Err(ConfigError::InvalidAnnotation(_))
        ));
    }

    #[test]
    fn test_resolve_flags() {
        let registry = ConverterRegistry::with_defaults().unwrap();
        let err = Annotation::of::<i64>()
            .resolve(&registry, Some(ConverterFlag::ID), "x")
            .unwrap_err();
        assert!(matches!(err, ConfigError::DisjointFlags { .. }));
    }
}
