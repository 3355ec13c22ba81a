//! Converter registry.
//!
//! The registry maps target types and annotation names to
//! [`ConverterSetting`]s. It is built once at startup, with every converter
//! registered through an explicit [`ConverterRegistry::register`] call, and
//! is read-only afterwards: parsers hold `Arc<ConverterSetting>` handles and
//! the registry itself is shared as `Arc<ConverterRegistry>`.
//!
//! All validation happens at registration time, so a misdeclared converter
//! fails process startup rather than a live parse.
//!
//! # Example
//!
//! ```
//! use parley_framework::{ConverterFn, ConverterRegistry, ConverterSetting, ParseFn};
//! use parley_core::TypeKey;
//!
//! #[derive(Clone)]
//! struct Hex(u32);
//!
//! let mut registry = ConverterRegistry::with_defaults().unwrap();
//! registry
//!     .register(
//!         ConverterSetting::builder(
//!             "hex",
//!             TypeKey::of::<Hex>(),
//!             ConverterFn::part(ParseFn::new(|part| {
//!                 u32::from_str_radix(part.trim_start_matches("0x"), 16).ok().map(Hex)
//!             })),
//!         )
//!         .build()
//!         .unwrap(),
//!     )
//!     .unwrap();
//!
//! assert!(registry.lookup_by_name("hex").is_ok());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::converter::ConverterFn;
use crate::error::{ConfigError, ConfigResult};
use crate::flags::ConverterFlag;
use parley_core::{TypeKey, Value};

/// Extra predicate refining the values a converter may produce, used for
/// derived types (`"text_channel"` on a channel converter, ...).
pub type TypeChecker = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

// =============================================================================
// ConverterSetting
// =============================================================================

/// A registered converter and everything the parser needs to know about it.
pub struct ConverterSetting {
    name: String,
    converter: ConverterFn,
    requires_part: bool,
    uses_flags: bool,
    default_flags: ConverterFlag,
    all_flags: ConverterFlag,
    canonical_type: TypeKey,
    alternative_names: Vec<String>,
    alternative_types: Vec<TypeKey>,
    checkers: HashMap<String, TypeChecker>,
}

impl ConverterSetting {
    /// Starts declaring a converter named `name` for `canonical_type`.
    pub fn builder(
        name: impl Into<String>,
        canonical_type: TypeKey,
        converter: ConverterFn,
    ) -> ConverterSettingBuilder {
        ConverterSettingBuilder {
            name: name.into(),
            converter,
            canonical_type,
            requires_part: None,
            uses_flags: None,
            default_flags: ConverterFlag::NONE,
            all_flags: ConverterFlag::NONE,
            alternative_names: Vec::new(),
            alternative_types: Vec::new(),
            checkers: HashMap::new(),
        }
    }

    /// Returns the canonical name of the converter.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the converter function.
    pub fn converter(&self) -> &ConverterFn {
        &self.converter
    }

    /// Returns `true` if the converter consumes a token.
    pub fn requires_part(&self) -> bool {
        self.requires_part
    }

    /// Returns `true` if the converter changes behavior based on flags.
    pub fn uses_flags(&self) -> bool {
        self.uses_flags
    }

    /// Returns the flags used when a parameter specifies none.
    pub fn default_flags(&self) -> ConverterFlag {
        self.default_flags
    }

    /// Returns every flag the converter understands.
    pub fn all_flags(&self) -> ConverterFlag {
        self.all_flags
    }

    /// Returns the type the converter produces.
    pub fn canonical_type(&self) -> TypeKey {
        self.canonical_type
    }

    /// Returns the extra names the converter can be looked up by.
    pub fn alternative_names(&self) -> &[String] {
        &self.alternative_names
    }

    /// Returns the extra types the converter is registered for.
    pub fn alternative_types(&self) -> &[TypeKey] {
        &self.alternative_types
    }

    /// Returns the refinement predicate registered under `name`.
    pub fn checker(&self, name: &str) -> Option<&TypeChecker> {
        self.checkers.get(name)
    }

    /// Computes the effective flags for a parameter using this converter.
    pub fn resolve_flags(&self, requested: Option<ConverterFlag>) -> ConfigResult<ConverterFlag> {
        ConverterFlag::resolve(requested, self.all_flags, self.default_flags).ok_or_else(|| {
            ConfigError::DisjointFlags {
                converter: self.name.clone(),
                requested: requested.unwrap_or_default(),
                supported: self.all_flags,
            }
        })
    }
}

impl fmt::Debug for ConverterSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterSetting")
            .field("name", &self.name)
            .field("converter", &self.converter)
            .field("requires_part", &self.requires_part)
            .field("default_flags", &self.default_flags)
            .field("all_flags", &self.all_flags)
            .field("canonical_type", &self.canonical_type)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConverterSetting`]; validation happens in
/// [`build`](Self::build).
pub struct ConverterSettingBuilder {
    name: String,
    converter: ConverterFn,
    canonical_type: TypeKey,
    requires_part: Option<bool>,
    uses_flags: Option<bool>,
    default_flags: ConverterFlag,
    all_flags: ConverterFlag,
    alternative_names: Vec<String>,
    alternative_types: Vec<TypeKey>,
    checkers: HashMap<String, TypeChecker>,
}

impl ConverterSettingBuilder {
    /// Declares whether the converter consumes a token.
    ///
    /// Defaults to the capability of the converter function; declaring a
    /// different value is an arity error.
    pub fn requires_part(mut self, requires_part: bool) -> Self {
        self.requires_part = Some(requires_part);
        self
    }

    /// Declares whether the converter uses flags.
    ///
    /// Defaults to `true` exactly when supported flags are declared.
    pub fn uses_flags(mut self, uses_flags: bool) -> Self {
        self.uses_flags = Some(uses_flags);
        self
    }

    /// Declares the default and the supported flags.
    pub fn flags(mut self, default_flags: ConverterFlag, all_flags: ConverterFlag) -> Self {
        self.default_flags = default_flags;
        self.all_flags = all_flags;
        self
    }

    /// Adds another name the converter can be looked up by.
    pub fn alternative_name(mut self, name: impl Into<String>) -> Self {
        self.alternative_names.push(name.into());
        self
    }

    /// Adds another type the converter is registered for.
    pub fn alternative_type(mut self, key: TypeKey) -> Self {
        self.alternative_types.push(key);
        self
    }

    /// Registers a refinement predicate under `name`.
    ///
    /// Annotating a parameter with `name` selects this converter, and values
    /// failing `checker` count as no match.
    pub fn checker(
        mut self,
        name: impl Into<String>,
        checker: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.checkers.insert(name.into(), Arc::new(checker));
        self
    }

    /// Validates the declaration.
    pub fn build(self) -> ConfigResult<ConverterSetting> {
        let requires_part = self
            .requires_part
            .unwrap_or_else(|| self.converter.consumes_part());
        let expected = if requires_part { 3 } else { 2 };
        if self.converter.arity() != expected {
            return Err(ConfigError::ConverterArity {
                converter: self.name,
                expected,
                found: self.converter.arity(),
            });
        }

        let uses_flags = self.uses_flags.unwrap_or(!self.all_flags.is_empty());
        if !uses_flags && !self.all_flags.is_empty() {
            return Err(ConfigError::UnusedFlags {
                converter: self.name,
                all: self.all_flags,
            });
        }
        if uses_flags && self.all_flags.is_empty() {
            return Err(ConfigError::EmptyFlags {
                converter: self.name,
            });
        }
        if !self.all_flags.contains(self.default_flags) {
            return Err(ConfigError::DefaultFlagsOutOfRange {
                converter: self.name,
                default: self.default_flags,
                all: self.all_flags,
            });
        }

        Ok(ConverterSetting {
            name: self.name.to_lowercase(),
            converter: self.converter,
            requires_part,
            uses_flags,
            default_flags: self.default_flags,
            all_flags: self.all_flags,
            canonical_type: self.canonical_type,
            alternative_names: self
                .alternative_names
                .iter()
                .map(|name| name.to_lowercase())
                .collect(),
            alternative_types: self.alternative_types,
            checkers: self
                .checkers
                .into_iter()
                .map(|(name, checker)| (name.to_lowercase(), checker))
                .collect(),
        })
    }
}

// =============================================================================
// ConverterRegistry
// =============================================================================

/// Lookup tables from types and names to converter settings.
#[derive(Default)]
pub struct ConverterRegistry {
    by_type: HashMap<TypeKey, Arc<ConverterSetting>>,
    by_name: HashMap<String, Arc<ConverterSetting>>,
}

impl ConverterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in converters.
    ///
    /// See [`converters`](crate::converters) for the list.
    pub fn with_defaults() -> ConfigResult<Self> {
        let mut registry = Self::new();
        crate::converters::register_defaults(&mut registry)?;
        Ok(registry)
    }

    /// Registers a converter under its canonical and alternative types and
    /// names.
    ///
    /// Nothing is registered if any key is already taken.
    pub fn register(&mut self, setting: ConverterSetting) -> ConfigResult<()> {
        let types: Vec<TypeKey> = std::iter::once(setting.canonical_type)
            .chain(setting.alternative_types.iter().copied())
            .collect();
        let names: Vec<String> = std::iter::once(setting.name.clone())
            .chain(setting.alternative_names.iter().cloned())
            .chain(setting.checkers.keys().cloned())
            .collect();

        if let Some(key) = types.iter().find(|key| self.by_type.contains_key(key)) {
            return Err(ConfigError::DuplicateConverter(key.name().to_string()));
        }
        if let Some(name) = names.iter().find(|name| self.by_name.contains_key(*name)) {
            return Err(ConfigError::DuplicateConverter(name.clone()));
        }

        debug!(
            converter = %setting.name,
            requires_part = setting.requires_part,
            flags = ?setting.all_flags,
            "Registered converter"
        );

        let setting = Arc::new(setting);
        for key in types {
            self.by_type.insert(key, Arc::clone(&setting));
        }
        for name in names {
            self.by_name.insert(name, Arc::clone(&setting));
        }
        Ok(())
    }

    /// Returns the converter registered for `key`.
    pub fn lookup_by_type(&self, key: TypeKey) -> ConfigResult<Arc<ConverterSetting>> {
        self.by_type
            .get(&key)
            .cloned()
            .ok_or(ConfigError::NoConverterForType(key.name()))
    }

    /// Returns the converter registered under `name` (case-insensitive).
    pub fn lookup_by_name(&self, name: &str) -> ConfigResult<Arc<ConverterSetting>> {
        self.by_name
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| ConfigError::NoConverterForName(name.to_string()))
    }

    /// Returns the number of distinct converters.
    pub fn len(&self) -> usize {
        let mut seen: Vec<*const ConverterSetting> =
            self.by_type.values().map(Arc::as_ptr).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    /// Returns `true` if no converter is registered.
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Iterates over the distinct registered converters.
    pub fn settings(&self) -> impl Iterator<Item = &Arc<ConverterSetting>> {
        let mut seen = Vec::new();
        self.by_type.values().filter(move |setting| {
            let ptr = Arc::as_ptr(setting);
            if seen.contains(&ptr) {
                false
            } else {
                seen.push(ptr);
                true
            }
        })
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.settings().map(|setting| setting.name()).collect();
        names.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("converters", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{InjectConverter, ParseFn};
    use crate::parameter::ParameterDetail;
    use async_trait::async_trait;
    use parley_core::{CommandContext, ConvertResult};

    struct Nothing;

    #[async_trait]
    impl InjectConverter for Nothing {
        async fn inject(
            &self,
            _ctx: &CommandContext,
            _detail: &ParameterDetail,
        ) -> ConvertResult<Option<Value>> {
            Ok(None)
        }
    }

    fn parse_u8(part: &str) -> Option<u8> {
        part.parse().ok()
    }

    fn u8_setting() -> ConverterSettingBuilder {
        ConverterSetting::builder(
            "byte",
            TypeKey::of::<u8>(),
            ConverterFn::part(ParseFn::new(parse_u8)),
        )
    }

    #[test]
    fn test_arity_mismatch() {
        let err = u8_setting().requires_part(false).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConverterArity {
                expected: 2,
                found: 3,
                ..
            }
        ));

        let err = ConverterSetting::builder("nothing", TypeKey::of::<()>(), ConverterFn::inject(Nothing))
            .requires_part(true)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConverterArity {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_flag_declarations() {
        let err = u8_setting()
            .uses_flags(false)
            .flags(ConverterFlag::NONE, ConverterFlag::ID)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnusedFlags { .. }));

        let err = u8_setting().uses_flags(true).build().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFlags { .. }));

        let err = u8_setting()
            .flags(ConverterFlag::ID | ConverterFlag::NAME, ConverterFlag::ID)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DefaultFlagsOutOfRange { .. }));

        let setting = u8_setting()
            .flags(ConverterFlag::ID, ConverterFlag::ID | ConverterFlag::NAME)
            .build()
            .unwrap();
        assert!(setting.uses_flags());
        assert!(setting.requires_part());
    }

    #[test]
    fn test_lookup() {
        let mut registry = ConverterRegistry::new();
        registry
            .register(
                u8_setting()
                    .alternative_name("u8")
                    .alternative_type(TypeKey::of::<std::num::NonZeroU8>())
                    .checker("even_byte", |value| {
                        value.downcast_ref::<u8>().is_some_and(|n| n % 2 == 0)
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let by_type = registry.lookup_by_type(TypeKey::of::<u8>()).unwrap();
        let by_alt_type = registry
            .lookup_by_type(TypeKey::of::<std::num::NonZeroU8>())
            .unwrap();
        let by_name = registry.lookup_by_name("BYTE").unwrap();
        let by_checker = registry.lookup_by_name("even_byte").unwrap();
        assert!(Arc::ptr_eq(&by_type, &by_alt_type));
        assert!(Arc::ptr_eq(&by_type, &by_name));
        assert!(Arc::ptr_eq(&by_type, &by_checker));
        assert!(by_type.checker("even_byte").is_some());
        assert_eq!(registry.len(), 1);

        assert!(matches!(
            registry.lookup_by_type(TypeKey::of::<u16>()),
            Err(ConfigError::NoConverterForType(_))
        ));
        assert!(matches!(
            registry.lookup_by_name("word"),
            Err(ConfigError::NoConverterForName(_))
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ConverterRegistry::new();
        registry.register(u8_setting().build().unwrap()).unwrap();

        let err = registry.register(u8_setting().build().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateConverter(_)));

        let renamed = ConverterSetting::builder(
            "other",
            TypeKey::of::<u16>(),
            ConverterFn::part(ParseFn::new(parse_u8)),
        )
        .alternative_name("byte")
        .build()
        .unwrap();
        assert!(registry.register(renamed).is_err());
        assert!(registry.lookup_by_type(TypeKey::of::<u16>()).is_err());
    }

    #[test]
    fn test_disjoint_flags_for_every_default_converter() {
        let registry = ConverterRegistry::with_defaults().unwrap();
        for setting in registry.settings() {
            for bits in 0..=ConverterFlag::all().bits() {
                let requested = ConverterFlag::from_bits_truncate(bits);
                let resolved = setting.resolve_flags(Some(requested));
                if requested.intersects(setting.all_flags()) {
                    assert_eq!(resolved.unwrap(), requested & setting.all_flags());
                } else {
                    assert!(matches!(resolved, Err(ConfigError::DisjointFlags { .. })));
                }
            }
            assert_eq!(setting.resolve_flags(None).unwrap(), setting.default_flags());
        }
    }
}
