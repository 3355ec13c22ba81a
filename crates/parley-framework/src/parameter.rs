//! Parameter plans.
//!
//! [`ContentParserParameter::compile`] turns a [`Signature`] into one
//! [`ContentParserParameter`] per declared parameter. Annotations are resolved
//! first, then a fixed sequence of classification passes fills in what the
//! author left implicit:
//!
//! 1. an unannotated parameter named like the context (`ctx`, `context`) is
//!    bound to the context injector, unless another parameter already is;
//! 2. if the first two parameters are unannotated and named like the client
//!    (`c`, `client`) and the message (`m`, `msg`, `message`), both are bound
//!    to their injectors;
//! 3. if there is no variadic, keyword-only or rest parameter, an unannotated
//!    last positional parameter captures the rest of the content;
//! 4. every parameter still unresolved gets the string converter.
//!
//! The order matters: injected parameters are never mistaken for the rest
//! parameter, and the rest parameter is chosen before the string fallback.

use std::fmt;
use std::sync::Arc;

use parley_core::{
    ClientHandle, CommandContext, ConvertResult, MessageHandle, TypeKey, Value,
};

use crate::annotation::Annotation;
use crate::error::ConfigResult;
use crate::flags::ConverterFlag;
use crate::registry::{ConverterRegistry, ConverterSetting, TypeChecker};
use crate::signature::{ParameterKind, Signature};

// =============================================================================
// ParameterDetail
// =============================================================================

/// One resolved way of converting a parameter.
#[derive(Clone)]
pub struct ParameterDetail {
    setting: Arc<ConverterSetting>,
    flags: ConverterFlag,
    target_type: Option<TypeKey>,
    checker: Option<TypeChecker>,
}

impl ParameterDetail {
    /// Creates a detail for `setting` with already resolved `flags`.
    pub fn new(setting: Arc<ConverterSetting>, flags: ConverterFlag) -> Self {
        Self {
            setting,
            flags,
            target_type: None,
            checker: None,
        }
    }

    /// Sets the concrete type the converter should produce, for converters
    /// registered under alternative types.
    pub fn with_target_type(mut self, target_type: Option<TypeKey>) -> Self {
        self.target_type = target_type;
        self
    }

    /// Sets the refinement predicate results must pass.
    pub fn with_checker(mut self, checker: Option<TypeChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn setting(&self) -> &Arc<ConverterSetting> {
        &self.setting
    }

    pub fn flags(&self) -> ConverterFlag {
        self.flags
    }

    pub fn target_type(&self) -> Option<TypeKey> {
        self.target_type
    }

    pub fn has_checker(&self) -> bool {
        self.checker.is_some()
    }

    /// Returns `true` if the converter consumes a token.
    pub fn requires_part(&self) -> bool {
        self.setting.requires_part()
    }

    /// Runs the converter; values rejected by the checker count as no match.
    pub async fn convert(
        &self,
        ctx: &CommandContext,
        part: Option<&str>,
    ) -> ConvertResult<Option<Value>> {
        let value = self.setting.converter().call(ctx, self, part).await?;
        Ok(value.filter(|value| self.checker.as_ref().is_none_or(|checker| checker(value))))
    }
}

impl fmt::Debug for ParameterDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDetail")
            .field("converter", &self.setting.name())
            .field("flags", &self.flags)
            .field("target_type", &self.target_type)
            .field("checker", &self.checker.is_some())
            .finish()
    }
}

// =============================================================================
// Classification names
// =============================================================================

/// Parameter names recognized by the classification passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationNames {
    pub context: Vec<String>,
    pub client: Vec<String>,
    pub message: Vec<String>,
}

impl Default for ClassificationNames {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|name| name.to_string()).collect()
        }

        Self {
            context: owned(&["ctx", "context"]),
            client: owned(&["c", "client"]),
            message: owned(&["m", "msg", "message"]),
        }
    }
}

impl ClassificationNames {
    fn matches(names: &[String], name: &str) -> bool {
        names.iter().any(|candidate| candidate == name)
    }
}

// =============================================================================
// ContentParserParameter
// =============================================================================

/// What a parameter does during a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterRole {
    /// Takes one token, by position or by keyword.
    Positional,
    /// Takes one keyed token.
    KeywordOnly,
    /// Takes unkeyed tokens until one fails to convert.
    Args,
    /// Takes every keyed token no other parameter claims.
    Kwargs,
    /// Takes the unconsumed rest of the content verbatim.
    Rest,
}

/// The parsing plan of one parameter.
#[derive(Clone)]
pub struct ContentParserParameter {
    name: String,
    display_name: String,
    description: Option<String>,
    default: Option<Value>,
    details: Vec<ParameterDetail>,
    role: ParameterRole,
    annotated: bool,
    flags: Option<ConverterFlag>,
}

impl ContentParserParameter {
    /// Compiles the parameters of `signature`.
    pub fn compile(
        registry: &ConverterRegistry,
        signature: &Signature,
        names: &ClassificationNames,
    ) -> ConfigResult<Vec<Self>> {
        signature.validate()?;

        let mut parameters = signature
            .parameters()
            .iter()
            .map(|declared| -> ConfigResult<Self> {
                let details = match declared.annotation_ref() {
                    Some(annotation) => {
                        annotation.resolve(registry, declared.flags_override(), declared.name())?
                    }
                    None => Vec::new(),
                };
                let annotation = declared.annotation_ref();
                Ok(Self {
                    name: declared.name().to_string(),
                    display_name: annotation
                        .and_then(Annotation::display_name)
                        .unwrap_or(declared.name())
                        .to_string(),
                    description: annotation
                        .and_then(Annotation::description)
                        .map(str::to_string),
                    default: declared.default_ref().cloned(),
                    details,
                    role: match declared.kind() {
                        ParameterKind::Positional => ParameterRole::Positional,
                        ParameterKind::KeywordOnly => ParameterRole::KeywordOnly,
                        ParameterKind::VarPositional => ParameterRole::Args,
                        ParameterKind::VarKeyword => ParameterRole::Kwargs,
                    },
                    annotated: annotation.is_some(),
                    flags: declared.flags_override(),
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        bind_context(registry, &mut parameters, names)?;
        bind_client_and_message(registry, &mut parameters, names)?;
        mark_rest(&mut parameters);
        default_to_string(registry, &mut parameters)?;

        Ok(parameters)
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name the parameter is shown as and matched against keywords.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The converter alternatives, in declaration order. Empty for the rest
    /// parameter.
    pub fn details(&self) -> &[ParameterDetail] {
        &self.details
    }

    pub fn role(&self) -> ParameterRole {
        self.role
    }

    /// Returns `true` for parameters bound by position, including the rest
    /// parameter.
    pub fn is_positional(&self) -> bool {
        matches!(self.role, ParameterRole::Positional | ParameterRole::Rest)
    }

    /// Returns `true` for keyword-only parameters.
    pub fn is_keyword(&self) -> bool {
        self.role == ParameterRole::KeywordOnly
    }

    /// Returns `true` for the variadic positional parameter.
    pub fn is_args(&self) -> bool {
        self.role == ParameterRole::Args
    }

    /// Returns `true` for the keyword catch-all parameter.
    pub fn is_kwargs(&self) -> bool {
        self.role == ParameterRole::Kwargs
    }

    /// Returns `true` for the parameter capturing the rest of the content.
    pub fn is_rest(&self) -> bool {
        self.role == ParameterRole::Rest
    }

    /// Returns `true` if the parameter has several converter alternatives.
    pub fn is_chained(&self) -> bool {
        self.details.len() > 1
    }

    /// Returns `true` if the value is produced without consuming a token.
    pub fn is_injected(&self) -> bool {
        matches!(self.details.as_slice(), [detail] if !detail.requires_part())
    }

    fn is_unresolved(&self) -> bool {
        !self.annotated && self.details.is_empty() && self.role != ParameterRole::Rest
    }

    fn bind(&mut self, registry: &ConverterRegistry, key: TypeKey) -> ConfigResult<()> {
        let setting = registry.lookup_by_type(key)?;
        let flags = setting.resolve_flags(self.flags)?;
        self.details = vec![ParameterDetail::new(setting, flags)];
        Ok(())
    }
}

impl fmt::Debug for ContentParserParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentParserParameter")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("details", &self.details)
            .field("default", &self.default)
            .finish()
    }
}

// =============================================================================
// Classification passes
// =============================================================================

fn binds(parameter: &ContentParserParameter, key: TypeKey) -> bool {
    parameter
        .details
        .iter()
        .any(|detail| detail.setting().canonical_type() == key)
}

fn is_single(parameter: &ContentParserParameter) -> bool {
    matches!(
        parameter.role,
        ParameterRole::Positional | ParameterRole::KeywordOnly
    )
}

fn bind_context(
    registry: &ConverterRegistry,
    parameters: &mut [ContentParserParameter],
    names: &ClassificationNames,
) -> ConfigResult<()> {
    let context = TypeKey::of::<CommandContext>();
    if parameters.iter().any(|parameter| binds(parameter, context)) {
        return Ok(());
    }

    let candidate = parameters.iter_mut().find(|parameter| {
        parameter.is_unresolved()
            && is_single(parameter)
            && ClassificationNames::matches(&names.context, &parameter.name)
    });
    match candidate {
        Some(parameter) => parameter.bind(registry, context),
        None => Ok(()),
    }
}

fn bind_client_and_message(
    registry: &ConverterRegistry,
    parameters: &mut [ContentParserParameter],
    names: &ClassificationNames,
) -> ConfigResult<()> {
    let [client, message, ..] = parameters else {
        return Ok(());
    };

    let eligible = |parameter: &ContentParserParameter, names: &[String]| {
        parameter.is_unresolved()
            && parameter.role == ParameterRole::Positional
            && ClassificationNames::matches(names, &parameter.name)
    };
    if eligible(client, &names.client) && eligible(message, &names.message) {
        client.bind(registry, TypeKey::of::<ClientHandle>())?;
        message.bind(registry, TypeKey::of::<MessageHandle>())?;
    }
    Ok(())
}

fn mark_rest(parameters: &mut [ContentParserParameter]) {
    let blocked = parameters.iter().any(|parameter| {
        matches!(
            parameter.role,
            ParameterRole::Args | ParameterRole::KeywordOnly | ParameterRole::Kwargs | ParameterRole::Rest
        )
    });
    if blocked {
        return;
    }

    if let Some(last) = parameters.last_mut() {
        if last.role == ParameterRole::Positional && last.is_unresolved() {
            last.role = ParameterRole::Rest;
            last.details.clear();
        }
    }
}

fn default_to_string(
    registry: &ConverterRegistry,
    parameters: &mut [ContentParserParameter],
) -> ConfigResult<()> {
    for parameter in parameters.iter_mut().filter(|parameter| parameter.is_unresolved()) {
        parameter.bind(registry, TypeKey::of::<String>())?;
    }
    Ok(())
}
