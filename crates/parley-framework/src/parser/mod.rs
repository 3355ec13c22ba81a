//! The content parser.
//!
//! A [`ContentParser`] is compiled once per handler signature and then run
//! once per invocation. A parse:
//!
//! 1. resolves every injected parameter (context, client, message, ...);
//! 2. tokenizes the content left to right, binding keyed tokens by display
//!    name (or to the catch-all) and unkeyed tokens to the next open
//!    positional or variadic parameter;
//! 3. hands whatever is left to the rest parameter once nothing else takes
//!    tokens;
//! 4. assembles the [`Arguments`] in declaration order, failing on the first
//!    required parameter without a value.
//!
//! Converters are awaited one at a time in token order. A converter error
//! aborts the parse and no partial arguments are returned.

mod state;

pub use state::{ParameterParsingState, StateStatus};

use std::sync::Arc;

use tracing::{Instrument, debug, debug_span, trace};

use crate::arguments::Arguments;
use crate::error::{ConfigResult, ParseError, ParseResult};
use crate::parameter::{ClassificationNames, ContentParserParameter, ParameterRole};
use crate::registry::ConverterRegistry;
use crate::separator::{Separator, Token};
use crate::signature::Signature;
use parley_core::{CommandContext, Value};

/// A compiled parsing plan for one handler signature.
///
/// Cheap to clone; the plan and the separator are shared.
///
/// # Example
///
/// ```
/// use parley_framework::{Annotation, ContentParser, ConverterRegistry, Signature, SignatureParameter};
/// use parley_core::CommandContext;
///
/// let registry = ConverterRegistry::with_defaults().unwrap();
/// let parser = ContentParser::new(
///     &registry,
///     &Signature::new("repeat")
///         .parameter(SignatureParameter::positional("times").annotation(Annotation::of::<i64>()))
///         .parameter(SignatureParameter::positional("text")),
/// )
/// .unwrap();
///
/// let ctx = CommandContext::new("3 hello there");
/// let args = tokio_test::block_on(parser.parse(&ctx)).unwrap();
/// let (times, text): (i64, String) = args.extract().unwrap();
/// assert_eq!(times, 3);
/// assert_eq!(text, "hello there");
/// ```
#[derive(Debug, Clone)]
pub struct ContentParser {
    name: Arc<str>,
    parameters: Arc<[ContentParserParameter]>,
    separator: Arc<Separator>,
}

impl ContentParser {
    /// Compiles `signature` with the default separator and classification
    /// names.
    pub fn new(registry: &ConverterRegistry, signature: &Signature) -> ConfigResult<Self> {
        Self::builder(signature).build(registry)
    }

    /// Starts configuring a parser for `signature`.
    pub fn builder(signature: &Signature) -> ContentParserBuilder<'_> {
        ContentParserBuilder {
            signature,
            separator: None,
            names: None,
        }
    }

    /// The signature name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ContentParserParameter] {
        &self.parameters
    }

    pub fn separator(&self) -> &Arc<Separator> {
        &self.separator
    }

    /// Parses the arguments part of `ctx`.
    pub async fn parse(&self, ctx: &CommandContext) -> ParseResult<Arguments> {
        let span = debug_span!("parse", command = %self.name);
        self.run(ctx).instrument(span).await
    }

    async fn run(&self, ctx: &CommandContext) -> ParseResult<Arguments> {
        let mut states: Vec<ParameterParsingState> = self
            .parameters
            .iter()
            .map(ParameterParsingState::new)
            .collect();

        for (parameter, state) in self.parameters.iter().zip(states.iter_mut()) {
            if parameter.is_injected() {
                let value = self.convert(ctx, parameter, None).await?;
                debug!(parameter = parameter.name(), resolved = value.is_some(), "Injected parameter");
                state.record(value);
            }
        }

        let content = ctx.content();
        let mut index = ctx.content_offset();
        let mut reoffered: Option<(usize, Token<'_>)> = None;

        loop {
            let start = reoffered.as_ref().map_or(index, |(start, _)| *start);
            if self.separator.parse_rest(content, start).is_empty() {
                break;
            }

            if !states.iter().any(ParameterParsingState::is_open) {
                if let Some(rest) = states.iter_mut().find(|state| state.is_empty_rest()) {
                    rest.capture(self.separator.parse_rest(content, start));
                }
                break;
            }

            let token = match reoffered.take() {
                Some((_, token)) => token,
                None => {
                    let token = self.separator.parse(content, index);
                    if token.next_index <= index {
                        break;
                    }
                    index = token.next_index;
                    token
                }
            };

            match token.keyword {
                Some(keyword) => self.bind_keyed(ctx, &mut states, keyword, &token.value).await?,
                None => {
                    let Some(position) = states.iter().position(ParameterParsingState::accepts_unkeyed)
                    else {
                        trace!(token = %token.value, "Discarded unclaimed token");
                        continue;
                    };

                    let parameter = &self.parameters[position];
                    let value = self.convert(ctx, parameter, Some(&token.value)).await?;
                    if value.is_none() && parameter.is_args() {
                        trace!(parameter = parameter.name(), token = %token.value, "Variadic parameter closed");
                        states[position].close();
                        reoffered = Some((start, token));
                        continue;
                    }
                    states[position].record(value);
                }
            }
        }

        self.assemble(&states)
    }

    async fn bind_keyed(
        &self,
        ctx: &CommandContext,
        states: &mut [ParameterParsingState],
        keyword: &str,
        value: &str,
    ) -> ParseResult<()> {
        let named = self
            .parameters
            .iter()
            .zip(states.iter())
            .position(|(parameter, state)| parameter.display_name() == keyword && state.accepts_keyed());
        let catch_all = || {
            self.parameters
                .iter()
                .position(ContentParserParameter::is_kwargs)
        };

        match named.or_else(catch_all) {
            Some(position) => {
                let parameter = &self.parameters[position];
                let converted = self.convert(ctx, parameter, Some(value)).await?;
                if parameter.is_kwargs() {
                    if let Some(converted) = converted {
                        states[position].record_keyword(keyword, converted);
                    }
                } else {
                    states[position].record(converted);
                }
            }
            None => trace!(keyword, value, "Discarded unmatched keyword"),
        }
        Ok(())
    }

    /// Tries each alternative of `parameter` in declaration order.
    async fn convert(
        &self,
        ctx: &CommandContext,
        parameter: &ContentParserParameter,
        part: Option<&str>,
    ) -> ParseResult<Option<Value>> {
        for detail in parameter.details() {
            match detail.convert(ctx, part).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => trace!(
                    parameter = parameter.name(),
                    converter = detail.setting().name(),
                    "No match"
                ),
                Err(source) => {
                    debug!(parameter = parameter.name(), error = %source, "Converter failed");
                    return Err(ParseError::Converter {
                        parameter: parameter.name().to_string(),
                        source,
                    });
                }
            }
        }
        Ok(None)
    }

    fn assemble(&self, states: &[ParameterParsingState]) -> ParseResult<Arguments> {
        let mut arguments = Arguments::new();

        for (parameter, state) in self.parameters.iter().zip(states) {
            match parameter.role() {
                ParameterRole::Positional | ParameterRole::KeywordOnly => {
                    let Some(value) = state.first_value().or(parameter.default()).cloned() else {
                        debug!(parameter = parameter.name(), "Missing required argument");
                        return Err(ParseError::missing(parameter.name()));
                    };
                    if parameter.is_keyword() {
                        arguments.push_keyword(parameter.name(), value);
                    } else {
                        arguments.push_positional(value);
                    }
                }
                ParameterRole::Args => {
                    for value in state.values() {
                        arguments.push_positional(value.clone());
                    }
                }
                ParameterRole::Kwargs => {
                    for (key, value) in state.keyword_entries() {
                        arguments.push_keyword(key.clone(), value.clone());
                    }
                }
                ParameterRole::Rest => {
                    let value = match state.rest_capture() {
                        Some(capture) => Value::new(capture.to_string()),
                        None => parameter
                            .default()
                            .cloned()
                            .unwrap_or_else(|| Value::new(String::new())),
                    };
                    arguments.push_positional(value);
                }
            }
        }

        Ok(arguments)
    }
}

/// Builder for [`ContentParser`].
#[derive(Debug)]
pub struct ContentParserBuilder<'a> {
    signature: &'a Signature,
    separator: Option<Arc<Separator>>,
    names: Option<ClassificationNames>,
}

impl ContentParserBuilder<'_> {
    /// Uses `separator` instead of the default quote separator.
    pub fn separator(mut self, separator: Arc<Separator>) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Uses `names` for the context, client and message heuristics.
    pub fn names(mut self, names: ClassificationNames) -> Self {
        self.names = Some(names);
        self
    }

    /// Compiles the plan against `registry`.
    pub fn build(self, registry: &ConverterRegistry) -> ConfigResult<ContentParser> {
        let names = self.names.unwrap_or_default();
        let parameters = ContentParserParameter::compile(registry, self.signature, &names)?;
        let separator = match self.separator {
            Some(separator) => separator,
            None => Separator::shared(Default::default(), crate::separator::DEFAULT_ASSIGNER)?,
        };

        debug!(
            command = self.signature.name(),
            parameters = parameters.len(),
            "Compiled content parser"
        );

        Ok(ContentParser {
            name: Arc::from(self.signature.name()),
            parameters: parameters.into(),
            separator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::separator::SeparatorKind;
    use crate::signature::SignatureParameter;

    fn parser(signature: Signature) -> ContentParser {
        let registry = ConverterRegistry::with_defaults().unwrap();
        ContentParser::new(&registry, &signature).unwrap()
    }

    #[tokio::test]
    async fn test_rest_capture() {
        let parser = parser(
            Signature::new("say")
                .parameter(SignatureParameter::positional("first"))
                .parameter(SignatureParameter::positional("rest")),
        );
        let args = parser.parse(&CommandContext::new("alpha beta gamma")).await.unwrap();
        let (first, rest): (String, String) = args.extract().unwrap();
        assert_eq!(first, "alpha");
        assert_eq!(rest, "beta gamma");
    }

    #[tokio::test]
    async fn test_rest_defaults_to_empty() {
        let parser = parser(
            Signature::new("say")
                .parameter(SignatureParameter::positional("first"))
                .parameter(SignatureParameter::positional("rest")),
        );
        let args = parser.parse(&CommandContext::new("alpha")).await.unwrap();
        assert_eq!(args.get::<String>(1).unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_required() {
        let parser = parser(
            Signature::new("count")
                .parameter(SignatureParameter::positional("n").annotation(Annotation::of::<i64>())),
        );
        let err = parser.parse(&CommandContext::new("")).await.unwrap_err();
        assert!(matches!(&err, ParseError::MissingArgument { parameter } if parameter == "n"));
    }

    #[tokio::test]
    async fn test_default_used() {
        let parser = parser(
            Signature::new("count").parameter(
                SignatureParameter::positional("n")
                    .annotation(Annotation::of::<i64>())
                    .default(10_i64),
            ),
        );
        let args = parser.parse(&CommandContext::new("   ")).await.unwrap();
        assert_eq!(args.get::<i64>(0).unwrap(), 10);
    }

    #[tokio::test]
    async fn test_variadic_accumulation() {
        let parser = parser(
            Signature::new("sum")
                .parameter(SignatureParameter::var_positional("numbers").annotation(Annotation::of::<i64>())),
        );
        let args = parser.parse(&CommandContext::new("1 2 notanumber 4")).await.unwrap();
        assert_eq!(args.extract::<Vec<i64>>().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_variadic_reoffers_token() {
        let parser = parser(
            Signature::new("tag")
                .parameter(SignatureParameter::var_positional("numbers").annotation(Annotation::of::<i64>()))
                .parameter(SignatureParameter::keyword_only("label").default("none".to_string())),
        );
        let args = parser.parse(&CommandContext::new("1 2 x label: y")).await.unwrap();
        assert_eq!(args.get_from::<i64>(0).unwrap(), vec![1, 2]);
        assert_eq!(args.get_keyword::<String>("label").unwrap(), "y");
    }

    #[tokio::test]
    async fn test_keyword_binding() {
        let parser = parser(
            Signature::new("greet")
                .parameter(SignatureParameter::positional("name").annotation(Annotation::of::<String>()))
                .parameter(SignatureParameter::keyword_only("times").annotation(Annotation::of::<i64>()))
                .parameter(SignatureParameter::var_keyword("extra")),
        );
        let args = parser
            .parse(&CommandContext::new("times: 3 Ada mood: happy mood: sad unknown"))
            .await
            .unwrap();
        assert_eq!(args.get::<String>(0).unwrap(), "Ada");
        assert_eq!(args.get_keyword::<i64>("times").unwrap(), 3);
        assert_eq!(args.get_keyword::<String>("mood").unwrap(), "happy");
        assert_eq!(args.keyword().len(), 2);
        assert_eq!(args.positional().len(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_keyword_is_dropped() {
        let parser = parser(
            Signature::new("greet")
                .parameter(SignatureParameter::positional("name").annotation(Annotation::of::<String>())),
        );
        let args = parser.parse(&CommandContext::new("color: red Ada")).await.unwrap();
        assert_eq!(args.get::<String>(0).unwrap(), "Ada");
        assert_eq!(args.len(), 1);
    }

    #[tokio::test]
    async fn test_keyword_by_display_name() {
        let parser = parser(
            Signature::new("repeat")
                .parameter(
                    SignatureParameter::positional("n")
                        .annotation((Annotation::of::<i64>(), "how often", "times")),
                )
                .parameter(SignatureParameter::positional("text").annotation(Annotation::of::<String>())),
        );
        let args = parser.parse(&CommandContext::new("times: 2 hello")).await.unwrap();
        let (n, text): (i64, String) = args.extract().unwrap();
        assert_eq!((n, text.as_str()), (2, "hello"));
    }

    #[tokio::test]
    async fn test_keyword_by_nested_display_name() {
        let parser = parser(
            Signature::new("repeat")
                .parameter(SignatureParameter::positional("n").annotation(Annotation::set([
                    Annotation::from((Annotation::of::<i64>(), "how often", "times")),
                    Annotation::of::<bool>(),
                ])))
                .parameter(SignatureParameter::positional("text").annotation(Annotation::of::<String>())),
        );
        assert_eq!(parser.parameters()[0].display_name(), "times");
        let args = parser.parse(&CommandContext::new("times: 2 hello")).await.unwrap();
        let (n, text): (i64, String) = args.extract().unwrap();
        assert_eq!((n, text.as_str()), (2, "hello"));
    }

    #[tokio::test]
    async fn test_context_injection() {
        let parser = parser(
            Signature::new("echo")
                .parameter(SignatureParameter::positional("ctx"))
                .parameter(SignatureParameter::positional("text")),
        );
        let ctx = CommandContext::builder("!echo  hi there ").content_offset(5).build();
        let args = parser.parse(&ctx).await.unwrap();
        let injected = args.get::<CommandContext>(0).unwrap();
        assert_eq!(injected.content(), "!echo  hi there ");
        assert_eq!(args.get::<String>(1).unwrap(), "hi there");
    }

    #[tokio::test]
    async fn test_run_separator() {
        let registry = ConverterRegistry::with_defaults().unwrap();
        let signature = Signature::new("list")
            .parameter(SignatureParameter::positional("a").annotation(Annotation::of::<String>()))
            .parameter(SignatureParameter::positional("b").annotation(Annotation::of::<String>()));
        let parser = ContentParser::builder(&signature)
            .separator(Separator::shared(SeparatorKind::Run(','), '=').unwrap())
            .build(&registry)
            .unwrap();
        let args = parser
            .parse(&CommandContext::new("first item, second item"))
            .await
            .unwrap();
        let (a, b): (String, String) = args.extract().unwrap();
        assert_eq!(a, "first item");
        assert_eq!(b, "second item");
    }

    #[tokio::test]
    async fn test_failed_positional_is_missing() {
        let parser = parser(
            Signature::new("count")
                .parameter(SignatureParameter::positional("n").annotation(Annotation::of::<i64>()))
                .parameter(SignatureParameter::positional("text").annotation(Annotation::of::<String>())),
        );
        let err = parser.parse(&CommandContext::new("abc def")).await.unwrap_err();
        assert_eq!(err.parameter(), "n");
    }

    #[tokio::test]
    async fn test_positional_retries_after_failed_token() {
        let parser = parser(
            Signature::new("count")
                .parameter(SignatureParameter::positional("n").annotation(Annotation::of::<i64>()))
                .parameter(SignatureParameter::positional("text").annotation(Annotation::of::<String>())),
        );
        let args = parser.parse(&CommandContext::new("abc 5 hello")).await.unwrap();
        let (n, text): (i64, String) = args.extract().unwrap();
        assert_eq!((n, text.as_str()), (5, "hello"));
    }
}
