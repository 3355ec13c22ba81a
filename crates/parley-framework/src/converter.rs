//! Converter functions.
//!
//! A converter turns a token (or nothing, for injected values) into a typed
//! [`Value`]. Converters come in exactly two capabilities:
//!
//! - [`PartConverter`]: consumes a token; called as `(context, detail, part)`.
//! - [`InjectConverter`]: synthesizes a value without consuming input, such
//!   as the invocation context itself; called as `(context, detail)`.
//!
//! [`ConverterFn`] is the closed set of both, stored in a
//! [`ConverterSetting`](crate::registry::ConverterSetting).
//!
//! Returning `Ok(None)` means "no match" and lets the parser try the next
//! alternative; returning `Err` aborts the parse.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::parameter::ParameterDetail;
use parley_core::{CommandContext, ConvertResult, Value};

/// Boxed future returned by closure-based converters.
pub type ConvertFuture<'a> = BoxFuture<'a, ConvertResult<Option<Value>>>;

/// A converter that consumes one token.
#[async_trait]
pub trait PartConverter: Send + Sync + 'static {
    /// Attempts to convert `part`.
    async fn convert(
        &self,
        ctx: &CommandContext,
        detail: &ParameterDetail,
        part: &str,
    ) -> ConvertResult<Option<Value>>;
}

/// A converter that produces a value without consuming a token.
#[async_trait]
pub trait InjectConverter: Send + Sync + 'static {
    /// Produces the value for the current invocation.
    async fn inject(
        &self,
        ctx: &CommandContext,
        detail: &ParameterDetail,
    ) -> ConvertResult<Option<Value>>;
}

#[async_trait]
impl<F> PartConverter for F
where
    F: for<'a> Fn(&'a CommandContext, &'a ParameterDetail, &'a str) -> ConvertFuture<'a>
        + Send
        + Sync
        + 'static,
{
    async fn convert(
        &self,
        ctx: &CommandContext,
        detail: &ParameterDetail,
        part: &str,
    ) -> ConvertResult<Option<Value>> {
        (self)(ctx, detail, part).await
    }
}

/// Wraps a synchronous parsing function as a [`PartConverter`].
///
/// Most value converters (integers, booleans, durations ...) only look at the
/// token itself.
pub struct ParseFn<T> {
    parse: fn(&str) -> Option<T>,
}

impl<T> ParseFn<T> {
    pub const fn new(parse: fn(&str) -> Option<T>) -> Self {
        Self { parse }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> PartConverter for ParseFn<T> {
    async fn convert(
        &self,
        _ctx: &CommandContext,
        _detail: &ParameterDetail,
        part: &str,
    ) -> ConvertResult<Option<Value>> {
        Ok((self.parse)(part).map(Value::new))
    }
}

/// The capability of a registered converter.
#[derive(Clone)]
pub enum ConverterFn {
    /// Consumes a token: `(context, detail, part)`.
    Part(Arc<dyn PartConverter>),
    /// Consumes nothing: `(context, detail)`.
    Inject(Arc<dyn InjectConverter>),
}

impl ConverterFn {
    /// Wraps a token-consuming converter.
    pub fn part(converter: impl PartConverter) -> Self {
        Self::Part(Arc::new(converter))
    }

    /// Wraps an injecting converter.
    pub fn inject(converter: impl InjectConverter) -> Self {
        Self::Inject(Arc::new(converter))
    }

    /// Returns the number of arguments the converter is called with.
    pub fn arity(&self) -> usize {
        match self {
            Self::Part(_) => 3,
            Self::Inject(_) => 2,
        }
    }

    /// Returns `true` if the converter consumes a token.
    pub fn consumes_part(&self) -> bool {
        matches!(self, Self::Part(_))
    }

    /// Runs the converter.
    ///
    /// A token converter called without a token yields no match.
    pub async fn call(
        &self,
        ctx: &CommandContext,
        detail: &ParameterDetail,
        part: Option<&str>,
    ) -> ConvertResult<Option<Value>> {
        match (self, part) {
            (Self::Part(converter), Some(part)) => converter.convert(ctx, detail, part).await,
            (Self::Part(_), None) => Ok(None),
            (Self::Inject(converter), _) => converter.inject(ctx, detail).await,
        }
    }
}

impl fmt::Debug for ConverterFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Part(_) => f.write_str("ConverterFn::Part"),
            Self::Inject(_) => f.write_str("ConverterFn::Inject"),
        }
    }
}
