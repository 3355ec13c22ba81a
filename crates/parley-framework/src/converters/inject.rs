//! Converters that inject values from the invocation context.

use async_trait::async_trait;

use crate::converter::InjectConverter;
use crate::parameter::ParameterDetail;
use parley_core::{CommandContext, ConvertResult, Value};

/// Injects the [`CommandContext`] itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextConverter;

#[async_trait]
impl InjectConverter for ContextConverter {
    async fn inject(
        &self,
        ctx: &CommandContext,
        _detail: &ParameterDetail,
    ) -> ConvertResult<Option<Value>> {
        Ok(Some(Value::new(ctx.clone())))
    }
}

/// Injects the acting client, as a [`ClientHandle`](parley_core::ClientHandle).
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientConverter;

#[async_trait]
impl InjectConverter for ClientConverter {
    async fn inject(
        &self,
        ctx: &CommandContext,
        _detail: &ParameterDetail,
    ) -> ConvertResult<Option<Value>> {
        Ok(ctx.client().map(|client| Value::new(client.clone())))
    }
}

/// Injects the triggering message, as a
/// [`MessageHandle`](parley_core::MessageHandle).
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageConverter;

#[async_trait]
impl InjectConverter for MessageConverter {
    async fn inject(
        &self,
        ctx: &CommandContext,
        _detail: &ParameterDetail,
    ) -> ConvertResult<Option<Value>> {
        Ok(ctx.message().map(|message| Value::new(message.clone())))
    }
}
