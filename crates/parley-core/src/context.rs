//! The invocation context handed to converters.
//!
//! A [`CommandContext`] describes one command invocation: the acting client,
//! the triggering message, the raw message content and the offset at which
//! the arguments begin (right after the command name). The surrounding
//! framework may also attach services, such as entity lookups, that
//! converters retrieve by type.
//!
//! The context is cheap to clone; all clones share the same data.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConvertError, ConvertResult};
use crate::value::Value;

/// Type-erased storage for a service attached to a context.
///
/// The inner `dyn Any` is an `Arc<T>` upcast to `Any`, so trait-object
/// services (`Arc<dyn MyTrait>`) can be stored and retrieved as well.
pub type ServiceArc = Arc<dyn Any + Send + Sync>;

/// Handle to the client (bot connection) that received the command.
#[derive(Clone, Debug)]
pub struct ClientHandle(Value);

impl ClientHandle {
    /// Wraps a client of any type.
    pub fn new<T: Any + Send + Sync>(client: T) -> Self {
        Self(Value::new(client))
    }

    /// Borrows the client as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns the wrapped value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Handle to the message that triggered the command.
#[derive(Clone, Debug)]
pub struct MessageHandle(Value);

impl MessageHandle {
    /// Wraps a message of any type.
    pub fn new<T: Any + Send + Sync>(message: T) -> Self {
        Self(Value::new(message))
    }

    /// Borrows the message as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns the wrapped value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

struct ContextInner {
    client: Option<ClientHandle>,
    message: Option<MessageHandle>,
    content: String,
    content_offset: usize,
    services: HashMap<TypeId, ServiceArc>,
}

/// The context of a single command invocation.
///
/// # Example
///
/// ```
/// use parley_core::CommandContext;
///
/// let ctx = CommandContext::builder("!greet alice")
///     .content_offset(6)
///     .build();
/// assert_eq!(ctx.arguments(), " alice");
/// ```
#[derive(Clone)]
pub struct CommandContext {
    inner: Arc<ContextInner>,
}

impl CommandContext {
    /// Creates a context for `content` with the arguments starting at byte 0.
    pub fn new(content: impl Into<String>) -> Self {
        Self::builder(content).build()
    }

    /// Starts building a context for `content`.
    pub fn builder(content: impl Into<String>) -> CommandContextBuilder {
        CommandContextBuilder {
            client: None,
            message: None,
            content: content.into(),
            content_offset: 0,
            services: HashMap::new(),
        }
    }

    /// Returns the acting client, if the framework supplied one.
    pub fn client(&self) -> Option<&ClientHandle> {
        self.inner.client.as_ref()
    }

    /// Returns the triggering message, if the framework supplied one.
    pub fn message(&self) -> Option<&MessageHandle> {
        self.inner.message.as_ref()
    }

    /// Returns the full raw content of the message.
    pub fn content(&self) -> &str {
        &self.inner.content
    }

    /// Returns the byte offset at which the arguments begin.
    pub fn content_offset(&self) -> usize {
        self.inner.content_offset
    }

    /// Returns the content following the command name.
    pub fn arguments(&self) -> &str {
        &self.inner.content[self.inner.content_offset..]
    }

    /// Looks up a service by its type.
    ///
    /// `T` may be a trait object: a service attached with
    /// `.service::<dyn MyLookup>(Arc::new(impl))` is retrieved with
    /// `get_service::<dyn MyLookup>()`.
    pub fn get_service<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.inner
            .services
            .get(&TypeId::of::<T>())
            .and_then(|arc| arc.downcast_ref::<Arc<T>>().map(Arc::clone))
    }

    /// Like [`get_service`](Self::get_service), but fails with
    /// [`ConvertError::ServiceNotFound`] when the service is absent.
    pub fn require_service<T: ?Sized + Send + Sync + 'static>(&self) -> ConvertResult<Arc<T>> {
        self.get_service::<T>()
            .ok_or(ConvertError::ServiceNotFound(std::any::type_name::<T>()))
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("content", &self.inner.content)
            .field("content_offset", &self.inner.content_offset)
            .field("has_client", &self.inner.client.is_some())
            .field("has_message", &self.inner.message.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CommandContext`].
pub struct CommandContextBuilder {
    client: Option<ClientHandle>,
    message: Option<MessageHandle>,
    content: String,
    content_offset: usize,
    services: HashMap<TypeId, ServiceArc>,
}

impl CommandContextBuilder {
    /// Sets the acting client.
    pub fn client<T: Any + Send + Sync>(mut self, client: T) -> Self {
        self.client = Some(ClientHandle::new(client));
        self
    }

    /// Sets the triggering message.
    pub fn message<T: Any + Send + Sync>(mut self, message: T) -> Self {
        self.message = Some(MessageHandle::new(message));
        self
    }

    /// Sets the byte offset at which the arguments begin.
    ///
    /// Offsets past the end of the content, or inside a multi-byte
    /// character, are moved forward to the next valid boundary.
    pub fn content_offset(mut self, offset: usize) -> Self {
        self.content_offset = offset;
        self
    }

    /// Attaches a service, retrievable with [`CommandContext::get_service`].
    pub fn service<T: ?Sized + Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.services.insert(TypeId::of::<T>(), Arc::new(service));
        self
    }

    /// Finishes the context.
    pub fn build(self) -> CommandContext {
        let mut offset = self.content_offset.min(self.content.len());
        while !self.content.is_char_boundary(offset) {
            offset += 1;
        }

        CommandContext {
            inner: Arc::new(ContextInner {
                client: self.client,
                message: self.message,
                content: self.content,
                content_offset: offset,
                services: self.services,
            }),
        }
    }
}
