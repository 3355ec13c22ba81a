//! Tower integration.
//!
//! [`ContentParserLayer`] puts a [`ContentParser`] in front of a handler
//! service. On every call the context is parsed and the inner service
//! receives the context together with the parsed [`Arguments`]. A failed
//! parse never reaches the inner service; the
//! [`ParseError`](crate::error::ParseError) is returned as a [`BoxError`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use parley_framework::{
//!     Arguments, ContentParser, ContentParserLayer, ConverterRegistry, Signature,
//!     SignatureParameter,
//! };
//! use parley_core::CommandContext;
//! use tower::{BoxError, ServiceExt, service_fn};
//!
//! let registry = ConverterRegistry::with_defaults().unwrap();
//! let parser = ContentParser::new(
//!     &registry,
//!     &Signature::new("echo").parameter(SignatureParameter::positional("text")),
//! )
//! .unwrap();
//!
//! let service = ContentParserLayer::new(parser).handler(service_fn(
//!     |(_ctx, args): (Arc<CommandContext>, Arguments)| async move {
//!         Ok::<_, BoxError>(args.get::<String>(0)?)
//!     },
//! ));
//!
//! let ctx = Arc::new(CommandContext::new("hello world"));
//! let echoed = tokio_test::block_on(service.oneshot(ctx)).unwrap();
//! assert_eq!(echoed, "hello world");
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::layer::util::{Identity, Stack};
use tower::{BoxError, Layer, Service, ServiceBuilder};
use tracing::debug;

use crate::arguments::Arguments;
use crate::parser::ContentParser;
use parley_core::CommandContext;

/// A tower [`Layer`] that parses the command content before calling the
/// inner service.
#[derive(Debug, Clone)]
pub struct ContentParserLayer {
    parser: ContentParser,
}

impl ContentParserLayer {
    pub fn new(parser: ContentParser) -> Self {
        Self { parser }
    }

    /// Converts to a [`ServiceBuilder`] for stacking further layers.
    pub fn build(self) -> ServiceBuilder<Stack<ContentParserLayer, Identity>> {
        ServiceBuilder::new().layer(self)
    }

    /// Wraps `handler` with this layer.
    pub fn handler<S>(self, handler: S) -> ContentParserService<S> {
        self.layer(handler)
    }
}

impl<S> Layer<S> for ContentParserLayer {
    type Service = ContentParserService<S>;

    fn layer(&self, inner: S) -> ContentParserService<S> {
        ContentParserService {
            parser: self.parser.clone(),
            inner,
        }
    }
}

/// The [`Service`] produced by [`ContentParserLayer`].
#[derive(Debug, Clone)]
pub struct ContentParserService<S> {
    parser: ContentParser,
    inner: S,
}

impl<S> Service<Arc<CommandContext>> for ContentParserService<S>
where
    S: Service<(Arc<CommandContext>, Arguments), Error = BoxError> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<S::Response, BoxError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, ctx: Arc<CommandContext>) -> Self::Future {
        let parser = self.parser.clone();
        // The clone is not driven to readiness; swap so the ready service is used.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        async move {
            let parsed = parser.parse(&ctx).await;
            match parsed {
                Ok(arguments) => inner.call((ctx, arguments)).await,
                Err(err) => {
                    debug!(command = parser.name(), error = %err, "Content did not parse");
                    Err(Box::new(err) as BoxError)
                }
            }
        }
        .boxed()
    }
}
