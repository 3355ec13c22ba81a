//! # Parley Core
//!
//! Foundation types shared by every layer of the Parley command argument
//! parser:
//!
//! - [`Value`] and [`TypeKey`]: type-erased converter output and the key
//!   converters are registered under
//! - [`CommandContext`]: the invocation context (client, message, raw content
//!   and attached services) that converters read from
//! - [`ConvertError`]: failures raised from inside converters
//!
//! This crate contains no parsing logic; see `parley-framework`.

pub mod context;
pub mod error;
pub mod value;

pub use context::{ClientHandle, CommandContext, CommandContextBuilder, MessageHandle, ServiceArc};
pub use error::{ConvertError, ConvertResult};
pub use value::{TypeKey, Value};
