//! Built-in converters.
//!
//! [`ConverterRegistry::with_defaults`] registers, in this order:
//!
//! | Names | Type | Token |
//! |---|---|---|
//! | `str`, `string` | `String` | yes |
//! | `int`, `integer`, `i64` | `i64` | yes |
//! | `float`, `f64` | `f64` | yes |
//! | `bool` | `bool` | yes |
//! | `duration`, `timedelta` | `std::time::Duration` | yes |
//! | `context`, `ctx` | `CommandContext` | no |
//! | `client` | `ClientHandle` | no |
//! | `message` | `MessageHandle` | no |
//!
//! Entity types are registered by the surrounding framework through
//! [`EntityConverter`].

mod entity;
mod inject;
mod primitive;

pub use entity::{EntityConverter, EntityLookup, LookupScope, MentionKind, parse_id, parse_url_id};
pub use inject::{ClientConverter, ContextConverter, MessageConverter};

use std::time::Duration;

use crate::converter::{ConverterFn, ParseFn};
use crate::error::ConfigResult;
use crate::registry::{ConverterRegistry, ConverterSetting};
use parley_core::{ClientHandle, CommandContext, MessageHandle, TypeKey};

fn part<T: Send + Sync + 'static>(
    name: &str,
    parse: fn(&str) -> Option<T>,
    aliases: &[&str],
) -> ConfigResult<ConverterSetting> {
    aliases
        .iter()
        .fold(
            ConverterSetting::builder(name, TypeKey::of::<T>(), ConverterFn::part(ParseFn::new(parse))),
            |builder, alias| builder.alternative_name(*alias),
        )
        .build()
}

/// Registers the built-in converters into `registry`.
pub fn register_defaults(registry: &mut ConverterRegistry) -> ConfigResult<()> {
    registry.register(part("str", primitive::parse_str, &["string"])?)?;
    registry.register(part("int", primitive::parse_int, &["integer", "i64"])?)?;
    registry.register(part("float", primitive::parse_float, &["f64"])?)?;
    registry.register(part("bool", primitive::parse_bool, &[])?)?;
    registry.register(part::<Duration>(
        "duration",
        primitive::parse_duration,
        &["timedelta"],
    )?)?;

    registry.register(
        ConverterSetting::builder(
            "context",
            TypeKey::of::<CommandContext>(),
            ConverterFn::inject(ContextConverter),
        )
        .alternative_name("ctx")
        .build()?,
    )?;
    registry.register(
        ConverterSetting::builder(
            "client",
            TypeKey::of::<ClientHandle>(),
            ConverterFn::inject(ClientConverter),
        )
        .build()?,
    )?;
    registry.register(
        ConverterSetting::builder(
            "message",
            TypeKey::of::<MessageHandle>(),
            ConverterFn::inject(MessageConverter),
        )
        .build()?,
    )?;

    Ok(())
}
