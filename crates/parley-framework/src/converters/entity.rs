//! Entity converters.
//!
//! Chat entities (users, roles, channels, emojis, messages ...) live outside
//! the parser. An [`EntityConverter`] resolves a token into one through an
//! [`EntityLookup`] service that the framework attaches to the
//! [`CommandContext`]. Which token shapes are tried depends on the
//! parameter's flags:
//!
//! | Flag | Accepted token |
//! |---|---|
//! | `MENTION` | `<@id>`, `<@!id>`, `<@&id>`, `<#id>`, `<:name:id>`, `<a:name:id>` |
//! | `ID` | a bare snowflake id |
//! | `URL` | a link ending in a snowflake id |
//! | `NAME` | anything, looked up by name |
//!
//! `EVERYWHERE` and `PROFILE` are handed to the lookup as a [`LookupScope`].

use std::marker::PhantomData;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::trace;

use crate::converter::{ConverterFn, PartConverter};
use crate::error::ConfigResult;
use crate::flags::ConverterFlag;
use crate::parameter::ParameterDetail;
use crate::registry::{ConverterSetting, ConverterSettingBuilder};
use parley_core::{CommandContext, ConvertResult, TypeKey, Value};

static USER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@!?(\d{7,21})>$").expect("user mention pattern is valid"));
static ROLE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@&(\d{7,21})>$").expect("role mention pattern is valid"));
static CHANNEL_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<#(\d{7,21})>$").expect("channel mention pattern is valid"));
static EMOJI_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<a?:\w{2,32}:(\d{7,21})>$").expect("emoji mention pattern is valid")
});
static ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{7,21}$").expect("id pattern is valid"));
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<?https?://\S+/(\d{7,21})/?>?$").expect("url pattern is valid")
});

/// The mention syntax an entity is referenced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    /// `<@id>` or `<@!id>`.
    User,
    /// `<@&id>`.
    Role,
    /// `<#id>`.
    Channel,
    /// `<:name:id>` or `<a:name:id>`.
    Emoji,
}

impl MentionKind {
    /// Extracts the id from a mention of this kind.
    pub fn parse(self, part: &str) -> Option<u64> {
        let regex = match self {
            Self::User => &USER_MENTION,
            Self::Role => &ROLE_MENTION,
            Self::Channel => &CHANNEL_MENTION,
            Self::Emoji => &EMOJI_MENTION,
        };
        capture_id(regex, part)
    }
}

fn capture_id(regex: &Regex, part: &str) -> Option<u64> {
    regex.captures(part)?.get(1)?.as_str().parse().ok()
}

/// Parses a bare snowflake id.
pub fn parse_id(part: &str) -> Option<u64> {
    ID.is_match(part).then(|| part.parse().ok()).flatten()
}

/// Parses the trailing snowflake id of a link.
pub fn parse_url_id(part: &str) -> Option<u64> {
    capture_id(&URL, part)
}

/// Where a lookup may search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupScope {
    /// Search beyond the local scope.
    pub everywhere: bool,
    /// Match per-scope profile names (nicknames) too.
    pub profile: bool,
}

impl From<ConverterFlag> for LookupScope {
    fn from(flags: ConverterFlag) -> Self {
        Self {
            everywhere: flags.contains(ConverterFlag::EVERYWHERE),
            profile: flags.contains(ConverterFlag::PROFILE),
        }
    }
}

/// Resolves entities of one type.
///
/// Implementations are attached to the context with
/// [`CommandContextBuilder::service`](parley_core::CommandContextBuilder::service).
#[async_trait]
pub trait EntityLookup: Send + Sync + 'static {
    type Entity: Clone + Send + Sync + 'static;

    async fn by_id(
        &self,
        ctx: &CommandContext,
        id: u64,
        scope: LookupScope,
    ) -> ConvertResult<Option<Self::Entity>>;

    async fn by_name(
        &self,
        ctx: &CommandContext,
        name: &str,
        scope: LookupScope,
    ) -> ConvertResult<Option<Self::Entity>>;
}

/// Token converter resolving `L::Entity` through the `L` service.
pub struct EntityConverter<L> {
    mention: Option<MentionKind>,
    _lookup: PhantomData<fn() -> L>,
}

impl<L: EntityLookup> EntityConverter<L> {
    pub fn new(mention: Option<MentionKind>) -> Self {
        Self {
            mention,
            _lookup: PhantomData,
        }
    }

    /// Declares a converter setting for `L::Entity`.
    pub fn setting(
        name: impl Into<String>,
        mention: Option<MentionKind>,
        default_flags: ConverterFlag,
        all_flags: ConverterFlag,
    ) -> ConverterSettingBuilder {
        ConverterSetting::builder(
            name,
            TypeKey::of::<L::Entity>(),
            ConverterFn::part(Self::new(mention)),
        )
        .flags(default_flags, all_flags)
    }

    /// Declares and validates a converter setting for `L::Entity`.
    pub fn build_setting(
        name: impl Into<String>,
        mention: Option<MentionKind>,
        default_flags: ConverterFlag,
        all_flags: ConverterFlag,
    ) -> ConfigResult<ConverterSetting> {
        Self::setting(name, mention, default_flags, all_flags).build()
    }
}

#[async_trait]
impl<L: EntityLookup> PartConverter for EntityConverter<L> {
    async fn convert(
        &self,
        ctx: &CommandContext,
        detail: &ParameterDetail,
        part: &str,
    ) -> ConvertResult<Option<Value>> {
        let lookup = ctx.require_service::<L>()?;
        let flags = detail.flags();
        let scope = LookupScope::from(flags);

        if flags.contains(ConverterFlag::MENTION) {
            if let Some(id) = self.mention.and_then(|kind| kind.parse(part)) {
                trace!(id, "Resolving mention");
                return Ok(lookup.by_id(ctx, id, scope).await?.map(Value::new));
            }
        }

        let id = flags
            .contains(ConverterFlag::ID)
            .then(|| parse_id(part))
            .flatten()
            .or_else(|| {
                flags
                    .contains(ConverterFlag::URL)
                    .then(|| parse_url_id(part))
                    .flatten()
            });
        if let Some(id) = id {
            if let Some(entity) = lookup.by_id(ctx, id, scope).await? {
                return Ok(Some(Value::new(entity)));
            }
        }

        if flags.contains(ConverterFlag::NAME) {
            return Ok(lookup.by_name(ctx, part, scope).await?.map(Value::new));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions() {
        assert_eq!(MentionKind::User.parse("<@123456789>"), Some(123456789));
        assert_eq!(MentionKind::User.parse("<@!123456789>"), Some(123456789));
        assert_eq!(MentionKind::User.parse("<@&123456789>"), None);
        assert_eq!(MentionKind::Role.parse("<@&123456789>"), Some(123456789));
        assert_eq!(MentionKind::Channel.parse("<#123456789>"), Some(123456789));
        assert_eq!(MentionKind::Emoji.parse("<:wave:123456789>"), Some(123456789));
        assert_eq!(MentionKind::Emoji.parse("<a:wave:123456789>"), Some(123456789));
        assert_eq!(MentionKind::Emoji.parse(":wave:"), None);
    }

    #[test]
    fn test_ids() {
        assert_eq!(parse_id("123456789012345678"), Some(123456789012345678));
        assert_eq!(parse_id("12"), None);
        assert_eq!(parse_id("12345678a"), None);
        assert_eq!(
            parse_url_id("https://chat.example.com/channels/1234567890/9876543210"),
            Some(9876543210)
        );
        assert_eq!(parse_url_id("https://example.com/about"), None);
    }

    #[test]
    fn test_scope_from_flags() {
        let scope = LookupScope::from(ConverterFlag::USER_ALL);
        assert!(scope.everywhere && scope.profile);
        assert_eq!(LookupScope::from(ConverterFlag::USER_DEFAULT), LookupScope::default());
    }
}
