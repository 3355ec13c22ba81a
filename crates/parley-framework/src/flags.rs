//! Converter flags.
//!
//! Flags toggle how a converter resolves a token. An entity converter may, for
//! example, accept mentions and ids but not names, or search beyond the local
//! scope. Every converter declares which flags it understands (`all_flags`)
//! and which it uses when a parameter specifies none (`default_flags`).

use bitflags::bitflags;

bitflags! {
    /// Independent capability toggles for a converter.
    ///
    /// # Example
    ///
    /// ```
    /// use parley_framework::ConverterFlag;
    ///
    /// let flags = ConverterFlag::USER_DEFAULT;
    /// assert!(flags.contains(ConverterFlag::MENTION | ConverterFlag::ID));
    /// assert!(!flags.contains(ConverterFlag::EVERYWHERE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConverterFlag: u8 {
        /// Resolve from a link to the entity.
        const URL = 1 << 0;
        /// Resolve from a mention (`<@123>`, `<#123>`, ...).
        const MENTION = 1 << 1;
        /// Resolve by name.
        const NAME = 1 << 2;
        /// Resolve by numeric id.
        const ID = 1 << 3;
        /// Search outside the local scope (other guilds, the whole cache).
        const EVERYWHERE = 1 << 4;
        /// Match against per-scope profiles (nicknames) as well.
        const PROFILE = 1 << 5;
    }
}

impl ConverterFlag {
    /// No flags.
    pub const NONE: Self = Self::empty();

    pub const USER_DEFAULT: Self = Self::MENTION.union(Self::NAME).union(Self::ID);
    pub const USER_ALL: Self = Self::USER_DEFAULT
        .union(Self::EVERYWHERE)
        .union(Self::PROFILE);

    pub const ROLE_DEFAULT: Self = Self::MENTION.union(Self::NAME).union(Self::ID);
    pub const ROLE_ALL: Self = Self::ROLE_DEFAULT.union(Self::EVERYWHERE);

    pub const CHANNEL_DEFAULT: Self = Self::MENTION.union(Self::NAME).union(Self::ID);
    pub const CHANNEL_ALL: Self = Self::CHANNEL_DEFAULT.union(Self::EVERYWHERE);

    pub const EMOJI_DEFAULT: Self = Self::MENTION.union(Self::ID);
    pub const EMOJI_ALL: Self = Self::EMOJI_DEFAULT.union(Self::NAME).union(Self::EVERYWHERE);

    pub const MESSAGE_DEFAULT: Self = Self::URL.union(Self::ID);
    pub const MESSAGE_ALL: Self = Self::MESSAGE_DEFAULT.union(Self::EVERYWHERE);

    /// Computes the effective flags of a parameter.
    ///
    /// Without `requested` flags the converter's `default` flags apply.
    /// Otherwise the result is `requested ∩ all`; `None` is returned when the
    /// intersection is empty, which callers report as a configuration error.
    pub fn resolve(requested: Option<Self>, all: Self, default: Self) -> Option<Self> {
        match requested {
            None => Some(default),
            Some(requested) => {
                let effective = requested & all;
                (!effective.is_empty()).then_some(effective)
            }
        }
    }
}

impl Default for ConverterFlag {
    fn default() -> Self {
        Self::NONE
    }
}
