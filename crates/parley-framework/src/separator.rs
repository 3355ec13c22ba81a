//! Content tokenizer.
//!
//! A [`Separator`] splits the argument part of a message into tokens. Each
//! call to [`Separator::parse`] yields one [`Token`]: an optional keyword
//! (`name: value` syntax, using the configured assigner), the value, and the
//! index the next call should start from.
//!
//! Two separator modes exist:
//!
//! - **Run** mode (`SeparatorKind::Run(',')`): values are runs of text between
//!   separator characters, so they may contain spaces. A separator can be
//!   escaped with a backslash.
//! - **Encapsulate** mode (`SeparatorKind::Encapsulate { start, end }`, the
//!   default is a pair of double quotes): values are whitespace-delimited
//!   words, or any text wrapped between the start and end characters.
//!
//! Separators are immutable and shared: [`Separator::shared`] hands out one
//! `Arc` per distinct `(kind, assigner)` configuration.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{ConfigError, ConfigResult};

/// The assigner used when none is configured.
pub const DEFAULT_ASSIGNER: char = ':';

/// How values are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeparatorKind {
    /// Values are separated by a single non-space character.
    Run(char),
    /// Values are words, or text wrapped between `start` and `end`.
    Encapsulate { start: char, end: char },
}

impl Default for SeparatorKind {
    fn default() -> Self {
        Self::Encapsulate {
            start: '"',
            end: '"',
        }
    }
}

/// One unit of content produced by a [`Separator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The keyword, if the value was given as `keyword<assigner> value`.
    pub keyword: Option<&'a str>,
    /// The value, without delimiters.
    pub value: Cow<'a, str>,
    /// Where the next token starts.
    pub next_index: usize,
}

impl Token<'_> {
    fn empty(index: usize) -> Self {
        Self {
            keyword: None,
            value: Cow::Borrowed(""),
            next_index: index,
        }
    }
}

static SEPARATORS: LazyLock<Mutex<HashMap<(SeparatorKind, char), Arc<Separator>>>> =
    LazyLock::new(Default::default);

/// Tokenizer configuration: a separator kind plus a keyword assigner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Separator {
    kind: SeparatorKind,
    assigner: char,
}

impl Default for Separator {
    fn default() -> Self {
        Self {
            kind: SeparatorKind::default(),
            assigner: DEFAULT_ASSIGNER,
        }
    }
}

impl Separator {
    /// Creates a separator, validating that the assigner and the separator
    /// characters cannot be confused with each other.
    pub fn new(kind: SeparatorKind, assigner: char) -> ConfigResult<Self> {
        if assigner.is_whitespace() {
            return Err(ConfigError::InvalidSeparator(
                "the assigner cannot be a whitespace character".to_string(),
            ));
        }

        match kind {
            SeparatorKind::Run(separator) => {
                if separator.is_whitespace() {
                    return Err(ConfigError::InvalidSeparator(
                        "the separator cannot be a whitespace character".to_string(),
                    ));
                }
                if separator == '\\' {
                    return Err(ConfigError::InvalidSeparator(
                        "the separator cannot be the escape character '\\'".to_string(),
                    ));
                }
                if separator == assigner {
                    return Err(ConfigError::InvalidSeparator(format!(
                        "the assigner {assigner:?} is also the separator"
                    )));
                }
            }
            SeparatorKind::Encapsulate { start, end } => {
                if start.is_whitespace() || end.is_whitespace() {
                    return Err(ConfigError::InvalidSeparator(
                        "encapsulators cannot be whitespace characters".to_string(),
                    ));
                }
                if start == assigner || end == assigner {
                    return Err(ConfigError::InvalidSeparator(format!(
                        "the assigner {assigner:?} is also an encapsulator"
                    )));
                }
            }
        }

        Ok(Self { kind, assigner })
    }

    /// Returns the process-wide instance for this configuration, creating it
    /// on first use.
    pub fn shared(kind: SeparatorKind, assigner: char) -> ConfigResult<Arc<Self>> {
        let mut cache = SEPARATORS.lock();
        if let Some(separator) = cache.get(&(kind, assigner)) {
            return Ok(Arc::clone(separator));
        }

        let separator = Arc::new(Self::new(kind, assigner)?);
        cache.insert((kind, assigner), Arc::clone(&separator));
        trace!(?kind, %assigner, "Cached new separator");
        Ok(separator)
    }

    /// Returns the separator kind.
    pub fn kind(&self) -> SeparatorKind {
        self.kind
    }

    /// Returns the keyword assigner.
    pub fn assigner(&self) -> char {
        self.assigner
    }

    /// Parses the token starting at byte `index` of `content`.
    ///
    /// With nothing left after `index` the value is empty and `next_index`
    /// equals `index`; with only whitespace left it is empty and `next_index`
    /// is the end of the content.
    pub fn parse<'a>(&self, content: &'a str, index: usize) -> Token<'a> {
        let index = index.min(content.len());
        if index == content.len() {
            return Token::empty(index);
        }

        match self.kind {
            SeparatorKind::Run(separator) => self.parse_run(content, index, separator),
            SeparatorKind::Encapsulate { start, end } => {
                self.parse_encapsulated(content, index, start, end)
            }
        }
    }

    /// Returns everything from `index` on, trimmed, ignoring separators and
    /// the assigner.
    pub fn parse_rest<'a>(&self, content: &'a str, index: usize) -> &'a str {
        content.get(index..).unwrap_or_default().trim()
    }

    fn is_separator_char(&self, c: char) -> bool {
        match self.kind {
            SeparatorKind::Run(separator) => c == separator,
            SeparatorKind::Encapsulate { start, end } => c == start || c == end,
        }
    }

    /// Detects a `keyword<assigner> ` prefix at `start`.
    ///
    /// Returns the keyword and the index the value starts at.
    fn keyword_at<'a>(&self, content: &'a str, start: usize) -> (Option<&'a str>, usize) {
        let end = skip(content, start, |c| {
            !c.is_whitespace() && c != self.assigner && !self.is_separator_char(c)
        });

        if end > start {
            let mut after = content[end..].chars();
            if after.next() == Some(self.assigner) && after.next().is_some_and(char::is_whitespace)
            {
                let value_start = skip(content, end + self.assigner.len_utf8(), char::is_whitespace);
                return (Some(&content[start..end]), value_start);
            }
        }

        (None, start)
    }

    fn parse_run<'a>(&self, content: &'a str, index: usize, separator: char) -> Token<'a> {
        let is_padding = |c: char| c == separator || c.is_whitespace();

        let start = skip(content, index, is_padding);
        if start == content.len() {
            return Token::empty(start);
        }

        let (keyword, value_start) = self.keyword_at(content, start);

        let mut escaped = false;
        let mut end = content.len();
        let mut chars = content[value_start..].char_indices().peekable();
        while let Some((offset, c)) = chars.next() {
            if c == '\\' && chars.peek().is_some_and(|&(_, next)| next == separator) {
                chars.next();
                escaped = true;
                continue;
            }
            if c == separator {
                end = value_start + offset;
                break;
            }
        }

        let raw = content[value_start..end].trim_end();
        let value = if escaped {
            Cow::Owned(raw.replace(&format!("\\{separator}"), &separator.to_string()))
        } else {
            Cow::Borrowed(raw)
        };

        Token {
            keyword,
            value,
            next_index: skip(content, end, is_padding),
        }
    }

    fn parse_encapsulated<'a>(
        &self,
        content: &'a str,
        index: usize,
        open: char,
        close: char,
    ) -> Token<'a> {
        let start = skip(content, index, char::is_whitespace);
        if start == content.len() {
            return Token::empty(start);
        }

        let (keyword, value_start) = self.keyword_at(content, start);

        let (value, end) = if content[value_start..].starts_with(open) {
            let inner_start = value_start + open.len_utf8();
            match content[inner_start..].find(close) {
                Some(offset) => {
                    let inner_end = inner_start + offset;
                    (&content[inner_start..inner_end], inner_end + close.len_utf8())
                }
                // Unterminated: the value runs to the end.
                None => (&content[inner_start..], content.len()),
            }
        } else {
            let end = plain_run_end(content, value_start, open, close);
            (&content[value_start..end], end)
        };

        Token {
            keyword,
            value: Cow::Borrowed(value),
            next_index: skip(content, end, char::is_whitespace),
        }
    }
}

/// Returns the first index at or after `index` whose character does not
/// satisfy `pred`, or the end of `content`.
fn skip(content: &str, index: usize, pred: impl Fn(char) -> bool) -> usize {
    content[index..]
        .char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(content.len(), |(offset, _)| index + offset)
}

/// End of an unquoted word. A stray closing character at the start of the
/// word belongs to it, so the tokenizer always makes progress.
fn plain_run_end(content: &str, start: usize, open: char, close: char) -> usize {
    for (offset, c) in content[start..].char_indices() {
        let stray_close = offset == 0 && c == close;
        if c.is_whitespace() || c == open || (c == close && !stray_close) {
            return start + offset;
        }
    }
    content.len()
}
