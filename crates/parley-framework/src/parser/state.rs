//! Per-invocation parameter states.
//!
//! One [`ParameterParsingState`] exists per compiled parameter for the
//! duration of a single parse. Generic states move
//! `Unfilled -> PartiallyFilled -> Satisfied`; the catch-all and rest states
//! only `Unfilled -> Satisfied`.

use parley_core::Value;

use crate::parameter::{ContentParserParameter, ParameterRole};

/// Progress of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateStatus {
    Unfilled,
    PartiallyFilled,
    Satisfied,
}

/// The mutable parse record of one parameter.
#[derive(Debug, Clone)]
pub enum ParameterParsingState {
    /// Positional, keyword-only and variadic parameters.
    ///
    /// `values` holds one entry per attempt; `None` records a token that did
    /// not convert.
    Generic {
        role: ParameterRole,
        injected: bool,
        status: StateStatus,
        values: Vec<Option<Value>>,
    },
    /// The keyword catch-all; the first value per key wins.
    Kwargs {
        status: StateStatus,
        entries: Vec<(String, Value)>,
    },
    /// The rest capture.
    Rest {
        status: StateStatus,
        capture: Option<String>,
    },
}

impl ParameterParsingState {
    pub fn new(parameter: &ContentParserParameter) -> Self {
        match parameter.role() {
            ParameterRole::Kwargs => Self::Kwargs {
                status: StateStatus::Unfilled,
                entries: Vec::new(),
            },
            ParameterRole::Rest => Self::Rest {
                status: StateStatus::Unfilled,
                capture: None,
            },
            role => Self::Generic {
                role,
                injected: parameter.is_injected(),
                status: StateStatus::Unfilled,
                values: Vec::new(),
            },
        }
    }

    pub fn status(&self) -> StateStatus {
        match self {
            Self::Generic { status, .. } | Self::Kwargs { status, .. } | Self::Rest { status, .. } => {
                *status
            }
        }
    }

    /// Returns `true` if the state still takes tokens. Parsing stops once no
    /// state does.
    pub fn is_open(&self) -> bool {
        match self {
            Self::Generic {
                injected: true, ..
            } => false,
            Self::Generic { status, .. } => *status != StateStatus::Satisfied,
            Self::Kwargs { .. } => true,
            Self::Rest { .. } => false,
        }
    }

    /// Returns `true` if the state takes the next unkeyed token.
    ///
    /// A positional keeps taking tokens after a failed attempt until one
    /// converts; a variadic until it is closed.
    pub fn accepts_unkeyed(&self) -> bool {
        match self {
            Self::Generic {
                role: ParameterRole::Positional | ParameterRole::Args,
                injected: false,
                status,
                ..
            } => *status != StateStatus::Satisfied,
            _ => false,
        }
    }

    /// Returns `true` if a keyed token matching the parameter's display name
    /// is bound here.
    pub fn accepts_keyed(&self) -> bool {
        matches!(
            self,
            Self::Generic {
                role: ParameterRole::Positional | ParameterRole::KeywordOnly,
                injected: false,
                ..
            }
        )
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Rest { .. })
    }

    /// Records one conversion attempt on a generic state.
    pub fn record(&mut self, value: Option<Value>) {
        if let Self::Generic {
            role,
            status,
            values,
            ..
        } = self
        {
            *status = match (*role, value.is_some()) {
                (ParameterRole::Args, true) => StateStatus::PartiallyFilled,
                (ParameterRole::Args, false) => StateStatus::Satisfied,
                (_, true) => StateStatus::Satisfied,
                (_, false) if *status == StateStatus::Unfilled => StateStatus::PartiallyFilled,
                (_, false) => *status,
            };
            values.push(value);
        }
    }

    /// Closes a variadic state without recording an attempt.
    pub fn close(&mut self) {
        if let Self::Generic { status, .. } = self {
            *status = StateStatus::Satisfied;
        }
    }

    /// Adds a catch-all entry unless `key` already has one.
    pub fn record_keyword(&mut self, key: &str, value: Value) {
        if let Self::Kwargs { status, entries } = self {
            if !entries.iter().any(|(existing, _)| existing == key) {
                entries.push((key.to_string(), value));
            }
            *status = StateStatus::Satisfied;
        }
    }

    /// Stores the rest capture; only the first capture is kept.
    pub fn capture(&mut self, rest: &str) {
        if let Self::Rest { status, capture } = self {
            if capture.is_none() {
                *capture = Some(rest.to_string());
                *status = StateStatus::Satisfied;
            }
        }
    }

    /// Returns `true` for a rest state that has captured nothing yet.
    pub fn is_empty_rest(&self) -> bool {
        matches!(self, Self::Rest { capture: None, .. })
    }

    /// The recorded values of a generic state.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        let values: &[Option<Value>] = match self {
            Self::Generic { values, .. } => values.as_slice(),
            _ => &[],
        };
        values.iter().flatten()
    }

    pub fn first_value(&self) -> Option<&Value> {
        self.values().next()
    }

    pub fn keyword_entries(&self) -> &[(String, Value)] {
        match self {
            Self::Kwargs { entries, .. } => entries,
            _ => &[],
        }
    }

    pub fn rest_capture(&self) -> Option<&str> {
        match self {
            Self::Rest { capture, .. } => capture.as_deref(),
            _ => None,
        }
    }
}
