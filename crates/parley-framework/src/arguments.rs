//! Parsed arguments and typed extraction.
//!
//! [`Arguments`] is what a successful parse produces: positional values in
//! declaration order (variadic values flattened in place, the rest capture as
//! a `String`) followed by keyword values. Handlers pull typed values out with
//! [`Arguments::get`] or, for a whole tuple at once, [`FromArguments`].
//!
//! ```
//! use parley_framework::Arguments;
//! use parley_core::Value;
//!
//! let mut args = Arguments::new();
//! args.push_positional(Value::new(3_i64));
//! args.push_positional(Value::new("hello".to_string()));
//!
//! let (count, text): (i64, String) = args.extract().unwrap();
//! assert_eq!(count, 3);
//! assert_eq!(text, "hello");
//! ```

use std::any::Any;

use parley_core::Value;

use crate::error::{ExtractError, ExtractResult};

/// The values a parse bound to a handler's parameters.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_positional(&mut self, value: Value) {
        self.positional.push(value);
    }

    pub fn push_keyword(&mut self, name: impl Into<String>, value: Value) {
        self.keyword.push((name.into(), value));
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }

    /// Returns the keyword value bound to `name`.
    pub fn keyword_value(&self, name: &str) -> Option<&Value> {
        self.keyword
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns the total number of values.
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Extracts the positional value at `index` as `T`.
    pub fn get<T: FromValue>(&self, index: usize) -> ExtractResult<T> {
        let value = self
            .positional
            .get(index)
            .ok_or(ExtractError::MissingPositional(index))?;
        T::from_value(value).ok_or_else(|| ExtractError::TypeMismatch {
            position: index.to_string(),
            expected: std::any::type_name::<T>(),
            found: value.type_name(),
        })
    }

    /// Extracts the keyword value bound to `name` as `T`.
    pub fn get_keyword<T: FromValue>(&self, name: &str) -> ExtractResult<T> {
        let value = self
            .keyword_value(name)
            .ok_or_else(|| ExtractError::MissingKeyword(name.to_string()))?;
        T::from_value(value).ok_or_else(|| ExtractError::TypeMismatch {
            position: name.to_string(),
            expected: std::any::type_name::<T>(),
            found: value.type_name(),
        })
    }

    /// Extracts every positional value from `start` on as `T`.
    ///
    /// Variadic values are flattened into the positional list, so this is how
    /// a handler collects them.
    pub fn get_from<T: FromValue>(&self, start: usize) -> ExtractResult<Vec<T>> {
        (start..self.positional.len())
            .map(|index| self.get(index))
            .collect()
    }

    /// Extracts the positional values as `T`.
    pub fn extract<T: FromArguments>(&self) -> ExtractResult<T> {
        T::from_arguments(self)
    }

    pub fn into_parts(self) -> (Vec<Value>, Vec<(String, Value)>) {
        (self.positional, self.keyword)
    }
}

/// Conversion from a single parsed [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl<T: Any + Clone> FromValue for T {
    fn from_value(value: &Value) -> Option<Self> {
        value.get::<T>()
    }
}

/// Conversion from the positional part of [`Arguments`].
pub trait FromArguments: Sized {
    fn from_arguments(arguments: &Arguments) -> ExtractResult<Self>;
}

impl<T: FromValue> FromArguments for Vec<T> {
    fn from_arguments(arguments: &Arguments) -> ExtractResult<Self> {
        arguments.get_from(0)
    }
}

/// Generates `FromArguments` for tuples, taking positional values in order.
macro_rules! impl_from_arguments {
    (
        $($ty:ident => $index:tt),*
    ) => {
        impl<$($ty,)*> FromArguments for ($($ty,)*)
        where
            $( $ty: FromValue, )*
        {
            fn from_arguments(arguments: &Arguments) -> ExtractResult<Self> {
                Ok(($( arguments.get::<$ty>($index)?, )*))
            }
        }
    };
}

impl_from_arguments!(T1 => 0);
impl_from_arguments!(T1 => 0, T2 => 1);
impl_from_arguments!(T1 => 0, T2 => 1, T3 => 2);
impl_from_arguments!(T1 => 0, T2 => 1, T3 => 2, T4 => 3);
impl_from_arguments!(T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4);
impl_from_arguments!(T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5);
impl_from_arguments!(T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6);
impl_from_arguments!(T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7);
impl_from_arguments!(
    T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7, T9 => 8
);
impl_from_arguments!(
    T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7, T9 => 8,
    T10 => 9
);
impl_from_arguments!(
    T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7, T9 => 8,
    T10 => 9, T11 => 10
);
impl_from_arguments!(
    T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7, T9 => 8,
    T10 => 9, T11 => 10, T12 => 11
);
impl_from_arguments!(
    T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7, T9 => 8,
    T10 => 9, T11 => 10, T12 => 11, T13 => 12
);
impl_from_arguments!(
    T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7, T9 => 8,
    T10 => 9, T11 => 10, T12 => 11, T13 => 12, T14 => 13
);
impl_from_arguments!(
    T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7, T9 => 8,
    T10 => 9, T11 => 10, T12 => 11, T13 => 12, T14 => 13, T15 => 14
);
impl_from_arguments!(
    T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7, T9 => 8,
    T10 => 9, T11 => 10, T12 => 11, T13 => 12, T14 => 13, T15 => 14, T16 => 15
);
