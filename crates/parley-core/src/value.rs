//! Type-erased values produced by converters.
//!
//! Converters are registered against a target type but stored behind a single
//! interface, so their output travels as a [`Value`]: a cheaply clonable,
//! reference-counted `dyn Any` that remembers the name of the type it holds.
//! [`TypeKey`] is the matching lookup key used by the converter registry.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// =============================================================================
// TypeKey
// =============================================================================

/// Identifies a Rust type for converter lookup.
///
/// Equality and hashing only consider the [`TypeId`]; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this key identifies `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// =============================================================================
// Value
// =============================================================================

/// A converted argument value.
///
/// Cloning a `Value` only bumps a reference count, so parameter defaults and
/// converter results can be handed out freely.
///
/// # Example
///
/// ```
/// use parley_core::Value;
///
/// let value = Value::new(42_i64);
/// assert!(value.is::<i64>());
/// assert_eq!(value.get::<i64>(), Some(42));
/// assert_eq!(value.get::<String>(), None);
/// ```
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wraps `value`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wraps an already shared value without copying it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the name of the contained type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the [`TypeId`] of the contained value.
    pub fn type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    /// Returns `true` if the contained value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrows the contained value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns a clone of the contained value as `T`.
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Converts into a shared `Arc<T>`, handing the value back on mismatch.
    pub fn downcast<T: Any + Send + Sync>(self) -> Result<Arc<T>, Self> {
        let type_name = self.type_name;
        self.inner
            .downcast::<T>()
            .map_err(|inner| Self { inner, type_name })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.downcast_ref::<String>() {
            return f.debug_tuple("Value").field(s).finish();
        }
        if let Some(n) = self.downcast_ref::<i64>() {
            return f.debug_tuple("Value").field(n).finish();
        }
        if let Some(b) = self.downcast_ref::<bool>() {
            return f.debug_tuple("Value").field(b).finish();
        }
        write!(f, "Value(<{}>)", self.type_name)
    }
}
