//! Non-owning view of the externally owned object graph.
//!
//! Every type here is an observation. The foreign process allocates, moves and
//! frees the objects behind a [`ForeignHandle`] without telling us, so a handle
//! only proves that an object *was* there when it was obtained.

mod schema;
pub use schema::*;

#[cfg(test)]
mod foreign_test;

use std::fmt;

#[cfg(test)]
use mockall::automock;

use crate::ForeignError;

/// Address-equivalent identity of a foreign object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignAddr(pub usize);

impl ForeignAddr {
    pub const NULL: ForeignAddr = ForeignAddr(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ForeignAddr {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque reference to a foreign object plus whether the managed wrapper around
/// it still exists. Never dereferenced when the wrapper is gone or the address
/// is null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ForeignHandle {
    pub addr: ForeignAddr,
    pub has_wrapper: bool,
}

impl ForeignHandle {
    pub fn new(addr: usize) -> Self {
        Self {
            addr: ForeignAddr(addr),
            has_wrapper: true,
        }
    }

    /// A handle whose managed wrapper was collected.
    pub fn detached(addr: usize) -> Self {
        Self {
            addr: ForeignAddr(addr),
            has_wrapper: false,
        }
    }

    pub fn is_null(&self) -> bool {
        !self.has_wrapper || self.addr.is_null()
    }
}

/// Raw value of a single foreign field.
#[derive(Clone, Debug, PartialEq)]
pub enum ForeignValue {
    Null,
    Int(i64),
    Bool(bool),
    Text(String),
    Object(ForeignHandle),
    List(Vec<ForeignHandle>),
}

impl ForeignValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ForeignValue::Null => "null",
            ForeignValue::Int(_) => "an integer",
            ForeignValue::Bool(_) => "a boolean",
            ForeignValue::Text(_) => "text",
            ForeignValue::Object(_) => "an object",
            ForeignValue::List(_) => "a list",
        }
    }
}

/// Capability to read the foreign object graph.
///
/// Implementations must fail atomically: a read either returns a value or an
/// error, and never leaves the caller with a half-read object. A failed type
/// query means "not this type", not a fault.
pub trait ForeignGraph {
    /// Process-wide root (the well-known manager singleton).
    fn root(&self) -> Result<ForeignHandle, ForeignError>;

    fn read(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) -> Result<ForeignValue, ForeignError>;

    /// Runtime class name of the object behind `handle`.
    fn class_name(
        &self,
        handle: ForeignHandle,
    ) -> Result<String, ForeignError>;

    /// Enumerate live instances of `class`. Expensive and fault-prone; only
    /// called on a tick that holds the discovery slot.
    fn find_instances(
        &self,
        class: &str,
    ) -> Result<Vec<ForeignHandle>, ForeignError>;

    /// Give the foreign runtime a chance to reach a safe point.
    fn safe_point(&self) {}
}

/// Best-effort live-ness check for a raw foreign address.
#[cfg_attr(test, automock)]
pub trait MemoryProbe {
    /// `Ok(false)` and `Err(_)` both mean "do not touch".
    fn probe(
        &self,
        addr: ForeignAddr,
    ) -> Result<bool, ForeignError>;
}

/// Result of a runtime "try-cast" of a foreign object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classified {
    NotApplicable,
    Typed(ForeignHandle),
}

impl Classified {
    pub fn typed(self) -> Option<ForeignHandle> {
        match self {
            Classified::Typed(handle) => Some(handle),
            Classified::NotApplicable => None,
        }
    }
}

/// Typed helpers over [`ForeignGraph`].
pub trait ForeignGraphExt: ForeignGraph {
    /// Read a field that must hold a non-null object.
    fn read_object(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) -> Result<ForeignHandle, ForeignError> {
        match self.read(handle, field)? {
            ForeignValue::Object(child) if !child.is_null() => Ok(child),
            ForeignValue::Object(_) | ForeignValue::Null => Err(ForeignError::NullHandle),
            other => Err(unexpected(field, "an object", &other)),
        }
    }

    fn read_int(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) -> Result<i64, ForeignError> {
        match self.read(handle, field)? {
            ForeignValue::Int(v) => Ok(v),
            other => Err(unexpected(field, "an integer", &other)),
        }
    }

    fn read_bool(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) -> Result<bool, ForeignError> {
        match self.read(handle, field)? {
            ForeignValue::Bool(v) => Ok(v),
            other => Err(unexpected(field, "a boolean", &other)),
        }
    }

    /// Null strings read as empty, matching how the foreign side renders them.
    fn read_text(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) -> Result<String, ForeignError> {
        match self.read(handle, field)? {
            ForeignValue::Text(v) => Ok(v),
            ForeignValue::Null => Ok(String::new()),
            other => Err(unexpected(field, "text", &other)),
        }
    }

    fn read_list(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) -> Result<Vec<ForeignHandle>, ForeignError> {
        match self.read(handle, field)? {
            ForeignValue::List(items) => Ok(items),
            ForeignValue::Null => Ok(Vec::new()),
            other => Err(unexpected(field, "a list", &other)),
        }
    }

    /// Follow a documented field path (`root -> a -> b -> ...`). Any null or
    /// failing hop aborts the whole walk.
    fn navigate(
        &self,
        start: ForeignHandle,
        path: &[&str],
    ) -> Result<ForeignHandle, ForeignError> {
        let mut current = start;
        for field in path {
            current = self.read_object(current, field)?;
        }
        Ok(current)
    }

    fn classify(
        &self,
        handle: ForeignHandle,
        class: &str,
    ) -> Classified {
        match self.class_name(handle) {
            Ok(found) if found == class => Classified::Typed(handle),
            _ => Classified::NotApplicable,
        }
    }
}

impl<G: ForeignGraph + ?Sized> ForeignGraphExt for G {}

fn unexpected(
    field: &str,
    expected: &'static str,
    found: &ForeignValue,
) -> ForeignError {
    tracing::trace!(field, expected, found = found.kind(), "unexpected foreign value");
    ForeignError::UnexpectedValue {
        field: field.to_string(),
        expected,
    }
}

impl From<i64> for ForeignValue {
    fn from(v: i64) -> Self {
        ForeignValue::Int(v)
    }
}

impl From<bool> for ForeignValue {
    fn from(v: bool) -> Self {
        ForeignValue::Bool(v)
    }
}

impl From<&str> for ForeignValue {
    fn from(v: &str) -> Self {
        ForeignValue::Text(v.to_string())
    }
}

impl From<ForeignHandle> for ForeignValue {
    fn from(v: ForeignHandle) -> Self {
        ForeignValue::Object(v)
    }
}

impl From<Vec<ForeignHandle>> for ForeignValue {
    fn from(v: Vec<ForeignHandle>) -> Self {
        ForeignValue::List(v)
    }
}
