use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use super::ForeignGraph;
use super::ForeignGraphExt;
use super::ForeignHandle;
use crate::utils::guard::contain;
use crate::ForeignError;

/// Last-seen primitive value of one foreign field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for Primitive {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Primitive::Int(v) => write!(f, "{}", v),
            Primitive::Bool(v) => write!(f, "{}", v),
            Primitive::Text(v) => f.write_str(v),
        }
    }
}

/// Flat field name -> value mapping used only for change comparison. No
/// structural data from the foreign graph is retained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeMap<String, Primitive>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        name: &str,
        value: Primitive,
    ) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(
        &mut self,
        name: &str,
        value: Primitive,
    ) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Primitive> {
        self.fields.get(name)
    }

    pub fn int(
        &self,
        name: &str,
    ) -> Option<i64> {
        match self.fields.get(name) {
            Some(Primitive::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn flag(
        &self,
        name: &str,
    ) -> Option<bool> {
        match self.fields.get(name) {
            Some(Primitive::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(
        &self,
        name: &str,
    ) -> Option<&str> {
        match self.fields.get(name) {
            Some(Primitive::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Refill fields that could not be read this tick from `previous`, so a
    /// momentarily unreadable field is not mistaken for a change.
    pub fn carry_forward(
        &mut self,
        previous: &Schema,
    ) {
        for (name, value) in &previous.fields {
            self.fields.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Bool,
    Text,
}

/// One schema field: a path of object hops from the bound handle, ending in
/// the primitive field itself.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub path: &'static [&'static str],
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        path: &'static [&'static str],
        kind: FieldKind,
    ) -> Self {
        Self { name, path, kind }
    }
}

/// Read `specs` from `handle`. Every field is isolated: one failing field is
/// simply absent from the result and the others are still read.
///
/// The one failure that is not isolated is the bound object itself going
/// away (null handle, or `Disposed` at `handle`'s address). That ends the read
/// so the owner can release the handle.
pub fn extract_schema<G: ForeignGraph + ?Sized>(
    graph: &G,
    handle: ForeignHandle,
    specs: &[FieldSpec],
) -> Result<Schema, ForeignError> {
    if handle.is_null() {
        return Err(ForeignError::NullHandle);
    }

    let mut schema = Schema::new();
    for spec in specs {
        match contain(|| read_field(graph, handle, spec)) {
            Some(Ok(value)) => schema.insert(spec.name, value),
            Some(Err(ForeignError::Disposed { addr })) if addr == handle.addr => {
                return Err(ForeignError::Disposed { addr });
            }
            Some(Err(e)) => trace!(field = spec.name, error = %e, "field read failed"),
            None => trace!(field = spec.name, "field read panicked"),
        }
    }
    Ok(schema)
}

fn read_field<G: ForeignGraph + ?Sized>(
    graph: &G,
    handle: ForeignHandle,
    spec: &FieldSpec,
) -> Result<Primitive, ForeignError> {
    let (last, hops) = spec.path.split_last().ok_or_else(|| ForeignError::Unreadable {
        field: spec.name.to_string(),
    })?;
    let owner = graph.navigate(handle, hops)?;
    let value = match spec.kind {
        FieldKind::Int => Primitive::Int(graph.read_int(owner, last)?),
        FieldKind::Bool => Primitive::Bool(graph.read_bool(owner, last)?),
        FieldKind::Text => Primitive::Text(graph.read_text(owner, last)?),
    };
    Ok(value)
}
