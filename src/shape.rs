//! Static shape classification.
//!
//! Every value the engine can meet implements [`Field`], which reports one of
//! five traversal categories and hands out a mutable, shape-specific view of
//! itself ([`Slot`]). The engine never inspects concrete types; it only talks
//! to these capability traits.

use std::fmt;

use crate::Result;

// ------------------------------- Shapes ---------------------------------- //

/// Traversal category of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Record,
    Reference,
    Dynamic,
    Collection,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Record => "record",
            Shape::Reference => "reference",
            Shape::Dynamic => "dynamic",
            Shape::Collection => "collection",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a value. Pure; never fails.
pub fn classify(value: &dyn Field) -> Shape {
    value.shape()
}

// ---------------------------- Capabilities ------------------------------- //

/// A value that can sit in a record field.
///
/// `shape` and `slot` must agree: a type reporting [`Shape::Collection`] hands
/// out [`Slot::Collection`], and so on.
pub trait Field {
    fn shape(&self) -> Shape;
    fn slot(&mut self) -> Slot<'_>;
}

/// Mutable, shape-specific view of a [`Field`].
pub enum Slot<'a> {
    Scalar(&'a mut dyn Scalar),
    Record(&'a mut dyn Record),
    Reference(&'a mut dyn Reference),
    Dynamic(&'a mut dyn Reference),
    Collection(&'a mut dyn Collection),
}

impl Slot<'_> {
    pub fn shape(&self) -> Shape {
        match self {
            Slot::Scalar(_) => Shape::Scalar,
            Slot::Record(_) => Shape::Record,
            Slot::Reference(_) => Shape::Reference,
            Slot::Dynamic(_) => Shape::Dynamic,
            Slot::Collection(_) => Shape::Collection,
        }
    }
}

/// Atomic value with a well-defined zero.
pub trait Scalar {
    fn is_zero(&self) -> bool;
    /// Reassign the zero value of the type.
    fn reset(&mut self);
}

/// Aggregate of named fields.
///
/// Implementations list their accessible fields; anything not handed to the
/// visitor is invisible to the engine. See [`impl_record!`](crate::impl_record).
pub trait Record {
    fn type_name(&self) -> &'static str;
    fn walk_fields(&mut self, visitor: &mut dyn FieldVisitor) -> Result<()>;
}

/// Callback driven by [`Record::walk_fields`], once per accessible field.
pub trait FieldVisitor {
    fn visit_field(&mut self, name: &'static str, field: &mut dyn Field) -> Result<()>;
}

/// Single-value holder, either empty or populated. Shared by the Reference and
/// Dynamic shapes.
pub trait Reference {
    fn is_empty(&self) -> bool;
    /// Reassign the canonical empty form.
    fn clear(&mut self);
    /// Stable identity for holders that may be reached more than once
    /// (shared pointers). Owned holders return `None`.
    fn identity(&self) -> Option<usize> {
        None
    }
    /// Run `visit` against the held value, if any.
    fn with_held(&mut self, visit: &mut dyn FnMut(&mut dyn Field) -> Result<()>) -> Result<()>;
}

/// Sequence or mapping with a cardinality.
pub trait Collection {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Replace with the canonical absent form (no backing storage).
    fn collapse(&mut self);
}
