//! Traversal engine.
//!
//! Depth-first, pre-order walk over a record. Every accessible field is
//! visited once and handled by its shape:
//!
//! - Record: always recursed into, never collapsed itself.
//! - Reference / Dynamic: empty → reassigned empty; populated → the held
//!   value is descended into and the holder stays populated.
//! - Collection: zero cardinality → collapsed to its absent form; otherwise
//!   left alone, elements included.
//! - Scalar: reset to zero only when already zero (inert).
//!
//! Descending into a held value is value-level: a held record is walked, a
//! held reference is followed, anything else is left as it is.

use std::collections::HashSet;
use std::ops::AddAssign;

use crate::error::{Error, Result};
use crate::shape::{Field, FieldVisitor, Record, Reference, Slot};

// ------------------------------- Report ---------------------------------- //

/// What a normalization run saw and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub records: usize,
    pub fields: usize,
    /// Zero scalars reassigned zero. Never an observable change.
    pub inert_scalars: usize,
    /// Dotted paths of collections collapsed to their absent form.
    pub collapsed: Vec<String>,
    /// Dotted paths of references/dynamics confirmed empty.
    pub cleared: Vec<String>,
}

impl Report {
    pub fn is_quiet(&self) -> bool {
        self.collapsed.is_empty() && self.cleared.is_empty()
    }
}

impl AddAssign for Report {
    fn add_assign(&mut self, rhs: Self) {
        self.records += rhs.records;
        self.fields += rhs.fields;
        self.inert_scalars += rhs.inert_scalars;
        self.collapsed.extend(rhs.collapsed);
        self.cleared.extend(rhs.cleared);
    }
}

// ------------------------------ Normalizer ------------------------------- //

/// Reusable front end for the engine. Accumulates a [`Report`] across runs.
#[derive(Debug, Default)]
pub struct Normalizer {
    path: Vec<&'static str>,
    // shared nodes on the current descent path
    active: HashSet<usize>,
    // shared nodes already walked during this run
    done: HashSet<usize>,
    report: Report,
}

type Step = fn(&mut Normalizer, &mut dyn Field) -> Result<()>;

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    /// Normalize a record in place.
    pub fn normalize<R: Record>(&mut self, root: &mut R) -> Result<()> {
        self.begin();
        let out = self.walk(root);
        self.finish(&out);
        out
    }

    /// Normalize whatever `root` resolves to. References are followed to the
    /// record they hold; an empty reference is a no-op. Any other shape is
    /// rejected with [`Error::NotARecord`].
    pub fn normalize_value(&mut self, root: &mut dyn Field) -> Result<()> {
        self.begin();
        let out = self.enter_root(root);
        self.finish(&out);
        out
    }

    fn begin(&mut self) {
        self.path.clear();
        self.active.clear();
        self.done.clear();
    }

    fn finish(&mut self, out: &Result<()>) {
        match out {
            Ok(()) => tracing::debug!(
                records = self.report.records,
                fields = self.report.fields,
                collapsed = self.report.collapsed.len(),
                cleared = self.report.cleared.len(),
                "normalized"
            ),
            Err(error) => tracing::debug!(%error, "normalization aborted"),
        }
        self.path.clear();
    }

    fn enter_root(&mut self, root: &mut dyn Field) -> Result<()> {
        match root.slot() {
            Slot::Record(record) => self.walk(record),
            Slot::Reference(holder) | Slot::Dynamic(holder) => {
                if holder.is_empty() {
                    return Ok(());
                }
                self.follow(holder, Self::enter_root)
            }
            other => Err(Error::NotARecord(other.shape())),
        }
    }

    fn walk(&mut self, record: &mut dyn Record) -> Result<()> {
        if self.path.is_empty() {
            self.path.push(record.type_name());
        }
        self.report.records += 1;
        record.walk_fields(self)
    }

    // Value-level descent into whatever a reference holds.
    fn descend(&mut self, value: &mut dyn Field) -> Result<()> {
        match value.slot() {
            Slot::Record(record) => self.walk(record),
            Slot::Reference(holder) | Slot::Dynamic(holder) => {
                if holder.is_empty() {
                    return Ok(());
                }
                self.follow(holder, Self::descend)
            }
            Slot::Collection(_) | Slot::Scalar(_) => Ok(()),
        }
    }

    fn follow(&mut self, holder: &mut dyn Reference, step: Step) -> Result<()> {
        let Some(id) = holder.identity() else {
            return holder.with_held(&mut |held| step(self, held));
        };
        if self.active.contains(&id) {
            return Err(Error::Cycle { path: self.current_path() });
        }
        if self.done.contains(&id) {
            return Ok(());
        }
        self.active.insert(id);
        let out = holder.with_held(&mut |held| step(self, held));
        self.active.remove(&id);
        self.done.insert(id);
        out
    }

    fn apply(&mut self, field: &mut dyn Field) -> Result<()> {
        match field.slot() {
            Slot::Record(record) => self.walk(record),
            Slot::Reference(holder) | Slot::Dynamic(holder) => {
                if holder.is_empty() {
                    holder.clear();
                    let path = self.current_path();
                    tracing::trace!(%path, "empty reference");
                    self.report.cleared.push(path);
                    Ok(())
                } else {
                    self.follow(holder, Self::descend)
                }
            }
            Slot::Collection(collection) => {
                if collection.is_empty() {
                    collection.collapse();
                    let path = self.current_path();
                    tracing::trace!(%path, "collapsed empty collection");
                    self.report.collapsed.push(path);
                }
                Ok(())
            }
            Slot::Scalar(scalar) => {
                if scalar.is_zero() {
                    scalar.reset();
                    self.report.inert_scalars += 1;
                }
                Ok(())
            }
        }
    }

    fn current_path(&self) -> String {
        self.path.join(".")
    }
}

impl FieldVisitor for Normalizer {
    fn visit_field(&mut self, name: &'static str, field: &mut dyn Field) -> Result<()> {
        self.path.push(name);
        self.report.fields += 1;
        let out = self.apply(field);
        self.path.pop();
        out
    }
}

// ------------------------------- Front API -------------------------------- //

/// Normalize a record in place.
pub fn normalize<R: Record>(root: &mut R) -> Result<()> {
    Normalizer::new().normalize(root)
}

/// Normalize a value that must resolve to a record. See
/// [`Normalizer::normalize_value`].
pub fn normalize_value(root: &mut dyn Field) -> Result<()> {
    Normalizer::new().normalize_value(root)
}

// ------------------------------- Tests ------------------------------------ //
