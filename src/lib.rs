//! # zero-trim
//!
//! In-place normalization of decoded records: fields that carry no
//! information (empty collections, empty optionals, null dynamic values) are
//! collapsed to one canonical absent form, so that only what the producer
//! actually set stays visible when a payload is printed, diffed or compared.
//!
//! ```
//! use zero_trim::{impl_record, normalize};
//!
//! #[derive(Debug, Default)]
//! struct Deployment {
//!     name: String,
//!     tags: Vec<String>,
//!     owner: Option<String>,
//! }
//! impl_record!(Deployment { name, tags, owner });
//!
//! let mut d = Deployment { name: "x".into(), tags: Vec::with_capacity(4), owner: None };
//! normalize(&mut d).unwrap();
//! assert_eq!(d.tags.capacity(), 0);
//! assert_eq!(d.name, "x");
//! ```
//!
//! Types take part by implementing [`Field`]: std collections, options,
//! scalars, `serde_json::Value` and friends are covered in [`field`]; user
//! structs register with [`impl_record!`], user scalars with [`impl_scalar!`].

#[macro_use]
mod macros;

pub mod dynamic;
pub mod engine;
pub mod error;
pub mod field;
pub mod jobs;
pub mod path_de;
pub mod shape;

pub use dynamic::{AnyField, Dynamic};
pub use engine::{normalize, normalize_value, Normalizer, Report};
pub use error::{Error, Result};
pub use field::Opaque;
pub use shape::{classify, Collection, Field, FieldVisitor, Record, Reference, Scalar, Shape, Slot};
