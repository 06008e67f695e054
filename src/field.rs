//! [`Field`] implementations for std, serde_json, chrono and indexmap types.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::shape::{Collection, Field, Reference, Scalar, Shape, Slot};
use crate::Result;

// ------------------------------- Scalars --------------------------------- //

crate::impl_scalar!(
    bool, char, String, Duration, DateTime<Utc>,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
);

// Floats compare by bit pattern: `-0.0 == 0.0` would otherwise be "reset"
// to `+0.0`, which is an observable change.
macro_rules! float_scalars {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                fn is_zero(&self) -> bool {
                    self.to_bits() == 0
                }

                fn reset(&mut self) {
                    *self = 0.0;
                }
            }

            impl Field for $ty {
                fn shape(&self) -> Shape {
                    Shape::Scalar
                }

                fn slot(&mut self) -> Slot<'_> {
                    Slot::Scalar(self)
                }
            }
        )*
    };
}

float_scalars!(f32, f64);

impl Scalar for Number {
    fn is_zero(&self) -> bool {
        self.as_u64() == Some(0) || self.as_i64() == Some(0)
    }

    fn reset(&mut self) {
        *self = Number::from(0u8);
    }
}

impl Field for Number {
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Scalar(self)
    }
}

/// Wrapper for values that have no notion of zero. Classified as a Scalar
/// that is never equal to zero, so the engine leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opaque<T>(pub T);

impl<T> Opaque<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Opaque<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Opaque<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> Scalar for Opaque<T> {
    fn is_zero(&self) -> bool {
        false
    }

    fn reset(&mut self) {}
}

impl<T> Field for Opaque<T> {
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Scalar(self)
    }
}

// ----------------------------- Collections ------------------------------- //

macro_rules! collection {
    (impl[$($gen:tt)*] $ty:ty) => {
        impl<$($gen)*> Collection for $ty {
            fn len(&self) -> usize {
                <$ty>::len(self)
            }

            fn collapse(&mut self) {
                *self = Default::default();
            }
        }

        impl<$($gen)*> Field for $ty {
            fn shape(&self) -> Shape {
                Shape::Collection
            }

            fn slot(&mut self) -> Slot<'_> {
                Slot::Collection(self)
            }
        }
    };
}

collection!(impl[T] Vec<T>);
collection!(impl[T] VecDeque<T>);
collection!(impl[K, V] BTreeMap<K, V>);
collection!(impl[T] BTreeSet<T>);
collection!(impl[K, V, S: BuildHasher + Default] HashMap<K, V, S>);
collection!(impl[T, S: BuildHasher + Default] HashSet<T, S>);
collection!(impl[K, V, S: BuildHasher + Default] IndexMap<K, V, S>);
collection!(impl[T, S: BuildHasher + Default] IndexSet<T, S>);
collection!(impl[] Map<String, Value>);

// ------------------------------ References ------------------------------- //

impl<T: Field> Reference for Option<T> {
    fn is_empty(&self) -> bool {
        self.is_none()
    }

    fn clear(&mut self) {
        *self = None;
    }

    fn with_held(&mut self, visit: &mut dyn FnMut(&mut dyn Field) -> Result<()>) -> Result<()> {
        match self {
            Some(held) => visit(held),
            None => Ok(()),
        }
    }
}

impl<T: Field> Field for Option<T> {
    fn shape(&self) -> Shape {
        Shape::Reference
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Reference(self)
    }
}

// A box is an owned, never-null pointer: it takes the shape of its content.
impl<T: Field + ?Sized> Field for Box<T> {
    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn slot(&mut self) -> Slot<'_> {
        (**self).slot()
    }
}

/// Shared node. Never empty; identified by address so the engine can detect
/// cycles and avoid walking a node reached through two paths twice.
impl<T: Field> Reference for Rc<RefCell<T>> {
    fn is_empty(&self) -> bool {
        false
    }

    fn clear(&mut self) {}

    fn identity(&self) -> Option<usize> {
        Some(Rc::as_ptr(self) as *const () as usize)
    }

    fn with_held(&mut self, visit: &mut dyn FnMut(&mut dyn Field) -> Result<()>) -> Result<()> {
        match self.try_borrow_mut() {
            Ok(mut held) => visit(&mut *held),
            Err(_) => {
                tracing::trace!("shared node is borrowed elsewhere; skipping");
                Ok(())
            }
        }
    }
}

impl<T: Field> Field for Rc<RefCell<T>> {
    fn shape(&self) -> Shape {
        Shape::Reference
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Reference(self)
    }
}

// ------------------------------- Dynamic --------------------------------- //

impl Reference for Value {
    fn is_empty(&self) -> bool {
        self.is_null()
    }

    fn clear(&mut self) {
        *self = Value::Null;
    }

    fn with_held(&mut self, visit: &mut dyn FnMut(&mut dyn Field) -> Result<()>) -> Result<()> {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => visit(b),
            Value::Number(n) => visit(n),
            Value::String(s) => visit(s),
            Value::Array(xs) => visit(xs),
            Value::Object(map) => visit(map),
        }
    }
}

impl Field for Value {
    fn shape(&self) -> Shape {
        Shape::Dynamic
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Dynamic(self)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::classify;
    use serde_json::json;

    #[test]
    fn std_types_classify_by_shape() {
        assert_eq!(classify(&0u32), Shape::Scalar);
        assert_eq!(classify(&String::new()), Shape::Scalar);
        assert_eq!(classify(&Utc::now()), Shape::Scalar);
        assert_eq!(classify(&Opaque(std::net::Ipv4Addr::LOCALHOST)), Shape::Scalar);
        assert_eq!(classify(&Vec::<u8>::new()), Shape::Collection);
        assert_eq!(classify(&BTreeMap::<String, i32>::new()), Shape::Collection);
        assert_eq!(classify(&IndexSet::<String>::new()), Shape::Collection);
        assert_eq!(classify(&Map::new()), Shape::Collection);
        assert_eq!(classify(&Some(1u8)), Shape::Reference);
        assert_eq!(classify(&None::<String>), Shape::Reference);
        assert_eq!(classify(&Rc::new(RefCell::new(1i32))), Shape::Reference);
        assert_eq!(classify(&json!({"a": 1})), Shape::Dynamic);
        assert_eq!(classify(&Value::Null), Shape::Dynamic);
    }

    #[test]
    fn box_is_transparent() {
        assert_eq!(classify(&Box::new(3i64)), Shape::Scalar);
        assert_eq!(classify(&Box::new(vec![1, 2])), Shape::Collection);
        assert_eq!(classify(&Box::new(Some(1u8))), Shape::Reference);
    }

    #[test]
    fn slot_agrees_with_shape() {
        let mut values: Vec<Box<dyn Field>> = vec![
            Box::new(1.5f64),
            Box::new(vec!["a".to_string()]),
            Box::new(Some(2u16)),
            Box::new(json!(null)),
            Box::new(HashMap::<u8, u8>::new()),
        ];
        for value in values.iter_mut() {
            let shape = value.shape();
            assert_eq!(value.slot().shape(), shape);
        }
    }

    #[test]
    fn negative_zero_is_not_zero() {
        assert!(Scalar::is_zero(&0.0f64));
        assert!(!Scalar::is_zero(&-0.0f64));
        assert!(!Scalar::is_zero(&f32::NAN));
    }

    #[test]
    fn json_numbers_zero() {
        assert!(Number::from(0u8).is_zero());
        assert!(!Number::from(-3i64).is_zero());
        let float_zero = Number::from_f64(0.0).unwrap();
        assert!(!float_zero.is_zero());
    }

    #[test]
    fn collapse_releases_storage() {
        let mut xs: Vec<u32> = Vec::with_capacity(16);
        Collection::collapse(&mut xs);
        assert_eq!(xs.capacity(), 0);

        let mut map: HashMap<String, String> = HashMap::with_capacity(8);
        Collection::collapse(&mut map);
        assert_eq!(map.capacity(), 0);
    }

    #[test]
    fn dynamic_value_hands_out_held_shape() {
        let mut v = json!(["x"]);
        let mut seen = None;
        v.with_held(&mut |held| {
            seen = Some(held.shape());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, Some(Shape::Collection));
    }
}
