use std::any::Any;
use std::fmt;

use crate::shape::{Field, Reference, Shape, Slot};
use crate::Result;

/// A [`Field`] that can also be downcast back to its concrete type.
pub trait AnyField: Field + Any {
    fn as_field_mut(&mut self) -> &mut dyn Field;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Field + Any> AnyField for T {
    fn as_field_mut(&mut self) -> &mut dyn Field {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Type-erased holder: empty, or exactly one value of any shape.
#[derive(Default)]
pub struct Dynamic(Option<Box<dyn AnyField>>);

impl Dynamic {
    pub fn new<T: Field + Any>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Shape of the held value, if any.
    pub fn held_shape(&self) -> Option<Shape> {
        self.0.as_deref().map(|v| v.shape())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.as_any().downcast_ref::<T>())
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut().and_then(|v| v.as_any_mut().downcast_mut::<T>())
    }

    /// Move the held value out, leaving this holder empty.
    pub fn take(&mut self) -> Self {
        Self(self.0.take())
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.held_shape() {
            Some(shape) => write!(f, "Dynamic({shape})"),
            None => f.write_str("Dynamic(nil)"),
        }
    }
}

impl Reference for Dynamic {
    fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    fn clear(&mut self) {
        self.0 = None;
    }

    fn with_held(&mut self, visit: &mut dyn FnMut(&mut dyn Field) -> Result<()>) -> Result<()> {
        match self.0.as_deref_mut() {
            Some(held) => visit(held.as_field_mut()),
            None => Ok(()),
        }
    }
}

impl Field for Dynamic {
    fn shape(&self) -> Shape {
        Shape::Dynamic
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Dynamic(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_sees_the_concrete_value() {
        let mut d = Dynamic::new(vec![1u8, 2, 3]);
        assert_eq!(d.held_shape(), Some(Shape::Collection));
        d.downcast_mut::<Vec<u8>>().unwrap().push(4);
        assert_eq!(d.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3, 4]));
        assert!(d.downcast_ref::<String>().is_none());
    }

    #[test]
    fn debug_names_the_held_shape() {
        assert_eq!(format!("{:?}", Dynamic::empty()), "Dynamic(nil)");
        assert_eq!(format!("{:?}", Dynamic::new(Some(1i32))), "Dynamic(reference)");
    }

    #[test]
    fn take_leaves_the_holder_empty() {
        let mut d = Dynamic::new(String::from("kept"));
        let taken = d.take();
        assert!(d.is_empty());
        assert_eq!(d.held_shape(), None);
        assert_eq!(taken.downcast_ref::<String>().map(String::as_str), Some("kept"));
        assert!(Dynamic::empty().take().is_empty());
    }

    #[test]
    fn held_value_is_not_the_box() {
        let mut d = Dynamic::new(7u64);
        let mut shape = None;
        d.with_held(&mut |held| {
            shape = Some(held.shape());
            Ok(())
        })
        .unwrap();
        assert_eq!(shape, Some(Shape::Scalar));
    }
}
