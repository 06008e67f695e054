//! Adapter macros that register user types with the classifier.

/// Register a struct as a [`Record`](crate::Record).
///
/// Only the listed fields are visible to the engine, in the listed order.
/// Fields left out are treated as inaccessible and never touched.
///
/// ```
/// use zero_trim::impl_record;
///
/// #[derive(Default)]
/// struct Service {
///     name: String,
///     ports: Vec<u16>,
///     owner: Option<String>,
///     cache: Vec<u8>, // private bookkeeping, not listed
/// }
///
/// impl_record!(Service { name, ports, owner });
///
/// let mut svc = Service { ports: Vec::with_capacity(4), ..Default::default() };
/// zero_trim::normalize(&mut svc).unwrap();
/// assert_eq!(svc.ports.capacity(), 0);
/// ```
///
/// Generic records list their parameters in brackets:
///
/// ```
/// use zero_trim::impl_record;
///
/// struct Page<T> {
///     items: Vec<T>,
///     next: Option<String>,
/// }
///
/// impl_record!(impl[T] Page<T> { items, next });
///
/// let mut page: Page<u32> = Page { items: Vec::with_capacity(8), next: None };
/// zero_trim::normalize(&mut page).unwrap();
/// assert_eq!(page.items.capacity(), 0);
/// ```
#[macro_export]
macro_rules! impl_record {
    (impl[$($gen:tt)*] $ty:ty { $($field:tt),* $(,)? }) => {
        impl<$($gen)*> $crate::Record for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            #[allow(unused_variables)]
            fn walk_fields(
                &mut self,
                visitor: &mut dyn $crate::FieldVisitor,
            ) -> $crate::Result<()> {
                $( visitor.visit_field(stringify!($field), &mut self.$field)?; )*
                Ok(())
            }
        }

        impl<$($gen)*> $crate::Field for $ty {
            fn shape(&self) -> $crate::Shape {
                $crate::Shape::Record
            }

            fn slot(&mut self) -> $crate::Slot<'_> {
                $crate::Slot::Record(self)
            }
        }
    };
    ($ty:ty { $($field:tt),* $(,)? }) => {
        $crate::impl_record!(impl[] $ty { $($field),* });
    };
}

/// Register types as [`Scalar`](crate::Scalar)s whose zero is their
/// `Default` value. Each type must implement `Default + PartialEq`.
///
/// ```
/// use zero_trim::{classify, impl_scalar, Shape};
///
/// #[derive(Default, PartialEq)]
/// enum Phase { #[default] Pending, Running }
///
/// impl_scalar!(Phase);
/// assert_eq!(classify(&Phase::Running), Shape::Scalar);
/// ```
#[macro_export]
macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Scalar for $ty {
                fn is_zero(&self) -> bool {
                    *self == <$ty as ::std::default::Default>::default()
                }

                fn reset(&mut self) {
                    *self = <$ty as ::std::default::Default>::default();
                }
            }

            impl $crate::Field for $ty {
                fn shape(&self) -> $crate::Shape {
                    $crate::Shape::Scalar
                }

                fn slot(&mut self) -> $crate::Slot<'_> {
                    $crate::Slot::Scalar(self)
                }
            }
        )*
    };
}
