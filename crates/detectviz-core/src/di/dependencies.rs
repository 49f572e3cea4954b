use std::sync::Arc;

use crate::di::container::Resolver;
use crate::di::descriptor::ServiceKey;
use crate::di::error::{BoxError, Result};

/// The argument list a factory declares.
///
/// Implemented for `()` and for tuples of up to eight `Arc<T>` capabilities.
/// Each element is resolved through the container in order; a failure is
/// reported with the element's position.
pub trait Dependencies: Sized + 'static {
    /// Capability keys in parameter order.
    fn keys() -> Vec<ServiceKey>;

    fn resolve(resolver: &mut Resolver<'_>) -> Result<Self>;
}

impl Dependencies for () {
    fn keys() -> Vec<ServiceKey> {
        Vec::new()
    }

    fn resolve(_resolver: &mut Resolver<'_>) -> Result<Self> {
        Ok(())
    }
}

macro_rules! impl_dependencies {
    ($($idx:tt => $ty:ident),+) => {
        impl<$($ty: ?Sized + Send + Sync + 'static),+> Dependencies for ($(Arc<$ty>,)+) {
            fn keys() -> Vec<ServiceKey> {
                vec![$(ServiceKey::of::<$ty>()),+]
            }

            fn resolve(resolver: &mut Resolver<'_>) -> Result<Self> {
                Ok(($(resolver.resolve_parameter::<$ty>($idx)?,)+))
            }
        }
    };
}

impl_dependencies!(0 => A);
impl_dependencies!(0 => A, 1 => B);
impl_dependencies!(0 => A, 1 => B, 2 => C);
impl_dependencies!(0 => A, 1 => B, 2 => C, 3 => D);
impl_dependencies!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
impl_dependencies!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);
impl_dependencies!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G);
impl_dependencies!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H);

/// What a factory may return: the instance itself, or the instance paired
/// with a possible error.
pub trait IntoInstance<T: ?Sized> {
    fn into_instance(self) -> std::result::Result<Arc<T>, BoxError>;
}

impl<T: ?Sized> IntoInstance<T> for Arc<T> {
    fn into_instance(self) -> std::result::Result<Arc<T>, BoxError> {
        Ok(self)
    }
}

impl<T: ?Sized, E> IntoInstance<T> for std::result::Result<Arc<T>, E>
where
    E: Into<BoxError>,
{
    fn into_instance(self) -> std::result::Result<Arc<T>, BoxError> {
        self.map_err(Into::into)
    }
}
