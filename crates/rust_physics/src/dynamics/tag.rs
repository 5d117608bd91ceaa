//! Opaque user payloads attached to bodies and fixtures

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased user data
///
/// Clones share the payload, and equality is identity of the payload, so a
/// tag copied onto a migrated fixture still compares equal to the source.
#[derive(Clone)]
pub struct UserTag(Arc<dyn Any + Send + Sync>);

impl UserTag {
    /// Wrap a value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as `T` if that is what it holds
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for UserTag {
    fn eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.0).cast::<()>() == Arc::as_ptr(&other.0).cast::<()>()
    }
}

impl fmt::Debug for UserTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserTag({:p})", Arc::as_ptr(&self.0))
    }
}
