//! Opaque "current user" capability carried by a [`crate::Ctx`].
//!
//! The core never authenticates anybody. Whatever sits at the top of the
//! handler tree may attach a user; handlers further down ask questions of
//! it through [`Permission`] checks.

use std::fmt;

use uuid::Uuid;

pub trait User: fmt::Display + Send + Sync {
    fn id(&self) -> Uuid;
}

/// A check a handler runs against the current user.
pub type Permission = fn(&dyn User) -> bool;

impl dyn User {
    pub fn can(&self, check: Permission) -> bool {
        check(self)
    }
}
