#![forbid(unsafe_code)]

//! The cell contract bindings are written against.
//!
//! Anything that can be read, written, and watched synchronously can be
//! synchronized. [`Observable`] is the in-crate implementation, and the
//! synced side cells implement it too, so a synced cell can be bound again.

use std::rc::Rc;

use super::observable::{Observable, Subscription};

/// A synchronously readable and writable reactive cell.
///
/// Implementations must make a `set` visible to the next `get` immediately.
pub trait Atom<T> {
    /// Current value.
    fn get(&self) -> T;

    /// Replace the value.
    fn set(&self, value: T);

    /// Watch for changes until the returned guard drops.
    fn subscribe(&self, callback: Box<dyn Fn(&T)>) -> Subscription;
}

impl<T: Clone + PartialEq + 'static> Atom<T> for Observable<T> {
    fn get(&self) -> T {
        Observable::get(self)
    }

    fn set(&self, value: T) {
        Observable::set(self, value);
    }

    fn subscribe(&self, callback: Box<dyn Fn(&T)>) -> Subscription {
        Observable::subscribe(self, callback)
    }
}

impl<T, C: Atom<T> + ?Sized> Atom<T> for Rc<C> {
    fn get(&self) -> T {
        (**self).get()
    }

    fn set(&self, value: T) {
        (**self).set(value);
    }

    fn subscribe(&self, callback: Box<dyn Fn(&T)>) -> Subscription {
        (**self).subscribe(callback)
    }
}

/// A write request: either a literal value or a function of the current one.
pub enum Update<T> {
    /// Replace with this value.
    Set(T),
    /// Compute the new value from the current one.
    Apply(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Update<T> {
    /// Functional update from a closure.
    pub fn apply(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Self::Apply(Box::new(f))
    }

    /// Turn the request into the intended new value.
    ///
    /// `current` is only called for [`Update::Apply`].
    pub fn resolve(self, current: impl FnOnce() -> T) -> T {
        match self {
            Self::Set(value) => value,
            Self::Apply(f) => f(&current()),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Self::Set(value)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Set(value) => f.debug_tuple("Set").field(value).finish(),
            Self::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}
