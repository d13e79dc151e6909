#![forbid(unsafe_code)]

//! The error channel of a binding.
//!
//! Holds the last conversion failure, or `None` once a later write converts
//! successfully. Bindings record failures into it; hosts read and watch it.

use crate::reactive::{Atom, Observable, Subscription};

/// Last conversion failure of a binding (or of a whole family, when shared).
pub struct ErrorChannel<E> {
    cell: Observable<Option<E>>,
}

impl<E> Clone for ErrorChannel<E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for ErrorChannel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ErrorChannel").field(&self.cell).finish()
    }
}

impl<E: Clone + PartialEq + 'static> Default for ErrorChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + PartialEq + 'static> ErrorChannel<E> {
    /// A channel in the "no error" state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Observable::new(None),
        }
    }

    /// The recorded failure, if any.
    #[must_use]
    pub fn get(&self) -> Option<E> {
        self.cell.get()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.cell.with(Option::is_some)
    }

    /// Dismiss the recorded failure without touching either side.
    pub fn clear(&self) {
        self.cell.set(None);
    }

    /// Watch for the failure being recorded, replaced or cleared.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&Option<E>) + 'static) -> Subscription {
        self.cell.subscribe(callback)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Whether both handles refer to the same channel.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.cell.ptr_eq(&other.cell)
    }

    pub(crate) fn record(&self, error: E) {
        self.cell.set(Some(error));
    }
}

/// The channel is a cell like any other, so it can be watched through
/// `dyn Atom` or bound again. Writing `None` dismisses the failure and
/// writing `Some` reports one; neither side of the binding is touched.
impl<E: Clone + PartialEq + 'static> Atom<Option<E>> for ErrorChannel<E> {
    fn get(&self) -> Option<E> {
        self.cell.get()
    }

    fn set(&self, value: Option<E>) {
        self.cell.set(value);
    }

    fn subscribe(&self, callback: Box<dyn Fn(&Option<E>)>) -> Subscription {
        self.cell.subscribe(callback)
    }
}
