#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! [`Observable<T>`] is the host cell that bindings run against. It is a
//! cheap, cloneable handle to one shared value; every clone reads and writes
//! the same storage.
//!
//! # Invariants
//!
//! 1. `version()` increments exactly once per `set`/`update` that changes the
//!    value.
//! 2. Setting a value equal to the current value is a no-op.
//! 3. `get()` after `set(v)` returns `v`, even while a [`BatchScope`] defers
//!    the notification.
//! 4. Subscribers run in registration order, after the value is stored and
//!    the interior borrow is released, so callbacks may read or write any
//!    observable (including this one).
//!
//! [`BatchScope`]: super::BatchScope

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::batch;

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    /// Weak so a dropped [`Subscription`] detaches without touching us.
    subscribers: Vec<Weak<Box<Callback<T>>>>,
    /// Set while a notification for this value sits in the batch queue.
    queued: bool,
}

/// A shared value that notifies subscribers when it changes.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
                queued: false,
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Store `value`, notifying subscribers if it differs from the current one.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Mutate a copy of the value and store it. Notifies only if the result
    /// differs.
    ///
    /// `f` runs without the value borrowed, so it may read this observable.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Register `callback` to run after every change.
    ///
    /// The callback stays registered for as long as the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Box<Callback<T>>> = Rc::new(Box::new(callback));
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    /// Number of mutations that changed the value.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscribers. Prunes dead entries as a side effect.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|w| w.strong_count() > 0);
        inner.subscribers.len()
    }

    /// Whether both handles point at the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self) {
        if batch::is_batching() {
            let mut inner = self.inner.borrow_mut();
            if inner.queued {
                return;
            }
            inner.queued = true;
            drop(inner);
            let flag = QueuedFlag(self.clone());
            batch::defer(Box::new(move || {
                let this = flag.0.clone();
                drop(flag);
                this.dispatch();
            }));
            return;
        }
        self.dispatch();
    }

    fn dispatch(&self) {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<_> = inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&value);
        }
    }
}

/// Clears `queued` when its deferred notification runs or is discarded.
struct QueuedFlag<T>(Observable<T>);

impl<T> Drop for QueuedFlag<T> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.0.inner.try_borrow_mut() {
            inner.queued = false;
        }
    }
}

/// RAII guard for an [`Observable`] subscription.
///
/// Dropping it removes the callback before the next notification cycle.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Rc<dyn Any>,
}

impl Subscription {
    /// Explicitly end the subscription. Equivalent to dropping it.
    pub fn unsubscribe(self) {}
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_returns_latest_set() {
        let obs = Observable::new(1);
        obs.set(2);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn equal_set_is_noop() {
        let obs = Observable::new("a".to_string());
        let fired = Rc::new(Cell::new(0));
        let f = Rc::clone(&fired);
        let _sub = obs.subscribe(move |_| f.set(f.get() + 1));

        obs.set("a".to_string());
        assert_eq!(obs.version(), 0);
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn update_in_place() {
        let obs = Observable::new(vec![1, 2]);
        obs.update(|v| v.push(3));
        assert_eq!(obs.get(), vec![1, 2, 3]);
        assert_eq!(obs.version(), 1);

        obs.update(|_| {});
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _s1 = obs.subscribe(move |v| l1.borrow_mut().push(("first", *v)));
        let l2 = Rc::clone(&log);
        let _s2 = obs.subscribe(move |v| l2.borrow_mut().push(("second", *v)));

        obs.set(7);
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn dropped_subscription_is_detached() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let sub = obs.subscribe(move |v| s.set(*v));
        assert_eq!(obs.subscriber_count(), 1);

        obs.set(1);
        sub.unsubscribe();
        obs.set(2);

        assert_eq!(seen.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn callback_may_write_back() {
        let obs = Observable::new(0);
        let inner = obs.clone();
        let _sub = obs.subscribe(move |v| {
            if *v < 3 {
                inner.set(v + 1);
            }
        });

        obs.set(1);
        assert_eq!(obs.get(), 3);
    }

    #[test]
    fn clones_share_storage() {
        let a = Observable::new(5);
        let b = a.clone();
        b.set(6);
        assert_eq!(a.get(), 6);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Observable::new(6)));
    }

    #[test]
    fn update_closure_may_read_self() {
        let obs = Observable::new(2);
        let reader = obs.clone();
        obs.update(|v| *v += reader.get());
        assert_eq!(obs.get(), 4);
        assert_eq!(obs.version(), 1);
    }
}
