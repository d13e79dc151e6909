#![forbid(unsafe_code)]

//! Two cells kept consistent through a pair of fallible conversions.
//!
//! [`SyncPair::bind`] wraps two existing cells `A` and `B` and hands back two
//! [`SyncedAtom`]s that read exactly like the originals, plus an
//! [`ErrorChannel`]. Writing through a synced side:
//!
//! 1. resolves the intended value (literal, or a function of the current one),
//! 2. converts it to the other side's type,
//! 3. commits it to its own cell,
//! 4. on success, commits the converted value to the other cell and clears
//!    the error channel,
//! 5. on failure, leaves the other cell alone and records the error.
//!
//! All commits happen inside one [`BatchScope`], so no subscriber can observe
//! step 3 without steps 4/5.
//!
//! ```
//! use atom_sync::reactive::Observable;
//! use atom_sync::sync::{ConversionError, SyncPair};
//!
//! let number = Observable::new(0_i64);
//! let text = Observable::new(String::from("0"));
//! let pair = SyncPair::bind(
//!     number.clone(),
//!     text.clone(),
//!     |n: &i64| Ok(n.to_string()),
//!     |s: &String| s.parse::<i64>().map_err(|_| ConversionError::new("not a number")),
//! );
//!
//! pair.b().set("abc".to_string());
//! assert_eq!(number.get(), 0);
//! assert_eq!(pair.error().get(), Some(ConversionError::new("not a number")));
//!
//! pair.b().set("7".to_string());
//! assert_eq!(number.get(), 7);
//! assert_eq!(pair.error().get(), None);
//! ```
//!
//! # Invariants
//!
//! 1. The written side always holds the written value (under
//!    [`FailurePolicy::CommitOwnSide`]).
//! 2. The other side only ever receives values produced by a successful
//!    conversion.
//! 3. Reads never convert.
//!
//! # Failure Modes
//!
//! - Direct writes to the underlying cells bypass the binding and can leave
//!   the sides inconsistent without touching the error channel. Call
//!   [`SyncPair::resync_from_a`] or [`SyncPair::resync_from_b`] to repair.
//! - A panicking conversion or cell propagates to the writer.

use std::rc::Rc;

use super::conversion::{ConversionError, ConversionResult, Converter};
use super::error::ErrorChannel;
use super::options::{FailurePolicy, SyncOptions};
use crate::reactive::{Atom, BatchScope, Subscription, Update};

struct PairCore<A, B, E> {
    a: Rc<dyn Atom<A>>,
    b: Rc<dyn Atom<B>>,
    converter: Converter<A, B, E>,
    error: ErrorChannel<E>,
    options: SyncOptions,
}

impl<A: 'static, B: 'static, E: Clone + PartialEq + 'static> PairCore<A, B, E> {
    fn write_a(&self, update: Update<A>) {
        let value = update.resolve(|| self.a.get());
        let converted = self.converter.forward(&value);
        commit(
            &*self.a,
            &*self.b,
            &self.error,
            self.options.failure,
            value,
            converted,
            "a",
        );
    }

    fn write_b(&self, update: Update<B>) {
        let value = update.resolve(|| self.b.get());
        let converted = self.converter.backward(&value);
        commit(
            &*self.b,
            &*self.a,
            &self.error,
            self.options.failure,
            value,
            converted,
            "b",
        );
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn commit<S, O, E: Clone + PartialEq + 'static>(
    own: &dyn Atom<S>,
    other: &dyn Atom<O>,
    error: &ErrorChannel<E>,
    failure: FailurePolicy,
    value: S,
    converted: ConversionResult<O, E>,
    side: &'static str,
) {
    let _batch = BatchScope::new();
    match converted {
        Ok(counterpart) => {
            own.set(value);
            other.set(counterpart);
            error.clear();
            #[cfg(feature = "tracing")]
            tracing::trace!(side, "synced write propagated");
        }
        Err(e) => {
            if failure == FailurePolicy::CommitOwnSide {
                own.set(value);
            }
            error.record(e);
            #[cfg(feature = "tracing")]
            tracing::debug!(side, ?failure, "conversion failed; other side held back");
        }
    }
}

/// Read/write access to one side of a pair, erased over the other side's type.
trait SyncSide<T> {
    fn read(&self) -> T;
    fn write(&self, update: Update<T>);
    fn watch(&self, callback: Box<dyn Fn(&T)>) -> Subscription;
}

struct SideA<A, B, E>(Rc<PairCore<A, B, E>>);
struct SideB<A, B, E>(Rc<PairCore<A, B, E>>);

impl<A: 'static, B: 'static, E: Clone + PartialEq + 'static> SyncSide<A> for SideA<A, B, E> {
    fn read(&self) -> A {
        self.0.a.get()
    }

    fn write(&self, update: Update<A>) {
        self.0.write_a(update);
    }

    fn watch(&self, callback: Box<dyn Fn(&A)>) -> Subscription {
        self.0.a.subscribe(callback)
    }
}

impl<A: 'static, B: 'static, E: Clone + PartialEq + 'static> SyncSide<B> for SideB<A, B, E> {
    fn read(&self) -> B {
        self.0.b.get()
    }

    fn write(&self, update: Update<B>) {
        self.0.write_b(update);
    }

    fn watch(&self, callback: Box<dyn Fn(&B)>) -> Subscription {
        self.0.b.subscribe(callback)
    }
}

/// One side of a binding: reads delegate to the underlying cell, writes
/// propagate to the other side.
///
/// Cloning yields another handle to the same side.
pub struct SyncedAtom<T> {
    side: Rc<dyn SyncSide<T>>,
}

impl<T> Clone for SyncedAtom<T> {
    fn clone(&self) -> Self {
        Self {
            side: Rc::clone(&self.side),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SyncedAtom<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncedAtom")
            .field("value", &self.side.read())
            .finish()
    }
}

impl<T> SyncedAtom<T> {
    /// Current value of the underlying cell.
    #[must_use]
    pub fn get(&self) -> T {
        self.side.read()
    }

    /// Write a literal value.
    pub fn set(&self, value: T) {
        self.side.write(Update::Set(value));
    }

    /// Write a value computed from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.side.write(Update::apply(f));
    }

    /// Write either form of update.
    pub fn write(&self, update: impl Into<Update<T>>) {
        self.side.write(update.into());
    }

    /// Watch the underlying cell, including changes made around the binding.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.side.watch(Box::new(callback))
    }

    /// Whether both handles are the same side of the same binding.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.side, &other.side)
    }
}

impl<T> Atom<T> for SyncedAtom<T> {
    fn get(&self) -> T {
        self.side.read()
    }

    fn set(&self, value: T) {
        self.side.write(Update::Set(value));
    }

    fn subscribe(&self, callback: Box<dyn Fn(&T)>) -> Subscription {
        self.side.watch(callback)
    }
}

/// A live binding between two cells.
///
/// Cloning yields another handle to the same binding.
pub struct SyncPair<A, B, E = ConversionError> {
    core: Rc<PairCore<A, B, E>>,
    a: SyncedAtom<A>,
    b: SyncedAtom<B>,
}

impl<A, B, E> Clone for SyncPair<A, B, E> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            a: self.a.clone(),
            b: self.b.clone(),
        }
    }
}

impl<A, B, E> std::fmt::Debug for SyncPair<A, B, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncPair")
            .field("options", &self.core.options)
            .finish_non_exhaustive()
    }
}

impl<A, B, E> SyncPair<A, B, E>
where
    A: 'static,
    B: 'static,
    E: Clone + PartialEq + 'static,
{
    /// Bind `a` and `b` with default options.
    pub fn bind(
        a: impl Atom<A> + 'static,
        b: impl Atom<B> + 'static,
        a2b: impl Fn(&A) -> ConversionResult<B, E> + 'static,
        b2a: impl Fn(&B) -> ConversionResult<A, E> + 'static,
    ) -> Self {
        Self::bind_with(a, b, Converter::new(a2b, b2a), SyncOptions::default())
    }

    /// Bind `a` and `b` with an existing converter and explicit options.
    pub fn bind_with(
        a: impl Atom<A> + 'static,
        b: impl Atom<B> + 'static,
        converter: Converter<A, B, E>,
        options: SyncOptions,
    ) -> Self {
        Self::assemble(Rc::new(a), Rc::new(b), converter, options, ErrorChannel::new())
    }

    /// Bind onto an error channel that may be shared with other bindings.
    pub(crate) fn assemble(
        a: Rc<dyn Atom<A>>,
        b: Rc<dyn Atom<B>>,
        converter: Converter<A, B, E>,
        options: SyncOptions,
        error: ErrorChannel<E>,
    ) -> Self {
        let core = Rc::new(PairCore {
            a,
            b,
            converter,
            error,
            options,
        });
        let a = SyncedAtom {
            side: Rc::new(SideA(Rc::clone(&core))),
        };
        let b = SyncedAtom {
            side: Rc::new(SideB(Rc::clone(&core))),
        };
        Self { core, a, b }
    }

    /// The synced A side.
    #[must_use]
    pub fn a(&self) -> &SyncedAtom<A> {
        &self.a
    }

    /// The synced B side.
    #[must_use]
    pub fn b(&self) -> &SyncedAtom<B> {
        &self.b
    }

    /// The binding's error channel.
    #[must_use]
    pub fn error(&self) -> &ErrorChannel<E> {
        &self.core.error
    }

    #[must_use]
    pub fn options(&self) -> SyncOptions {
        self.core.options
    }

    /// Split into the synced sides and the error channel.
    #[must_use]
    pub fn into_parts(self) -> (SyncedAtom<A>, SyncedAtom<B>, ErrorChannel<E>) {
        let error = self.core.error.clone();
        (self.a, self.b, error)
    }

    /// Re-propagate the A cell's current value to B.
    ///
    /// Use after the underlying A cell was written directly.
    pub fn resync_from_a(&self) {
        self.core.write_a(Update::Set(self.core.a.get()));
    }

    /// Re-propagate the B cell's current value to A.
    pub fn resync_from_b(&self) {
        self.core.write_b(Update::Set(self.core.b.get()));
    }
}

/// Bind two cells and return `(synced_a, synced_b, error)` directly.
pub fn sync_atoms<A, B, E>(
    a: impl Atom<A> + 'static,
    b: impl Atom<B> + 'static,
    a2b: impl Fn(&A) -> ConversionResult<B, E> + 'static,
    b2a: impl Fn(&B) -> ConversionResult<A, E> + 'static,
) -> (SyncedAtom<A>, SyncedAtom<B>, ErrorChannel<E>)
where
    A: 'static,
    B: 'static,
    E: Clone + PartialEq + 'static,
{
    SyncPair::bind(a, b, a2b, b2a).into_parts()
}
