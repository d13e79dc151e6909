#![forbid(unsafe_code)]

//! Reactive cells that synced bindings are built on.
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`BatchScope`]: RAII guard that defers notifications until the
//!   outermost scope exits.
//! - [`Atom`]: the read/write/subscribe contract bindings are written
//!   against, with [`Update`] for literal or functional writes.
//! - [`AtomFamily`]: a keyed, lazily populated cache with an eviction
//!   predicate.
//!
//! # Architecture
//!
//! Everything here is single-threaded: `Observable<T>` uses
//! `Rc<RefCell<..>>` for shared ownership and `BatchScope` keeps its state in
//! a thread-local. Subscribers are held as `Weak` callbacks and pruned lazily
//! during notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. Within a `BatchScope`, values update immediately but notifications are
//!    deferred until the outermost scope exits.

pub mod atom;
pub mod batch;
pub mod family;
pub mod observable;

pub use atom::{Atom, Update};
pub use batch::BatchScope;
pub use family::{AtomFamily, ShouldRemove};
pub use observable::{Observable, Subscription};
