#![forbid(unsafe_code)]

//! Keyed families of sync pairs.
//!
//! A [`SyncFamily`] is the parameterized form of [`SyncPair`]: given a way to
//! look up an A cell and a B cell for each parameter, it lazily builds one
//! binding per parameter and caches it, so repeated lookups for the same live
//! key hand back the same synced cells.
//!
//! # Lifecycle
//!
//! Each key's binding is created on first access and lives until it is
//! removed explicitly or matched by the eviction predicate (see
//! [`AtomFamily`]). A removed key is rebuilt from scratch on its next access;
//! with [`ErrorScope::PerKey`] that includes a clear error channel.
//!
//! # Error scope
//!
//! | Scope | Channel | Eviction resets it |
//! |-------|---------|--------------------|
//! | [`ErrorScope::PerKey`] (default) | one per key | yes |
//! | [`ErrorScope::Shared`] | one per family | no |
//!
//! With a shared channel, the last write on any key decides what it shows.

use std::hash::Hash;
use std::rc::Rc;

use super::binding::{SyncPair, SyncedAtom};
use super::conversion::{ConversionError, ConversionResult, Converter};
use super::error::ErrorChannel;
use super::options::{ErrorScope, FamilyOptions};
use crate::reactive::family::{AtomFamily, ShouldRemove};
use crate::reactive::Atom;

/// A lazily populated family of sync pairs keyed by `P`.
pub struct SyncFamily<P, A, B, E = ConversionError> {
    pairs: AtomFamily<P, SyncPair<A, B, E>>,
    shared_error: Option<ErrorChannel<E>>,
    options: FamilyOptions,
}

impl<P, A, B, E> Clone for SyncFamily<P, A, B, E> {
    fn clone(&self) -> Self {
        Self {
            pairs: self.pairs.clone(),
            shared_error: self.shared_error.clone(),
            options: self.options,
        }
    }
}

impl<P, A, B, E> std::fmt::Debug for SyncFamily<P, A, B, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncFamily")
            .field("pairs", &self.pairs)
            .field("options", &self.options)
            .finish()
    }
}

impl<P, A, B, E> SyncFamily<P, A, B, E>
where
    P: Eq + Hash + Clone + 'static,
    A: 'static,
    B: 'static,
    E: Clone + PartialEq + 'static,
{
    /// Bind the cells returned by `a_atom_of` / `b_atom_of` for each key,
    /// with default options.
    pub fn bind<CA, CB>(
        a_atom_of: impl Fn(&P) -> CA + 'static,
        b_atom_of: impl Fn(&P) -> CB + 'static,
        a2b: impl Fn(&A) -> ConversionResult<B, E> + 'static,
        b2a: impl Fn(&B) -> ConversionResult<A, E> + 'static,
    ) -> Self
    where
        CA: Atom<A> + 'static,
        CB: Atom<B> + 'static,
    {
        Self::bind_with(
            a_atom_of,
            b_atom_of,
            Converter::new(a2b, b2a),
            FamilyOptions::default(),
        )
    }

    /// Bind with an existing converter and explicit options.
    pub fn bind_with<CA, CB>(
        a_atom_of: impl Fn(&P) -> CA + 'static,
        b_atom_of: impl Fn(&P) -> CB + 'static,
        converter: Converter<A, B, E>,
        options: FamilyOptions,
    ) -> Self
    where
        CA: Atom<A> + 'static,
        CB: Atom<B> + 'static,
    {
        let shared_error = match options.error_scope {
            ErrorScope::PerKey => None,
            ErrorScope::Shared => Some(ErrorChannel::new()),
        };
        let channel_for_key = shared_error.clone();
        let pairs = AtomFamily::new(move |param: &P| {
            #[cfg(feature = "tracing")]
            tracing::debug!(scope = ?options.error_scope, "sync family binding created");
            SyncPair::assemble(
                Rc::new(a_atom_of(param)),
                Rc::new(b_atom_of(param)),
                converter.clone(),
                options.sync,
                channel_for_key.clone().unwrap_or_default(),
            )
        });
        Self {
            pairs,
            shared_error,
            options,
        }
    }

    /// The binding for `param`, created on first access.
    pub fn pair(&self, param: &P) -> SyncPair<A, B, E> {
        self.pairs.get(param)
    }

    /// The synced A side for `param`.
    pub fn a(&self, param: &P) -> SyncedAtom<A> {
        self.pair(param).a().clone()
    }

    /// The synced B side for `param`.
    pub fn b(&self, param: &P) -> SyncedAtom<B> {
        self.pair(param).b().clone()
    }

    /// The error channel that `param`'s writes report to.
    ///
    /// With a shared scope this is the family-wide channel.
    pub fn error(&self, param: &P) -> ErrorChannel<E> {
        self.pair(param).error().clone()
    }

    /// The family-wide channel, when the error scope is shared.
    #[must_use]
    pub fn shared_error(&self) -> Option<&ErrorChannel<E>> {
        self.shared_error.as_ref()
    }

    /// Evict `param`'s binding. Returns whether one was cached.
    pub fn remove(&self, param: &P) -> bool {
        self.pairs.remove(param)
    }

    /// Install or clear the eviction predicate over `(created_at, param)`.
    pub fn set_should_remove(&self, should_remove: Option<ShouldRemove<P>>) {
        self.pairs.set_should_remove(should_remove);
    }

    /// Run the eviction predicate over every cached binding.
    pub fn sweep(&self) -> usize {
        self.pairs.sweep()
    }

    #[must_use]
    pub fn contains(&self, param: &P) -> bool {
        self.pairs.contains(param)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Keys with a live binding, in no particular order.
    #[must_use]
    pub fn params(&self) -> Vec<P> {
        self.pairs.params()
    }

    #[must_use]
    pub fn options(&self) -> FamilyOptions {
        self.options
    }

    /// Split into per-side views that share this family's binding cache.
    ///
    /// Removing a key through any view evicts that key's whole binding.
    #[must_use]
    pub fn into_parts(self) -> (SideFamily<P, A>, SideFamily<P, B>, ErrorFamily<P, E>) {
        let control: Rc<dyn FamilyControl<P>> = Rc::new(self.pairs.clone());
        let (a, b, e) = (self.clone(), self.clone(), self);
        (
            SideFamily {
                lookup: Rc::new(move |p: &P| a.a(p)),
                control: Rc::clone(&control),
            },
            SideFamily {
                lookup: Rc::new(move |p: &P| b.b(p)),
                control: Rc::clone(&control),
            },
            ErrorFamily {
                lookup: Rc::new(move |p: &P| e.error(p)),
                control,
            },
        )
    }
}

/// Cache controls shared by the per-side views.
trait FamilyControl<P> {
    fn remove(&self, param: &P) -> bool;
    fn set_should_remove(&self, should_remove: Option<ShouldRemove<P>>);
    fn sweep(&self) -> usize;
    fn contains(&self, param: &P) -> bool;
}

impl<P, V> FamilyControl<P> for AtomFamily<P, V>
where
    P: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    fn remove(&self, param: &P) -> bool {
        AtomFamily::remove(self, param)
    }

    fn set_should_remove(&self, should_remove: Option<ShouldRemove<P>>) {
        AtomFamily::set_should_remove(self, should_remove);
    }

    fn sweep(&self) -> usize {
        AtomFamily::sweep(self)
    }

    fn contains(&self, param: &P) -> bool {
        AtomFamily::contains(self, param)
    }
}

/// One side of a [`SyncFamily`], callable per key.
pub struct SideFamily<P, T> {
    lookup: Rc<dyn Fn(&P) -> SyncedAtom<T>>,
    control: Rc<dyn FamilyControl<P>>,
}

/// The error channels of a [`SyncFamily`], callable per key.
pub struct ErrorFamily<P, E> {
    lookup: Rc<dyn Fn(&P) -> ErrorChannel<E>>,
    control: Rc<dyn FamilyControl<P>>,
}

macro_rules! family_view {
    ($view:ident, $out:ty, $what:literal) => {
        impl<P, T> Clone for $view<P, T> {
            fn clone(&self) -> Self {
                Self {
                    lookup: Rc::clone(&self.lookup),
                    control: Rc::clone(&self.control),
                }
            }
        }

        impl<P, T> std::fmt::Debug for $view<P, T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($view)).finish_non_exhaustive()
            }
        }

        impl<P, T> $view<P, T> {
            #[doc = concat!("The ", $what, " for `param`, created on first access.")]
            pub fn get(&self, param: &P) -> $out {
                (self.lookup)(param)
            }

            /// Evict `param`'s whole binding. Returns whether one was cached.
            pub fn remove(&self, param: &P) -> bool {
                self.control.remove(param)
            }

            /// Install or clear the family's eviction predicate.
            pub fn set_should_remove(&self, should_remove: Option<ShouldRemove<P>>) {
                self.control.set_should_remove(should_remove);
            }

            /// Run the eviction predicate over every cached binding.
            pub fn sweep(&self) -> usize {
                self.control.sweep()
            }

            #[must_use]
            pub fn contains(&self, param: &P) -> bool {
                self.control.contains(param)
            }
        }
    };
}

family_view!(SideFamily, SyncedAtom<T>, "synced cell");
family_view!(ErrorFamily, ErrorChannel<T>, "error channel");

/// Bind two cell families and return the three per-key views directly.
pub fn sync_atom_families<P, A, B, E, CA, CB>(
    a_atom_of: impl Fn(&P) -> CA + 'static,
    b_atom_of: impl Fn(&P) -> CB + 'static,
    a2b: impl Fn(&A) -> ConversionResult<B, E> + 'static,
    b2a: impl Fn(&B) -> ConversionResult<A, E> + 'static,
) -> (SideFamily<P, A>, SideFamily<P, B>, ErrorFamily<P, E>)
where
    P: Eq + Hash + Clone + 'static,
    A: 'static,
    B: 'static,
    E: Clone + PartialEq + 'static,
    CA: Atom<A> + 'static,
    CB: Atom<B> + 'static,
{
    SyncFamily::bind(a_atom_of, b_atom_of, a2b, b2a).into_parts()
}
