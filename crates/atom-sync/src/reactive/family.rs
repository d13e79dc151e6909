#![forbid(unsafe_code)]

//! Lazily populated, keyed caches of cells.
//!
//! An [`AtomFamily`] maps a parameter to a value built on first access by a
//! factory. The cached value is handed out by clone, so for `Rc`-backed
//! values every access for the same live key yields the same shared cell.
//!
//! # Eviction
//!
//! Entries leave the cache through [`AtomFamily::remove`] or through the
//! `should_remove` predicate, which sees each entry's creation instant and
//! parameter. The family never schedules sweeps on its own; the predicate is
//! evaluated:
//!
//! - over every entry when it is installed,
//! - for the requested entry on every [`AtomFamily::get`],
//! - over every entry whenever the host calls [`AtomFamily::sweep`].
//!
//! The predicate is called with the cache unborrowed, so it may read or
//! remove members of the family it guards.
//!
//! A key that was evicted is rebuilt from scratch on its next access, with a
//! fresh creation instant.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use web_time::Instant;

/// Eviction policy: `(created_at, param) -> should evict`.
pub type ShouldRemove<P> = Rc<dyn Fn(Instant, &P) -> bool>;

struct Entry<V> {
    value: V,
    created_at: Instant,
}

struct FamilyInner<P, V> {
    entries: HashMap<P, Entry<V>>,
    should_remove: Option<ShouldRemove<P>>,
}

/// A keyed, lazily populated cache with an optional eviction predicate.
///
/// Cloning an `AtomFamily` yields another handle to the same cache.
pub struct AtomFamily<P, V> {
    inner: Rc<RefCell<FamilyInner<P, V>>>,
    factory: Rc<dyn Fn(&P) -> V>,
}

impl<P, V> Clone for AtomFamily<P, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            factory: Rc::clone(&self.factory),
        }
    }
}

impl<P, V> std::fmt::Debug for AtomFamily<P, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AtomFamily")
            .field("len", &inner.entries.len())
            .field("has_should_remove", &inner.should_remove.is_some())
            .finish()
    }
}

impl<P, V> AtomFamily<P, V>
where
    P: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    /// Create an empty family whose members are built by `factory`.
    pub fn new(factory: impl Fn(&P) -> V + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FamilyInner {
                entries: HashMap::new(),
                should_remove: None,
            })),
            factory: Rc::new(factory),
        }
    }

    /// The member for `param`, building and caching it if needed.
    ///
    /// If the eviction predicate matches the cached entry, the entry is
    /// dropped and a fresh one is built in its place.
    pub fn get(&self, param: &P) -> V {
        let cached = {
            let inner = self.inner.borrow();
            inner.entries.get(param).map(|entry| {
                (
                    entry.value.clone(),
                    entry.created_at,
                    inner.should_remove.clone(),
                )
            })
        };
        if let Some((value, created_at, should_remove)) = cached {
            // The predicate runs unborrowed so it may inspect this family.
            match should_remove {
                Some(pred) if pred(created_at, param) => {
                    self.evict_if_unchanged(param, created_at);
                    #[cfg(feature = "tracing")]
                    tracing::debug!("atom family entry expired on access");
                }
                _ => return value,
            }
        }

        // Build without holding the borrow so the factory may use other
        // families, or this one for a different key.
        let built = (self.factory)(param);
        let mut inner = self.inner.borrow_mut();
        let value = inner
            .entries
            .entry(param.clone())
            .or_insert(Entry {
                value: built,
                created_at: Instant::now(),
            })
            .value
            .clone();
        #[cfg(feature = "tracing")]
        tracing::trace!(len = inner.entries.len(), "atom family entry created");
        value
    }

    /// Evict the member for `param`. Returns whether it was cached.
    pub fn remove(&self, param: &P) -> bool {
        let removed = self.inner.borrow_mut().entries.remove(param);
        #[cfg(feature = "tracing")]
        if removed.is_some() {
            tracing::debug!("atom family entry removed");
        }
        removed.is_some()
    }

    /// Install or clear the eviction predicate.
    ///
    /// Installing a predicate immediately sweeps all current entries.
    /// Passing `None` disables eviction.
    pub fn set_should_remove(&self, should_remove: Option<ShouldRemove<P>>) {
        let sweep = should_remove.is_some();
        self.inner.borrow_mut().should_remove = should_remove;
        if sweep {
            self.sweep();
        }
    }

    /// Evaluate the predicate over every entry, evicting matches.
    ///
    /// Returns the number of entries evicted; zero when no predicate is set.
    pub fn sweep(&self) -> usize {
        let (pred, stamps) = {
            let inner = self.inner.borrow();
            let Some(pred) = inner.should_remove.clone() else {
                return 0;
            };
            let stamps: Vec<(P, Instant)> = inner
                .entries
                .iter()
                .map(|(param, entry)| (param.clone(), entry.created_at))
                .collect();
            (pred, stamps)
        };
        let evicted: Vec<V> = stamps
            .into_iter()
            .filter(|(param, created_at)| pred(*created_at, param))
            .filter_map(|(param, created_at)| self.evict_if_unchanged(&param, created_at))
            .collect();
        #[cfg(feature = "tracing")]
        if !evicted.is_empty() {
            tracing::debug!(evicted = evicted.len(), "atom family sweep");
        }
        // Evicted values drop here, after the borrow is released.
        evicted.len()
    }

    /// Remove `param` only if its entry is still the one stamped `created_at`.
    ///
    /// A predicate may have rebuilt the entry while the family was unborrowed.
    fn evict_if_unchanged(&self, param: &P, created_at: Instant) -> Option<V> {
        let mut inner = self.inner.borrow_mut();
        if inner
            .entries
            .get(param)
            .is_some_and(|entry| entry.created_at == created_at)
        {
            inner.entries.remove(param).map(|entry| entry.value)
        } else {
            None
        }
    }

    /// Whether `param` currently has a cached member.
    #[must_use]
    pub fn contains(&self, param: &P) -> bool {
        self.inner.borrow().entries.contains_key(param)
    }

    /// Creation instant of the cached member for `param`.
    #[must_use]
    pub fn created_at(&self, param: &P) -> Option<Instant> {
        self.inner
            .borrow()
            .entries
            .get(param)
            .map(|entry| entry.created_at)
    }

    /// Number of cached members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Whether no member is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Parameters of all cached members, in no particular order.
    #[must_use]
    pub fn params(&self) -> Vec<P> {
        self.inner.borrow().entries.keys().cloned().collect()
    }

    /// Evict every member. The predicate stays installed.
    pub fn clear(&self) {
        let drained = std::mem::take(&mut self.inner.borrow_mut().entries);
        drop(drained);
    }
}
