#![forbid(unsafe_code)]

//! Deferred notification scopes.
//!
//! While a [`BatchScope`] is alive on the current thread, [`Observable`]
//! writes take effect immediately but their subscriber notifications are
//! queued. When the outermost scope drops, the queue is flushed in the order
//! the observables were first written.
//!
//! A synced write commits up to three cells (own side, other side, error
//! channel). Running it inside one scope means no subscriber ever sees the
//! own-side value without the matching other-side and error state.
//!
//! [`Observable`]: super::Observable

use std::cell::RefCell;

type Deferred = Box<dyn FnOnce()>;

#[derive(Default)]
struct BatchState {
    depth: usize,
    pending: Vec<Deferred>,
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

pub(crate) fn is_batching() -> bool {
    BATCH.with(|b| b.borrow().depth > 0)
}

pub(crate) fn defer(job: Deferred) {
    BATCH.with(|b| b.borrow_mut().pending.push(job));
}

/// RAII guard that defers observable notifications until it drops.
///
/// Scopes nest; only the outermost one flushes.
#[must_use = "notifications flush when the scope is dropped"]
pub struct BatchScope {
    _private: (),
}

impl BatchScope {
    /// Open a batch scope on the current thread.
    pub fn new() -> Self {
        BATCH.with(|b| b.borrow_mut().depth += 1);
        Self { _private: () }
    }

    /// Whether any batch scope is open on the current thread.
    #[must_use]
    pub fn is_active() -> bool {
        is_batching()
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let jobs = BATCH.with(|b| {
            let mut state = b.borrow_mut();
            state.depth -= 1;
            if state.depth == 0 {
                std::mem::take(&mut state.pending)
            } else {
                Vec::new()
            }
        });
        if std::thread::panicking() {
            // Discarded jobs reset their observables' queued flags on drop.
            drop(jobs);
            return;
        }
        // Depth is already zero here, so writes made by subscribers notify
        // directly instead of re-queueing. If a job panics, the rest are
        // dropped unrun and their observables stay notifiable.
        for job in jobs {
            job();
        }
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("active", &is_batching())
            .finish()
    }
}
