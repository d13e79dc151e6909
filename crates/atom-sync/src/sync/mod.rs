#![forbid(unsafe_code)]

//! Bidirectional synchronization of reactive cells.
//!
//! - [`Converter`]: the `a2b` / `b2a` pair of pure, fallible conversions.
//! - [`SyncPair`]: binds two cells, producing two [`SyncedAtom`]s and an
//!   [`ErrorChannel`].
//! - [`SyncFamily`]: the keyed form, one lazily built pair per parameter,
//!   with removal and an eviction predicate.
//!
//! # Propagation rule
//!
//! A write through a synced side always commits that side. The other side is
//! written only with the result of a successful conversion; on failure it
//! keeps its previous value and the error channel records why. Any later
//! successful write, on either side, clears the channel.
//!
//! # Invariants
//!
//! 1. Writes are synchronous and complete before returning.
//! 2. Subscribers never observe a partially applied write.
//! 3. Reads never convert.
//! 4. Within a family, writes through one key never touch another key's
//!    cells, nor its error channel unless the scope is shared.

pub mod binding;
pub mod conversion;
pub mod error;
pub mod family;
pub mod options;

pub use binding::{SyncPair, SyncedAtom, sync_atoms};
pub use conversion::{ConversionError, ConversionResult, Converter};
pub use error::ErrorChannel;
pub use family::{ErrorFamily, SideFamily, SyncFamily, sync_atom_families};
pub use options::{ErrorScope, FailurePolicy, FamilyOptions, SyncOptions};
