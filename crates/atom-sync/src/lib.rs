#![forbid(unsafe_code)]

//! Keep two reactive cells of different types consistent through a pair of
//! fallible conversions.
//!
//! ```
//! use atom_sync::{ConversionError, Observable, SyncPair};
//!
//! let celsius = Observable::new(0.0_f64);
//! let input = Observable::new(String::from("32"));
//! let pair = SyncPair::bind(
//!     celsius.clone(),
//!     input.clone(),
//!     |c: &f64| Ok(format!("{}", c * 9.0 / 5.0 + 32.0)),
//!     |s: &String| {
//!         s.trim()
//!             .parse::<f64>()
//!             .map(|f| (f - 32.0) * 5.0 / 9.0)
//!             .map_err(|_| ConversionError::new("not a temperature"))
//!     },
//! );
//!
//! pair.a().set(100.0);
//! assert_eq!(input.get(), "212");
//!
//! pair.b().set("hot".to_string());
//! assert_eq!(celsius.get(), 100.0);
//! assert!(pair.error().has_error());
//! ```
//!
//! See [`sync`] for the propagation rule and [`reactive`] for the cells it
//! runs on.

pub mod reactive;
pub mod sync;

pub use reactive::{Atom, AtomFamily, BatchScope, Observable, Subscription, Update};
pub use sync::{
    ConversionError, ConversionResult, Converter, ErrorChannel, ErrorFamily, ErrorScope,
    FailurePolicy, FamilyOptions, SideFamily, SyncFamily, SyncOptions, SyncPair, SyncedAtom,
    sync_atom_families, sync_atoms,
};
