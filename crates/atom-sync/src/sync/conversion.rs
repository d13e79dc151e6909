#![forbid(unsafe_code)]

//! Fallible conversions between the two sides of a binding.
//!
//! A conversion is a pure function returning a [`ConversionResult`]. It must
//! not have side effects: a binding may call it speculatively, and a failed
//! call is always safe to retry with new input. Partiality is expressed only
//! through `Err`, never by panicking.

use std::rc::Rc;

/// Outcome of converting one side's value into the other side's type.
pub type ConversionResult<T, E = ConversionError> = Result<T, E>;

/// The default error value: an opaque, human-readable description.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ConversionError {
    message: String,
}

impl ConversionError {
    /// Create an error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConversionError {}

impl From<&str> for ConversionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ConversionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

type ConvertFn<S, T, E> = Rc<dyn Fn(&S) -> ConversionResult<T, E>>;

/// The `a2b` / `b2a` pair, shared by every binding built from it.
pub struct Converter<A, B, E = ConversionError> {
    a2b: ConvertFn<A, B, E>,
    b2a: ConvertFn<B, A, E>,
}

impl<A, B, E> Clone for Converter<A, B, E> {
    fn clone(&self) -> Self {
        Self {
            a2b: Rc::clone(&self.a2b),
            b2a: Rc::clone(&self.b2a),
        }
    }
}

impl<A, B, E> std::fmt::Debug for Converter<A, B, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter").finish_non_exhaustive()
    }
}

impl<A, B, E> Converter<A, B, E> {
    /// Pair up the two directions.
    pub fn new(
        a2b: impl Fn(&A) -> ConversionResult<B, E> + 'static,
        b2a: impl Fn(&B) -> ConversionResult<A, E> + 'static,
    ) -> Self {
        Self {
            a2b: Rc::new(a2b),
            b2a: Rc::new(b2a),
        }
    }

    /// Convert an A-side value to the B side.
    pub fn forward(&self, a: &A) -> ConversionResult<B, E> {
        (self.a2b)(a)
    }

    /// Convert a B-side value to the A side.
    pub fn backward(&self, b: &B) -> ConversionResult<A, E> {
        (self.b2a)(b)
    }
}
