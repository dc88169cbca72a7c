//! Request validation
//!
//! Payloads go through three steps before reaching a handler:
//!
//! 1. the body is parsed as JSON (malformed JSON is a 400, not axum's default 422)
//! 2. [`filters`] normalise the raw value (string fields are trimmed)
//! 3. the value is deserialized into a typed payload and checked with `validator`
//!
//! Field-level helpers for amounts and timestamps live in [`de`] and [`validators`].

pub mod de;
pub mod extractor;
pub mod filters;
pub mod validators;

pub use extractor::Validated;
