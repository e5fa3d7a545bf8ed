//! Roundsale pricing
//!
//! Deterministic round-based contribution pricing: an immutable schedule of
//! cumulative raised-value goals with per-round rates, and a pure fold that
//! splits a contribution into per-rate segments, clamped at the hard cap.
//!
//! Monetary unit: atto-VAL (aVAL). 1 VAL = 1_000_000_000_000_000_000 aVAL.

pub mod errors;
pub mod schedule;

pub use errors::*;
pub use schedule::*;
