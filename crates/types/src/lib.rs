//! Roundsale core types
//!
//! Monetary scalars and account addresses shared by the pricing and sale
//! engine crates. All money is integer fixed-point; no floats anywhere.

pub mod address;
pub mod amount;

pub use address::*;
pub use amount::*;
