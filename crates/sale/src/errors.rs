//! Sale engine error types

use roundsale_pricing::ScheduleError;
use roundsale_types::AttoVal;
use thiserror::Error;

/// Errors surfaced by the sale engine's public operations.
///
/// A failed operation leaves all ledger state exactly as it was before the
/// call; nothing is retried automatically.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error("contribution of {value} aVAL is below the minimum of {minimum} aVAL")]
    BelowMinimum { value: AttoVal, minimum: AttoVal },

    #[error("sale closed: cap of {cap} aVAL reached or request would exceed it")]
    SaleClosed { cap: AttoVal },

    #[error("caller is not the sale administrator")]
    Unauthorized,

    #[error("nothing to refund: contributor has no escrowed value")]
    NothingToRefund,

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

pub type Result<T> = std::result::Result<T, SaleError>;
