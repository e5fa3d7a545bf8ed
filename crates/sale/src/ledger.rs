//! Per-contributor accounting records.
//!
//! Settlement is an explicit tagged state rather than a boolean inferred
//! from field combinations: escrowed value carries the credit it was priced
//! at when contributed, and that pricing is never redone later.

use roundsale_types::{Address, AttoVal, CreditUnits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settlement state of a contributor's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    /// Value held by the engine, credit priced but unminted, pending approval.
    Escrowed { value: AttoVal, units: CreditUnits },
    /// Contributor approved; contributions settle immediately.
    Settled,
}

impl Default for Settlement {
    fn default() -> Self {
        Settlement::Escrowed { value: 0, units: 0 }
    }
}

/// Lifetime record for a single contributor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRecord {
    /// Total value recorded for this contributor; reset only by refund.
    pub total_contributed: AttoVal,
    pub settlement: Settlement,
}

impl ContributorRecord {
    pub fn approved(&self) -> bool {
        matches!(self.settlement, Settlement::Settled)
    }

    /// Escrowed value and units; zero for settled records.
    pub fn escrow(&self) -> (AttoVal, CreditUnits) {
        match self.settlement {
            Settlement::Escrowed { value, units } => (value, units),
            Settlement::Settled => (0, 0),
        }
    }
}

/// Address-keyed contributor records.
///
/// Records are created lazily on first use and zeroed, never removed, on
/// refund — a refunded contributor may contribute again from a zero base.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContributorLedger {
    records: HashMap<Address, ContributorRecord>,
}

impl ContributorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a contributor's record; unknown addresses read as zero.
    pub fn get(&self, address: &Address) -> ContributorRecord {
        self.records.get(address).copied().unwrap_or_default()
    }

    /// Record a priced contribution.
    ///
    /// Escrowed contributors accumulate both value and units; settled
    /// contributors only grow their lifetime total (their credit was minted
    /// by the caller at purchase time).
    pub fn record(&mut self, address: &Address, value: AttoVal, units: CreditUnits) {
        let record = self.records.entry(*address).or_default();
        record.total_contributed = record.total_contributed.saturating_add(value);
        if let Settlement::Escrowed {
            value: escrowed,
            units: accrued,
        } = &mut record.settlement
        {
            *escrowed = escrowed.saturating_add(value);
            *accrued = accrued.saturating_add(units);
        }
    }

    /// Flip a contributor to settled and return the escrow eligible for
    /// retroactive settlement. Returns `None` when already settled.
    ///
    /// Approving an unknown address creates a settled zero record, so a
    /// contributor can be whitelisted before their first purchase.
    pub fn approve(&mut self, address: &Address) -> Option<(AttoVal, CreditUnits)> {
        let record = self.records.entry(*address).or_default();
        match record.settlement {
            Settlement::Settled => None,
            Settlement::Escrowed { value, units } => {
                record.settlement = Settlement::Settled;
                Some((value, units))
            }
        }
    }

    /// Zero an escrowed record and return the pre-clear escrow.
    ///
    /// Returns `None` for settled or unknown records; forwarded value cannot
    /// be clawed back through this path.
    pub fn clear(&mut self, address: &Address) -> Option<(AttoVal, CreditUnits)> {
        let record = self.records.get_mut(address)?;
        match record.settlement {
            Settlement::Settled => None,
            Settlement::Escrowed { value, units } => {
                *record = ContributorRecord::default();
                Some((value, units))
            }
        }
    }

    /// Sum of recorded contributions over non-refunded contributors.
    pub fn total_contributed(&self) -> AttoVal {
        self.records
            .values()
            .map(|record| record.total_contributed)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
