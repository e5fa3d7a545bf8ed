//! The sale engine: purchase, approval, refund, and cap enforcement.
//!
//! State mutates only after every collaborator call for an operation has
//! succeeded, so a failed operation leaves the ledger and the running total
//! exactly as they were.

use roundsale_pricing::RoundSchedule;
use roundsale_types::{format_val, Address, AttoVal, CreditUnits};
use tracing::{debug, info, warn};

use crate::collaborators::{CreditIssuer, ValueChannel};
use crate::config::SaleConfig;
use crate::errors::{Result, SaleError};
use crate::ledger::{ContributorLedger, ContributorRecord, Settlement};

/// Outcome of a successful purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseOutcome {
    /// Value accepted, in aVAL.
    pub value: AttoVal,
    /// Credit earned at the rates in effect during this purchase.
    pub units: CreditUnits,
    /// True when the credit was minted and the value forwarded immediately;
    /// false when both went to escrow.
    pub settled: bool,
}

/// Round-based capped sale over an external credit issuer and value channel.
pub struct SaleEngine {
    schedule: RoundSchedule,
    ledger: ContributorLedger,
    total_raised: AttoVal,
    min_contribution: AttoVal,
    beneficiary: Address,
    administrator: Address,
    issuer: Box<dyn CreditIssuer>,
    channel: Box<dyn ValueChannel>,
}

impl std::fmt::Debug for SaleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleEngine")
            .field("schedule", &self.schedule)
            .field("ledger", &self.ledger)
            .field("total_raised", &self.total_raised)
            .field("min_contribution", &self.min_contribution)
            .field("beneficiary", &self.beneficiary)
            .field("administrator", &self.administrator)
            .field("issuer", &"<dyn CreditIssuer>")
            .field("channel", &"<dyn ValueChannel>")
            .finish()
    }
}

impl SaleEngine {
    /// Build an engine from a validated configuration and collaborators.
    pub fn new(
        config: SaleConfig,
        issuer: Box<dyn CreditIssuer>,
        channel: Box<dyn ValueChannel>,
    ) -> Result<Self> {
        let schedule = config.build_schedule()?;

        info!(
            target: "sale",
            "Sale opened: {} rounds, cap {}, minimum {}",
            schedule.len(),
            format_val(schedule.cap()),
            format_val(config.min_contribution)
        );

        Ok(Self {
            schedule,
            ledger: ContributorLedger::new(),
            total_raised: 0,
            min_contribution: config.min_contribution,
            beneficiary: config.beneficiary,
            administrator: config.administrator,
            issuer,
            channel,
        })
    }

    /// Accept a contribution of `value` aVAL from (or on behalf of)
    /// `contributor`.
    ///
    /// Approved contributors settle immediately: credit is minted and the
    /// value forwarded to the beneficiary. Unapproved contributors escrow
    /// both, priced at today's rates, until approval.
    ///
    /// A contribution that would push the total past the cap is rejected in
    /// full; nothing is truncated.
    pub fn purchase(&mut self, contributor: &Address, value: AttoVal) -> Result<PurchaseOutcome> {
        if value < self.min_contribution {
            return Err(SaleError::BelowMinimum {
                value,
                minimum: self.min_contribution,
            });
        }

        let cap = self.schedule.cap();
        if self.total_raised >= cap {
            return Err(SaleError::SaleClosed { cap });
        }

        let quote = self.schedule.price_contribution(self.total_raised, value)?;
        if quote.is_empty() || quote.consumed < value {
            return Err(SaleError::SaleClosed { cap });
        }

        let settled = self.ledger.get(contributor).approved();
        if settled {
            self.settle(contributor, value, quote.units)?;
        }

        self.total_raised += value;
        self.ledger.record(contributor, value, quote.units);

        info!(
            target: "sale",
            "Purchase: {} from {} ({} units, {}), raised {} of {}",
            format_val(value),
            contributor,
            quote.units,
            if settled { "settled" } else { "escrowed" },
            format_val(self.total_raised),
            format_val(cap)
        );

        Ok(PurchaseOutcome {
            value,
            units: quote.units,
            settled,
        })
    }

    /// Approve a contributor, settling any escrowed value retroactively.
    ///
    /// Administrator-only. Idempotent: repeated calls are no-ops and never
    /// double-mint. Approving an address with no escrow simply marks it for
    /// immediate settlement of future purchases.
    pub fn approve(&mut self, caller: &Address, contributor: &Address) -> Result<()> {
        if caller != &self.administrator {
            return Err(SaleError::Unauthorized);
        }

        let record = self.ledger.get(contributor);
        let (value, units) = match record.settlement {
            Settlement::Settled => {
                debug!(target: "sale", "Approve: {} already settled", contributor);
                return Ok(());
            }
            Settlement::Escrowed { value, units } => (value, units),
        };

        if value > 0 || units > 0 {
            self.settle(contributor, value, units)?;
        }
        self.ledger.approve(contributor);

        info!(
            target: "sale",
            "Approved {}: settled {} and {} escrowed units",
            contributor,
            format_val(value),
            units
        );

        Ok(())
    }

    /// Refund a contributor's own escrowed value.
    pub fn refund_self(&mut self, contributor: &Address) -> Result<AttoVal> {
        self.refund(contributor)
    }

    /// Refund a contributor's escrowed value on their behalf.
    /// Administrator-only.
    pub fn refund_for(&mut self, caller: &Address, contributor: &Address) -> Result<AttoVal> {
        if caller != &self.administrator {
            return Err(SaleError::Unauthorized);
        }
        self.refund(contributor)
    }

    /// Delegate minting authority over the credit issuer. Administrator-only;
    /// no credit balances move.
    pub fn transfer_issuer_control(
        &mut self,
        caller: &Address,
        new_controller: &Address,
    ) -> Result<()> {
        if caller != &self.administrator {
            return Err(SaleError::Unauthorized);
        }

        self.issuer
            .transfer_control(new_controller)
            .map_err(|err| SaleError::TransferFailed(err.to_string()))?;

        info!(target: "sale", "Issuer control transferred to {}", new_controller);
        Ok(())
    }

    /// Snapshot of a contributor's record; unknown addresses read as zero.
    pub fn contributor_record(&self, address: &Address) -> ContributorRecord {
        self.ledger.get(address)
    }

    /// Cumulative accepted value in aVAL.
    pub fn total_raised(&self) -> AttoVal {
        self.total_raised
    }

    /// The final round's cumulative goal.
    pub fn cap(&self) -> AttoVal {
        self.schedule.cap()
    }

    /// Index of the currently active round; `None` once the cap is reached.
    pub fn current_round(&self) -> Option<usize> {
        self.schedule.round_at(self.total_raised)
    }

    pub fn beneficiary(&self) -> &Address {
        &self.beneficiary
    }

    pub fn administrator(&self) -> &Address {
        &self.administrator
    }

    pub fn min_contribution(&self) -> AttoVal {
        self.min_contribution
    }

    pub fn schedule(&self) -> &RoundSchedule {
        &self.schedule
    }

    /// Read access to the credit issuer, for queries.
    pub fn issuer(&self) -> &dyn CreditIssuer {
        self.issuer.as_ref()
    }

    /// Sum of recorded contributions; equals `total_raised` at all times.
    pub fn ledger_total(&self) -> AttoVal {
        self.ledger.total_contributed()
    }

    /// Mint credit and forward value, undoing the mint if the forward fails.
    fn settle(&mut self, contributor: &Address, value: AttoVal, units: CreditUnits) -> Result<()> {
        if units > 0 {
            self.issuer
                .mint(contributor, units)
                .map_err(|err| SaleError::TransferFailed(err.to_string()))?;
        }

        if value > 0 {
            if let Err(err) = self.channel.forward(&self.beneficiary, value) {
                if units > 0 {
                    if let Err(burn_err) = self.issuer.burn(contributor, units) {
                        warn!(
                            target: "sale",
                            "Failed to unwind mint of {} units for {}: {}",
                            units, contributor, burn_err
                        );
                    }
                }
                return Err(SaleError::TransferFailed(err.to_string()));
            }
        }

        Ok(())
    }

    fn refund(&mut self, contributor: &Address) -> Result<AttoVal> {
        let record = self.ledger.get(contributor);
        let value = match record.settlement {
            Settlement::Settled => return Err(SaleError::NothingToRefund),
            Settlement::Escrowed { value, .. } => value,
        };
        if value == 0 {
            return Err(SaleError::NothingToRefund);
        }

        self.channel
            .return_to(contributor, value)
            .map_err(|err| SaleError::TransferFailed(err.to_string()))?;

        self.ledger.clear(contributor);
        self.total_raised -= value;

        info!(
            target: "sale",
            "Refunded {} to {}, raised now {}",
            format_val(value),
            contributor,
            format_val(self.total_raised)
        );

        Ok(value)
    }
}
