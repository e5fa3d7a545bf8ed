//! Round schedule and the contribution pricing fold.
//!
//! The schedule is immutable after construction. Pricing is a pure function
//! of `(already_raised, amount)` so it can be exercised in isolation from
//! the stateful sale engine.

use roundsale_types::{AttoVal, CreditUnits, Rate};
use serde::{Deserialize, Serialize};

use crate::errors::ScheduleError;

/// A single pricing round, active until the sale's cumulative raised value
/// reaches `goal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Cumulative raised-value goal in aVAL. The final round's goal is the
    /// global contribution cap.
    pub goal: AttoVal,
    /// Whole credits minted per whole VAL while this round is active.
    pub rate: Rate,
}

/// One priced slice of a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub rate: Rate,
    pub amount: AttoVal,
}

/// Result of pricing a contribution against the schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quote {
    /// Atomic credit units earned by the consumed value.
    pub units: CreditUnits,
    /// Value actually consumed; less than requested when the cap intervenes.
    pub consumed: AttoVal,
    /// Per-rate slices in consumption order.
    pub segments: Vec<Segment>,
}

impl Quote {
    /// True when the cap left no room for any part of the contribution.
    pub fn is_empty(&self) -> bool {
        self.consumed == 0
    }
}

/// Immutable, validated sequence of pricing rounds ordered by ascending goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSchedule {
    rounds: Vec<Round>,
}

impl RoundSchedule {
    /// Build a schedule from parallel goal and rate sequences.
    ///
    /// Goals must be strictly increasing and both sequences non-empty and of
    /// equal length; rates must be nonzero.
    pub fn new(goals: Vec<AttoVal>, rates: Vec<Rate>) -> Result<Self, ScheduleError> {
        if goals.is_empty() || rates.is_empty() {
            return Err(ScheduleError::Empty);
        }
        if goals.len() != rates.len() {
            return Err(ScheduleError::LengthMismatch {
                goals: goals.len(),
                rates: rates.len(),
            });
        }

        let mut previous = 0;
        for (index, &goal) in goals.iter().enumerate() {
            if goal <= previous {
                return Err(ScheduleError::NonIncreasingGoal { index });
            }
            previous = goal;
        }

        if let Some(index) = rates.iter().position(|&rate| rate == 0) {
            return Err(ScheduleError::ZeroRate { index });
        }

        let rounds = goals
            .into_iter()
            .zip(rates)
            .map(|(goal, rate)| Round { goal, rate })
            .collect();

        Ok(Self { rounds })
    }

    /// The rounds in ascending goal order.
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Number of rounds in the schedule.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Always false for a validated schedule; present for completeness.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// The global contribution cap: the final round's cumulative goal.
    pub fn cap(&self) -> AttoVal {
        self.rounds.last().map(|round| round.goal).unwrap_or(0)
    }

    /// Index of the round a given cumulative raised amount falls in.
    ///
    /// Returns `None` once the raised amount has reached the cap.
    pub fn round_at(&self, raised: AttoVal) -> Option<usize> {
        self.rounds.iter().position(|round| raised < round.goal)
    }

    /// Price a contribution of `amount` on top of `already_raised`.
    ///
    /// The contribution is consumed in segments: each segment is
    /// `min(remaining, distance to the active round's goal)` priced at that
    /// round's rate, until the amount is spent or the cap is reached. The
    /// returned quote reports the value actually consumed; the caller decides
    /// what a short consumption means (the sale engine rejects it outright).
    pub fn price_contribution(
        &self,
        already_raised: AttoVal,
        amount: AttoVal,
    ) -> Result<Quote, ScheduleError> {
        let mut position = already_raised;
        let mut remaining = amount;
        let mut quote = Quote::default();

        for round in &self.rounds {
            if remaining == 0 {
                break;
            }
            if position >= round.goal {
                continue;
            }

            let slice = remaining.min(round.goal - position);
            let earned = slice
                .checked_mul(round.rate)
                .ok_or(ScheduleError::ArithmeticOverflow("segment credit"))?;

            quote.units = quote
                .units
                .checked_add(earned)
                .ok_or(ScheduleError::ArithmeticOverflow("credit total"))?;
            quote.consumed += slice;
            quote.segments.push(Segment {
                rate: round.rate,
                amount: slice,
            });

            position += slice;
            remaining -= slice;
        }

        Ok(quote)
    }
}
