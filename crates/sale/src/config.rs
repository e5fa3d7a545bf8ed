//! Sale configuration.

use roundsale_pricing::{RoundSchedule, ScheduleError};
use roundsale_types::{Address, AttoVal, Rate};
use serde::{Deserialize, Serialize};

/// Construction parameters for a sale, loadable from TOML.
///
/// Value amounts are written as decimal VAL strings ("1400", "0.1") because
/// aVAL quantities do not fit a TOML integer; parsing is exact, no floats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Receives forwarded contributions.
    pub beneficiary: Address,
    /// May approve contributors, refund on their behalf, and hand over
    /// issuer control.
    pub administrator: Address,
    /// Cumulative round goals, strictly increasing; the last is the cap.
    #[serde(with = "val_decimal_vec")]
    pub round_goals: Vec<AttoVal>,
    /// Credits per VAL for each round; same length as `round_goals`.
    #[serde(with = "rate_vec")]
    pub round_rates: Vec<Rate>,
    /// Smallest accepted contribution.
    #[serde(with = "val_decimal")]
    pub min_contribution: AttoVal,
}

impl SaleConfig {
    /// Validate the round parameters and build the schedule.
    pub fn build_schedule(&self) -> Result<RoundSchedule, ScheduleError> {
        RoundSchedule::new(self.round_goals.clone(), self.round_rates.clone())
    }
}

mod val_decimal {
    use roundsale_types::{val_from_decimal, val_to_decimal, AttoVal};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &AttoVal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&val_to_decimal(*amount))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AttoVal, D::Error> {
        let raw = String::deserialize(deserializer)?;
        val_from_decimal(&raw).map_err(D::Error::custom)
    }
}

mod val_decimal_vec {
    use roundsale_types::{val_from_decimal, val_to_decimal, AttoVal};
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(amounts: &[AttoVal], serializer: S) -> Result<S::Ok, S::Error> {
        let raw: Vec<String> = amounts.iter().map(|a| val_to_decimal(*a)).collect();
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<AttoVal>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| val_from_decimal(s).map_err(D::Error::custom))
            .collect()
    }
}

mod rate_vec {
    use roundsale_types::Rate;
    use serde::{
        de::Error as DeError, ser::Error as SerError, ser::SerializeSeq, Deserialize, Deserializer,
        Serializer,
    };

    pub fn serialize<S: Serializer>(rates: &[Rate], serializer: S) -> Result<S::Ok, S::Error> {
        // TOML integers are i64; rates are stored as plain integers on disk.
        let mut seq = serializer.serialize_seq(Some(rates.len()))?;
        for rate in rates {
            let native = i64::try_from(*rate).map_err(S::Error::custom)?;
            seq.serialize_element(&native)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Rate>, D::Error> {
        let raw = Vec::<i64>::deserialize(deserializer)?;
        raw.iter()
            .map(|&v| Rate::try_from(v).map_err(D::Error::custom))
            .collect()
    }
}
