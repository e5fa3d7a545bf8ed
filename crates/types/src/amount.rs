//! Monetary scalars for the sale ledger.
//!
//! Contributed value is denominated in atto-VAL (aVAL).
//! 1 VAL = 10^18 aVAL. Issued credit uses the same 18-decimal scheme, so
//! multiplying a value in aVAL by a whole-credits-per-VAL rate yields
//! atomic credit units with no rescaling step.

/// Contributed value in atto-VAL (aVAL)
pub type AttoVal = u128;

/// Issued credit in atomic units (18 decimals)
pub type CreditUnits = u128;

/// Whole credits minted per whole VAL.
///
/// Because value and credit both carry 18 decimals, the same number is
/// also atomic credit per aVAL, so `value * rate` is exact.
pub type Rate = u128;

/// 1 VAL = 10^18 aVAL
pub const ATTO_PER_VAL: AttoVal = 1_000_000_000_000_000_000;

/// Atomic credit units per whole credit
pub const UNITS_PER_CREDIT: CreditUnits = 1_000_000_000_000_000_000;

/// Number of fractional decimal digits in a VAL amount.
pub const VAL_DECIMALS: u32 = 18;

/// Errors raised when parsing a decimal VAL string.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid decimal amount: {0}")]
    InvalidDigit(String),
    #[error("more than {VAL_DECIMALS} fractional digits: {0}")]
    TooPrecise(String),
    #[error("amount overflows the 128-bit range: {0}")]
    Overflow(String),
}

/// Convert a whole-VAL amount into aVAL.
pub const fn val(amount: u128) -> AttoVal {
    amount * ATTO_PER_VAL
}

/// Render an aVAL amount as a plain decimal VAL string ("1400", "0.1").
///
/// Trailing zeros of the fractional part are trimmed; whole amounts print
/// without a decimal point. The output round-trips through
/// [`val_from_decimal`] exactly.
pub fn val_to_decimal(amount: AttoVal) -> String {
    let whole = amount / ATTO_PER_VAL;
    let frac = amount % ATTO_PER_VAL;

    if frac == 0 {
        return whole.to_string();
    }

    let mut digits = format!("{:018}", frac);
    while digits.ends_with('0') {
        digits.pop();
    }
    format!("{whole}.{digits}")
}

/// Parse a decimal VAL string ("1400", "0.1", ".5") into aVAL, exactly.
///
/// At most 18 fractional digits are accepted; there is no rounding.
pub fn val_from_decimal(input: &str) -> Result<AttoVal, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::InvalidDigit(input.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::InvalidDigit(input.to_string()));
    }
    if frac.len() as u32 > VAL_DECIMALS {
        return Err(AmountError::TooPrecise(input.to_string()));
    }

    let whole_part: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| AmountError::Overflow(input.to_string()))?
    };

    // Right-pad the fractional digits to 18 places; the result always fits.
    let frac_part: u128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<18}")
            .parse()
            .map_err(|_| AmountError::Overflow(input.to_string()))?
    };

    whole_part
        .checked_mul(ATTO_PER_VAL)
        .and_then(|atto| atto.checked_add(frac_part))
        .ok_or_else(|| AmountError::Overflow(input.to_string()))
}

/// Format an aVAL amount as a human readable VAL string.
pub fn format_val(amount: AttoVal) -> String {
    format!("{} VAL", val_to_decimal(amount))
}
