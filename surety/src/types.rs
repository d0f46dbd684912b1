//! Domain types for Flight Surety.
//!
//! Identities, amounts, status codes and the tunable [`Parameters`] of the
//! state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SuretyError;

/// Size of the oracle index space; indices are drawn from `0..INDEX_SPACE`.
pub const INDEX_SPACE: u8 = 10;

/// Number of distinct indices assigned to every oracle.
pub const INDICES_PER_ORACLE: usize = 3;

/// Address-like identity of an airline, passenger, oracle or owner.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Creates an address from any string-like identity
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the address as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Amount of currency in base units (wei).
///
/// One whole unit is [`Wei::UNIT`] base units. Amounts never go negative and
/// arithmetic is checked.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Wei(u128);

impl Wei {
    /// Base units per whole currency unit (10^18)
    pub const UNIT: u128 = 1_000_000_000_000_000_000;

    /// The zero amount
    pub const ZERO: Self = Self(0);

    /// Creates an amount from base units
    #[must_use]
    pub const fn new(wei: u128) -> Self {
        Self(wei)
    }

    /// Creates an amount of whole units
    #[must_use]
    pub const fn units(units: u128) -> Self {
        Self(units * Self::UNIT)
    }

    /// Creates an amount from a fraction of a unit, `numerator / denominator`
    ///
    /// Returns zero when `denominator` is zero.
    #[must_use]
    pub const fn fraction(numerator: u128, denominator: u128) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        Self(numerator * Self::UNIT / denominator)
    }

    /// Returns the amount in base units
    #[must_use]
    pub const fn wei(self) -> u128 {
        self.0
    }

    /// Checks if this amount is zero
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, returning `None` on overflow
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Scales the amount by `ratio`, rounding down. `None` on overflow or a
    /// zero denominator.
    #[must_use]
    pub const fn scale(self, ratio: Ratio) -> Option<Self> {
        if ratio.denominator == 0 {
            return None;
        }
        match self.0.checked_mul(ratio.numerator) {
            Some(product) => Some(Self(product / ratio.denominator)),
            None => None,
        }
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::UNIT;
        let fraction = self.0 % Self::UNIT;
        if fraction == 0 {
            return write!(f, "{whole} units");
        }
        let digits = format!("{fraction:018}");
        write!(f, "{whole}.{} units", digits.trim_end_matches('0'))
    }
}

/// A rational multiplier, e.g. 3/2 for the payout on a late flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    /// Multiplied in first
    pub numerator: u128,
    /// Divided out last
    pub denominator: u128,
}

impl Ratio {
    /// Creates a ratio
    #[must_use]
    pub const fn new(numerator: u128, denominator: u128) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// Flight status as reported by oracles.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum StatusCode {
    /// No information yet
    #[default]
    Unknown = 0,
    /// Flight on time
    OnTime = 10,
    /// Delayed through the airline's fault; the only status that pays out
    LateAirline = 20,
    /// Delayed by weather
    LateWeather = 30,
    /// Delayed by a technical issue
    LateTechnical = 40,
    /// Delayed for any other reason
    LateOther = 50,
}

impl StatusCode {
    /// Every status code, in ascending code order
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::OnTime,
        Self::LateAirline,
        Self::LateWeather,
        Self::LateTechnical,
        Self::LateOther,
    ];

    /// Numeric code
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether passengers are compensated for this status
    #[must_use]
    pub const fn pays_out(self) -> bool {
        matches!(self, Self::LateAirline)
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = SuretyError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or(SuretyError::UnknownStatusCode(code))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::OnTime => "onTime",
            Self::LateAirline => "lateAirline",
            Self::LateWeather => "lateWeather",
            Self::LateTechnical => "lateTechnical",
            Self::LateOther => "lateOther",
        };
        write!(f, "{label} ({})", self.code())
    }
}

/// Trims a flight code, rejecting blank ones.
///
/// # Errors
///
/// Returns [`SuretyError::EmptyFlightCode`] if nothing is left after trimming.
pub fn flight_code(raw: &str) -> Result<String, SuretyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SuretyError::EmptyFlightCode);
    }
    Ok(trimmed.to_string())
}

/// Tunable constants of the state machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// Minimum deposit per `FundAirline` call
    pub funding_threshold: Wei,
    /// Largest premium accepted for a single policy
    pub premium_cap: Wei,
    /// Credit paid per unit of premium when a flight is late through the airline's fault
    pub payout: Ratio,
    /// Number of agreeing oracles that resolves a request
    pub min_responses: usize,
    /// Minimum oracle registration fee
    pub oracle_fee: Wei,
    /// Registered-and-funded airlines that may admit a candidate alone
    pub unilateral_admissions: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            funding_threshold: Wei::units(10),
            premium_cap: Wei::units(1),
            payout: Ratio::new(3, 2),
            min_responses: 3,
            oracle_fee: Wei::units(1),
            unilateral_admissions: 4,
        }
    }
}
