//! Weight units and unit-tagged weight values.
//!
//! Two conversion tables exist. The exact table uses 1 kg = 2.204623 lb. The
//! "simple metric" table uses the tabletop approximations (1 kg = 2 lb,
//! 1 oz = 30 g, 1 t = 1 long ton) and is selected by
//! [`SheetSettings::use_simple_metric_conversions`](crate::config::SheetSettings).

use core::fmt;
use core::str::FromStr;

use strum::{AsRefStr, Display, EnumString};

use crate::error::{CalcResult, ErrorSeverity, SheetError};
use crate::fxp::{Fixed6, ParseFixedError};

/// Unit a weight is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightUnits {
    #[strum(serialize = "oz")]
    #[cfg_attr(feature = "serde", serde(rename = "oz"))]
    Ounce,

    #[default]
    #[strum(to_string = "lb", serialize = "lbs", serialize = "#")]
    #[cfg_attr(feature = "serde", serde(rename = "lb"))]
    Pound,

    #[strum(serialize = "tn")]
    #[cfg_attr(feature = "serde", serde(rename = "tn"))]
    ShortTon,

    #[strum(serialize = "lt")]
    #[cfg_attr(feature = "serde", serde(rename = "lt"))]
    LongTon,

    #[strum(serialize = "g")]
    #[cfg_attr(feature = "serde", serde(rename = "g"))]
    Gram,

    #[strum(serialize = "kg")]
    #[cfg_attr(feature = "serde", serde(rename = "kg"))]
    Kilogram,

    #[strum(serialize = "t")]
    #[cfg_attr(feature = "serde", serde(rename = "t"))]
    MetricTon,
}

impl WeightUnits {
    /// Returns `(numerator, denominator)` such that one unit equals
    /// `numerator / denominator` pounds.
    fn pound_ratio(self, simple_metric: bool) -> (Fixed6, Fixed6) {
        let exact_kg = Fixed6::from_decimal(2_204_623, 6);
        match (self, simple_metric) {
            (Self::Ounce, _) => (Fixed6::ONE, Fixed6::from_int(16)),
            (Self::Pound, _) => (Fixed6::ONE, Fixed6::ONE),
            (Self::ShortTon, _) => (Fixed6::from_int(2000), Fixed6::ONE),
            (Self::LongTon, _) => (Fixed6::from_int(2240), Fixed6::ONE),
            (Self::Kilogram, true) => (Fixed6::TWO, Fixed6::ONE),
            (Self::Kilogram, false) => (exact_kg, Fixed6::ONE),
            (Self::Gram, true) => (Fixed6::ONE, Fixed6::from_int(480)),
            (Self::Gram, false) => (exact_kg, Fixed6::from_int(1000)),
            (Self::MetricTon, true) => (Fixed6::from_int(2240), Fixed6::ONE),
            (Self::MetricTon, false) => (exact_kg.mul_int(1000), Fixed6::ONE),
        }
    }

    pub const fn is_metric(self) -> bool {
        matches!(self, Self::Gram | Self::Kilogram | Self::MetricTon)
    }

    /// Formats `weight` in these units.
    pub fn format(self, weight: Weight, simple_metric: bool) -> CalcResult<String> {
        Ok(weight.convert_to(self, simple_metric)?.to_string())
    }
}

/// A weight value tagged with its unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Weight {
    pub value: Fixed6,
    pub units: WeightUnits,
}

impl Weight {
    pub const fn new(value: Fixed6, units: WeightUnits) -> Self {
        Self { value, units }
    }

    pub const fn zero(units: WeightUnits) -> Self {
        Self::new(Fixed6::ZERO, units)
    }

    pub const fn pounds(value: i64) -> Self {
        Self::new(Fixed6::from_int(value), WeightUnits::Pound)
    }

    pub const fn is_zero(self) -> bool {
        self.value.is_zero()
    }

    /// Re-expresses this weight in `units`.
    pub fn convert_to(self, units: WeightUnits, simple_metric: bool) -> CalcResult<Self> {
        if self.units == units {
            return Ok(self);
        }
        let (from_num, from_den) = self.units.pound_ratio(simple_metric);
        let (to_num, to_den) = units.pound_ratio(simple_metric);
        let pounds = self.value.checked_mul(from_num)?.checked_div(from_den)?;
        let value = pounds.checked_mul(to_den)?.checked_div(to_num)?;
        Ok(Self::new(value, units))
    }

    /// Adds `other`, expressed in this weight's units.
    pub fn checked_add(self, other: Self, simple_metric: bool) -> CalcResult<Self> {
        let other = other.convert_to(self.units, simple_metric)?;
        Ok(Self::new(self.value.checked_add(other.value)?, self.units))
    }

    pub fn checked_sub(self, other: Self, simple_metric: bool) -> CalcResult<Self> {
        let other = other.convert_to(self.units, simple_metric)?;
        Ok(Self::new(self.value.checked_sub(other.value)?, self.units))
    }

    /// Multiplies the magnitude, keeping the unit.
    pub fn scaled(self, factor: Fixed6) -> Self {
        Self::new(self.value * factor, self.units)
    }

    pub fn max_zero(self) -> Self {
        Self::new(self.value.max(Fixed6::ZERO), self.units)
    }

    /// Parses `"<amount> [unit]"`, falling back to `default_units` when no unit is given.
    pub fn parse_with_default(s: &str, default_units: WeightUnits) -> Result<Self, ParseWeightError> {
        let s = s.trim();
        let split = s
            .char_indices()
            .find(|&(_, ch)| !(ch.is_ascii_digit() || matches!(ch, '.' | ',' | '+' | '-')))
            .map_or(s.len(), |(index, _)| index);
        let (amount, unit) = s.split_at(split);
        let value = amount.trim().parse::<Fixed6>()?;
        let unit = unit.trim();
        let units = if unit.is_empty() {
            default_units
        } else {
            unit.parse()
                .map_err(|_| ParseWeightError::UnknownUnit(unit.to_string()))?
        };
        Ok(Self::new(value, units))
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.units)
    }
}

impl FromStr for Weight {
    type Err = ParseWeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default(s, WeightUnits::Pound)
    }
}

/// Failure to parse a weight string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseWeightError {
    #[error("invalid weight amount: {0}")]
    Amount(#[from] ParseFixedError),

    #[error("unknown weight unit {0:?}")]
    UnknownUnit(String),
}

impl SheetError for ParseWeightError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Amount(_) => "WEIGHT_INVALID_AMOUNT",
            Self::UnknownUnit(_) => "WEIGHT_UNKNOWN_UNIT",
        }
    }
}

serde_via_str!(Weight);
