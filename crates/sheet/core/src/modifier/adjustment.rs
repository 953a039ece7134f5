use core::fmt;
use core::str::FromStr;

use crate::error::{CalcResult, ErrorSeverity, SheetError};
use crate::fxp::{Fixed6, ParseFixedError};
use crate::units::{ParseWeightError, Weight, WeightUnits};

/// Failure to parse a persisted cost or weight adjustment.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseAdjustmentError {
    #[error("invalid adjustment amount: {0}")]
    Amount(#[from] ParseFixedError),

    #[error("invalid weight adjustment: {0}")]
    Weight(#[from] ParseWeightError),
}

impl SheetError for ParseAdjustmentError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Amount(_) => "ADJUSTMENT_INVALID_AMOUNT",
            Self::Weight(_) => "ADJUSTMENT_INVALID_WEIGHT",
        }
    }
}

fn strip_multiplier(s: &str) -> Option<&str> {
    s.strip_prefix('x')
        .or_else(|| s.strip_prefix('X'))
        .or_else(|| s.strip_prefix('×'))
        .map(str::trim)
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let (head, tail) = (s.get(..split)?, s.get(split..)?);
    tail.eq_ignore_ascii_case(suffix).then_some(head.trim())
}

/// Cost adjustment of an equipment modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostAdjustment {
    /// `+5`: added to the running cost.
    Addition(Fixed6),
    /// `+10%`: percentage of the value entering the stage.
    Percentage(Fixed6),
    /// `x2`: multiplies the running cost.
    Multiplier(Fixed6),
    /// `+1 CF`: cost factor, accumulated in the base stage.
    CostFactor(Fixed6),
}

impl Default for CostAdjustment {
    fn default() -> Self {
        Self::Addition(Fixed6::ZERO)
    }
}

impl fmt::Display for CostAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addition(amount) => f.write_str(&amount.to_signed_string()),
            Self::Percentage(amount) => write!(f, "{}%", amount.to_signed_string()),
            Self::Multiplier(amount) => write!(f, "x{amount}"),
            Self::CostFactor(amount) => write!(f, "{} CF", amount.to_signed_string()),
        }
    }
}

impl FromStr for CostAdjustment {
    type Err = ParseAdjustmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = strip_multiplier(s) {
            return Ok(Self::Multiplier(rest.parse()?));
        }
        if let Some(rest) = s.strip_suffix('%') {
            return Ok(Self::Percentage(rest.trim().parse()?));
        }
        if let Some(rest) = strip_suffix_ignore_case(s, "cf") {
            return Ok(Self::CostFactor(rest.parse()?));
        }
        Ok(Self::Addition(s.parse()?))
    }
}

serde_via_str!(CostAdjustment);

/// A `numerator/denominator` pair. The denominator may be zero in authored
/// data; that only fails when the fraction is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: Fixed6,
    pub denominator: Fixed6,
}

impl Fraction {
    pub const fn new(numerator: Fixed6, denominator: Fixed6) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn value(self) -> CalcResult<Fixed6> {
        self.numerator.checked_div(self.denominator)
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::new(Fixed6::ONE, Fixed6::ONE)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == Fixed6::ONE {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Fraction {
    type Err = ParseFixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((numerator, denominator)) => Ok(Self::new(
                numerator.trim().parse()?,
                denominator.trim().parse()?,
            )),
            None => Ok(Self::new(s.trim().parse()?, Fixed6::ONE)),
        }
    }
}

/// Weight adjustment of an equipment modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightAdjustment {
    /// `+2 lb`: added to the stage sum.
    Addition(Weight),
    /// `+10%`: percentage of the original weight (original stage), or a plain
    /// percentage multiplier in later stages.
    Percentage(Fixed6),
    /// `x1/2`: multiplies the running weight.
    Multiplier(Fraction),
    /// `x50%`: multiplies the running weight by a percentage fraction.
    PercentageMultiplier(Fraction),
}

impl Default for WeightAdjustment {
    fn default() -> Self {
        Self::Addition(Weight::zero(WeightUnits::Pound))
    }
}

impl fmt::Display for WeightAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addition(weight) => {
                write!(f, "{} {}", weight.value.to_signed_string(), weight.units)
            }
            Self::Percentage(amount) => write!(f, "{}%", amount.to_signed_string()),
            Self::Multiplier(fraction) => write!(f, "x{fraction}"),
            Self::PercentageMultiplier(fraction) => write!(f, "x{fraction}%"),
        }
    }
}

impl FromStr for WeightAdjustment {
    type Err = ParseAdjustmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = strip_multiplier(s) {
            return Ok(match rest.strip_suffix('%') {
                Some(pct) => Self::PercentageMultiplier(pct.parse()?),
                None => Self::Multiplier(rest.parse()?),
            });
        }
        if let Some(rest) = s.strip_suffix('%') {
            return Ok(Self::Percentage(rest.trim().parse()?));
        }
        Ok(Self::Addition(s.parse()?))
    }
}

serde_via_str!(WeightAdjustment);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_adjustments_parse_by_shape() {
        let cases = [
            ("+5", CostAdjustment::Addition(Fixed6::from_int(5))),
            ("-10%", CostAdjustment::Percentage(Fixed6::from_int(-10))),
            ("x2", CostAdjustment::Multiplier(Fixed6::TWO)),
            ("×0.5", CostAdjustment::Multiplier(Fixed6::HALF)),
            ("+1 CF", CostAdjustment::CostFactor(Fixed6::ONE)),
            ("-0.5cf", CostAdjustment::CostFactor(-Fixed6::HALF)),
        ];
        for (text, expected) in cases {
            assert_eq!(text.parse::<CostAdjustment>().unwrap(), expected, "{text}");
        }
        assert_eq!(CostAdjustment::CostFactor(Fixed6::ONE).to_string(), "+1 CF");
        assert!("x".parse::<CostAdjustment>().is_err());
    }

    #[test]
    fn weight_adjustments_parse_by_shape() {
        assert_eq!(
            "x1/2".parse::<WeightAdjustment>().unwrap(),
            WeightAdjustment::Multiplier(Fraction::new(Fixed6::ONE, Fixed6::TWO))
        );
        assert_eq!(
            "x50%".parse::<WeightAdjustment>().unwrap(),
            WeightAdjustment::PercentageMultiplier(Fraction::new(Fixed6::from_int(50), Fixed6::ONE))
        );
        assert_eq!(
            "-2 kg".parse::<WeightAdjustment>().unwrap(),
            WeightAdjustment::Addition(Weight::new(-Fixed6::TWO, WeightUnits::Kilogram))
        );
        assert_eq!(WeightAdjustment::default().to_string(), "+0 lb");
    }

    #[test]
    fn zero_denominator_fails_only_when_applied() {
        let fraction: Fraction = "1/0".parse().unwrap();
        assert!(fraction.value().is_err());
    }
}
