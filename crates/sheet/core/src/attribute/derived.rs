//! Values derived from resolved attributes: damage dice, lifting, encumbrance,
//! move and dodge.

use core::fmt;

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::config::DamageProgression;
use crate::error::CalcResult;
use crate::fxp::Fixed6;
use crate::units::{Weight, WeightUnits};

/// `10^(k/10)` for `k` in `0..20`, to six places.
const DECADE_STEPS: [Fixed6; 20] = [
    Fixed6::from_raw(1_000_000),
    Fixed6::from_raw(1_258_925),
    Fixed6::from_raw(1_584_893),
    Fixed6::from_raw(1_995_262),
    Fixed6::from_raw(2_511_886),
    Fixed6::from_raw(3_162_278),
    Fixed6::from_raw(3_981_072),
    Fixed6::from_raw(5_011_872),
    Fixed6::from_raw(6_309_573),
    Fixed6::from_raw(7_943_282),
    Fixed6::from_raw(10_000_000),
    Fixed6::from_raw(12_589_254),
    Fixed6::from_raw(15_848_932),
    Fixed6::from_raw(19_952_623),
    Fixed6::from_raw(25_118_864),
    Fixed6::from_raw(31_622_777),
    Fixed6::from_raw(39_810_717),
    Fixed6::from_raw(50_118_723),
    Fixed6::from_raw(63_095_734),
    Fixed6::from_raw(79_432_823),
];

/// Strength used for lifting: truncated, and halved (rounding up) while a
/// HALVE_ST threshold is active.
pub fn lifting_strength(strength: Fixed6, halve: bool) -> i32 {
    let st = strength.trunc().to_i32();
    if halve { st / 2 + st % 2 } else { st }
}

/// Basic lift for `strength`, expressed in `units`.
///
/// Metric sheets with simple conversions compute in kilograms, everything
/// else in pounds. Values at or above the rounding point are rounded to whole
/// units and all values keep at most one decimal place before the result is
/// converted.
pub fn basic_lift(
    strength: i32,
    progression: DamageProgression,
    units: WeightUnits,
    simple_metric: bool,
) -> CalcResult<Weight> {
    let desired = units;
    let metric = simple_metric && units.is_metric();
    let (divisor, multiplier, round_at, units) = if metric {
        (10, 1, 5, WeightUnits::Kilogram)
    } else {
        (5, 2, 10, WeightUnits::Pound)
    };
    if strength < 1 {
        return Ok(Weight::zero(desired));
    }
    let mut value = match progression {
        DamageProgression::KnowingYourOwnStrength => {
            let mut st = strength;
            let mut decades = 0;
            if st > 19 {
                decades = st / 10 - 1;
                st -= decades * 10;
            }
            let step = DECADE_STEPS
                .get(usize::try_from(st).unwrap_or(0))
                .copied()
                .unwrap_or(Fixed6::ONE);
            let mut value = step.mul_int(multiplier);
            value = if st <= 6 {
                (value * Fixed6::TEN).round().div_int(10).unwrap_or(value)
            } else {
                value.round()
            };
            let scale = 10_i64.checked_pow(u32::try_from(decades).unwrap_or(0)).unwrap_or(i64::MAX);
            value.mul_int(scale)
        }
        DamageProgression::BasicSet => Fixed6::from_int(i64::from(strength) * i64::from(strength))
            .div_int(divisor)
            .unwrap_or(Fixed6::ZERO),
    };
    if value >= Fixed6::from_int(round_at) {
        value = value.round();
    }
    value = (value * Fixed6::TEN).trunc().div_int(10).unwrap_or(value);
    Weight::new(value, units).convert_to(desired, simple_metric)
}

/// Lift capabilities as multiples of basic lift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiftMultiples {
    pub one_handed: Weight,
    pub two_handed: Weight,
    pub shove_and_knock_over: Weight,
    pub running_shove_and_knock_over: Weight,
    pub carry_on_back: Weight,
    pub shift_slightly: Weight,
}

impl LiftMultiples {
    pub fn from_basic_lift(basic_lift: Weight) -> Self {
        let times = |n: i64| basic_lift.scaled(Fixed6::from_int(n));
        Self {
            one_handed: times(2),
            two_handed: times(8),
            shove_and_knock_over: times(12),
            running_shove_and_knock_over: times(24),
            carry_on_back: times(15),
            shift_slightly: times(50),
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Encumbrance {
    #[default]
    None,
    Light,
    Medium,
    Heavy,
    ExtraHeavy,
}

impl Encumbrance {
    pub const fn weight_multiplier(self) -> i64 {
        match self {
            Self::None => 1,
            Self::Light => 2,
            Self::Medium => 3,
            Self::Heavy => 6,
            Self::ExtraHeavy => 10,
        }
    }

    pub const fn penalty(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Light => -1,
            Self::Medium => -2,
            Self::Heavy => -3,
            Self::ExtraHeavy => -4,
        }
    }

    /// Most weight carried at this level.
    pub fn maximum_carry(self, basic_lift: Weight) -> Weight {
        basic_lift.scaled(Fixed6::from_int(self.weight_multiplier()))
    }

    /// Lightest level able to carry `carried`, or the heaviest level.
    pub fn for_carried(carried: Weight, basic_lift: Weight, simple_metric: bool) -> Self {
        let carried = carried
            .convert_to(basic_lift.units, simple_metric)
            .map_or(Fixed6::MAX, |weight| weight.value);
        let capacities: Vec<Fixed6> = Self::iter()
            .map(|level| level.maximum_carry(basic_lift).value)
            .collect();
        Self::iter()
            .nth(encumbrance_index(carried, &capacities))
            .unwrap_or(Self::ExtraHeavy)
    }
}

/// Index of the first capacity at least `carried`, else the last index.
pub fn encumbrance_index(carried: Fixed6, capacities: &[Fixed6]) -> usize {
    capacities
        .iter()
        .position(|&capacity| capacity >= carried)
        .unwrap_or_else(|| capacities.len().saturating_sub(1))
}

/// Divisor applied to move or dodge for `active` halving thresholds: none,
/// halved, or quartered at most.
pub fn halving_divisor(active: usize) -> i64 {
    2 * active.min(2) as i64
}

fn halved(value: Fixed6, active: usize) -> Fixed6 {
    match halving_divisor(active) {
        0 => value,
        divisor => value.div_int(divisor).map_or(value, Fixed6::ceil),
    }
}

/// Move at encumbrance `level`.
pub fn move_at(basic_move: Fixed6, halve_move: usize, level: Encumbrance) -> i32 {
    let initial = halved(basic_move.max(Fixed6::ZERO), halve_move);
    let factor = Fixed6::from(10 + 2 * level.penalty());
    let adjusted = (initial * factor).div_int(10).unwrap_or(Fixed6::ZERO).trunc();
    if adjusted < Fixed6::ONE {
        i32::from(initial.is_positive())
    } else {
        adjusted.to_i32()
    }
}

/// Dodge at encumbrance `level`. Speed and bonus are truncated to whole
/// numbers before any halving.
pub fn dodge(basic_speed: Fixed6, dodge_bonus: Fixed6, halve_dodge: usize, level: Encumbrance) -> i32 {
    let mut value = 3 + dodge_bonus.trunc().to_i32() + basic_speed.max(Fixed6::ZERO).trunc().to_i32();
    let divisor = halving_divisor(halve_dodge) as i32;
    if divisor > 0 {
        let bump = i32::from(value % divisor != 0);
        value = value / divisor + bump;
    }
    (value + level.penalty()).max(1)
}

/// A dice expression such as `2d-1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dice {
    pub count: i32,
    pub modifier: i32,
}

impl Dice {
    pub const fn new(count: i32, modifier: i32) -> Self {
        Self { count, modifier }
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.count)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Dice {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Thrust damage for striking strength `st`.
pub fn thrust(st: i32, progression: DamageProgression) -> Dice {
    match progression {
        DamageProgression::BasicSet => {
            if st < 19 {
                return Dice::new(1, -(6 - (st - 1) / 2));
            }
            let mut value = st - 11;
            if st > 50 {
                value -= 1;
                if st > 79 {
                    value -= 1 + (st - 80) / 5;
                }
            }
            Dice::new(value / 8 + 1, value % 8 / 2 - 1)
        }
        DamageProgression::KnowingYourOwnStrength => {
            if st < 12 {
                Dice::new(1, st - 12)
            } else {
                Dice::new((st - 7) / 4, (st + 1) % 4 - 1)
            }
        }
    }
}

/// Swing damage for striking strength `st`.
pub fn swing(st: i32, progression: DamageProgression) -> Dice {
    match progression {
        DamageProgression::BasicSet => {
            if st < 10 {
                return Dice::new(1, -(5 - (st - 1) / 2));
            }
            if st < 28 {
                let value = st - 9;
                return Dice::new(value / 4 + 1, value % 4 - 1);
            }
            let mut value = st;
            if st > 40 {
                value -= (st - 40) / 5;
            }
            if st > 59 {
                value += 1;
            }
            value += 9;
            Dice::new(value / 8 + 1, value % 8 / 2 - 1)
        }
        DamageProgression::KnowingYourOwnStrength => {
            if st < 10 {
                Dice::new(1, st - 10)
            } else {
                Dice::new((st - 5) / 4, (st - 1) % 4 - 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_set_damage_table() {
        let cases = [
            (1, "1d-6", "1d-5"),
            (10, "1d-2", "1d"),
            (12, "1d-1", "1d+2"),
            (13, "1d", "2d-1"),
            (19, "2d-1", "3d+1"),
            (27, "3d-1", "5d+1"),
            (30, "3d", "5d+2"),
        ];
        for (st, thr, sw) in cases {
            assert_eq!(thrust(st, DamageProgression::BasicSet).to_string(), thr, "thrust {st}");
            assert_eq!(swing(st, DamageProgression::BasicSet).to_string(), sw, "swing {st}");
        }
    }

    #[test]
    fn knowing_your_own_strength_damage() {
        let kyos = DamageProgression::KnowingYourOwnStrength;
        assert_eq!(thrust(10, kyos).to_string(), "1d-2");
        assert_eq!(thrust(15, kyos).to_string(), "2d-1");
        assert_eq!(swing(10, kyos).to_string(), "1d");
        assert_eq!(swing(14, kyos).to_string(), "2d");
    }

    #[test]
    fn basic_lift_progressions() {
        let lift = |st, progression, units| basic_lift(st, progression, units, true).unwrap().to_string();
        assert_eq!(lift(10, DamageProgression::BasicSet, WeightUnits::Pound), "20 lb");
        assert_eq!(lift(3, DamageProgression::BasicSet, WeightUnits::Pound), "1.8 lb");
        assert_eq!(lift(11, DamageProgression::BasicSet, WeightUnits::Pound), "24 lb");
        assert_eq!(lift(10, DamageProgression::BasicSet, WeightUnits::Kilogram), "10 kg");
        assert_eq!(lift(10, DamageProgression::KnowingYourOwnStrength, WeightUnits::Pound), "20 lb");
        assert_eq!(lift(25, DamageProgression::KnowingYourOwnStrength, WeightUnits::Pound), "630 lb");
        assert_eq!(lift(0, DamageProgression::BasicSet, WeightUnits::Pound), "0 lb");
        assert_eq!(lift(10, DamageProgression::BasicSet, WeightUnits::Ounce), "320 oz");

        let exact = basic_lift(10, DamageProgression::BasicSet, WeightUnits::Kilogram, false).unwrap();
        assert_eq!(exact.units, WeightUnits::Kilogram);
        assert_eq!(exact.value, Fixed6::from_raw(9_071_846));
    }

    #[test]
    fn lifting_strength_halves_rounding_up() {
        assert_eq!(lifting_strength(Fixed6::from_int(11), true), 6);
        assert_eq!(lifting_strength(Fixed6::from_decimal(105, 1), false), 10);
    }

    #[test]
    fn encumbrance_picks_first_sufficient_capacity() {
        let capacities: Vec<Fixed6> = [10, 20, 30, 40, 50, 60].map(Fixed6::from_int).to_vec();
        assert_eq!(encumbrance_index(Fixed6::from_int(25), &capacities), 2);
        assert_eq!(encumbrance_index(Fixed6::from_int(61), &capacities), 5);
        assert_eq!(
            Encumbrance::for_carried(Weight::pounds(50), Weight::pounds(20), true),
            Encumbrance::Medium
        );
        assert_eq!(
            Encumbrance::for_carried(Weight::pounds(500), Weight::pounds(20), true),
            Encumbrance::ExtraHeavy
        );
    }

    #[test]
    fn halving_thresholds_on_move_and_dodge() {
        assert_eq!(move_at(Fixed6::from_int(5), 2, Encumbrance::None), 2);
        assert_eq!(move_at(Fixed6::from_int(5), 5, Encumbrance::None), 2);
        assert_eq!(move_at(Fixed6::from_int(5), 1, Encumbrance::None), 3);
        assert_eq!(move_at(Fixed6::from_int(6), 0, Encumbrance::Medium), 3);
        assert_eq!(move_at(Fixed6::from_int(1), 0, Encumbrance::ExtraHeavy), 1);
        assert_eq!(move_at(Fixed6::ZERO, 0, Encumbrance::None), 0);
        let speed = Fixed6::from_decimal(575, 2);
        assert_eq!(dodge(speed, Fixed6::ZERO, 0, Encumbrance::None), 8);
        assert_eq!(dodge(speed, Fixed6::ZERO, 1, Encumbrance::Light), 3);
        assert_eq!(dodge(speed, Fixed6::ZERO, 1, Encumbrance::None), 4);
        assert_eq!(dodge(Fixed6::from_int(6), Fixed6::from_decimal(15, 1), 2, Encumbrance::None), 3);
        assert_eq!(dodge(Fixed6::ZERO, Fixed6::ZERO, 0, Encumbrance::ExtraHeavy), 1);
    }
}
