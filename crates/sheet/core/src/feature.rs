//! Rule effects attached to traits and modifiers.
//!
//! [`Feature`] is a closed tagged union. Each variant knows the feature-index key
//! it files itself under; lookups lower-case both sides, so keys are
//! case-insensitive. Bonus variants carry a [`LeveledAmount`] whose level is set
//! by the index builder on the indexed copy, never on the trait's own feature.

use core::fmt;
use core::str::FromStr;

use strum::{AsRefStr, Display, EnumString};

use crate::criteria::{NumericCriteria, StringCompare, StringCriteria};
use crate::fxp::Fixed6;
use crate::units::{ParseWeightError, Weight};

pub const ATTRIBUTE_PREFIX: &str = "attr.";
pub const SKILL_NAME_PREFIX: &str = "skill.name";
pub const SKILL_POINTS_PREFIX: &str = "skill.points";
pub const SPELL_COLLEGE_PREFIX: &str = "spell.college";
pub const SPELL_NAME_PREFIX: &str = "spell";
pub const SPELL_POINTS_COLLEGE_PREFIX: &str = "spell.points.college";
pub const SPELL_POINTS_NAME_PREFIX: &str = "spell.points";
pub const WEAPON_SKILL_PREFIX: &str = "weapon.skill";
pub const WEAPON_NAMED_PREFIX: &str = "weapon_named";
pub const THIS_WEAPON_KEY: &str = "\u{1}";
pub const DR_PREFIX: &str = "dr.";
pub const REACTION_KEY: &str = "reaction";
pub const CONDITIONAL_KEY: &str = "conditional";
pub const CONTAINED_WEIGHT_KEY: &str = "equipment.weight.contained";

/// A numeric amount, optionally multiplied by a level count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct LeveledAmount {
    pub amount: Fixed6,
    pub per_level: bool,
    /// Level count supplied at aggregation time.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub level: i32,
}

impl LeveledAmount {
    pub const fn flat(amount: i64) -> Self {
        Self {
            amount: Fixed6::from_int(amount),
            per_level: false,
            level: 0,
        }
    }

    pub const fn per_level(amount: i64) -> Self {
        Self {
            amount: Fixed6::from_int(amount),
            per_level: true,
            level: 0,
        }
    }

    #[must_use]
    pub const fn at_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn adjusted(&self) -> Fixed6 {
        if self.per_level {
            self.amount.mul_int(i64::from(self.level))
        } else {
            self.amount
        }
    }

    pub fn integer_adjusted(&self) -> i32 {
        self.adjusted().to_i32()
    }
}

impl fmt::Display for LeveledAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.per_level {
            write!(f, "{} per level", self.amount.to_signed_string())
        } else {
            f.write_str(&self.amount.to_signed_string())
        }
    }
}

/// Restricts a strength bonus to one use of strength.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum StrengthLimitation {
    LiftingOnly,
    StrikingOnly,
    ThrowingOnly,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct AttributeBonus {
    pub amount: LeveledAmount,
    pub attribute: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub limitation: Option<StrengthLimitation>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SkillSelection {
    #[default]
    SkillsWithName,
    WeaponsWithName,
    ThisWeapon,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SkillBonus {
    pub amount: LeveledAmount,
    pub selection: SkillSelection,
    pub name: StringCriteria,
    pub specialization: StringCriteria,
    pub category: StringCriteria,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SkillPointBonus {
    pub amount: LeveledAmount,
    pub name: StringCriteria,
    pub specialization: StringCriteria,
    pub category: StringCriteria,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SpellMatch {
    #[default]
    AllColleges,
    CollegeName,
    SpellName,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SpellBonus {
    pub amount: LeveledAmount,
    pub match_kind: SpellMatch,
    pub name: StringCriteria,
    pub category: StringCriteria,
}

impl SpellBonus {
    /// Whether this bonus applies to a spell with the given name, colleges and
    /// categories.
    pub fn matches_spell(&self, name: &str, colleges: &[String], categories: &[String]) -> bool {
        let named = match self.match_kind {
            SpellMatch::AllColleges => true,
            SpellMatch::CollegeName => colleges.iter().any(|college| self.name.matches(college)),
            SpellMatch::SpellName => self.name.matches(name),
        };
        named && self.category.matches_categories(categories.iter().map(String::as_str))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum WeaponSelection {
    #[default]
    WeaponsWithRequiredSkill,
    WeaponsWithName,
    ThisWeapon,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct WeaponDamageBonus {
    pub amount: LeveledAmount,
    pub selection: WeaponSelection,
    pub name: StringCriteria,
    pub specialization: StringCriteria,
    pub relative_level: NumericCriteria,
    pub category: StringCriteria,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct DrBonus {
    pub amount: LeveledAmount,
    pub location: String,
    pub specialization: String,
}

impl DrBonus {
    pub const DEFAULT_LOCATION: &'static str = "torso";
    pub const ALL_SPECIALIZATION: &'static str = "all";
}

impl Default for DrBonus {
    fn default() -> Self {
        Self {
            amount: LeveledAmount::default(),
            location: Self::DEFAULT_LOCATION.to_string(),
            specialization: Self::ALL_SPECIALIZATION.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct CostReduction {
    pub attribute: String,
    /// Whole percentage points.
    pub percentage: i32,
}

/// Reaction bonus or conditional modifier tied to a free-text situation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SituationalBonus {
    pub amount: LeveledAmount,
    pub situation: String,
}

/// How much a container reduces the weight of its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightReduction {
    Percentage(Fixed6),
    Fixed(Weight),
}

impl Default for WeightReduction {
    fn default() -> Self {
        Self::Percentage(Fixed6::ZERO)
    }
}

impl fmt::Display for WeightReduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage(pct) => write!(f, "{pct}%"),
            Self::Fixed(weight) => fmt::Display::fmt(weight, f),
        }
    }
}

impl FromStr for WeightReduction {
    type Err = ParseWeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().strip_suffix('%') {
            Some(pct) => Ok(Self::Percentage(pct.parse()?)),
            None => Ok(Self::Fixed(s.parse()?)),
        }
    }
}

serde_via_str!(WeightReduction);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct ContainedWeightReduction {
    pub reduction: WeightReduction,
}

/// A rule effect attached to a trait or modifier.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum Feature {
    AttributeBonus(AttributeBonus),
    SkillBonus(SkillBonus),
    SkillPointBonus(SkillPointBonus),
    SpellBonus(SpellBonus),
    SpellPointBonus(SpellBonus),
    WeaponDamageBonus(WeaponDamageBonus),
    DrBonus(DrBonus),
    CostReduction(CostReduction),
    ReactionBonus(SituationalBonus),
    ConditionalModifier(SituationalBonus),
    ContainedWeightReduction(ContainedWeightReduction),
}

/// `prefix/<qualifier>` for an exact name match with no other narrowing,
/// `prefix*` otherwise.
fn scoped_key(prefix: &str, name: &StringCriteria, others: &[&StringCriteria]) -> String {
    let exact = name.compare == StringCompare::Is
        && others.iter().all(|criteria| criteria.compare == StringCompare::Any);
    if exact {
        format!("{prefix}/{}", name.qualifier)
    } else {
        format!("{prefix}*")
    }
}

impl Feature {
    /// The case-normalized key this feature is indexed under.
    pub fn key(&self) -> String {
        let key = match self {
            Self::AttributeBonus(bonus) => match bonus.limitation {
                Some(limitation) => format!("{ATTRIBUTE_PREFIX}{}.{limitation}", bonus.attribute),
                None => format!("{ATTRIBUTE_PREFIX}{}", bonus.attribute),
            },
            Self::SkillBonus(bonus) => match bonus.selection {
                SkillSelection::SkillsWithName => scoped_key(
                    SKILL_NAME_PREFIX,
                    &bonus.name,
                    &[&bonus.specialization, &bonus.category],
                ),
                SkillSelection::WeaponsWithName => scoped_key(
                    WEAPON_NAMED_PREFIX,
                    &bonus.name,
                    &[&bonus.specialization, &bonus.category],
                ),
                SkillSelection::ThisWeapon => THIS_WEAPON_KEY.to_string(),
            },
            Self::SkillPointBonus(bonus) => scoped_key(
                SKILL_POINTS_PREFIX,
                &bonus.name,
                &[&bonus.specialization, &bonus.category],
            ),
            Self::SpellBonus(bonus) => spell_key(bonus, SPELL_COLLEGE_PREFIX, SPELL_NAME_PREFIX),
            Self::SpellPointBonus(bonus) => {
                spell_key(bonus, SPELL_POINTS_COLLEGE_PREFIX, SPELL_POINTS_NAME_PREFIX)
            }
            Self::WeaponDamageBonus(bonus) => match bonus.selection {
                WeaponSelection::WeaponsWithRequiredSkill => scoped_key(
                    WEAPON_SKILL_PREFIX,
                    &bonus.name,
                    &[&bonus.specialization, &bonus.category],
                ),
                WeaponSelection::WeaponsWithName => scoped_key(
                    WEAPON_NAMED_PREFIX,
                    &bonus.name,
                    &[&bonus.specialization, &bonus.category],
                ),
                WeaponSelection::ThisWeapon => THIS_WEAPON_KEY.to_string(),
            },
            Self::DrBonus(bonus) => format!("{DR_PREFIX}{}", bonus.location),
            Self::CostReduction(reduction) => format!("{ATTRIBUTE_PREFIX}{}", reduction.attribute),
            Self::ReactionBonus(_) => REACTION_KEY.to_string(),
            Self::ConditionalModifier(_) => CONDITIONAL_KEY.to_string(),
            Self::ContainedWeightReduction(_) => CONTAINED_WEIGHT_KEY.to_string(),
        };
        key.to_lowercase()
    }

    /// The leveled amount of bonus variants.
    pub fn amount(&self) -> Option<&LeveledAmount> {
        match self {
            Self::AttributeBonus(bonus) => Some(&bonus.amount),
            Self::SkillBonus(bonus) => Some(&bonus.amount),
            Self::SkillPointBonus(bonus) => Some(&bonus.amount),
            Self::SpellBonus(bonus) | Self::SpellPointBonus(bonus) => Some(&bonus.amount),
            Self::WeaponDamageBonus(bonus) => Some(&bonus.amount),
            Self::DrBonus(bonus) => Some(&bonus.amount),
            Self::ReactionBonus(bonus) | Self::ConditionalModifier(bonus) => Some(&bonus.amount),
            Self::CostReduction(_) | Self::ContainedWeightReduction(_) => None,
        }
    }

    pub fn amount_mut(&mut self) -> Option<&mut LeveledAmount> {
        match self {
            Self::AttributeBonus(bonus) => Some(&mut bonus.amount),
            Self::SkillBonus(bonus) => Some(&mut bonus.amount),
            Self::SkillPointBonus(bonus) => Some(&mut bonus.amount),
            Self::SpellBonus(bonus) | Self::SpellPointBonus(bonus) => Some(&mut bonus.amount),
            Self::WeaponDamageBonus(bonus) => Some(&mut bonus.amount),
            Self::DrBonus(bonus) => Some(&mut bonus.amount),
            Self::ReactionBonus(bonus) | Self::ConditionalModifier(bonus) => {
                Some(&mut bonus.amount)
            }
            Self::CostReduction(_) | Self::ContainedWeightReduction(_) => None,
        }
    }

    /// Copy of this feature with its leveled amount evaluated at `level`.
    #[must_use]
    pub fn leveled(&self, level: i32) -> Self {
        let mut copy = self.clone();
        if let Some(amount) = copy.amount_mut() {
            amount.level = level;
        }
        copy
    }
}

fn spell_key(bonus: &SpellBonus, college_prefix: &str, name_prefix: &str) -> String {
    match bonus.match_kind {
        SpellMatch::AllColleges => college_prefix.to_string(),
        SpellMatch::CollegeName => scoped_key(college_prefix, &bonus.name, &[&bonus.category]),
        SpellMatch::SpellName => scoped_key(name_prefix, &bonus.name, &[&bonus.category]),
    }
}
