use core::fmt;
use core::str::FromStr;

use strum::{AsRefStr, Display, EnumString};

use crate::error::{ErrorSeverity, SheetError};
use crate::feature::Feature;
use crate::prereq::PrereqList;

use super::Satisfaction;

/// Default target naming another skill rather than an attribute.
pub const SKILL_DEFAULT_TARGET: &str = "skill";

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DifficultyLevel {
    #[strum(serialize = "e")]
    #[cfg_attr(feature = "serde", serde(rename = "e"))]
    Easy,
    #[default]
    #[strum(serialize = "a")]
    #[cfg_attr(feature = "serde", serde(rename = "a"))]
    Average,
    #[strum(serialize = "h")]
    #[cfg_attr(feature = "serde", serde(rename = "h"))]
    Hard,
    #[strum(serialize = "vh")]
    #[cfg_attr(feature = "serde", serde(rename = "vh"))]
    VeryHard,
    #[strum(serialize = "w")]
    #[cfg_attr(feature = "serde", serde(rename = "w"))]
    Wildcard,
}

impl DifficultyLevel {
    /// Level relative to the controlling attribute for one point spent.
    pub const fn base_relative_level(self) -> i32 {
        match self {
            Self::Easy => 0,
            Self::Average => -1,
            Self::Hard => -2,
            Self::VeryHard | Self::Wildcard => -3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid difficulty `{0}`, expected `<attribute>/<e|a|h|vh|w>`")]
pub struct ParseDifficultyError(pub String);

impl SheetError for ParseDifficultyError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "DIFFICULTY_INVALID"
    }
}

/// Controlling attribute plus difficulty level, persisted as `dx/a`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Difficulty {
    pub attribute: String,
    pub level: DifficultyLevel,
}

impl Difficulty {
    pub fn new(attribute: impl Into<String>, level: DifficultyLevel) -> Self {
        Self {
            attribute: attribute.into(),
            level,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::new("dx", DifficultyLevel::Average)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.attribute, self.level)
    }
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDifficultyError(s.to_string());
        // Techniques persist without an attribute, as `/a`.
        let (attribute, level) = s.trim().split_once('/').ok_or_else(invalid)?;
        let level = level.trim().parse().map_err(|_| invalid())?;
        Ok(Self::new(attribute.trim().to_lowercase(), level))
    }
}

serde_via_str!(Difficulty);

/// A way of using a skill untrained: an attribute, or another skill, plus a
/// modifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SkillDefault {
    /// Attribute id, or [`SKILL_DEFAULT_TARGET`].
    pub target: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub specialization: String,
    pub modifier: i32,
    /// Level the default grants, set when it is chosen as the best default.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub level: i32,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub adjusted_level: i32,
    /// Point equivalent of the default.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub points: i32,
}

impl SkillDefault {
    pub fn attribute(attribute: impl Into<String>, modifier: i32) -> Self {
        Self {
            target: attribute.into(),
            modifier,
            ..Self::default()
        }
    }

    pub fn skill(name: impl Into<String>, modifier: i32) -> Self {
        Self {
            target: SKILL_DEFAULT_TARGET.to_string(),
            name: name.into(),
            modifier,
            ..Self::default()
        }
    }

    pub fn is_skill_based(&self) -> bool {
        self.target.eq_ignore_ascii_case(SKILL_DEFAULT_TARGET)
    }

    /// True if both name the same default, ignoring resolved levels.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.target.eq_ignore_ascii_case(&other.target)
            && self.name.eq_ignore_ascii_case(&other.name)
            && self.specialization.eq_ignore_ascii_case(&other.specialization)
            && self.modifier == other.modifier
    }

    /// `Broadsword (Fencing)` or the attribute id.
    pub fn full_name(&self) -> String {
        if !self.is_skill_based() {
            return self.target.clone();
        }
        if self.specialization.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.specialization)
        }
    }
}

/// Technique data: the default it builds on and an optional cap above it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct TechniqueSpec {
    pub default: SkillDefault,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub limit_modifier: Option<i32>,
}

/// Computed level of a skill, technique, or spell. `level` is `None` when the
/// trait cannot be used at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillLevel {
    pub level: Option<i32>,
    pub relative_level: i32,
    pub tooltip: String,
}

impl SkillLevel {
    pub fn unusable() -> Self {
        Self::default()
    }
}

/// A skill, a technique, or a container of them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct Skill {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub specialization: String,
    pub notes: String,
    pub container: bool,
    pub difficulty: Difficulty,
    pub points: i32,
    /// How many times the encumbrance penalty applies (0 to 9).
    pub encumbrance_penalty_multiplier: i32,
    pub categories: Vec<String>,
    pub defaults: Vec<SkillDefault>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub technique: Option<TechniqueSpec>,
    pub features: Vec<Feature>,
    pub prereqs: PrereqList,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub defaulted_from: Option<SkillDefault>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub level: SkillLevel,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub satisfaction: Satisfaction,
}

impl Default for Skill {
    fn default() -> Self {
        Self {
            name: String::new(),
            specialization: String::new(),
            notes: String::new(),
            container: false,
            difficulty: Difficulty::default(),
            points: 1,
            encumbrance_penalty_multiplier: 0,
            categories: Vec::new(),
            defaults: Vec::new(),
            technique: None,
            features: Vec::new(),
            prereqs: PrereqList::default(),
            defaulted_from: None,
            level: SkillLevel::unusable(),
            satisfaction: Satisfaction::default(),
        }
    }
}

impl Skill {
    pub fn new(name: impl Into<String>, difficulty: Difficulty, points: i32) -> Self {
        Self {
            name: name.into(),
            difficulty,
            points,
            ..Self::default()
        }
    }

    pub fn technique(
        name: impl Into<String>,
        level: DifficultyLevel,
        default: SkillDefault,
        points: i32,
    ) -> Self {
        Self {
            name: name.into(),
            difficulty: Difficulty::new(String::new(), level),
            points,
            technique: Some(TechniqueSpec {
                default,
                limit_modifier: None,
            }),
            ..Self::default()
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container: true,
            points: 0,
            ..Self::default()
        }
    }

    pub const fn is_technique(&self) -> bool {
        self.technique.is_some()
    }

    /// `Name (Specialization)`.
    pub fn full_name(&self) -> String {
        if self.specialization.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.specialization)
        }
    }

    /// Whether this skill answers to `name` and, if given, `specialization`.
    pub fn answers_to(&self, name: &str, specialization: &str) -> bool {
        !self.container
            && self.name.eq_ignore_ascii_case(name)
            && (specialization.is_empty() || self.specialization.eq_ignore_ascii_case(specialization))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_attribute_and_level() {
        let difficulty: Difficulty = "IQ/VH".parse().unwrap();
        assert_eq!(difficulty, Difficulty::new("iq", DifficultyLevel::VeryHard));
        assert_eq!(difficulty.to_string(), "iq/vh");
        assert!("dx".parse::<Difficulty>().is_err());
        assert!("dx/x".parse::<Difficulty>().is_err());
        assert_eq!("/h".parse::<Difficulty>().unwrap(), Difficulty::new("", DifficultyLevel::Hard));
    }

    #[test]
    fn base_relative_levels() {
        let levels: Vec<_> = [
            DifficultyLevel::Easy,
            DifficultyLevel::Average,
            DifficultyLevel::Hard,
            DifficultyLevel::VeryHard,
            DifficultyLevel::Wildcard,
        ]
        .iter()
        .map(|level| level.base_relative_level())
        .collect();
        assert_eq!(levels, [0, -1, -2, -3, -3]);
    }

    #[test]
    fn skill_names_match_case_insensitively() {
        let mut skill = Skill::new("Broadsword", Difficulty::default(), 4);
        skill.specialization = "Fencing".into();
        assert!(skill.answers_to("broadsword", ""));
        assert!(skill.answers_to("BROADSWORD", "fencing"));
        assert!(!skill.answers_to("broadsword", "cavalry"));
        assert_eq!(skill.full_name(), "Broadsword (Fencing)");
    }

    #[test]
    fn defaults_compare_without_resolved_state() {
        let mut chosen = SkillDefault::skill("Shortsword", -2);
        chosen.level = 9;
        chosen.points = 1;
        assert!(chosen.equivalent(&SkillDefault::skill("shortsword", -2)));
        assert!(!chosen.equivalent(&SkillDefault::attribute("dx", -2)));
    }
}
