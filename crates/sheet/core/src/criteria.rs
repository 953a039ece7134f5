//! Predicates deciding whether a bonus or prerequisite applies to a candidate.

use strum::{AsRefStr, Display, EnumString};

use crate::fxp::Fixed6;
use crate::units::Weight;

/// Comparison applied by a [`StringCriteria`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum StringCompare {
    #[default]
    Any,
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    StartsWith,
    DoesNotStartWith,
    EndsWith,
    DoesNotEndWith,
}

impl StringCompare {
    fn phrase(self) -> &'static str {
        match self {
            Self::Any => "is anything",
            Self::Is => "is",
            Self::IsNot => "is not",
            Self::Contains => "contains",
            Self::DoesNotContain => "does not contain",
            Self::StartsWith => "starts with",
            Self::DoesNotStartWith => "does not start with",
            Self::EndsWith => "ends with",
            Self::DoesNotEndWith => "does not end with",
        }
    }
}

/// Case-insensitive string predicate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct StringCriteria {
    pub compare: StringCompare,
    pub qualifier: String,
}

impl StringCriteria {
    pub fn new(compare: StringCompare, qualifier: impl Into<String>) -> Self {
        Self {
            compare,
            qualifier: qualifier.into(),
        }
    }

    /// Matches every candidate.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is(qualifier: impl Into<String>) -> Self {
        Self::new(StringCompare::Is, qualifier)
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        let qualifier = self.qualifier.to_lowercase();
        match self.compare {
            StringCompare::Any => true,
            StringCompare::Is => candidate == qualifier,
            StringCompare::IsNot => candidate != qualifier,
            StringCompare::Contains => candidate.contains(&qualifier),
            StringCompare::DoesNotContain => !candidate.contains(&qualifier),
            StringCompare::StartsWith => candidate.starts_with(&qualifier),
            StringCompare::DoesNotStartWith => !candidate.starts_with(&qualifier),
            StringCompare::EndsWith => candidate.ends_with(&qualifier),
            StringCompare::DoesNotEndWith => !candidate.ends_with(&qualifier),
        }
    }

    /// True if any category matches. With no match at all, the criteria still
    /// passes when it would accept the empty string, so "any" and negated
    /// criteria accept uncategorized traits.
    pub fn matches_categories<'a, I>(&self, categories: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        categories.into_iter().any(|category| self.matches(category)) || self.matches("")
    }

    pub fn describe(&self) -> String {
        match self.compare {
            StringCompare::Any => self.compare.phrase().to_string(),
            _ => format!("{} \"{}\"", self.compare.phrase(), self.qualifier),
        }
    }
}

/// Comparison applied by a [`NumericCriteria`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum NumericCompare {
    Any,
    Equals,
    NotEquals,
    #[default]
    AtLeast,
    AtMost,
    GreaterThan,
    LessThan,
}

impl NumericCompare {
    pub fn compare(self, candidate: Fixed6, qualifier: Fixed6) -> bool {
        match self {
            Self::Any => true,
            Self::Equals => candidate == qualifier,
            Self::NotEquals => candidate != qualifier,
            Self::AtLeast => candidate >= qualifier,
            Self::AtMost => candidate <= qualifier,
            Self::GreaterThan => candidate > qualifier,
            Self::LessThan => candidate < qualifier,
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            Self::Any => "is anything",
            Self::Equals => "is",
            Self::NotEquals => "is not",
            Self::AtLeast => "at least",
            Self::AtMost => "at most",
            Self::GreaterThan => "greater than",
            Self::LessThan => "less than",
        }
    }
}

/// Numeric predicate over fixed-point values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct NumericCriteria {
    pub compare: NumericCompare,
    pub qualifier: Fixed6,
}

impl NumericCriteria {
    pub const fn new(compare: NumericCompare, qualifier: Fixed6) -> Self {
        Self { compare, qualifier }
    }

    pub const fn any() -> Self {
        Self::new(NumericCompare::Any, Fixed6::ZERO)
    }

    pub const fn at_least(qualifier: i64) -> Self {
        Self::new(NumericCompare::AtLeast, Fixed6::from_int(qualifier))
    }

    pub fn matches(&self, candidate: Fixed6) -> bool {
        self.compare.compare(candidate, self.qualifier)
    }

    pub fn matches_int(&self, candidate: i32) -> bool {
        self.matches(Fixed6::from(candidate))
    }

    pub fn describe(&self) -> String {
        match self.compare {
            NumericCompare::Any => self.compare.phrase().to_string(),
            _ => format!("{} {}", self.compare.phrase(), self.qualifier),
        }
    }
}

/// Numeric predicate over weights; candidates are converted into the
/// qualifier's units before comparing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct WeightCriteria {
    pub compare: NumericCompare,
    pub qualifier: Weight,
}

impl WeightCriteria {
    pub const fn new(compare: NumericCompare, qualifier: Weight) -> Self {
        Self { compare, qualifier }
    }

    pub fn matches(&self, candidate: Weight, simple_metric: bool) -> bool {
        match candidate.convert_to(self.qualifier.units, simple_metric) {
            Ok(converted) => self.compare.compare(converted.value, self.qualifier.value),
            Err(_) => false,
        }
    }

    pub fn describe(&self) -> String {
        match self.compare {
            NumericCompare::Any => self.compare.phrase().to_string(),
            _ => format!("{} {}", self.compare.phrase(), self.qualifier),
        }
    }
}
