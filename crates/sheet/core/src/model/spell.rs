use crate::prereq::PrereqList;

use super::skill::{Difficulty, DifficultyLevel, SkillLevel};
use super::Satisfaction;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct Spell {
    pub name: String,
    pub notes: String,
    pub container: bool,
    pub colleges: Vec<String>,
    pub difficulty: Difficulty,
    pub points: i32,
    pub categories: Vec<String>,
    pub prereqs: PrereqList,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub level: SkillLevel,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub satisfaction: Satisfaction,
}

impl Default for Spell {
    fn default() -> Self {
        Self {
            name: String::new(),
            notes: String::new(),
            container: false,
            colleges: Vec::new(),
            difficulty: Difficulty::new("iq", DifficultyLevel::Hard),
            points: 1,
            categories: Vec::new(),
            prereqs: PrereqList::default(),
            level: SkillLevel::unusable(),
            satisfaction: Satisfaction::default(),
        }
    }
}

impl Spell {
    pub fn new(name: impl Into<String>, colleges: &[&str], points: i32) -> Self {
        Self {
            name: name.into(),
            colleges: colleges.iter().map(|college| (*college).to_string()).collect(),
            points,
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

    pub fn in_college(&self, college: &str) -> bool {
        self.colleges
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(college))
    }
}
