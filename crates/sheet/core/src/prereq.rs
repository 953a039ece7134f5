//! Prerequisite trees and their evaluation.
//!
//! A trait's [`PrereqList`] is checked against a read-only [`SheetOracle`] once
//! per convergence pass. The trait that owns the list never satisfies its own
//! prerequisites. Failures are collected as `"\n- "` prefixed lines under
//! [`UNSATISFIED_HEADER`].

use crate::criteria::{NumericCompare, NumericCriteria, StringCompare, StringCriteria, WeightCriteria};
use crate::forest::{Forest, NodeId};
use crate::fxp::Fixed6;
use crate::model::{Advantage, Skill, Spell, TraitKind, TraitRef};
use crate::units::Weight;

pub const UNSATISFIED_HEADER: &str = "Prerequisites have not been met:";
pub const REASON_PREFIX: &str = "\n- ";

/// Read-only view of the sheet that prerequisites are checked against.
pub trait SheetOracle {
    fn advantages(&self) -> &Forest<Advantage>;
    fn skills(&self) -> &Forest<Skill>;
    fn spells(&self) -> &Forest<Spell>;
    /// Current value of an attribute, `None` for unknown ids.
    fn attribute_current(&self, id: &str) -> Option<Fixed6>;
    fn simple_metric(&self) -> bool;
}

/// Contents of an equipment container, for contained weight and quantity
/// prerequisites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contents {
    pub weight: Weight,
    pub quantity: Fixed6,
}

/// The trait whose prerequisites are being checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrereqOwner {
    pub trait_ref: TraitRef,
    /// Set only for equipment containers.
    pub contents: Option<Contents>,
}

impl PrereqOwner {
    pub const fn new(trait_ref: TraitRef) -> Self {
        Self {
            trait_ref,
            contents: None,
        }
    }

    #[must_use]
    pub const fn with_contents(mut self, contents: Contents) -> Self {
        self.contents = Some(contents);
        self
    }

    fn is(&self, kind: TraitKind, id: NodeId) -> bool {
        self.trait_ref == TraitRef::new(kind, id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct PrereqList {
    /// All prerequisites must hold; otherwise at least one.
    pub all: bool,
    pub prereqs: Vec<Prereq>,
}

impl Default for PrereqList {
    fn default() -> Self {
        Self {
            all: true,
            prereqs: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum Prereq {
    List(PrereqList),
    Advantage(AdvantagePrereq),
    Attribute(AttributePrereq),
    Skill(SkillPrereq),
    Spell(SpellPrereq),
    ContainedWeight(ContainedWeightPrereq),
    ContainedQuantity(ContainedQuantityPrereq),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct AdvantagePrereq {
    pub has: bool,
    pub name: StringCriteria,
    pub level: NumericCriteria,
    pub notes: StringCriteria,
}

impl Default for AdvantagePrereq {
    fn default() -> Self {
        Self {
            has: true,
            name: StringCriteria::is(""),
            level: NumericCriteria::any(),
            notes: StringCriteria::any(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct AttributePrereq {
    pub has: bool,
    pub which: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub combined_with: Option<String>,
    pub qualifier: NumericCriteria,
}

impl Default for AttributePrereq {
    fn default() -> Self {
        Self {
            has: true,
            which: "st".to_string(),
            combined_with: None,
            qualifier: NumericCriteria::at_least(10),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SkillPrereq {
    pub has: bool,
    pub name: StringCriteria,
    pub specialization: StringCriteria,
    pub level: NumericCriteria,
}

impl Default for SkillPrereq {
    fn default() -> Self {
        Self {
            has: true,
            name: StringCriteria::is(""),
            specialization: StringCriteria::any(),
            level: NumericCriteria::any(),
        }
    }
}

/// What a [`SpellPrereq`] counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SpellPrereqKind {
    #[default]
    Name,
    Category,
    College,
    /// Number of distinct colleges among matching spells.
    CollegeCount,
    Any,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SpellPrereq {
    pub has: bool,
    pub kind: SpellPrereqKind,
    pub qualifier: StringCriteria,
    pub quantity: NumericCriteria,
}

impl Default for SpellPrereq {
    fn default() -> Self {
        Self {
            has: true,
            kind: SpellPrereqKind::Name,
            qualifier: StringCriteria::is(""),
            quantity: NumericCriteria::at_least(1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct ContainedWeightPrereq {
    pub has: bool,
    pub qualifier: WeightCriteria,
}

impl Default for ContainedWeightPrereq {
    fn default() -> Self {
        Self {
            has: true,
            qualifier: WeightCriteria::new(NumericCompare::AtMost, Weight::pounds(5)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct ContainedQuantityPrereq {
    pub has: bool,
    pub qualifier: NumericCriteria,
}

impl Default for ContainedQuantityPrereq {
    fn default() -> Self {
        Self {
            has: true,
            qualifier: NumericCriteria::new(NumericCompare::AtMost, Fixed6::ONE),
        }
    }
}

fn has_text(has: bool) -> &'static str {
    if has { "Has" } else { "Does not have" }
}

fn indent(text: &str) -> String {
    text.replace('\n', "\n  ")
}

impl PrereqList {
    pub fn is_empty(&self) -> bool {
        self.prereqs.is_empty()
    }

    /// Checks this list as the root of a trait's prerequisites, appending one
    /// reason line per failure to `reasons`.
    pub fn check(&self, sheet: &dyn SheetOracle, owner: &PrereqOwner, reasons: &mut String) -> bool {
        let mut local = String::new();
        let satisfied = self.evaluate(sheet, owner, &mut local);
        if !satisfied {
            if self.all {
                reasons.push_str(&local);
            } else {
                reasons.push_str(REASON_PREFIX);
                reasons.push_str("Requires at least one of:");
                reasons.push_str(&indent(&local));
            }
        }
        satisfied
    }

    fn evaluate(&self, sheet: &dyn SheetOracle, owner: &PrereqOwner, local: &mut String) -> bool {
        let met = self
            .prereqs
            .iter()
            .filter(|prereq| prereq.satisfied(sheet, owner, local))
            .count();
        met == self.prereqs.len() || (!self.all && met > 0)
    }

    fn satisfied_nested(&self, sheet: &dyn SheetOracle, owner: &PrereqOwner, reasons: &mut String) -> bool {
        let mut local = String::new();
        let satisfied = self.evaluate(sheet, owner, &mut local);
        if !satisfied {
            reasons.push_str(REASON_PREFIX);
            reasons.push_str(if self.all {
                "Requires all of:"
            } else {
                "Requires at least one of:"
            });
            reasons.push_str(&indent(&local));
        }
        satisfied
    }
}

impl Prereq {
    pub fn satisfied(&self, sheet: &dyn SheetOracle, owner: &PrereqOwner, reasons: &mut String) -> bool {
        let (has, found) = match self {
            Self::List(list) => return list.satisfied_nested(sheet, owner, reasons),
            Self::Advantage(prereq) => (prereq.has, prereq.found(sheet, owner)),
            Self::Attribute(prereq) => (prereq.has, prereq.found(sheet)),
            Self::Skill(prereq) => (prereq.has, prereq.found(sheet, owner)),
            Self::Spell(prereq) => (prereq.has, prereq.found(sheet, owner)),
            Self::ContainedWeight(prereq) => (prereq.has, prereq.found(sheet, owner)),
            Self::ContainedQuantity(prereq) => (prereq.has, prereq.found(owner)),
        };
        let satisfied = found == has;
        if !satisfied {
            reasons.push_str(REASON_PREFIX);
            reasons.push_str(&self.describe());
        }
        satisfied
    }

    /// One-line description of the requirement.
    pub fn describe(&self) -> String {
        match self {
            Self::List(list) => format!(
                "Requires {} of {} prerequisites",
                if list.all { "all" } else { "one" },
                list.prereqs.len()
            ),
            Self::Advantage(prereq) => {
                let mut text = format!(
                    "{} an advantage whose name {}",
                    has_text(prereq.has),
                    prereq.name.describe()
                );
                if prereq.notes.compare != StringCompare::Any {
                    text.push_str(&format!(", notes {}", prereq.notes.describe()));
                }
                if prereq.level.compare != NumericCompare::Any {
                    text.push_str(&format!(", and level {}", prereq.level.describe()));
                }
                text
            }
            Self::Attribute(prereq) => {
                let mut which = prereq.which.to_uppercase();
                if let Some(other) = &prereq.combined_with {
                    which = format!("{which}+{}", other.to_uppercase());
                }
                format!(
                    "{} {which} which is {}",
                    has_text(prereq.has),
                    prereq.qualifier.describe()
                )
            }
            Self::Skill(prereq) => {
                let mut text = format!(
                    "{} a skill whose name {}",
                    has_text(prereq.has),
                    prereq.name.describe()
                );
                if prereq.specialization.compare != StringCompare::Any {
                    text.push_str(&format!(
                        ", specialization {}",
                        prereq.specialization.describe()
                    ));
                }
                if prereq.level.compare != NumericCompare::Any {
                    text.push_str(&format!(", and level {}", prereq.level.describe()));
                }
                text
            }
            Self::Spell(prereq) => {
                let subject = match prereq.kind {
                    SpellPrereqKind::Name => format!("whose name {}", prereq.qualifier.describe()),
                    SpellPrereqKind::Category => {
                        format!("whose category {}", prereq.qualifier.describe())
                    }
                    SpellPrereqKind::College => {
                        format!("whose college {}", prereq.qualifier.describe())
                    }
                    SpellPrereqKind::CollegeCount => "from distinct colleges".to_string(),
                    SpellPrereqKind::Any => "of any kind".to_string(),
                };
                format!(
                    "{} spells {subject}, count {}",
                    has_text(prereq.has),
                    prereq.quantity.describe()
                )
            }
            Self::ContainedWeight(prereq) => format!(
                "{} a contained weight which {}",
                has_text(prereq.has),
                prereq.qualifier.describe()
            ),
            Self::ContainedQuantity(prereq) => format!(
                "{} a contained quantity which {}",
                has_text(prereq.has),
                prereq.qualifier.describe()
            ),
        }
    }
}

impl AdvantagePrereq {
    fn found(&self, sheet: &dyn SheetOracle, owner: &PrereqOwner) -> bool {
        let advantages = sheet.advantages();
        advantages.iter().any(|(id, advantage)| {
            !owner.is(TraitKind::Advantage, id)
                && advantage.enabled
                && self.name.matches(&advantage.name)
                && self.notes.matches(&advantage.notes)
                && self.level.matches_int(advantage.level_count())
        })
    }
}

impl AttributePrereq {
    fn found(&self, sheet: &dyn SheetOracle) -> bool {
        let Some(mut value) = sheet.attribute_current(&self.which) else {
            tracing::warn!(attribute = %self.which, "prerequisite names an unknown attribute");
            return false;
        };
        if let Some(other) = &self.combined_with {
            match sheet.attribute_current(other) {
                Some(extra) => value += extra,
                None => {
                    tracing::warn!(attribute = %other, "prerequisite names an unknown attribute");
                    return false;
                }
            }
        }
        self.qualifier.matches(value)
    }
}

impl SkillPrereq {
    fn found(&self, sheet: &dyn SheetOracle, owner: &PrereqOwner) -> bool {
        sheet.skills().iter().any(|(id, skill)| {
            !owner.is(TraitKind::Skill, id)
                && !skill.container
                && self.name.matches(&skill.name)
                && self.specialization.matches(&skill.specialization)
                && skill
                    .level
                    .level
                    .map_or(self.level.compare == NumericCompare::Any, |level| {
                        self.level.matches_int(level)
                    })
        })
    }
}

impl SpellPrereq {
    fn found(&self, sheet: &dyn SheetOracle, owner: &PrereqOwner) -> bool {
        let spells = sheet
            .spells()
            .iter()
            .filter(|(id, spell)| !owner.is(TraitKind::Spell, *id) && !spell.container)
            .map(|(_, spell)| spell);
        let count = match self.kind {
            SpellPrereqKind::Name => spells.filter(|spell| self.qualifier.matches(&spell.name)).count(),
            SpellPrereqKind::Category => spells
                .filter(|spell| {
                    spell
                        .categories
                        .iter()
                        .any(|category| self.qualifier.matches(category))
                })
                .count(),
            SpellPrereqKind::College => spells
                .filter(|spell| spell.colleges.iter().any(|college| self.qualifier.matches(college)))
                .count(),
            SpellPrereqKind::CollegeCount => {
                let mut colleges: Vec<String> = spells
                    .flat_map(|spell| spell.colleges.iter().map(|college| college.to_lowercase()))
                    .collect();
                colleges.sort_unstable();
                colleges.dedup();
                colleges.len()
            }
            SpellPrereqKind::Any => spells.count(),
        };
        self.quantity
            .matches_int(i32::try_from(count).unwrap_or(i32::MAX))
    }
}

impl ContainedWeightPrereq {
    fn found(&self, sheet: &dyn SheetOracle, owner: &PrereqOwner) -> bool {
        match owner.contents {
            // Only containers can fail a contained weight check.
            None => self.has,
            Some(contents) => self.qualifier.matches(contents.weight, sheet.simple_metric()),
        }
    }
}

impl ContainedQuantityPrereq {
    fn found(&self, owner: &PrereqOwner) -> bool {
        match owner.contents {
            None => self.has,
            Some(contents) => self.qualifier.matches(contents.quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{Difficulty, SkillLevel};

    #[derive(Default)]
    struct Sheet {
        advantages: Forest<Advantage>,
        skills: Forest<Skill>,
        spells: Forest<Spell>,
        attributes: BTreeMap<String, Fixed6>,
    }

    impl SheetOracle for Sheet {
        fn advantages(&self) -> &Forest<Advantage> {
            &self.advantages
        }

        fn skills(&self) -> &Forest<Skill> {
            &self.skills
        }

        fn spells(&self) -> &Forest<Spell> {
            &self.spells
        }

        fn attribute_current(&self, id: &str) -> Option<Fixed6> {
            self.attributes.get(id).copied()
        }

        fn simple_metric(&self) -> bool {
            true
        }
    }

    fn owner() -> PrereqOwner {
        PrereqOwner::new(TraitRef::new(TraitKind::Equipment, NodeId(99)))
    }

    fn attribute(which: &str, at_least: i64) -> Prereq {
        Prereq::Attribute(AttributePrereq {
            which: which.into(),
            qualifier: NumericCriteria::at_least(at_least),
            ..AttributePrereq::default()
        })
    }

    fn sheet() -> Sheet {
        let mut sheet = Sheet::default();
        sheet.attributes.insert("st".into(), Fixed6::from_int(12));
        sheet.attributes.insert("dx".into(), Fixed6::from_int(10));
        sheet
    }

    #[test]
    fn all_list_reports_each_failure() {
        let list = PrereqList {
            all: true,
            prereqs: vec![attribute("st", 13), attribute("dx", 10), attribute("dx", 11)],
        };
        let mut reasons = String::new();
        assert!(!list.check(&sheet(), &owner(), &mut reasons));
        assert_eq!(
            reasons,
            "\n- Has ST which is at least 13\n- Has DX which is at least 11"
        );
    }

    #[test]
    fn any_list_needs_one() {
        let list = PrereqList {
            all: false,
            prereqs: vec![attribute("st", 13), attribute("st", 12)],
        };
        let mut reasons = String::new();
        assert!(list.check(&sheet(), &owner(), &mut reasons));
        assert!(reasons.is_empty());
    }

    #[test]
    fn combined_and_unknown_attributes() {
        let combined = Prereq::Attribute(AttributePrereq {
            which: "st".into(),
            combined_with: Some("dx".into()),
            qualifier: NumericCriteria::at_least(22),
            ..AttributePrereq::default()
        });
        let mut reasons = String::new();
        assert!(combined.satisfied(&sheet(), &owner(), &mut reasons));
        assert!(!attribute("luck", 1).satisfied(&sheet(), &owner(), &mut reasons));
    }

    #[test]
    fn owner_never_satisfies_itself() {
        let mut sheet = sheet();
        let id = sheet.advantages.push_root(Advantage::new("Magery", 15));
        let prereq = Prereq::Advantage(AdvantagePrereq {
            name: StringCriteria::is("magery"),
            ..AdvantagePrereq::default()
        });
        let mut reasons = String::new();
        assert!(prereq.satisfied(&sheet, &owner(), &mut reasons));
        let itself = PrereqOwner::new(TraitRef::new(TraitKind::Advantage, id));
        assert!(!prereq.satisfied(&sheet, &itself, &mut reasons));
    }

    #[test]
    fn negated_skill_prereq() {
        let mut sheet = sheet();
        let mut skill = Skill::new("Lockpicking", Difficulty::default(), 2);
        skill.level = SkillLevel {
            level: Some(11),
            ..SkillLevel::default()
        };
        sheet.skills.push_root(skill);
        let lacks = Prereq::Skill(SkillPrereq {
            has: false,
            name: StringCriteria::is("Lockpicking"),
            ..SkillPrereq::default()
        });
        let mut reasons = String::new();
        assert!(!lacks.satisfied(&sheet, &owner(), &mut reasons));
        assert!(reasons.starts_with("\n- Does not have a skill whose name is \"Lockpicking\""));
    }

    #[test]
    fn college_count_counts_distinct_colleges() {
        let mut sheet = sheet();
        sheet.spells.push_root(Spell::new("Ignite Fire", &["Fire"], 1));
        sheet.spells.push_root(Spell::new("Create Fire", &["fire"], 1));
        sheet.spells.push_root(Spell::new("Shape Earth", &["Earth"], 1));
        let prereq = Prereq::Spell(SpellPrereq {
            kind: SpellPrereqKind::CollegeCount,
            quantity: NumericCriteria::at_least(2),
            ..SpellPrereq::default()
        });
        let mut reasons = String::new();
        assert!(prereq.satisfied(&sheet, &owner(), &mut reasons));
    }

    #[test]
    fn contained_weight_applies_only_to_containers() {
        let prereq = Prereq::ContainedWeight(ContainedWeightPrereq::default());
        let mut reasons = String::new();
        assert!(prereq.satisfied(&sheet(), &owner(), &mut reasons));
        let full = owner().with_contents(Contents {
            weight: Weight::pounds(8),
            quantity: Fixed6::from_int(3),
        });
        assert!(!prereq.satisfied(&sheet(), &full, &mut reasons));
        assert_eq!(reasons, "\n- Has a contained weight which at most 5 lb");
    }

    #[test]
    fn nested_lists_indent_their_reasons() {
        let list = PrereqList {
            all: true,
            prereqs: vec![Prereq::List(PrereqList {
                all: false,
                prereqs: vec![attribute("st", 14), attribute("dx", 14)],
            })],
        };
        let mut reasons = String::new();
        assert!(!list.check(&sheet(), &owner(), &mut reasons));
        assert_eq!(
            reasons,
            "\n- Requires at least one of:\n  - Has ST which is at least 14\n  - Has DX which is at least 14"
        );
    }
}
