use crate::attribute::{AttributeKind, resolve_attributes};
use crate::error::CalcResult;
use crate::forest::{Forest, NodeId};
use crate::index::FeatureIndex;
use crate::model::{Equipment, Satisfaction, SkillLevel, TraitKind, TraitRef};
use crate::prereq::{Contents, PrereqList, PrereqOwner, REASON_PREFIX, UNSATISFIED_HEADER};

use super::delta::{Recalculation, SheetFields};
use super::points::{self, PointInputs};
use super::resolved::{ResolvedSheet, SIZE_MODIFIER};
use super::{Character, weight};

impl Character {
    /// Brings every derived value up to date.
    ///
    /// Equipment totals are computed once, then up to
    /// [`SheetSettings::max_iterations`](crate::config::SheetSettings::max_iterations)
    /// passes rebuild the feature index, resolve attributes, recompute levels
    /// and check prerequisites, stopping early once a pass leaves every level
    /// where it was. Hitting the cap is not an error. Point totals are
    /// computed last.
    pub fn recalculate(&mut self) -> CalcResult<Recalculation> {
        let previous = self.resolved.clone();
        let levels_before = self.level_snapshot();
        let prereqs_before = self.satisfaction_snapshot();

        let units = self.settings.default_weight_units;
        let simple = self.settings.use_simple_metric_conversions;
        weight::update_extended(&mut self.equipment, units, simple)?;
        weight::update_extended(&mut self.other_equipment, units, simple)?;
        self.resolved = ResolvedSheet {
            carried_weight: weight::carried_weight(&self.equipment, false, units),
            carried_weight_for_skills: weight::carried_weight(&self.equipment, true, units),
            wealth_carried: weight::wealth(&self.equipment),
            wealth_not_carried: weight::wealth(&self.other_equipment),
            ..ResolvedSheet::default()
        };

        let limit = self.settings.max_iterations.max(1);
        let mut passes = 0;
        loop {
            passes += 1;
            self.index = FeatureIndex::build(&self.advantages, &self.skills, &self.equipment);
            self.apply_attribute_features();
            self.resolved.size_modifier =
                self.size_modifier + self.index.attribute_bonus(SIZE_MODIFIER, None, true, None).to_i32();
            self.resolved.attributes =
                resolve_attributes(&self.settings.attributes, &self.attributes, self.resolved.size_modifier)?;
            self.resolved.derive(&self.index, &self.settings)?;

            let levels_changed = self.update_levels();
            self.update_prereqs();
            tracing::debug!(pass = passes, levels_changed, "convergence pass");
            if !levels_changed || passes >= limit {
                break;
            }
        }

        self.resolved.points = points::compute(&PointInputs {
            defs: &self.settings.attributes,
            attributes: &self.attributes,
            size_modifier: self.resolved.size_modifier,
            progression: self.settings.damage_progression,
            advantages: &self.advantages,
            skills: &self.skills,
            spells: &self.spells,
            total_points: self.total_points,
        })?;

        let mut changed = SheetFields::from_states(&previous, &self.resolved);
        if self.level_snapshot() != levels_before {
            changed |= SheetFields::LEVELS;
        }
        if self.satisfaction_snapshot() != prereqs_before {
            changed |= SheetFields::PREREQS;
        }
        tracing::debug!(passes, ?changed, unspent = self.resolved.points.unspent, "recalculated");
        Ok(Recalculation { passes, changed })
    }

    /// Copies attribute bonuses and cost reductions from the index onto the
    /// allocations.
    fn apply_attribute_features(&mut self) {
        for def in &self.settings.attributes {
            let integer = def.kind != AttributeKind::Decimal;
            let attribute = self.attributes.entry(def.id.clone()).or_default();
            attribute.bonus = self.index.attribute_bonus(&def.id, None, integer, None);
            attribute.cost_reduction = self.index.cost_reduction(&def.id);
        }
    }

    fn level_snapshot(&self) -> Vec<SkillLevel> {
        let skills = self.skills.iter().map(|(_, skill)| skill.level.clone());
        let spells = self.spells.iter().map(|(_, spell)| spell.level.clone());
        skills.chain(spells).collect()
    }

    fn satisfaction_snapshot(&self) -> Vec<Satisfaction> {
        let mut all: Vec<Satisfaction> = Vec::new();
        all.extend(self.advantages.iter().map(|(_, advantage)| advantage.satisfaction.clone()));
        all.extend(self.skills.iter().map(|(_, skill)| skill.satisfaction.clone()));
        all.extend(self.spells.iter().map(|(_, spell)| spell.satisfaction.clone()));
        all.extend(self.equipment.iter().map(|(_, item)| item.satisfaction.clone()));
        all.extend(self.other_equipment.iter().map(|(_, item)| item.satisfaction.clone()));
        all
    }

    fn check(&self, prereqs: &PrereqList, owner: &PrereqOwner, mut reasons: String) -> Satisfaction {
        let met = prereqs.check(self, owner, &mut reasons);
        if met && reasons.is_empty() {
            Satisfaction::default()
        } else {
            Satisfaction::unsatisfied(format!("{UNSATISFIED_HEADER}{reasons}"))
        }
    }

    /// Reasons a technique cannot be used, beyond its prerequisite list.
    fn technique_reasons(&self, id: NodeId) -> String {
        let Some(def) = self
            .skills
            .get(id)
            .and_then(|skill| skill.technique.as_ref())
            .map(|technique| &technique.default)
            .filter(|def| def.is_skill_based())
        else {
            return String::new();
        };
        let mut candidates = self
            .skills
            .iter()
            .filter(|(other, skill)| *other != id && skill.answers_to(&def.name, &def.specialization))
            .peekable();
        if candidates.peek().is_none() {
            format!("{REASON_PREFIX}Requires a skill named {}", def.full_name())
        } else if !candidates.any(|(_, skill)| skill.is_technique() || skill.points > 0) {
            format!("{REASON_PREFIX}Requires at least 1 point in the skill named {}", def.full_name())
        } else {
            String::new()
        }
    }

    fn equipment_satisfactions(&self, forest: &Forest<Equipment>, kind: TraitKind) -> Vec<(NodeId, Satisfaction)> {
        let units = self.settings.default_weight_units;
        forest
            .iter()
            .map(|(id, item)| {
                let mut owner = PrereqOwner::new(TraitRef::new(kind, id));
                if forest.has_children(id) {
                    let (weight, quantity) = weight::contents_of(forest, id, units);
                    owner = owner.with_contents(Contents { weight, quantity });
                }
                (id, self.check(&item.prereqs, &owner, String::new()))
            })
            .collect()
    }

    /// Re-evaluates the prerequisites of every trait against the current
    /// state, then records the results.
    pub(super) fn update_prereqs(&mut self) {
        let owner = |kind, id| PrereqOwner::new(TraitRef::new(kind, id));
        let advantages: Vec<_> = self
            .advantages
            .iter()
            .map(|(id, advantage)| {
                (id, self.check(&advantage.prereqs, &owner(TraitKind::Advantage, id), String::new()))
            })
            .collect();
        let skills: Vec<_> = self
            .skills
            .iter()
            .map(|(id, skill)| {
                let extra = self.technique_reasons(id);
                (id, self.check(&skill.prereqs, &owner(TraitKind::Skill, id), extra))
            })
            .collect();
        let spells: Vec<_> = self
            .spells
            .iter()
            .map(|(id, spell)| (id, self.check(&spell.prereqs, &owner(TraitKind::Spell, id), String::new())))
            .collect();
        let equipment = self.equipment_satisfactions(&self.equipment, TraitKind::Equipment);
        let other_equipment = self.equipment_satisfactions(&self.other_equipment, TraitKind::OtherEquipment);

        for (id, satisfaction) in advantages {
            if let Some(advantage) = self.advantages.get_mut(id) {
                advantage.satisfaction = satisfaction;
            }
        }
        for (id, satisfaction) in skills {
            if let Some(skill) = self.skills.get_mut(id) {
                skill.satisfaction = satisfaction;
            }
        }
        for (id, satisfaction) in spells {
            if let Some(spell) = self.spells.get_mut(id) {
                spell.satisfaction = satisfaction;
            }
        }
        for (id, satisfaction) in equipment {
            if let Some(item) = self.equipment.get_mut(id) {
                item.satisfaction = satisfaction;
            }
        }
        for (id, satisfaction) in other_equipment {
            if let Some(item) = self.other_equipment.get_mut(id) {
                item.satisfaction = satisfaction;
            }
        }
    }
}
