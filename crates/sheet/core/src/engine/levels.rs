//! Skill, technique and spell levels.
//!
//! Every level read from another trait uses the level that trait stored on the
//! previous pass, so two traits that default to each other drift apart one
//! pass at a time instead of recursing.

use std::collections::BTreeSet;

use crate::forest::NodeId;
use crate::model::{DifficultyLevel, Skill, SkillDefault, SkillLevel, Spell};

use super::Character;

/// Relative level bought with `points`, on top of the difficulty's base.
/// `None` when the points buy nothing.
fn points_to_relative(points: i32) -> Option<i32> {
    match points {
        1 => Some(0),
        2 | 3 => Some(1),
        p if p >= 4 => Some(1 + p / 4),
        _ => None,
    }
}

impl Character {
    fn attribute_level(&self, id: &str) -> Option<i32> {
        self.resolved
            .attributes
            .get(&id.to_lowercase())
            .map(|values| values.current.trunc().to_i32())
    }

    /// Skills answering to `name`, except `exclude`. With `require_points`,
    /// skills without points are skipped; techniques always qualify.
    fn skills_named<'a>(
        &'a self,
        name: &'a str,
        specialization: &'a str,
        require_points: bool,
        exclude: Option<NodeId>,
    ) -> impl Iterator<Item = (NodeId, &'a Skill)> + 'a {
        self.skills.iter().filter(move |(id, skill)| {
            Some(*id) != exclude
                && skill.answers_to(name, specialization)
                && (!require_points || skill.is_technique() || skill.points > 0)
        })
    }

    /// Highest stored level among the skills answering to `name`.
    fn best_skill_level(
        &self,
        name: &str,
        specialization: &str,
        require_points: bool,
        exclude: Option<NodeId>,
    ) -> Option<i32> {
        self.skills_named(name, specialization, require_points, exclude)
            .filter_map(|(_, skill)| skill.level.level)
            .max()
    }

    /// True if `def` leads, through the defaults other skills are currently
    /// using, back to `skill_id`.
    fn in_default_chain(
        &self,
        skill_id: NodeId,
        def: Option<&SkillDefault>,
        looked_at: &mut BTreeSet<NodeId>,
    ) -> bool {
        let Some(def) = def.filter(|def| def.is_skill_based()) else {
            return false;
        };
        for (id, other) in self.skills_named(&def.name, &def.specialization, true, None) {
            if id == skill_id {
                return true;
            }
            if looked_at.insert(id) && self.in_default_chain(skill_id, other.defaulted_from.as_ref(), looked_at) {
                return true;
            }
        }
        false
    }

    fn default_level(&self, skill_id: NodeId, skill: &Skill, def: &SkillDefault) -> Option<i32> {
        if def.is_skill_based() {
            let level = self.best_skill_level(&def.name, &def.specialization, true, Some(skill_id))?;
            let bonus = self
                .index
                .skill_bonus(&def.name, &def.specialization, &skill.categories, None);
            Some(level + def.modifier - bonus)
        } else {
            Some(self.attribute_level(&def.target)? + def.modifier)
        }
    }

    /// The best usable default of a skill, with its point equivalent.
    fn best_default_with_points(&self, skill_id: NodeId, skill: &Skill) -> Option<SkillDefault> {
        if skill.is_technique() {
            return None;
        }
        let mut best: Option<(i32, &SkillDefault)> = None;
        for def in &skill.defaults {
            if self.in_default_chain(skill_id, Some(def), &mut BTreeSet::new()) {
                continue;
            }
            let Some(level) = self.default_level(skill_id, skill, def) else { continue };
            if best.is_none_or(|(best_level, _)| level > best_level) {
                best = Some((level, def));
            }
        }
        let (level, def) = best?;
        let baseline =
            self.attribute_level(&skill.difficulty.attribute)? + skill.difficulty.level.base_relative_level();
        let points = if level == baseline {
            1
        } else if level == baseline + 1 {
            2
        } else if level > baseline + 1 {
            4 * (level - (baseline + 1))
        } else {
            -level.max(0)
        };
        Some(SkillDefault {
            level,
            adjusted_level: level,
            points,
            ..def.clone()
        })
    }

    fn skill_level(&self, skill_id: NodeId, skill: &Skill) -> (SkillLevel, Option<SkillDefault>) {
        if skill.container {
            return (SkillLevel::unusable(), None);
        }
        if skill.is_technique() {
            return (self.technique_level(skill_id, skill), None);
        }
        let def = self.best_default_with_points(skill_id, skill);
        let Some(mut level) = self.attribute_level(&skill.difficulty.attribute) else {
            return (SkillLevel::unusable(), def);
        };
        if self.settings.use_half_stat_defaults {
            level = level / 2 + 5;
        }
        let wildcard = skill.difficulty.level == DifficultyLevel::Wildcard;
        // Wildcard skills never fall back to a default.
        let fallback = def.as_ref().filter(|_| !wildcard);
        let mut relative = skill.difficulty.level.base_relative_level();
        let mut points = skill.points
            + self
                .index
                .skill_point_bonus(&skill.name, &skill.specialization, &skill.categories, None);
        if wildcard {
            points /= 3;
        } else if let Some(def) = fallback.filter(|def| def.points > 0) {
            points += def.points;
        }
        match (points_to_relative(points), fallback) {
            (Some(bought), _) => relative += bought,
            (None, Some(def)) if def.points < 0 => relative = def.adjusted_level - level,
            (None, _) => return (SkillLevel::unusable(), def),
        }
        level += relative;
        if let Some(def) = fallback {
            level = level.max(def.adjusted_level);
        }

        let mut tooltip = String::new();
        let bonus = self.index.skill_bonus(
            &skill.name,
            &skill.specialization,
            &skill.categories,
            Some(&mut tooltip),
        );
        level += bonus;
        relative += bonus;
        let penalty = self.resolved.encumbrance_for_skills.penalty() * skill.encumbrance_penalty_multiplier;
        if penalty != 0 {
            level += penalty;
            tooltip.push_str(&format!("\nEncumbrance [{penalty:+}]"));
        }
        let computed = SkillLevel {
            level: Some(level),
            relative_level: relative,
            tooltip,
        };
        (computed, def)
    }

    fn technique_level(&self, skill_id: NodeId, skill: &Skill) -> SkillLevel {
        let Some(technique) = skill.technique.as_ref() else {
            return SkillLevel::unusable();
        };
        let def = &technique.default;
        let base = if def.is_skill_based() {
            self.best_skill_level(&def.name, &def.specialization, true, Some(skill_id))
        } else {
            self.attribute_level(&def.target)
        };
        let Some(base) = base else {
            return SkillLevel::unusable();
        };

        let mut points = skill.points
            + self
                .index
                .skill_point_bonus(&skill.name, &skill.specialization, &skill.categories, None);
        if skill.difficulty.level == DifficultyLevel::Hard {
            points -= 1;
        }
        let mut tooltip = String::new();
        let mut relative = points.max(0)
            + self.index.skill_bonus(
                &skill.name,
                &skill.specialization,
                &skill.categories,
                Some(&mut tooltip),
            );
        let mut level = base + def.modifier + relative;
        if let Some(limit) = technique.limit_modifier {
            let max = base + limit;
            if level > max {
                relative -= level - max;
                level = max;
            }
        }
        SkillLevel {
            level: Some(level),
            relative_level: relative,
            tooltip,
        }
    }

    fn spell_level(&self, spell: &Spell) -> SkillLevel {
        if spell.container {
            return SkillLevel::unusable();
        }
        let mut points = spell.points
            + self
                .index
                .spell_point_bonus(&spell.name, &spell.colleges, &spell.categories, None);
        if spell.difficulty.level == DifficultyLevel::Wildcard {
            points /= 3;
        }
        let (Some(base), Some(bought)) = (
            self.attribute_level(&spell.difficulty.attribute),
            points_to_relative(points),
        ) else {
            return SkillLevel::unusable();
        };
        let mut tooltip = String::new();
        let relative = spell.difficulty.level.base_relative_level()
            + bought
            + self.index.spell_bonus(
                &spell.name,
                &spell.colleges,
                &spell.categories,
                Some(&mut tooltip),
            );
        SkillLevel {
            level: Some(base + relative),
            relative_level: relative,
            tooltip,
        }
    }

    /// Recomputes every skill, technique and spell level from the levels
    /// stored on the previous pass. Returns true if any level moved.
    pub(super) fn update_levels(&mut self) -> bool {
        let skills: Vec<_> = self
            .skills
            .iter()
            .map(|(id, skill)| {
                let (level, def) = self.skill_level(id, skill);
                (id, level, def)
            })
            .collect();
        let spells: Vec<_> = self
            .spells
            .iter()
            .map(|(id, spell)| (id, self.spell_level(spell)))
            .collect();

        let mut changed = false;
        for (id, level, def) in skills {
            if let Some(skill) = self.skills.get_mut(id) {
                changed |= skill.level != level;
                skill.level = level;
                skill.defaulted_from = def;
            }
        }
        for (id, level) in spells {
            if let Some(spell) = self.spells.get_mut(id) {
                changed |= spell.level != level;
                spell.level = level;
            }
        }
        changed
    }
}
