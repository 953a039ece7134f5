//! The feature index: every active feature of the sheet, filed by key.
//!
//! Rebuilt from scratch on every convergence pass. Each entry is a copy of the
//! trait's feature with its leveled amount evaluated, tagged with the
//! [`TraitRef`] and name of the trait that granted it. The back-reference is
//! only used for tooltips.

use std::collections::{BTreeMap, BTreeSet};

use crate::attribute::MAX_COST_REDUCTION;
use crate::feature::{
    ATTRIBUTE_PREFIX, CONDITIONAL_KEY, DR_PREFIX, DrBonus, Feature, REACTION_KEY,
    SKILL_NAME_PREFIX, SKILL_POINTS_PREFIX, SPELL_COLLEGE_PREFIX, SPELL_NAME_PREFIX,
    SPELL_POINTS_COLLEGE_PREFIX, SPELL_POINTS_NAME_PREFIX, SkillSelection, SpellBonus,
    StrengthLimitation, WEAPON_NAMED_PREFIX, WEAPON_SKILL_PREFIX, WeaponSelection,
};
use crate::forest::Forest;
use crate::fxp::Fixed6;
use crate::model::{Advantage, AdvantageContainerType, Equipment, Skill, TraitKind, TraitRef};

/// One feature as filed in the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedFeature {
    pub feature: Feature,
    pub owner: TraitRef,
    /// Name of the granting trait, for tooltips.
    pub source: String,
}

impl IndexedFeature {
    fn adjusted(&self) -> Fixed6 {
        self.feature.amount().map_or(Fixed6::ZERO, |amount| amount.adjusted())
    }

    fn integer_adjusted(&self) -> i32 {
        self.feature.amount().map_or(0, |amount| amount.integer_adjusted())
    }
}

/// A bonus tied to a situation, such as a reaction modifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SituationalAmount {
    pub owner: TraitRef,
    pub source: String,
    pub situation: String,
    pub amount: i32,
}

/// A weapon damage bonus evaluated at a die count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageBonus {
    pub owner: TraitRef,
    pub source: String,
    pub amount: Fixed6,
}

fn append_tooltip(tooltip: Option<&mut String>, entry: &IndexedFeature) {
    if let (Some(tooltip), Some(amount)) = (tooltip, entry.feature.amount()) {
        tooltip.push_str(&format!("\n{} [{amount}]", entry.source));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureIndex {
    entries: BTreeMap<String, Vec<IndexedFeature>>,
}

impl FeatureIndex {
    /// Indexes the features of every active advantage, skill and carried piece
    /// of equipment.
    ///
    /// Disabled advantages and unequipped or fractional equipment are skipped
    /// together with their descendants. Disabled modifiers contribute nothing.
    pub fn build(
        advantages: &Forest<Advantage>,
        skills: &Forest<Skill>,
        equipment: &Forest<Equipment>,
    ) -> Self {
        let mut index = Self::default();

        for id in advantages.ids_where(|advantage| advantage.enabled) {
            let Some(advantage) = advantages.get(id) else { continue };
            let owner = TraitRef::new(TraitKind::Advantage, id);
            if advantage.container_type != Some(AdvantageContainerType::Group) {
                index.file_all(&advantage.features, advantage.level_count(), owner, &advantage.name);
            }
            for modifier in advantage.enabled_modifiers() {
                index.file_all(&modifier.features, modifier.level_count(), owner, &advantage.name);
            }
        }

        for (id, skill) in skills.iter().filter(|(_, skill)| !skill.container) {
            let owner = TraitRef::new(TraitKind::Skill, id);
            index.file_all(&skill.features, 0, owner, &skill.name);
        }

        for id in equipment.ids_where(Equipment::is_active) {
            let Some(item) = equipment.get(id) else { continue };
            let owner = TraitRef::new(TraitKind::Equipment, id);
            index.file_all(&item.features, 0, owner, &item.name);
            for modifier in item.enabled_modifiers() {
                index.file_all(&modifier.features, 0, owner, &item.name);
            }
        }

        tracing::trace!(keys = index.entries.len(), features = index.len(), "feature index built");
        index
    }

    fn file_all(&mut self, features: &[Feature], level: i32, owner: TraitRef, source: &str) {
        for feature in features {
            // Consumed by the container during weight aggregation.
            if matches!(feature, Feature::ContainedWeightReduction(_)) {
                continue;
            }
            self.entries.entry(feature.key()).or_default().push(IndexedFeature {
                feature: feature.leveled(level),
                owner,
                source: source.to_string(),
            });
        }
    }

    /// Total number of indexed features.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Features filed under `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> &[IndexedFeature] {
        self.entries
            .get(&key.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any feature anywhere in the index was granted by `owner`.
    pub fn has_owner(&self, owner: TraitRef) -> bool {
        self.entries.values().flatten().any(|entry| entry.owner == owner)
    }

    fn exact_and_wildcard<'a>(
        &'a self,
        prefix: &str,
        name: &str,
    ) -> impl Iterator<Item = &'a IndexedFeature> + 'a {
        let exact = self.get(&format!("{prefix}/{name}"));
        let wildcard = self.get(&format!("{prefix}*"));
        exact.iter().chain(wildcard.iter())
    }

    /// Sum of the attribute bonuses for `attribute`, optionally restricted to
    /// one use of strength. Integer attributes sum truncated amounts.
    pub fn attribute_bonus(
        &self,
        attribute: &str,
        limitation: Option<StrengthLimitation>,
        integer: bool,
        mut tooltip: Option<&mut String>,
    ) -> Fixed6 {
        let key = match limitation {
            Some(limitation) => format!("{ATTRIBUTE_PREFIX}{attribute}.{limitation}"),
            None => format!("{ATTRIBUTE_PREFIX}{attribute}"),
        };
        let mut total = Fixed6::ZERO;
        for entry in self.get(&key) {
            if !matches!(entry.feature, Feature::AttributeBonus(_)) {
                continue;
            }
            total += if integer {
                Fixed6::from(entry.integer_adjusted())
            } else {
                entry.adjusted()
            };
            append_tooltip(tooltip.as_deref_mut(), entry);
        }
        total
    }

    /// Summed cost reduction for `attribute`, in percent, capped at 80.
    pub fn cost_reduction(&self, attribute: &str) -> i32 {
        let total: i32 = self
            .get(&format!("{ATTRIBUTE_PREFIX}{attribute}"))
            .iter()
            .filter_map(|entry| match &entry.feature {
                Feature::CostReduction(reduction) => Some(reduction.percentage),
                _ => None,
            })
            .sum();
        total.min(MAX_COST_REDUCTION)
    }

    /// Skill level bonus for a skill with the given name, specialization and
    /// categories.
    pub fn skill_bonus(
        &self,
        name: &str,
        specialization: &str,
        categories: &[String],
        mut tooltip: Option<&mut String>,
    ) -> i32 {
        let mut total = 0;
        for entry in self.exact_and_wildcard(SKILL_NAME_PREFIX, name) {
            let Feature::SkillBonus(bonus) = &entry.feature else { continue };
            if bonus.selection == SkillSelection::SkillsWithName
                && bonus.name.matches(name)
                && bonus.specialization.matches(specialization)
                && bonus.category.matches_categories(categories.iter().map(String::as_str))
            {
                total += entry.integer_adjusted();
                append_tooltip(tooltip.as_deref_mut(), entry);
            }
        }
        total
    }

    /// Extra points granted toward a skill.
    pub fn skill_point_bonus(
        &self,
        name: &str,
        specialization: &str,
        categories: &[String],
        mut tooltip: Option<&mut String>,
    ) -> i32 {
        let mut total = 0;
        for entry in self.exact_and_wildcard(SKILL_POINTS_PREFIX, name) {
            let Feature::SkillPointBonus(bonus) = &entry.feature else { continue };
            if bonus.name.matches(name)
                && bonus.specialization.matches(specialization)
                && bonus.category.matches_categories(categories.iter().map(String::as_str))
            {
                total += entry.integer_adjusted();
                append_tooltip(tooltip.as_deref_mut(), entry);
            }
        }
        total
    }

    fn spell_entries<'a>(
        &'a self,
        college_prefix: &str,
        name_prefix: &str,
        name: &str,
        colleges: &[String],
    ) -> Vec<&'a IndexedFeature> {
        let mut entries: Vec<&IndexedFeature> = self.get(college_prefix).iter().collect();
        let unique: BTreeSet<String> = colleges.iter().map(|college| college.to_lowercase()).collect();
        for college in &unique {
            entries.extend(self.get(&format!("{college_prefix}/{college}")));
        }
        entries.extend(self.get(&format!("{college_prefix}*")));
        entries.extend(self.exact_and_wildcard(name_prefix, name));
        entries
    }

    fn sum_spell_bonuses(
        entries: Vec<&IndexedFeature>,
        points: bool,
        name: &str,
        colleges: &[String],
        categories: &[String],
        mut tooltip: Option<&mut String>,
    ) -> i32 {
        let mut total = 0;
        for entry in entries {
            let bonus: &SpellBonus = match (&entry.feature, points) {
                (Feature::SpellBonus(bonus), false) | (Feature::SpellPointBonus(bonus), true) => bonus,
                _ => continue,
            };
            if bonus.matches_spell(name, colleges, categories) {
                total += entry.integer_adjusted();
                append_tooltip(tooltip.as_deref_mut(), entry);
            }
        }
        total
    }

    /// Spell level bonus from college-wide, per-college and per-spell bonuses.
    pub fn spell_bonus(
        &self,
        name: &str,
        colleges: &[String],
        categories: &[String],
        tooltip: Option<&mut String>,
    ) -> i32 {
        let entries = self.spell_entries(SPELL_COLLEGE_PREFIX, SPELL_NAME_PREFIX, name, colleges);
        Self::sum_spell_bonuses(entries, false, name, colleges, categories, tooltip)
    }

    /// Extra points granted toward a spell.
    pub fn spell_point_bonus(
        &self,
        name: &str,
        colleges: &[String],
        categories: &[String],
        tooltip: Option<&mut String>,
    ) -> i32 {
        let entries =
            self.spell_entries(SPELL_POINTS_COLLEGE_PREFIX, SPELL_POINTS_NAME_PREFIX, name, colleges);
        Self::sum_spell_bonuses(entries, true, name, colleges, categories, tooltip)
    }

    /// DR bonuses for a hit location, summed per specialization.
    pub fn dr_bonuses(&self, location: &str) -> BTreeMap<String, i32> {
        let mut totals = BTreeMap::new();
        for entry in self.get(&format!("{DR_PREFIX}{location}")) {
            let Feature::DrBonus(bonus) = &entry.feature else { continue };
            let specialization = if bonus.specialization.trim().is_empty() {
                DrBonus::ALL_SPECIALIZATION.to_string()
            } else {
                bonus.specialization.to_lowercase()
            };
            *totals.entry(specialization).or_insert(0) += entry.integer_adjusted();
        }
        totals
    }

    fn situational(&self, key: &str) -> Vec<SituationalAmount> {
        self.get(key)
            .iter()
            .filter_map(|entry| match &entry.feature {
                Feature::ReactionBonus(bonus) | Feature::ConditionalModifier(bonus) => {
                    Some(SituationalAmount {
                        owner: entry.owner,
                        source: entry.source.clone(),
                        situation: bonus.situation.clone(),
                        amount: entry.integer_adjusted(),
                    })
                }
                _ => None,
            })
            .collect()
    }

    pub fn reactions(&self) -> Vec<SituationalAmount> {
        self.situational(REACTION_KEY)
    }

    pub fn conditional_modifiers(&self) -> Vec<SituationalAmount> {
        self.situational(CONDITIONAL_KEY)
    }

    /// Damage bonuses for weapons selected by name and usage, evaluated at
    /// `dice`.
    pub fn named_weapon_damage_bonuses(
        &self,
        name: &str,
        usage: &str,
        categories: &[String],
        dice: i32,
    ) -> Vec<DamageBonus> {
        self.exact_and_wildcard(WEAPON_NAMED_PREFIX, name)
            .filter(|entry| match &entry.feature {
                Feature::WeaponDamageBonus(bonus) => {
                    bonus.selection == WeaponSelection::WeaponsWithName
                        && bonus.name.matches(name)
                        && bonus.specialization.matches(usage)
                        && bonus.category.matches_categories(categories.iter().map(String::as_str))
                }
                _ => false,
            })
            .map(|entry| damage_at(entry, dice))
            .collect()
    }

    /// Damage bonuses for weapons used with the named skill, evaluated at
    /// `dice`. `relative_level` is the wielder's best relative skill level.
    pub fn skill_weapon_damage_bonuses(
        &self,
        skill: &str,
        specialization: &str,
        relative_level: i32,
        categories: &[String],
        dice: i32,
    ) -> Vec<DamageBonus> {
        self.exact_and_wildcard(WEAPON_SKILL_PREFIX, skill)
            .filter(|entry| match &entry.feature {
                Feature::WeaponDamageBonus(bonus) => {
                    bonus.selection == WeaponSelection::WeaponsWithRequiredSkill
                        && bonus.name.matches(skill)
                        && bonus.specialization.matches(specialization)
                        && bonus.relative_level.matches_int(relative_level)
                        && bonus.category.matches_categories(categories.iter().map(String::as_str))
                }
                _ => false,
            })
            .map(|entry| damage_at(entry, dice))
            .collect()
    }
}

fn damage_at(entry: &IndexedFeature, dice: i32) -> DamageBonus {
    DamageBonus {
        owner: entry.owner,
        source: entry.source.clone(),
        amount: entry
            .feature
            .leveled(dice)
            .amount()
            .map_or(Fixed6::ZERO, |amount| amount.adjusted()),
    }
}
