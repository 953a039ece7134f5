//! Point totals of the stabilized sheet.

use std::collections::BTreeMap;

use crate::attribute::{Attribute, AttributeDef};
use crate::config::DamageProgression;
use crate::error::CalcResult;
use crate::forest::{Forest, NodeId};
use crate::fxp::Fixed6;
use crate::model::{Advantage, AdvantageContainerType, Skill, Spell};

const QUIRK_POINTS: i32 = -1;
const HIT_POINTS: &str = "hp";

/// Points spent per category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointTotals {
    pub attributes: i32,
    pub advantages: i32,
    pub disadvantages: i32,
    pub quirks: i32,
    pub race: i32,
    pub skills: i32,
    pub spells: i32,
    pub spent: i32,
    pub unspent: i32,
}

impl PointTotals {
    fn add_trait(&mut self, points: i32) {
        match points {
            QUIRK_POINTS => self.quirks += points,
            p if p > 0 => self.advantages += p,
            p if p < 0 => self.disadvantages += p,
            _ => {}
        }
    }
}

/// Adjusted points of an advantage, containers included.
pub fn advantage_points(forest: &Forest<Advantage>, id: NodeId) -> i32 {
    let Some(advantage) = forest.get(id) else { return 0 };
    if !advantage.enabled {
        return 0;
    }
    let Some(kind) = advantage.container_type else {
        return advantage.adjusted_points();
    };
    let children: Vec<i32> = forest
        .children(id)
        .iter()
        .map(|&child| advantage_points(forest, child))
        .collect();
    match kind {
        AdvantageContainerType::AlternativeAbilities => alternative_abilities(&children),
        AdvantageContainerType::Group
        | AdvantageContainerType::MetaTrait
        | AdvantageContainerType::Race => children.iter().sum(),
    }
}

/// The costliest ability at full price, every other at a fifth, rounded up.
fn alternative_abilities(points: &[i32]) -> i32 {
    let Some(max_at) = points
        .iter()
        .enumerate()
        .max_by_key(|&(i, &p)| (p, core::cmp::Reverse(i)))
        .map(|(i, _)| i)
    else {
        return 0;
    };
    points
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            if i == max_at {
                p
            } else {
                Fixed6::from(p).div_int(5).map_or(0, |fifth| fifth.ceil().to_i32())
            }
        })
        .sum()
}

fn tally_advantages(forest: &Forest<Advantage>, ids: &[NodeId], totals: &mut PointTotals) {
    for &id in ids {
        let Some(advantage) = forest.get(id) else { continue };
        if !advantage.enabled {
            continue;
        }
        match advantage.container_type {
            Some(AdvantageContainerType::Group) => {
                tally_advantages(forest, forest.children(id), totals);
            }
            Some(AdvantageContainerType::Race) => totals.race += advantage_points(forest, id),
            _ => totals.add_trait(advantage_points(forest, id)),
        }
    }
}

pub(super) struct PointInputs<'a> {
    pub defs: &'a [AttributeDef],
    pub attributes: &'a BTreeMap<String, Attribute>,
    pub size_modifier: i32,
    pub progression: DamageProgression,
    pub advantages: &'a Forest<Advantage>,
    pub skills: &'a Forest<Skill>,
    pub spells: &'a Forest<Spell>,
    pub total_points: i32,
}

pub(super) fn compute(inputs: &PointInputs<'_>) -> CalcResult<PointTotals> {
    let mut totals = PointTotals::default();

    for def in inputs.defs {
        let Some(attribute) = inputs.attributes.get(&def.id) else { continue };
        let size_exempt =
            def.id == HIT_POINTS && inputs.progression == DamageProgression::KnowingYourOwnStrength;
        totals.attributes += def.compute_cost(
            attribute.adj,
            attribute.cost_reduction,
            inputs.size_modifier,
            size_exempt,
        )?;
    }

    tally_advantages(inputs.advantages, inputs.advantages.roots(), &mut totals);

    totals.skills = inputs
        .skills
        .iter()
        .filter(|(_, skill)| !skill.container)
        .map(|(_, skill)| skill.points)
        .sum();
    totals.spells = inputs
        .spells
        .iter()
        .filter(|(_, spell)| !spell.container)
        .map(|(_, spell)| spell.points)
        .sum();

    totals.spent = totals.attributes
        + totals.advantages
        + totals.disadvantages
        + totals.quirks
        + totals.race
        + totals.skills
        + totals.spells;
    totals.unspent = inputs.total_points - totals.spent;
    Ok(totals)
}
