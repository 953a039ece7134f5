//! Computed values exported next to the persisted sheet.

use serde::{Deserialize, Serialize};
use sheet_core::{Character, Encumbrance, Fixed6, LiftMultiples, PointTotals, Weight};

/// The "calc" block of an exported character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcExport {
    pub thrust: String,
    pub swing: String,
    pub basic_lift: Weight,
    pub lift: LiftMultiples,
    pub encumbrance: Encumbrance,
    /// Move at each encumbrance level, lightest first.
    #[serde(rename = "move")]
    pub moves: [i32; 5],
    pub dodge: [i32; 5],
    pub parry_bonus: i32,
    pub block_bonus: i32,
    pub weight_carried: Weight,
    pub wealth_carried: Fixed6,
    pub wealth_not_carried: Fixed6,
    pub points: PointTotals,
}

impl CalcExport {
    /// Reads the values of the last recalculation.
    pub fn from_character(character: &Character) -> Self {
        let resolved = character.resolved();
        Self {
            thrust: resolved.thrust.to_string(),
            swing: resolved.swing.to_string(),
            basic_lift: resolved.basic_lift,
            lift: resolved.lift,
            encumbrance: resolved.encumbrance,
            moves: resolved.moves,
            dodge: resolved.dodges,
            parry_bonus: resolved.parry_bonus,
            block_bonus: resolved.block_bonus,
            weight_carried: resolved.carried_weight,
            wealth_carried: resolved.wealth_carried,
            wealth_not_carried: resolved.wealth_not_carried,
            points: resolved.points,
        }
    }
}
