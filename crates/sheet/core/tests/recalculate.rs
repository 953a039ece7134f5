use sheet_core::attribute::PoolThreshold;
use sheet_core::feature::{AttributeBonus, ContainedWeightReduction, WeightReduction};
use sheet_core::prereq::{AttributePrereq, ContainedWeightPrereq};
use sheet_core::{
    Advantage, AdvantageContainerType, AttributeDef, AttributeKind, Character, DamageProgression,
    Dice, DifficultyLevel, Encumbrance, Equipment, Feature, Fixed6, Formula, LeveledAmount,
    NumericCompare, NumericCriteria, Prereq, SheetFields, SheetSettings, Skill, SkillDefault,
    Weight, WeightCriteria, WeightUnits,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A skill defaulting to a technique that builds on the same skill. Each
/// pass raises one of them from the other's previous level.
fn diverging_pair(max_iterations: u32) -> Character {
    let mut sheet = Character::new(SheetSettings::new().with_max_iterations(max_iterations));
    let mut skill = Skill::new("Swimming", "dx/e".parse().unwrap(), 1);
    skill.defaults.push(SkillDefault::skill("Diving", 0));
    sheet.skills.push_root(skill);
    sheet.skills.push_root(Skill::technique(
        "Diving",
        DifficultyLevel::Average,
        SkillDefault::skill("Swimming", 2),
        0,
    ));
    sheet
}

fn level(sheet: &Character, name: &str) -> Option<i32> {
    sheet
        .skills
        .iter()
        .find(|(_, skill)| skill.name == name)
        .and_then(|(_, skill)| skill.level.level)
}

#[test]
fn empty_sheet_settles_after_one_pass() {
    init_tracing();
    let mut sheet = Character::default();
    let report = sheet.recalculate().unwrap();

    assert_eq!(report.passes, 1);
    assert!(report.changed.contains(SheetFields::ATTRIBUTES | SheetFields::LIFT | SheetFields::POINTS));
    let resolved = sheet.resolved();
    assert_eq!(resolved.current("st"), Fixed6::from_int(10));
    assert_eq!(resolved.current("basic_speed"), Fixed6::from_int(5));
    assert_eq!(resolved.basic_lift.to_string(), "20 lb");
    assert_eq!(resolved.thrust, Dice::new(1, -2));
    assert_eq!(resolved.swing, Dice::new(1, 0));
    assert_eq!(resolved.move_at(Encumbrance::None), 5);
    assert_eq!(resolved.dodge_at(Encumbrance::None), 8);
    assert_eq!(sheet.points().unspent, Character::DEFAULT_TOTAL_POINTS);

    let again = sheet.recalculate().unwrap();
    assert_eq!(again.passes, 1);
    assert!(again.is_empty());
}

#[test]
fn mutually_dependent_levels_stop_at_the_pass_limit() {
    init_tracing();
    let mut sheet = diverging_pair(5);
    let report = sheet.recalculate().unwrap();
    assert_eq!(report.passes, 5);
    assert!(report.changed.contains(SheetFields::LEVELS));
    assert_eq!(level(&sheet, "Swimming"), Some(14));
    assert_eq!(level(&sheet, "Diving"), Some(14));

    let mut longer = diverging_pair(8);
    assert_eq!(longer.recalculate().unwrap().passes, 8);
    assert!(level(&longer, "Swimming") > level(&sheet, "Swimming"));
}

#[test]
fn zero_iterations_still_runs_one_pass() {
    let mut sheet = diverging_pair(0);
    assert_eq!(sheet.recalculate().unwrap().passes, 1);
    assert_eq!(level(&sheet, "Swimming"), Some(10));
    assert_eq!(level(&sheet, "Diving"), None);
}

#[test]
fn point_totals_split_by_category() {
    let mut sheet = Character::default();
    for (name, points) in [("Fit", 10), ("Bad Temper", -5), ("Chauvinistic", -1), ("Dislikes Fish", -1)] {
        sheet.advantages.push_root(Advantage::new(name, points));
    }
    sheet.recalculate().unwrap();

    let points = sheet.points();
    assert_eq!(points.advantages, 10);
    assert_eq!(points.disadvantages, -5);
    assert_eq!(points.quirks, -2);
    assert_eq!(points.spent, 3);
    assert_eq!(points.unspent, 147);
}

#[test]
fn race_and_attributes_count_toward_spent_points() {
    let mut sheet = Character::default().with_attribute("st", Fixed6::from_int(2), Fixed6::ZERO);
    let race = sheet
        .advantages
        .push_root(Advantage::container("Ogre", AdvantageContainerType::Race));
    sheet.advantages.push_child(race, Advantage::new("Huge", 30));
    sheet.skills.push_root(Skill::new("Brawling", "dx/e".parse().unwrap(), 2));
    sheet.recalculate().unwrap();

    let points = sheet.points();
    assert_eq!(points.race, 30);
    assert_eq!(points.attributes, 20);
    assert_eq!(points.skills, 2);
    assert_eq!(points.unspent, 150 - 52);
}

#[test]
fn circular_attribute_bases_resolve_to_zero() {
    init_tracing();
    let mut attributes = sheet_core::standard_attributes();
    attributes.push(AttributeDef::new("sanity", "Sanity", AttributeKind::Integer, Formula::variable("luck"), 5));
    attributes.push(AttributeDef::new("luck", "Luck", AttributeKind::Integer, Formula::variable("sanity"), 5));
    let mut sheet = Character::new(SheetSettings::new().with_attributes(attributes));

    sheet.recalculate().unwrap();
    assert_eq!(sheet.resolved().current("sanity"), Fixed6::ZERO);
    assert_eq!(sheet.resolved().current("luck"), Fixed6::ZERO);
    assert_eq!(sheet.resolved().current("iq"), Fixed6::from_int(10));
}

#[test]
fn pool_thresholds_halve_move_and_dodge() {
    let mut sheet = Character::default();
    sheet.set_attribute_damage("hp", Fixed6::from_int(7));
    sheet.recalculate().unwrap();

    let resolved = sheet.resolved();
    let hp = &resolved.attributes["hp"];
    assert_eq!(hp.current, Fixed6::from_int(3));
    assert_eq!(hp.threshold.as_deref(), Some("Reeling"));
    assert_eq!(resolved.move_at(Encumbrance::None), 3);
    assert_eq!(resolved.dodge_at(Encumbrance::None), 4);
}

#[test]
fn carried_weight_sets_encumbrance() {
    let mut sheet = Character::default();
    sheet
        .equipment
        .push_root(Equipment::new("Backpack", Fixed6::from_int(60), Weight::pounds(50)));
    let mut stowed = Equipment::new("Tent", Fixed6::from_int(150), Weight::pounds(100));
    stowed.equipped = false;
    sheet.other_equipment.push_root(stowed);
    sheet.recalculate().unwrap();

    let resolved = sheet.resolved();
    assert_eq!(resolved.carried_weight, Weight::pounds(50));
    assert_eq!(resolved.encumbrance, Encumbrance::Medium);
    assert_eq!(resolved.move_at(resolved.encumbrance), 3);
    assert_eq!(resolved.dodge_at(resolved.encumbrance), 6);
    assert_eq!(resolved.wealth_carried, Fixed6::from_int(60));
    assert_eq!(resolved.wealth_not_carried, Fixed6::from_int(150));
}

#[test]
fn strength_bonus_flows_into_lift_and_damage() {
    let mut sheet = Character::default();
    sheet.recalculate().unwrap();

    let mut giant = Advantage::leveled("Lifting ST", 3, 5);
    giant.features.push(Feature::AttributeBonus(AttributeBonus {
        amount: LeveledAmount::per_level(1),
        attribute: "st".into(),
        limitation: None,
    }));
    sheet.advantages.push_root(giant);
    let report = sheet.recalculate().unwrap();

    assert!(report.changed.contains(SheetFields::ATTRIBUTES | SheetFields::LIFT | SheetFields::DAMAGE));
    assert_eq!(sheet.resolved().current("st"), Fixed6::from_int(15));
    assert_eq!(sheet.resolved().basic_lift.to_string(), "45 lb");
    assert_eq!(sheet.points().advantages, 15);
}

#[test]
fn knowing_your_own_strength_changes_lift() {
    let settings = SheetSettings::new().with_damage_progression(DamageProgression::KnowingYourOwnStrength);
    let mut sheet = Character::new(settings).with_attribute("st", Fixed6::from_int(15), Fixed6::ZERO);
    sheet.recalculate().unwrap();
    assert_eq!(sheet.resolved().current("st"), Fixed6::from_int(25));
    assert_eq!(sheet.resolved().basic_lift.to_string(), "630 lb");
}

#[test]
fn unmet_prerequisites_record_reasons() {
    let mut sheet = Character::default();
    let mut brute = Advantage::new("Brute", 5);
    brute.prereqs.prereqs.push(Prereq::Attribute(AttributePrereq {
        which: "st".into(),
        qualifier: NumericCriteria::at_least(12),
        ..AttributePrereq::default()
    }));
    let brute = sheet.advantages.push_root(brute);
    let orphan = sheet.skills.push_root(Skill::technique(
        "Arm Lock",
        DifficultyLevel::Average,
        SkillDefault::skill("Judo", 0),
        1,
    ));
    let report = sheet.recalculate().unwrap();
    assert!(report.changed.contains(SheetFields::PREREQS));

    let brute_state = &sheet.advantages.get(brute).unwrap().satisfaction;
    assert!(!brute_state.satisfied);
    assert_eq!(
        brute_state.unsatisfied_reason,
        "Prerequisites have not been met:\n- Has ST which is at least 12"
    );
    let technique = &sheet.skills.get(orphan).unwrap().satisfaction;
    assert_eq!(
        technique.unsatisfied_reason,
        "Prerequisites have not been met:\n- Requires a skill named Judo"
    );

    sheet.set_attribute_adj("st", Fixed6::from_int(2));
    sheet.recalculate().unwrap();
    assert!(sheet.advantages.get(brute).unwrap().satisfaction.satisfied);
}

#[test]
fn containers_check_their_contents() {
    let mut sheet = Character::default();
    let mut quiver = Equipment::new("Quiver", Fixed6::from_int(10), Weight::pounds(1));
    quiver.prereqs.prereqs.push(Prereq::ContainedWeight(ContainedWeightPrereq {
        has: true,
        qualifier: WeightCriteria::new(NumericCompare::AtMost, Weight::pounds(3)),
    }));
    quiver.features.push(Feature::ContainedWeightReduction(ContainedWeightReduction {
        reduction: WeightReduction::Percentage(Fixed6::from_int(50)),
    }));
    let quiver = sheet.equipment.push_root(quiver);
    let mut arrows = Equipment::new("Arrow", Fixed6::from_int(2), Weight::new(Fixed6::from_decimal(1, 1), Default::default()));
    arrows.quantity = Fixed6::from_int(40);
    sheet.equipment.push_child(quiver, arrows);
    sheet.recalculate().unwrap();

    let state = &sheet.equipment.get(quiver).unwrap().satisfaction;
    assert!(!state.satisfied);
    assert_eq!(sheet.resolved().carried_weight, Weight::pounds(3));
}

#[test]
fn thresholds_can_come_from_custom_pools() {
    let mut attributes = sheet_core::standard_attributes();
    attributes.push(
        AttributeDef::new("er", "Energy Reserve", AttributeKind::Pool, Formula::constant(6), 3)
            .with_thresholds(vec![PoolThreshold::new("Drained", 0, 1, 0), PoolThreshold::new("Charged", 1, 1, 0)]),
    );
    let mut sheet = Character::new(SheetSettings::new().with_attributes(attributes));
    sheet.set_attribute_damage("er", Fixed6::from_int(6));
    sheet.recalculate().unwrap();
    assert_eq!(sheet.resolved().attributes["er"].threshold.as_deref(), Some("Drained"));
}

#[test]
fn reeling_halves_dodge_after_truncating_speed() {
    let mut sheet = Character::default()
        .with_attribute("dx", Fixed6::from_int(1), Fixed6::ZERO)
        .with_attribute("ht", Fixed6::from_int(2), Fixed6::ZERO);
    sheet.set_attribute_damage("hp", Fixed6::from_int(9));
    sheet.recalculate().unwrap();

    let resolved = sheet.resolved();
    assert_eq!(resolved.current("basic_speed"), Fixed6::from_decimal(575, 2));
    assert_eq!(resolved.attributes["hp"].threshold.as_deref(), Some("Reeling"));
    assert_eq!(resolved.dodge_at(Encumbrance::None), 4);
    assert_eq!(resolved.dodge_at(Encumbrance::Light), 3);
    assert_eq!(resolved.move_at(Encumbrance::None), 3);
}

#[test]
fn half_stat_sheets_halve_skill_attributes() {
    let settings = SheetSettings::new().with_half_stat_defaults(true);
    let mut sheet = Character::new(settings).with_attribute("dx", Fixed6::from_int(4), Fixed6::ZERO);
    sheet.skills.push_root(Skill::new("Brawling", "dx/e".parse().unwrap(), 1));
    sheet.recalculate().unwrap();
    assert_eq!(level(&sheet, "Brawling"), Some(12));
}

#[test]
fn unbought_wildcard_skills_are_unusable() {
    let mut sheet = Character::default();
    let mut gun = Skill::new("Gun!", "dx/w".parse().unwrap(), 0);
    gun.defaults.push(SkillDefault::attribute("dx", -5));
    sheet.skills.push_root(gun);
    sheet.recalculate().unwrap();
    assert_eq!(level(&sheet, "Gun!"), None);
}

#[test]
fn weight_ignored_containers_keep_their_contents_for_skills() {
    let mut sheet = Character::default();
    let mut backpack = Equipment::new("Backpack", Fixed6::from_int(60), Weight::pounds(10));
    backpack.weight_ignored_for_skills = true;
    let backpack = sheet.equipment.push_root(backpack);
    sheet
        .equipment
        .push_child(backpack, Equipment::new("Rope", Fixed6::from_int(5), Weight::pounds(30)));
    sheet.recalculate().unwrap();

    let resolved = sheet.resolved();
    assert_eq!(resolved.carried_weight, Weight::pounds(40));
    assert_eq!(resolved.carried_weight_for_skills, Weight::pounds(30));
}

#[test]
fn exact_metric_sheets_report_lift_in_kilograms() {
    let settings = SheetSettings::new()
        .with_weight_units(WeightUnits::Kilogram)
        .with_simple_metric_conversions(false);
    let mut sheet = Character::new(settings);
    sheet.recalculate().unwrap();

    let lift = sheet.resolved().basic_lift;
    assert_eq!(lift.units, WeightUnits::Kilogram);
    assert_eq!(lift.value, Fixed6::from_raw(9_071_846));
    assert_eq!(sheet.resolved().encumbrance, Encumbrance::None);
}
