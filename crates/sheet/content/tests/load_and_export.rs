use std::fs;

use sheet_content::{CharacterLoader, ContentFactory, export_json};
use sheet_core::{DamageProgression, Encumbrance, Fixed6, Weight, WeightUnits};
use tempfile::TempDir;

const SHEET: &str = r#"{
    "name": "Ilsa Varga",
    "total_points": 100,
    "attributes": {
        "st": { "adj": "2" },
        "hp": { "damage": 3 }
    },
    "advantages": [
        { "name": "Fit", "base_points": 5 },
        {
            "name": "Quirks",
            "container_type": "group",
            "children": [
                { "name": "Hums while working", "base_points": -1 },
                { "name": "Distrusts horses", "base_points": -1 }
            ]
        }
    ],
    "skills": [
        { "name": "Climbing", "difficulty": "dx/a", "points": 2 },
        {
            "name": "Stealth",
            "difficulty": "dx/a",
            "points": 0,
            "defaults": [{ "target": "dx", "modifier": -5 }]
        }
    ],
    "spells": [
        { "name": "Light", "colleges": ["Light and Darkness"], "points": 1 }
    ],
    "equipment": [
        {
            "name": "Backpack",
            "value": "60",
            "weight": "10 lb",
            "children": [
                { "name": "Rope", "value": "5", "weight": "3 lb", "quantity": 2 }
            ]
        }
    ],
    "other_equipment": [
        { "name": "Spare boots", "value": "40", "weight": "3 lb", "equipped": false }
    ],
    "notes": [{ "text": "Owes the guild 20 silver." }]
}"#;

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("characters")).unwrap();
    fs::write(dir.path().join("characters/ilsa.json"), SHEET).unwrap();
    dir
}

fn skill_level(character: &sheet_core::Character, name: &str) -> Option<i32> {
    character
        .skills
        .iter()
        .find(|(_, skill)| skill.name == name)
        .and_then(|(_, skill)| skill.level.level)
}

#[test]
fn sheets_load_and_recalculate() {
    let dir = data_dir();
    let character = ContentFactory::new(dir.path()).load_character("ilsa").unwrap();

    assert_eq!(character.name, "Ilsa Varga");
    let resolved = character.resolved();
    assert_eq!(resolved.current("st"), Fixed6::from_int(12));
    assert_eq!(resolved.current("hp"), Fixed6::from_int(9));
    assert_eq!(resolved.carried_weight, Weight::pounds(16));
    assert_eq!(resolved.encumbrance, Encumbrance::None);
    assert_eq!(resolved.wealth_carried, Fixed6::from_int(70));
    assert_eq!(resolved.wealth_not_carried, Fixed6::from_int(40));
    assert_eq!(skill_level(&character, "Climbing"), Some(10));
    assert_eq!(skill_level(&character, "Stealth"), Some(5));

    let points = character.points();
    assert_eq!(points.attributes, 20);
    assert_eq!(points.advantages, 5);
    assert_eq!(points.quirks, -2);
    assert_eq!(points.skills, 2);
    assert_eq!(points.spells, 1);
    assert_eq!(points.unspent, 100 - 26);
}

#[test]
fn directory_settings_apply_to_loaded_sheets() {
    let dir = data_dir();
    fs::write(
        dir.path().join("settings.toml"),
        "default_weight_units = \"kg\"\ndamage_progression = \"knowing_your_own_strength\"\n",
    )
    .unwrap();
    let factory = ContentFactory::new(dir.path());
    let settings = factory.load_settings().unwrap();
    assert_eq!(settings.damage_progression, DamageProgression::KnowingYourOwnStrength);

    let character = factory.load_character("ilsa").unwrap();
    assert_eq!(character.resolved().basic_lift.units, WeightUnits::Kilogram);
    assert_eq!(character.resolved().carried_weight.units, WeightUnits::Kilogram);
}

#[test]
fn custom_attribute_libraries_replace_the_standard_set() {
    let dir = data_dir();
    let mut library = fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/data/attributes/standard.ron")).unwrap();
    library = library.replace(
        "    ],\n)",
        "        (id: \"luck\", name: \"Luck\", kind: integer, base: \"$iq - 2\", cost_per_point: 15),\n    ],\n)",
    );
    fs::write(dir.path().join("attributes.ron"), library).unwrap();

    let character = ContentFactory::new(dir.path()).load_character("ilsa").unwrap();
    assert_eq!(character.resolved().current("luck"), Fixed6::from_int(8));
}

#[test]
fn exported_sheets_carry_calc_and_reload() {
    let dir = data_dir();
    let character = ContentFactory::new(dir.path()).load_character("ilsa").unwrap();

    let json = export_json(&character).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["calc"]["thrust"], "1d-1");
    assert_eq!(value["calc"]["basic_lift"], "29 lb");
    assert_eq!(value["calc"]["move"][0], 5);

    let saved = dir.path().join("saved.json");
    CharacterLoader::save(&saved, &character).unwrap();
    let reloaded = CharacterLoader::load(&saved).unwrap();
    assert_eq!(reloaded.resolved(), character.resolved());
    assert_eq!(reloaded.notes.len(), 1);
    assert_eq!(reloaded.advantages.len(), 4);
}

#[test]
fn missing_files_name_the_path() {
    let dir = TempDir::new().unwrap();
    let error = ContentFactory::new(dir.path()).load_character("nobody").unwrap_err();
    assert!(error.to_string().contains("nobody.json"));
}
