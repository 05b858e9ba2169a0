use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};

use mwstats::{
    RenameTable, SortRules, TimeSettings, convert_duration_seconds, normalize_times,
    rename_document, sort_document,
};

fn read_fixture(name: &str) -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    serde_json::from_str(&raw).expect("fixture should be json")
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .expect("mapping")
        .keys()
        .map(String::as_str)
        .collect()
}

fn metric(entry: &Value, field: &str) -> f64 {
    entry["properties"][field].as_f64().expect("numeric field")
}

fn assert_non_increasing(container: &Value, field: &str) {
    let values: Vec<f64> = container
        .as_object()
        .expect("mapping")
        .values()
        .map(|entry| metric(entry, field))
        .collect();
    assert!(
        values.windows(2).all(|pair| pair[0] >= pair[1]),
        "{field} not descending: {values:?}"
    );
}

#[test]
fn rename_then_sort_matches_worked_example() {
    let table =
        RenameTable::from_pairs([("dom", "Domination"), ("war", "Team Deathmatch")]).unwrap();
    let doc = json!({"mode": {
        "dom": {"properties": {"timePlayed": 10}},
        "war": {"properties": {"timePlayed": 50}}
    }});

    let mut out = rename_document(doc, &table);
    let report = sort_document(&mut out, &SortRules::default());

    assert!(report.is_clean());
    assert_eq!(
        out,
        json!({"mode": {
            "Team Deathmatch": {"properties": {"timePlayed": 50}},
            "Domination": {"properties": {"timePlayed": 10}}
        }})
    );
    assert_eq!(keys(&out["mode"]), vec!["Team Deathmatch", "Domination"]);
}

#[test]
fn unknown_code_is_unchanged() {
    let table = RenameTable::bundled().unwrap();
    assert_eq!(rename_document(json!("xyz123"), &table), json!("xyz123"));
    assert_eq!(
        rename_document(json!({"xyz123": "xyz123"}), &table),
        json!({"xyz123": "xyz123"})
    );
}

#[test]
fn rename_is_idempotent_on_stats_fixture() {
    let table = RenameTable::bundled().unwrap();
    let once = rename_document(read_fixture("stats.json"), &table);
    let twice = rename_document(once.clone(), &table);
    assert_eq!(once, twice);
}

#[test]
fn sorted_containers_are_descending() {
    let table = RenameTable::bundled().unwrap();
    let mut doc = rename_document(read_fixture("stats.json"), &table);
    let report = sort_document(&mut doc, &SortRules::default());
    assert!(report.is_clean(), "unexpected skips: {:?}", report.skipped);

    let lifetime = &doc["data"]["lifetime"];
    assert_non_increasing(&lifetime["mode"], "timePlayed");
    assert_non_increasing(&lifetime["itemData"]["Assault Rifles"], "kills");
    assert_non_increasing(&lifetime["itemData"]["SMGs"], "kills");
    assert_non_increasing(&lifetime["itemData"]["Tactical Equipment"], "uses");
    for group in lifetime["Scorestreaks"].as_object().unwrap().values() {
        assert_non_increasing(group, "awardedCount");
    }
    assert_non_increasing(&doc["data"]["weekly"]["mode"], "timePlayed");

    // Equal values keep their fixture order.
    assert_eq!(
        keys(&lifetime["mode"]),
        vec!["Team Deathmatch", "Domination", "Search and Destroy"]
    );
    assert_eq!(keys(&lifetime["itemData"]["SMGs"]), vec!["P90", "MP7", "AUG"]);
    assert_eq!(
        keys(&lifetime["Accolades"]["properties"]),
        vec![
            "Most time spent Prone (Grassy Knoll)",
            "Longest life (Lifer)",
            "Most kills (The Feared)"
        ]
    );
}

#[test]
fn normalization_twice_does_not_double_convert() {
    let mut doc = read_fixture("match_info.json");
    let settings = TimeSettings::default();
    assert!(normalize_times(&mut doc, &settings) > 0);
    let once = doc.clone();
    assert_eq!(normalize_times(&mut doc, &settings), 0);
    assert_eq!(doc, once);
    assert_eq!(
        doc["data"]["matches"][0]["utcStartSeconds"],
        json!("GMT: Tuesday, October 17, 2023 07:41:18 AM")
    );
    assert_eq!(
        doc["data"]["matches"][0]["duration"],
        json!("10 Minutes 0 Seconds 0 Milliseconds")
    );
}

#[test]
fn duration_example() {
    assert_eq!(
        convert_duration_seconds(90061),
        "1 Days 1 Hours 1 Minutes 1 Seconds"
    );
}

#[test]
fn sorting_converted_stats_skips_without_reordering() {
    let table = RenameTable::bundled().unwrap();
    let mut doc = rename_document(read_fixture("stats.json"), &table);
    sort_document(&mut doc, &SortRules::default());
    normalize_times(&mut doc, &TimeSettings::default());
    let converted = doc.clone();

    let report = sort_document(&mut doc, &SortRules::default());
    assert!(!report.is_clean());
    assert_eq!(doc, converted);
}
