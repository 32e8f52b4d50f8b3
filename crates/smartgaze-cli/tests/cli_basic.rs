//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "smartgaze-cli", "--quiet", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

const ANSWERS: &str = r#"{
    "portion": 3, "diet": 5, "salt": 3, "fat": 3,
    "natural": 3, "convenience": 3, "price": 3
}"#;

const CATALOG: &str = r#"[
    {
        "name": "spicy_ramen", "category": "Instant Noodles",
        "calories": 380, "sodium_mg": 1200, "saturated_fat_g": 7.0,
        "protein_g": 9.0, "natural_ingredients": "No",
        "preparation_time": "5 minutos", "price_usd": 1.5
    },
    {
        "name": "veggie_cup", "category": "Instant Noodles",
        "calories": 290, "sodium_mg": 600, "saturated_fat_g": 2.0,
        "protein_g": 12.0, "natural_ingredients": "Sí, orgánico",
        "preparation_time": "Listo para comer", "price_usd": 2.0
    }
]"#;

#[test]
fn score_rank_outputs_sorted_table() {
    let dir = tempfile::tempdir().unwrap();
    let answers = dir.path().join("answers.json");
    let catalog = dir.path().join("catalog.json");
    write(&answers, ANSWERS);
    write(&catalog, CATALOG);

    let (stdout, stderr, code) = run_cli(&[
        "score",
        "rank",
        "--answers",
        answers.to_str().unwrap(),
        "--catalog",
        catalog.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "score rank failed: {stderr}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "veggie_cup");
}

#[test]
fn session_run_then_results_assemble() {
    let dir = tempfile::tempdir().unwrap();

    // Dummy image assets per mode folder.
    for (folder, names) in [
        ("paired", vec!["a", "b", "c", "d"]),
        ("grid", vec!["a", "b", "c", "d"]),
        ("sequential", vec!["p", "q"]),
    ] {
        let mode_dir = dir.path().join(folder);
        std::fs::create_dir_all(&mode_dir).unwrap();
        for name in names {
            write(&mode_dir.join(format!("{name}.png")), "not-a-real-png");
        }
    }

    let script = dir.path().join("script.json");
    write(
        &script,
        r#"[
            {"intent": "choose", "image_id": "a"},
            {"intent": "choose", "image_id": "c"},
            {"intent": "choose", "image_id": "a"},
            {"intent": "advance"},
            {"intent": "choose", "image_id": "b"},
            {"intent": "advance"},
            {"intent": "next"},
            {"intent": "choose", "image_id": "q"},
            {"intent": "confirm"},
            {"intent": "advance"}
        ]"#,
    );

    let record = dir.path().join("session.json");
    let (_, stderr, code) = run_cli(&[
        "session",
        "run",
        "--script",
        script.to_str().unwrap(),
        "--paired-dir",
        dir.path().join("paired").to_str().unwrap(),
        "--grid-dir",
        dir.path().join("grid").to_str().unwrap(),
        "--sequential-dir",
        dir.path().join("sequential").to_str().unwrap(),
        "--out",
        record.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "session run failed: {stderr}");

    let recorded: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&record).unwrap()).unwrap();
    assert_eq!(recorded["complete"], true);

    let (stdout, stderr, code) = run_cli(&[
        "results",
        "assemble",
        "--record",
        record.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "results assemble failed: {stderr}");
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["screen_id"], "paired/pair_1");
    assert_eq!(rows[3]["screen_id"], "grid");
}

#[test]
fn config_path_prints_a_location() {
    let (stdout, stderr, code) = run_cli(&["config", "path"]);
    assert_eq!(code, 0, "config path failed: {stderr}");
    assert!(stdout.contains("config.toml"));
}
