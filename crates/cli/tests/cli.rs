use assert_cmd::Command;
use predicates::prelude::*;

fn catalog() -> String {
    format!("{}/../../configs/kinds.yaml", env!("CARGO_MANIFEST_DIR"))
}

fn cosmogen() -> Command {
    Command::cargo_bin("cosmogen").expect("cosmogen bin")
}

#[test]
fn populate_reports_generated_children_as_json() {
    let output = cosmogen()
        .args([
            "populate",
            "--catalog",
            &catalog(),
            "--root",
            "star_system",
            "--seed",
            "7",
            "--limit",
            "3",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value =
        serde_json::from_slice(&output).expect("populate output is json");
    assert_eq!(report["root"], "star_system");
    let children = report["children"].as_array().expect("children array");
    // The star sits at the origin; everything else was generated.
    assert!(children.iter().any(|c| c["kind"] == "star"));
    assert!(children.len() <= 4);
    for child in children.iter().filter(|c| c["kind"] == "planet") {
        assert!(child["distance_m"].as_f64().unwrap() > 0.0);
        assert!(child["eccentricity"].as_f64().unwrap() < 0.1 + 1e-9);
    }
}

#[test]
fn census_lists_child_kinds() {
    cosmogen()
        .args([
            "census",
            "--catalog",
            &catalog(),
            "--root",
            "galaxy",
            "--seed",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("star_system").and(predicate::str::contains("nebula")));
}

#[test]
fn orbit_prints_epoch_state() {
    cosmogen()
        .args([
            "orbit",
            "--periapsis",
            "1e11",
            "--eccentricity",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.000000e11, 0.000000e0, 0.000000e0"));
}

#[test]
fn orbit_rejects_negative_eccentricity() {
    cosmogen()
        .args(["orbit", "--periapsis", "1e11", "--eccentricity=-0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("eccentricity"));
}

#[test]
fn unknown_root_kind_fails() {
    cosmogen()
        .args(["census", "--catalog", &catalog(), "--root", "quasar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quasar"));
}
