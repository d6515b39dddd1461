mod common;

use assert_cmd::Command;
use common::{TestWorkspace, write_sample_dataset};
use csv_drift::plan::ChangePlan;
use predicates::str::contains;

#[test]
fn detect_show_and_migrate_end_to_end() {
    let ws = TestWorkspace::new();
    let (old, new) = write_sample_dataset(&ws);
    let plan_path = ws.path().join("detected_changes.yaml");
    let output = ws.path().join("migrated_output");

    Command::cargo_bin("csv-drift")
        .expect("binary exists")
        .args([
            "detect",
            "--old",
            old.to_str().unwrap(),
            "--new",
            new.to_str().unwrap(),
            "--plan",
            plan_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let plan = ChangePlan::load(&plan_path).expect("plan written");
    assert_eq!(plan.renamed_tables["Invoices"], "Invoice");

    Command::cargo_bin("csv-drift")
        .expect("binary exists")
        .args(["show", "--plan", plan_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("renamed table"))
        .stdout(contains("data/clients -> crm/clients"))
        .stdout(contains("skeleton row"));

    Command::cargo_bin("csv-drift")
        .expect("binary exists")
        .args([
            "migrate",
            "--old",
            old.to_str().unwrap(),
            "--new",
            new.to_str().unwrap(),
            "--plan",
            plan_path.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(
        ws.read("migrated_output/scenarios.csv"),
        "scenario,growth\nC,3\nA,1\nD,\nbaseline_2035,4\n"
    );
    assert!(ws.exists("migrated_output/crm/clients/clients.csv"));
}

#[test]
fn hand_edited_plan_drives_migration() {
    let ws = TestWorkspace::new();
    let (old, new) = write_sample_dataset(&ws);
    // Operator rejected the inferred rename and every column change.
    let plan_path = ws.write(
        "reviewed.yaml",
        "moved_tables:\n  clients:\n    from: data/clients\n    to: crm/clients\n",
    );

    Command::cargo_bin("csv-drift")
        .expect("binary exists")
        .args([
            "migrate",
            "--old",
            old.to_str().unwrap(),
            "--new",
            new.to_str().unwrap(),
            "--plan",
            plan_path.to_str().unwrap(),
            "--output",
            ws.path().join("out").to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(!ws.exists("out/billing/invoice/invoices.csv"));
    assert_eq!(
        ws.read("out/data/orders/orders.csv"),
        ws.read("old_version/data/orders/orders.csv")
    );
}

#[test]
fn detect_fails_without_manifest() {
    let ws = TestWorkspace::new();
    Command::cargo_bin("csv-drift")
        .expect("binary exists")
        .args([
            "detect",
            "--old",
            ws.path().join("missing_old").to_str().unwrap(),
            "--new",
            ws.path().join("missing_new").to_str().unwrap(),
            "--plan",
            ws.path().join("plan.yaml").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("error:"));
    assert!(!ws.exists("plan.yaml"));
}

#[test]
fn cutoff_outside_unit_interval_is_rejected() {
    Command::cargo_bin("csv-drift")
        .expect("binary exists")
        .args(["detect", "--table-cutoff", "1.5"])
        .assert()
        .failure()
        .stderr(contains("between 0 and 1"));
}
