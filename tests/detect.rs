mod common;

use std::fs;

use common::{TestWorkspace, write_sample_dataset};
use csv_drift::detect::{detect, infer_column_changes};
use csv_drift::io_utils::CsvFormat;
use csv_drift::layout::DatasetLayout;
use csv_drift::matcher::{COLUMN_CUTOFF, MatchCutoffs};

#[test]
fn detect_classifies_tables() {
    let ws = TestWorkspace::new();
    let (old, new) = write_sample_dataset(&ws);
    let plan = detect(&DatasetLayout::new(old, new), &MatchCutoffs::default()).expect("detect");

    assert_eq!(plan.renamed_tables.len(), 1);
    assert_eq!(plan.renamed_tables["Invoices"], "Invoice");

    assert_eq!(plan.moved_tables.len(), 1);
    assert_eq!(plan.moved_tables["clients"].from, "data/clients");
    assert_eq!(plan.moved_tables["clients"].to, "crm/clients");

    assert_eq!(plan.new_tables.keys().collect::<Vec<_>>(), vec!["Receipts"]);
    assert!(plan.new_tables["Receipts"].create_empty);

    // removed tables are not reported anywhere
    assert!(!plan.renamed_tables.contains_key("archive"));
    assert!(!plan.moved_tables.contains_key("archive"));
    assert!(!plan.new_tables.contains_key("archive"));
}

#[test]
fn detect_records_column_changes_by_new_path() {
    let ws = TestWorkspace::new();
    let (old, new) = write_sample_dataset(&ws);
    let plan = detect(&DatasetLayout::new(old, new), &MatchCutoffs::default()).expect("detect");

    let orders = &plan.column_changes["data/orders"];
    assert_eq!(orders.renamed_columns["customer_nm"], "customer_name");
    assert_eq!(orders.dropped_columns, vec!["legacy_flag"]);
    assert_eq!(orders.added_columns, vec!["region"]);

    let invoice = &plan.column_changes["billing/invoice"];
    assert!(invoice.renamed_columns.is_empty());
    assert_eq!(invoice.added_columns, vec!["currency"]);

    // identical headers produce no record
    assert!(!plan.column_changes.contains_key("crm/clients"));
    assert_eq!(plan.column_changes.len(), 2);
}

#[test]
fn detect_infers_scenario_changes() {
    let ws = TestWorkspace::new();
    let (old, new) = write_sample_dataset(&ws);
    let plan = detect(&DatasetLayout::new(old, new), &MatchCutoffs::default()).expect("detect");

    let scenarios = &plan.scenario_changes;
    assert_eq!(scenarios.renamed_keys.len(), 1);
    assert_eq!(scenarios.renamed_keys["baseline_2030"], "baseline_2035");
    assert_eq!(scenarios.new_rows, vec!["D"]);
}

#[test]
fn unreadable_scenarios_degrade_to_empty_changes() {
    let ws = TestWorkspace::new();
    let (old, new) = write_sample_dataset(&ws);
    fs::remove_file(new.join("scenarios.csv")).unwrap();
    let plan = detect(&DatasetLayout::new(old, new), &MatchCutoffs::default()).expect("detect");
    assert!(plan.scenario_changes.is_empty());
    assert_eq!(plan.renamed_tables.len(), 1);
}

#[test]
fn every_column_change_key_is_a_new_manifest_path() {
    let ws = TestWorkspace::new();
    let (old, new) = write_sample_dataset(&ws);
    let layout = DatasetLayout::new(old, new);
    let plan = detect(&layout, &MatchCutoffs::default()).expect("detect");
    let manifest =
        csv_drift::manifest::Manifest::load(&layout.new_manifest(), &layout.format).unwrap();
    assert!(plan.unknown_column_change_paths(&manifest).is_empty());
}

#[test]
fn missing_manifest_stops_detection() {
    let ws = TestWorkspace::new();
    let (old, new) = write_sample_dataset(&ws);
    fs::remove_file(old.join("csv_structure.csv")).unwrap();
    let err = detect(&DatasetLayout::new(old, new), &MatchCutoffs::default()).unwrap_err();
    assert!(format!("{err:#}").contains("old manifest"));
}

#[test]
fn column_inference_uses_first_file_by_name() {
    let ws = TestWorkspace::new();
    ws.write("old/t/b.csv", "id,zzz\n");
    ws.write("old/t/a.csv", "id,amount\n");
    ws.write("new/t/a.csv", "id,amount_usd\n");
    let change = infer_column_changes(
        &ws.path().join("old/t"),
        &ws.path().join("new/t"),
        &CsvFormat::default(),
        COLUMN_CUTOFF,
    )
    .expect("infer")
    .expect("change recorded");
    assert_eq!(change.renamed_columns["amount"], "amount_usd");
    assert!(change.dropped_columns.is_empty());
}

#[test]
fn column_inference_without_csv_files_records_nothing() {
    let ws = TestWorkspace::new();
    ws.write("old/t/readme.txt", "nothing here");
    ws.write("new/t/a.csv", "id\n");
    let change = infer_column_changes(
        &ws.path().join("old/t"),
        &ws.path().join("new/t"),
        &CsvFormat::default(),
        COLUMN_CUTOFF,
    )
    .expect("infer");
    assert!(change.is_none());
}
