//! Part comparison tests
//!
//! Exercises the comparison engine through the CLI across BOM, file,
//! and technical attribute categories.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mct() -> Command {
    let mut cmd = Command::cargo_bin("mct").unwrap();
    cmd.env("MCT_AUTHOR", "testuser");
    cmd
}

fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    mct().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

fn ok(tmp: &TempDir, args: &[&str]) {
    mct().current_dir(tmp.path()).args(args).assert().success();
}

fn new_part(tmp: &TempDir, number: &str, name: &str) {
    ok(tmp, &["part", "new", "--part-number", number, "--name", name]);
}

#[test]
fn test_compare_part_with_itself_fails() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget");

    mct()
        .current_dir(tmp.path())
        .args(["compare", "run", "PN-1", "PN-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot compare a part with itself"));
}

#[test]
fn test_bom_equal_quantities_show_no_changes() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget A");
    new_part(&tmp, "PN-2", "Widget B");
    new_part(&tmp, "PN-C", "Common Component");

    ok(
        &tmp,
        &["part", "bom-add", "PN-1", "--component", "PN-C", "--quantity", "4"],
    );
    ok(
        &tmp,
        &["part", "bom-add", "PN-2", "--component", "PN-C", "--quantity", "4"],
    );

    mct()
        .current_dir(tmp.path())
        .args(["compare", "run", "PN-1", "PN-2", "--scope", "bom"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "BOM: 0 changes (0 added, 0 deleted, 0 modified)",
        ));
}

#[test]
fn test_bom_quantity_difference_yields_one_modified_entry() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget A");
    new_part(&tmp, "PN-2", "Widget B");
    new_part(&tmp, "PN-C", "Common Component");

    ok(
        &tmp,
        &["part", "bom-add", "PN-1", "--component", "PN-C", "--quantity", "2"],
    );
    ok(
        &tmp,
        &["part", "bom-add", "PN-2", "--component", "PN-C", "--quantity", "5"],
    );

    mct()
        .current_dir(tmp.path())
        .args(["compare", "run", "PN-1", "PN-2", "--scope", "bom"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "BOM: 1 changes (0 added, 0 deleted, 1 modified)",
        ))
        .stdout(predicate::str::contains("qty 2 -> 5"));
}

#[test]
fn test_bom_added_and_deleted_components() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget A");
    new_part(&tmp, "PN-2", "Widget B");
    new_part(&tmp, "PN-OLD", "Old Component");
    new_part(&tmp, "PN-NEW", "New Component");

    ok(
        &tmp,
        &["part", "bom-add", "PN-1", "--component", "PN-OLD", "--quantity", "1"],
    );
    ok(
        &tmp,
        &["part", "bom-add", "PN-2", "--component", "PN-NEW", "--quantity", "3"],
    );

    mct()
        .current_dir(tmp.path())
        .args(["compare", "run", "PN-1", "PN-2", "--scope", "bom"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "BOM: 2 changes (1 added, 1 deleted, 0 modified)",
        ))
        .stdout(predicate::str::contains("PN-OLD"))
        .stdout(predicate::str::contains("PN-NEW"));
}

#[test]
fn test_missing_bom_degrades_to_note() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget A");
    new_part(&tmp, "PN-2", "Widget B");
    new_part(&tmp, "PN-C", "Component");

    ok(
        &tmp,
        &["part", "bom-add", "PN-2", "--component", "PN-C", "--quantity", "1"],
    );

    mct()
        .current_dir(tmp.path())
        .args(["compare", "run", "PN-1", "PN-2", "--scope", "bom"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Part A (PN-1) has no BOM"));
}

#[test]
fn test_technical_rows_always_emitted() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget A");
    new_part(&tmp, "PN-2", "Widget B");

    ok(
        &tmp,
        &[
            "part",
            "set-attr",
            "PN-1",
            "--key",
            "surface_finish",
            "--value",
            "Anodized",
        ],
    );

    mct()
        .current_dir(tmp.path())
        .args(["compare", "run", "PN-1", "PN-2", "--scope", "technical"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Technical attributes (1 changed)"))
        .stdout(predicate::str::contains("Surface Finishing: 'Anodized' -> ''"));
}

#[test]
fn test_comparison_record_is_stored_and_showable() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget A");
    new_part(&tmp, "PN-2", "Widget B");

    mct()
        .current_dir(tmp.path())
        .args(["compare", "run", "PN-1", "PN-2", "--scope", "technical"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compare: PN-1 vs PN-2"));

    mct()
        .current_dir(tmp.path())
        .args(["compare", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compare: PN-1 vs PN-2"))
        .stdout(predicate::str::contains("compared"));

    // Re-runs are stored as separate records
    mct()
        .current_dir(tmp.path())
        .args(["compare", "run", "PN-2", "PN-1", "--scope", "technical"])
        .assert()
        .success();

    let stored: Vec<_> = std::fs::read_dir(tmp.path().join("comparisons"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(stored.len(), 2);

    // Stored records can be shown again by id
    let id = stored[0]
        .file_name()
        .to_string_lossy()
        .trim_end_matches(".mct.yaml")
        .to_string();
    mct()
        .current_dir(tmp.path())
        .args(["compare", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Technical attributes"));
}

#[test]
fn test_json_report_output() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget A");
    new_part(&tmp, "PN-2", "Widget B");

    mct()
        .current_dir(tmp.path())
        .args([
            "compare", "run", "PN-1", "PN-2", "--scope", "technical", "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"technical\""))
        .stdout(predicate::str::contains("\"summary\""));
}

#[test]
fn test_changelog_records_part_edits() {
    let tmp = setup_project();
    new_part(&tmp, "PN-1", "Widget A");

    ok(
        &tmp,
        &[
            "part",
            "set-attr",
            "PN-1",
            "--key",
            "raw_material",
            "--value",
            "AISI 304",
            "--reason",
            "customer-request",
        ],
    );

    // Find the part id from its JSON representation
    let output = mct()
        .current_dir(tmp.path())
        .args(["part", "show", "PN-1", "-f", "json"])
        .output()
        .unwrap();
    let part: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = part["id"].as_str().unwrap();

    mct()
        .current_dir(tmp.path())
        .args(["log", id, "--changes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("customer_request"))
        .stdout(predicate::str::contains(
            "Added new field: Raw Material = AISI 304",
        ));

    // A second edit gets changeset number 2
    ok(
        &tmp,
        &[
            "part",
            "set-attr",
            "PN-1",
            "--key",
            "raw_material",
            "--value",
            "AISI 316",
        ],
    );

    mct()
        .current_dir(tmp.path())
        .args(["log", id, "--changes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#2"))
        .stdout(predicate::str::contains(
            "Modified Raw Material: 'AISI 304' -> 'AISI 316'",
        ));
}
