//! Document and revision lifecycle tests
//!
//! Exercises the approval state machine end-to-end: request-approval,
//! multi-approver approval, release with notifications, undo, and the
//! single-unreleased-revision invariant.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mct() -> Command {
    let mut cmd = Command::cargo_bin("mct").unwrap();
    cmd.env("MCT_AUTHOR", "testuser");
    cmd
}

/// Project with alice+bob as default approvers and prod on the
/// release distribution list
fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    mct().current_dir(tmp.path()).arg("init").assert().success();

    std::fs::write(
        tmp.path().join(".mct/config.yaml"),
        r#"approvals:
  approvers: [alice, bob]
  release_to: [prod]
"#,
    )
    .unwrap();
    tmp
}

fn new_doc(tmp: &TempDir, title: &str) {
    mct()
        .current_dir(tmp.path())
        .args(["doc", "new", "--title", title])
        .assert()
        .success();
}

// ============================================================================
// Approval cycle
// ============================================================================

#[test]
fn test_full_document_lifecycle() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    // draft -> pending_approval
    mct()
        .current_dir(tmp.path())
        .args(["doc", "request-approval", "DC-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 approvers required"));

    // First approval does not transition
    mct()
        .current_dir(tmp.path())
        .args(["doc", "approve", "DC-0001", "--by", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2"));

    mct()
        .current_dir(tmp.path())
        .args(["doc", "list", "--state", "pending_approval"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DC-0001"));

    // Second approval auto-transitions to approved
    mct()
        .current_dir(tmp.path())
        .args(["doc", "approve", "DC-0001", "--by", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("all approvals received"));

    // approved -> released, stamping actor and notifying the list
    mct()
        .current_dir(tmp.path())
        .args(["doc", "release", "DC-0001", "--by", "boss"])
        .assert()
        .success()
        .stdout(predicate::str::contains("released by boss"))
        .stdout(predicate::str::contains("Notified 1 recipients"));

    let outbox: Vec<_> = std::fs::read_dir(tmp.path().join(".mct/outbox"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(outbox.len(), 1);
    let body = std::fs::read_to_string(outbox[0].path()).unwrap();
    assert!(body.contains("prod"));
    assert!(body.contains("DC-0001"));
    assert!(body.contains("boss"));
}

#[test]
fn test_duplicate_approval_rejected() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "request-approval", "DC-0001"])
        .assert()
        .success();
    mct()
        .current_dir(tmp.path())
        .args(["doc", "approve", "DC-0001", "--by", "alice"])
        .assert()
        .success();

    mct()
        .current_dir(tmp.path())
        .args(["doc", "approve", "DC-0001", "--by", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already approved"));
}

#[test]
fn test_outsider_cannot_approve() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "request-approval", "DC-0001"])
        .assert()
        .success();

    mct()
        .current_dir(tmp.path())
        .args(["doc", "approve", "DC-0001", "--by", "mallory"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the assigned approver set"));
}

#[test]
fn test_approve_requires_pending_state() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "approve", "DC-0001", "--by", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in pending_approval state"));
}

#[test]
fn test_release_requires_approved_state() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "release", "DC-0001", "--by", "boss"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in approved state"));
}

// ============================================================================
// Undo and cancel
// ============================================================================

#[test]
fn test_undo_steps_back_one_state() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "request-approval", "DC-0001"])
        .assert()
        .success();

    mct()
        .current_dir(tmp.path())
        .args(["doc", "undo", "DC-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pending_approval -> draft"));

    // Draft is unmapped: no-op
    mct()
        .current_dir(tmp.path())
        .args(["doc", "undo", "DC-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to undo"));
}

#[test]
fn test_cancel_and_undo_back_to_draft() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "cancel", "DC-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));

    mct()
        .current_dir(tmp.path())
        .args(["doc", "undo", "DC-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled -> draft"));
}

#[test]
fn test_cancel_released_document_fails() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    for args in [
        vec!["doc", "request-approval", "DC-0001"],
        vec!["doc", "approve", "DC-0001", "--by", "alice"],
        vec!["doc", "approve", "DC-0001", "--by", "bob"],
        vec!["doc", "release", "DC-0001", "--by", "boss"],
    ] {
        mct().current_dir(tmp.path()).args(&args).assert().success();
    }

    mct()
        .current_dir(tmp.path())
        .args(["doc", "cancel", "DC-0001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid state transition"));
}

// ============================================================================
// Revision invariant
// ============================================================================

#[test]
fn test_single_unreleased_revision_invariant() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "new-rev", "DC-0001", "--description", "Initial issue"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created revision 1"));

    // Second revision while R1 is still draft must fail
    mct()
        .current_dir(tmp.path())
        .args(["doc", "new-rev", "DC-0001", "--description", "Too soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot create a new revision"));

    // Walk R1 through to released
    for args in [
        vec!["rev", "request-approval", "DC-0001:1"],
        vec!["rev", "approve", "DC-0001:1", "--by", "alice"],
        vec!["rev", "approve", "DC-0001:1", "--by", "bob"],
        vec!["rev", "release", "DC-0001:1", "--by", "boss"],
    ] {
        mct().current_dir(tmp.path()).args(&args).assert().success();
    }

    // Now a second revision may be raised, linked to its predecessor
    mct()
        .current_dir(tmp.path())
        .args(["doc", "new-rev", "DC-0001", "--description", "Tolerance update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created revision 2"))
        .stdout(predicate::str::contains("supersedes 1 earlier revision"));
}

#[test]
fn test_revision_release_notifies_distribution_list() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "new-rev", "DC-0001", "--description", "Initial issue"])
        .assert()
        .success();

    for args in [
        vec!["rev", "request-approval", "DC-0001:1"],
        vec!["rev", "approve", "DC-0001:1", "--by", "alice"],
        vec!["rev", "approve", "DC-0001:1", "--by", "bob"],
    ] {
        mct().current_dir(tmp.path()).args(&args).assert().success();
    }

    mct()
        .current_dir(tmp.path())
        .args(["rev", "release", "DC-0001:1", "--by", "boss"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notified 1 recipients"));

    // Revision show carries the approval and release stamps
    mct()
        .current_dir(tmp.path())
        .args(["rev", "show", "DC-0001:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("released_by: boss"))
        .stdout(predicate::str::contains("approved_by: bob"));
}

#[test]
fn test_request_approval_without_approvers_fails() {
    let tmp = TempDir::new().unwrap();
    mct().current_dir(tmp.path()).arg("init").assert().success();
    new_doc(&tmp, "No Approvers");

    mct()
        .current_dir(tmp.path())
        .args(["doc", "request-approval", "DC-0001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no approvers assigned"));
}

// ============================================================================
// Roster-gated approval
// ============================================================================

#[test]
fn test_roster_role_gate_blocks_unauthorized_approver() {
    let tmp = setup_project();
    new_doc(&tmp, "Bracket Drawing");

    std::fs::write(
        tmp.path().join(".mct/team.yaml"),
        r#"version: 1
members:
  - name: Alice Smith
    email: alice@example.com
    username: alice
    department: Quality
    roles: [quality]
  - name: Bob Wilson
    email: bob@example.com
    username: bob
    department: Production
    roles: []
approval_matrix:
  DOC: [quality]
"#,
    )
    .unwrap();

    mct()
        .current_dir(tmp.path())
        .args(["doc", "request-approval", "DC-0001"])
        .assert()
        .success();

    // Bob is in the approver set but lacks the quality role
    mct()
        .current_dir(tmp.path())
        .args(["doc", "approve", "DC-0001", "--by", "bob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires role quality"));

    mct()
        .current_dir(tmp.path())
        .args(["doc", "approve", "DC-0001", "--by", "alice"])
        .assert()
        .success();
}
