use assert_cmd::Command;
use predicates::prelude::*;

const SNAPSHOT: &str = r#"{
    "timezone": "UTC",
    "availability": [
        {"dayOfWeek": 1, "startTime": "09:00", "endTime": "17:00"}
    ],
    "booked": [
        {"scheduledAt": "2026-03-23T14:00:00Z", "duration": 60}
    ],
    "timeBlocks": []
}"#;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("tutor-schedule").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn slots_from_stdin() {
    let out = cmd()
        .args(["slots", "--input", "-", "--date", "2026-03-16", "--duration", "60"])
        .args(["--now", "2026-03-16T08:00:00Z"])
        .write_stdin(SNAPSHOT)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let slots = json(&out);
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 15);
    assert_eq!(slots[0]["label"], "9:00 AM");
    assert_eq!(slots[0]["time"], "09:00");
    assert_eq!(slots[14]["label"], "4:00 PM");
}

#[test]
fn slots_step_from_environment() {
    let out = cmd()
        .env("TUTOR_SCHEDULE_SCHEDULING__SLOT_STEP_MINUTES", "60")
        .args(["slots", "-i", "-", "-d", "2026-03-16", "--duration", "60"])
        .args(["--now", "2026-03-16T08:00:00Z"])
        .write_stdin(SNAPSHOT)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(json(&out).as_array().unwrap().len(), 8);
}

#[test]
fn plan_weekly_without_snapshot() {
    let out = cmd()
        .args(["plan", "--date", "2026-03-16", "--time", "2:00 PM"])
        .args(["--frequency", "weekly", "--count", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = json(&out);
    let occ = report["occurrences"].as_array().unwrap();
    assert_eq!(occ.len(), 3);
    assert_eq!(occ[0]["start"], "2026-03-16T14:00:00Z");
    assert_eq!(occ[2]["date"], "2026-03-30");
    assert!(report.get("resolution").is_none());
}

#[test]
fn plan_reports_partial_conflict() {
    let out = cmd()
        .args(["plan", "-d", "2026-03-16", "-t", "2:00 PM", "-f", "weekly", "-c", "4", "-i", "-"])
        .write_stdin(SNAPSHOT)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = json(&out);
    assert_eq!(report["resolution"], "PARTIAL_CONFLICT");
    assert_eq!(report["conflicts"].as_array().unwrap().len(), 1);
    assert_eq!(report["conflicts"][0]["index"], 1);
    assert_eq!(report["validSessions"].as_array().unwrap().len(), 3);
}

#[test]
fn plan_rejects_count_over_limit() {
    cmd()
        .args(["plan", "-d", "2026-03-16", "-t", "2:00 PM", "-f", "weekly", "-c", "53"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("count must be between 1 and 52"));
}

#[test]
fn max_occurrences_above_52_rejected_from_environment() {
    cmd()
        .env("TUTOR_SCHEDULE_SCHEDULING__MAX_OCCURRENCES", "100")
        .args(["plan", "-d", "2026-03-16", "-t", "2:00 PM", "-f", "weekly", "-c", "80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_occurrences must be between 1 and 52"));
}

#[test]
fn plan_rejects_bad_time_label() {
    cmd()
        .args(["plan", "-d", "2026-03-16", "-t", "13:00 PM"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid time"));
}

#[test]
fn slots_rejects_malformed_snapshot() {
    cmd()
        .args(["slots", "-i", "-", "-d", "2026-03-16"])
        .write_stdin("{\"availability\": [{\"dayOfWeek\": 1}]}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid availability snapshot JSON"));
}
