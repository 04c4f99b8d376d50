use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../ade-schedule/tests/fixtures/ade_export.ics"
);

const LESSON: &str = "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
SUMMARY:R1.01 Intro (A) - B\n\
DESCRIPTION:R1 - TP A\\nTrainer X\n\
DTSTART:20240101T090000\n\
DTEND:20240101T110000\n\
LOCATION:RoomA,RoomB\n\
END:VEVENT\n\
END:VCALENDAR\n";

fn cmd() -> Command {
    Command::cargo_bin("ade-schedule").unwrap()
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn test_merged_from_stdin() {
    let output = cmd().write_stdin(LESSON).assert().success().get_output().stdout.clone();
    let json = stdout_json(&output);
    let merged = json.as_array().unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0]["parsed"]["code"], "R1.01");
    assert_eq!(merged[0]["parsed"]["groupFormat"], "TP");
    assert_eq!(merged[0]["parsed"]["trainer"], "Trainer X");
    assert_eq!(merged[0]["raw"]["LOCATION"], "RoomA,RoomB");
}

#[test]
fn test_dash_reads_stdin() {
    cmd()
        .args(["-", "--stage", "raw"])
        .write_stdin(LESSON)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"SUMMARY\":\"R1.01 Intro (A) - B\""));
}

#[test]
fn test_parsed_stage_from_file_with_filters() {
    let output = cmd()
        .args([FIXTURE, "--stage", "parsed", "--group", "C"])
        .args(["--from", "2024-09-09", "--to", "2024-09-15"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = stdout_json(&output);
    let parsed = json.as_array().unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0]["index"], 3);
    assert_eq!(parsed[0]["groupFormat"], "CM");
}

#[test]
fn test_location_filter() {
    let output = cmd()
        .args([FIXTURE, "--stage", "parsed", "--location", "B102"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json[0]["location"], serde_json::json!(["B101", "B102"]));
}

#[test]
fn test_pretty_output() {
    cmd()
        .args(["--pretty", "--stage", "parsed"])
        .write_stdin(LESSON)
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  {\n"));
}

#[test]
fn test_timezone_shifts_floating_times() {
    let output = cmd()
        .args(["--stage", "parsed", "--timezone", "Europe/Paris"])
        .write_stdin(LESSON)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json[0]["start"], "2024-01-01T08:00:00Z");
}

#[test]
fn test_not_ics_fails() {
    cmd()
        .write_stdin("hello world")
        .assert()
        .failure()
        .stderr(predicate::str::contains("The content is not in ICS format."));
}

#[test]
fn test_reversed_period_fails() {
    cmd()
        .args(["--from", "2024-02-01", "--to", "2024-01-01"])
        .write_stdin(LESSON)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The start date (from) must be before or equal to the end date (to).",
        ));
}

#[test]
fn test_no_survivors_fails_merge() {
    cmd()
        .args(["--group", "Z"])
        .write_stdin(LESSON)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No parsed events to merge."));
}

#[test]
fn test_no_survivors_parsed_is_empty_array() {
    cmd()
        .args(["--group", "Z", "--stage", "parsed"])
        .write_stdin(LESSON)
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn test_invalid_timezone_rejected() {
    cmd()
        .args(["--timezone", "Mars/Olympus"])
        .write_stdin(LESSON)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown IANA timezone"));
}

#[test]
fn test_missing_file_reports_path() {
    cmd()
        .arg("/nonexistent/schedule.ics")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read /nonexistent/schedule.ics"));
}
