//! The `vmsim` binary: exit status and the printed report.

use std::process::{Command, Output};

fn vmsim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vmsim"))
        .args(args)
        .env_remove("LOG")
        .output()
        .unwrap()
}

#[test]
fn clean_run_prints_report_and_exits_zero() {
    let out = vmsim(&["--seed", "7", "4", "2", "nfu", "R0", "R1", "W2", "R0"]);
    assert!(out.status.success(), "{:?}", out);
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("The hit ratio is: 0.00%"), "{}", stdout);
    assert!(stdout.contains("4 disk accesses in total"), "{}", stdout);
}

#[test]
fn hits_show_up_in_the_ratio() {
    let out = vmsim(&["4", "2", "aging", "R0", "R0", "W0", "R1"]);
    assert!(out.status.success(), "{:?}", out);
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("The hit ratio is: 50.00%"), "{}", stdout);
    assert!(stdout.contains("2 disk accesses in total"), "{}", stdout);
}

#[test]
fn unknown_policy_exits_one() {
    let out = vmsim(&["4", "2", "lru", "R0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn out_of_range_page_exits_one() {
    let out = vmsim(&["4", "2", "nfu", "R0", "R4"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn bad_counts_exit_one() {
    for args in [
        &["4", "0", "nfu", "R0"][..],
        &["0", "2", "nfu", "R0"][..],
        &["4", "two", "nfu", "R0"][..],
        &["4", "-1", "nfu", "R0"][..],
    ] {
        let out = vmsim(args);
        assert_eq!(out.status.code(), Some(1), "{:?}", args);
    }
}

#[test]
fn malformed_request_exits_one() {
    let out = vmsim(&["4", "2", "random", "R0", "Wx"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn unknown_log_level_exits_one() {
    let out = vmsim(&["--log", "verbose", "4", "2", "nfu", "R0"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("unknown log level `verbose`"), "{}", stderr);
}
