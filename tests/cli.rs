//! End-to-end runs of the rsyncr binary against a fake rsync.
//!
//! The fake answers `--version`, prints a canned itemized plan for dry runs (`-n`)
//! and records every other invocation, so the tests can see whether a real transfer
//! would have happened.
#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use tempfile::TempDir;

const FAKE_RSYNC: &str = r#"#!/bin/sh
for a in "$@"; do
  if [ "$a" = "--version" ]; then
    echo "rsync  version 3.2.7  protocol version 31"
    exit 0
  fi
done
for a in "$@"; do
  if [ "$a" = "-n" ]; then
    cat "$FAKE_RSYNC_PLAN"
    exit 0
  fi
done
echo "$*" >> "$FAKE_RSYNC_LOG"
exit "${FAKE_RSYNC_EXIT:-0}"
"#;

struct Fixture {
    _root: TempDir,
    source: PathBuf,
    target: PathBuf,
    rsync: PathBuf,
    plan: PathBuf,
    log: PathBuf,
}

impl Fixture {
    fn new(plan: &str) -> Self {
        Self::with_target_name(plan, "photos")
    }

    fn with_target_name(plan: &str, name: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().canonicalize().unwrap();
        let source = base.join("src").join("photos");
        let target = base.join("dst").join(name);
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&target).unwrap();
        let rsync = base.join("rsync");
        fs::write(&rsync, FAKE_RSYNC).unwrap();
        fs::set_permissions(&rsync, fs::Permissions::from_mode(0o755)).unwrap();
        let plan_file = base.join("plan.txt");
        fs::write(&plan_file, plan).unwrap();
        Self {
            _root: root,
            source,
            target,
            rsync,
            plan: plan_file,
            log: base.join("calls.log"),
        }
    }

    fn cmd(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("rsyncr").unwrap();
        cmd.current_dir(&self.source)
            .env("RSYNC", &self.rsync)
            .env("FAKE_RSYNC_PLAN", &self.plan)
            .env("FAKE_RSYNC_LOG", &self.log)
            .env_remove("FAKE_RSYNC_EXIT")
            .env_remove("RSYNCR_LOG")
            .arg(&self.target)
            .args(args);
        cmd
    }

    /// Transfers that were not dry runs.
    fn transfers(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .map(|s| s.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

fn stdout(cmd: &mut Command, code: i32) -> String {
    let assert = cmd.assert().code(code);
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

fn stderr(cmd: &mut Command, code: i32) -> String {
    let assert = cmd.assert().code(code);
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

#[test]
fn harmless_update_runs_rsync() {
    let f = Fixture::new("sending incremental file list\n>f+++++++++ a.jpg\n>f.st...... b.jpg\n");
    let out = stdout(&mut f.cmd(&[]), 0);
    assert!(out.contains("1     added files"));
    assert!(out.contains("1     chngd files"));
    let runs = f.transfers();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].contains("-u") && runs[0].contains("--stats"));
    assert!(runs[0].ends_with(&format!("{}/", f.target.display())));
}

#[test]
fn deletions_are_blocked_without_force() {
    let f = Fixture::new("*deleting   old.jpg\n");
    let out = stdout(&mut f.cmd(&[]), 101);
    assert!(out.contains("1     remvd entries"));
    assert!(f.transfers().is_empty());

    f.cmd(&["--force"]).assert().code(0);
    assert_eq!(f.transfers().len(), 1);
}

#[test]
fn file_replaced_by_directory_is_blocked() {
    let f = Fixture::new("*deleting   trip\ncd+++++++++ trip/\n>f+++++++++ trip/a.jpg\n");
    let out = stdout(&mut f.cmd(&[]), 101);
    assert!(out.contains("1     remvd entries"));
    assert!(out.contains("1     Added dirs (including 1 files)"));
    assert!(!out.contains("Moved dirs"));
    assert!(f.transfers().is_empty());
}

#[test]
fn sync_mode_accepts_deletions() {
    let f = Fixture::new("*deleting   old.jpg\n");
    f.cmd(&["--sync"]).assert().code(0);
    let runs = f.transfers();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].contains("--delete-after"));
}

#[test]
fn moves_are_blocked_even_when_syncing() {
    let f = Fixture::new("*deleting   2019/\ncd+++++++++ 2020/\n>f+++++++++ 2020/a.jpg\n");
    let out = stdout(&mut f.cmd(&["-s"]), 101);
    assert!(out.contains("Added dirs (including 1 files)"));
    assert!(out.contains("1     Moved dirs (maybe)"));
    assert!(f.transfers().is_empty());
}

#[test]
fn file_moves_are_reported() {
    let f = Fixture::new("*deleting   2019/a.jpg\n>f+++++++++ 2020/a.jpg\n");
    let out = stdout(&mut f.cmd(&["--sync"]), 101);
    assert!(out.contains("1     moved files (maybe)"));
    f.cmd(&["--sync", "-y"]).assert().code(0);
}

#[test]
fn simulation_stops_before_transfer() {
    let f = Fixture::new("*deleting   old.jpg\n*deleting   2019/\n");
    let out = stdout(&mut f.cmd(&["-n"]), 100);
    assert!(out.contains("2     remvd entries"));
    assert!(f.transfers().is_empty());
}

#[test]
fn nothing_to_do() {
    let f = Fixture::new("sending incremental file list\n.d..t...... ./\n\nsent 10 bytes\n");
    let out = stdout(&mut f.cmd(&[]), 0);
    assert!(out.contains("Nothing to do."));
    assert!(f.transfers().is_empty());
}

#[test]
fn excluded_entries_are_ignored() {
    let f = Fixture::new("*deleting   notes.txt~~\n*deleting   tmp/cache.bin\n");
    stdout(&mut f.cmd(&[]), 101);
    let out = stdout(&mut f.cmd(&["--exclude", "tmp/"]), 0);
    assert!(out.contains("Nothing to do."));
}

#[test]
fn folder_names_must_match() {
    let f = Fixture::with_target_name(">f+++++++++ a.jpg\n", "music");
    f.cmd(&[]).assert().code(101);
    assert!(f.transfers().is_empty());
    f.cmd(&["--force-foldername"]).assert().code(0);
    assert_eq!(f.transfers().len(), 1);
}

#[test]
fn simulation_ignores_folder_names() {
    let f = Fixture::with_target_name(">f+++++++++ a.jpg\n", "Music");
    f.cmd(&["--simulate"]).assert().code(100);
}

#[test]
fn missing_target() {
    let f = Fixture::new("");
    let mut cmd = Command::cargo_bin("rsyncr").unwrap();
    let missing = f.target.parent().unwrap().join("nope");
    let err = stderr(
        cmd.current_dir(&f.source)
            .env("RSYNC", &f.rsync)
            .arg(&missing),
        103,
    );
    assert!(err.contains("Create it manually"));
}

#[test]
fn target_inside_source() {
    let f = Fixture::new("");
    let inner = f.source.join("photos");
    fs::create_dir(&inner).unwrap();
    let mut cmd = Command::cargo_bin("rsyncr").unwrap();
    cmd.current_dir(&f.source)
        .env("RSYNC", &f.rsync)
        .arg(&inner)
        .assert()
        .code(103);
}

#[test]
fn rsync_failures_are_passed_through() {
    let f = Fixture::new(">f+++++++++ a.jpg\n");
    let err = stderr(f.cmd(&[]).env("FAKE_RSYNC_EXIT", "23"), 23);
    assert!(err.contains("rsync exited with code 23"));
}

#[test]
fn malformed_lines_are_skipped() {
    let f = Fixture::new(">q+++++++++ weird\n>f+++++++++ a.jpg\n");
    let err = stderr(&mut f.cmd(&[]), 0);
    assert!(err.contains("skipping rsync output"));
    assert_eq!(f.transfers().len(), 1);
}

#[test]
fn ask_can_abort_or_continue() {
    let f = Fixture::new("*deleting   old.jpg\n");
    let out = stdout(f.cmd(&["--ask"]).write_stdin("r\nx\n"), 102);
    assert!(out.contains("  old.jpg\n"));
    assert!(f.transfers().is_empty());

    f.cmd(&["-i"]).write_stdin("y\n").assert().code(0);
    assert_eq!(f.transfers().len(), 1);
}

#[test]
fn ask_can_switch_mode() {
    let f = Fixture::new("*deleting   old.jpg\n");
    f.cmd(&["-i"]).write_stdin("sync\n").assert().code(0);
    let runs = f.transfers();
    assert!(runs[0].contains("--delete-after"));
}

#[test]
fn add_mode_skips_the_dry_run() {
    let f = Fixture::new("*deleting   old.jpg\n");
    let out = stdout(&mut f.cmd(&["--add"]), 0);
    assert!(!out.contains("remvd"));
    let runs = f.transfers();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].contains("--ignore-existing"));
}

#[test]
fn single_file_mode() {
    let f = Fixture::new("");
    fs::write(f.source.join("a.jpg"), "x").unwrap();
    f.cmd(&["--file", "a.jpg"]).assert().code(0);
    let runs = f.transfers();
    assert!(runs[0].contains("-P"));
    assert!(!runs[0].split(' ').any(|a| a == "-r"));
    assert!(runs[0].contains(&format!("{}", Path::new(&f.source).join("a.jpg").display())));
}

#[test]
fn estimate_reads_statistics() {
    let f = Fixture::new("Number of files: 3 (reg: 2, dir: 1)\nTotal file size: 1,048,576 bytes\n");
    let out = stdout(f.cmd(&["--estimate", "-n"]).write_stdin("\n"), 100);
    assert!(out.contains("Estimated run time for 3 entries"));
    assert!(out.contains("Nothing to do."));
}
