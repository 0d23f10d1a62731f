//! Exactly one daemon instance per host.

#![cfg(unix)]

use std::fs::OpenOptions;
use std::path::Path;

use assert_cmd::Command;
use fs2::FileExt;
use tempfile::TempDir;

use pairsync_core::config::{app_dir_at, config_path_at};

fn pairsync(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pairsync").expect("binary");
    cmd.env("HOME", home).env("USERPROFILE", home);
    cmd
}

/// Keep desktop alerts away from the test machine's notification daemon.
fn stub_notify_send(dir: &Path) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("notify-send");
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    format!(
        "{}:{}",
        dir.display(),
        std::env::var("PATH").unwrap_or_default()
    )
}

#[test]
fn second_instance_exits_1_with_no_side_effects() {
    let home = TempDir::new().expect("home");
    let app_dir = app_dir_at(home.path());
    std::fs::create_dir_all(&app_dir).expect("app dir");

    // Pose as the winning instance.
    let lock_path = app_dir.join("pairsync.lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .expect("open lock");
    lock_file.try_lock_exclusive().expect("hold lock");

    pairsync(home.path())
        .arg("--single")
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr("");

    assert!(
        !config_path_at(home.path()).exists(),
        "loser must not create a config file"
    );
    assert!(
        !app_dir.join("pairsync.log").exists(),
        "loser must not open the log"
    );
}

#[test]
fn lock_release_unblocks_the_next_start() {
    let home = TempDir::new().expect("home");
    let app_dir = app_dir_at(home.path());
    std::fs::create_dir_all(&app_dir).expect("app dir");

    let lock_path = app_dir.join("pairsync.lock");
    {
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .expect("open lock");
        lock_file.try_lock_exclusive().expect("hold lock");
        // Dropped here: the lock dies with the handle.
    }

    // With the lock free the run proceeds to first-run onboarding.
    let bin = TempDir::new().expect("bin");
    pairsync(home.path())
        .env("PATH", stub_notify_send(bin.path()))
        .arg("--single")
        .assert()
        .failure()
        .code(1);
    assert!(config_path_at(home.path()).exists());
}
