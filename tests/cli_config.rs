use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;
use tt::config::{ConfigStore, FileConfigStore};

#[test]
fn write_config_saves_the_prompt_override() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    Command::cargo_bin("tt")
        .unwrap()
        .arg("-c")
        .arg(&path)
        .args(["-p", "the quick brown fox", "--write-config"])
        .assert()
        .success();

    let cfg = FileConfigStore::with_path(&path).load().unwrap();
    assert_eq!(cfg.phrase, "the quick brown fox");
}

#[test]
fn write_config_leaves_a_malformed_file_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    Command::cargo_bin("tt")
        .unwrap()
        .arg("-c")
        .arg(&path)
        .arg("--write-config")
        .assert()
        .failure();

    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn write_config_rejects_an_empty_prompt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    Command::cargo_bin("tt")
        .unwrap()
        .arg("-c")
        .arg(&path)
        .args(["-p", "   ", "--write-config"])
        .assert()
        .failure();

    assert!(!path.exists());
}
