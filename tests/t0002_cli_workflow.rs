use std::fs;

use predicates::prelude::*;

mod common;

#[test]
fn add_commit_log_checkout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path();
    common::init_empty_repo(path);

    common::write_file(path, "a/b.txt", "hi");
    common::sgit(path).args(&["add", "a/b.txt"]).assert().success();

    common::sgit(path)
        .args(&["commit", "-m", "first"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[master "))
        .stdout(predicate::str::ends_with("] first\n"));

    common::sgit(path).args(&["tag", "v1"]).assert().success();

    common::write_file(path, "a/b.txt", "hello");
    common::write_file(path, "c", "c");
    common::sgit(path).args(&["add", "a/b.txt", "c"]).assert().success();
    common::sgit(path).args(&["commit", "-m", "second"]).assert().success();

    let log = common::stdout_of(path, &["log"]);
    assert_eq!(log.lines().filter(|l| l.starts_with("commit ")).count(), 2);
    assert!(log.starts_with("commit "));
    assert!(log.contains("(HEAD -> master)"));
    assert!(log.contains("(tag: v1)"));

    common::sgit(path)
        .args(&["checkout", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("HEAD is now at "));

    assert_eq!(fs::read_to_string(path.join("a/b.txt")).unwrap(), "hi");
    assert_eq!(common::stdout_of(path, &["ls-files"]), "a/b.txt\n");

    common::sgit(path)
        .args(&["status"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("HEAD detached at "));
}

#[test]
fn hash_object_and_cat_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path();
    common::init_empty_repo(path);

    let output = common::sgit(path)
        .args(&["hash-object", "-w", "--stdin"])
        .write_stdin("")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = String::from_utf8(output).unwrap();
    let id = id.trim_end();
    assert_eq!(id.len(), 20);

    assert_eq!(common::stdout_of(path, &["cat-file", "-t", id]), "blob\n");
    assert_eq!(common::stdout_of(path, &["cat-file", "-s", id]), "0\n");

    common::sgit(path)
        .args(&["cat-file", "-p", "ffffffffffffffffffff"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("ERROR: not found"));
}

#[test]
fn diff_against_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path();
    common::init_empty_repo(path);

    common::write_file(path, "notes.txt", "alpha\nbeta\n");
    common::sgit(path).args(&["add", "notes.txt"]).assert().success();
    common::sgit(path).args(&["diff"]).assert().success().stdout("");

    common::write_file(path, "notes.txt", "alpha\ngamma\n");
    common::sgit(path)
        .args(&["diff"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("--- a/notes.txt\n+++ b/notes.txt\n"))
        .stdout(predicate::str::contains(" alpha\n-beta\n+gamma\n"));
}
