use std::{fs, path::Path};

use assert_cmd::Command;

// Run the `sgit` binary in `dir` with a predictable author identity.
#[allow(dead_code)]
pub fn sgit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sgit").unwrap();
    cmd.current_dir(dir)
        .env_remove("SGIT_AUTHOR_NAME")
        .env_remove("SGIT_AUTHOR_EMAIL")
        .env_remove("SGIT_LOG");
    cmd
}

#[allow(dead_code)]
pub fn init_empty_repo(dir: &Path) {
    sgit(dir).args(&["init", "."]).assert().success();
}

#[allow(dead_code)]
pub fn write_file(dir: &Path, path: &str, content: &str) {
    let file = dir.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

// Run a command that must succeed and return its stdout.
#[allow(dead_code)]
pub fn stdout_of(dir: &Path, args: &[&str]) -> String {
    let output = sgit(dir).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "sgit {:?} failed:\n{}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}
