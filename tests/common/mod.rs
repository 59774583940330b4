use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::path::Path;
use std::process::Output;

pub fn fimcheck_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("fimcheck");
    cmd.arg("-C").arg(cwd);
    cmd
}

// Each integration test file is compiled as its own crate, and not every one
// uses every helper.
#[allow(dead_code)]
pub fn check_output(cwd: &Path, args: &[&str]) -> Output {
    let mut cmd = fimcheck_cmd(cwd);
    cmd.arg("check").args(args);
    cmd.output().expect("failed to run `fimcheck check`")
}

#[allow(dead_code)]
pub fn extract_fingerprint(stdout: &[u8]) -> String {
    let output = std::str::from_utf8(stdout).expect("check stdout should be UTF-8");
    output
        .lines()
        .find_map(|line| line.strip_prefix("Fingerprint: "))
        .expect("fingerprint not found in output")
        .to_string()
}

#[allow(dead_code)]
pub fn read_baseline(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).expect("baseline file should exist");
    serde_json::from_str(&content).expect("baseline file should be JSON")
}
