mod common;

use common::fimcheck_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn menu_without_terminal_fails() {
    let temp = TempDir::new().unwrap();

    fimcheck_cmd(temp.path())
        .assert()
        .code(255)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Interactive mode requires a terminal"));

    assert!(!temp.path().join("baseline.json").exists());
}
