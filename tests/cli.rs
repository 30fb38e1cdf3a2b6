//! Exit-code and usage-message behavior only observable at the process
//! boundary, driven against the compiled `lox` binary.

use assert_cmd::Command;

#[test]
fn running_a_clean_script_exits_zero_and_prints_its_output() {
    Command::cargo_bin("lox")
        .unwrap()
        .arg("tests/fixtures/ok.lox")
        .assert()
        .success()
        .stdout("hello\n3\n");
}

#[test]
fn a_parse_error_exits_sixty_five() {
    Command::cargo_bin("lox")
        .unwrap()
        .arg("tests/fixtures/parse_error.lox")
        .assert()
        .code(65);
}

#[test]
fn a_runtime_error_exits_seventy() {
    Command::cargo_bin("lox")
        .unwrap()
        .arg("tests/fixtures/runtime_error.lox")
        .assert()
        .code(70);
}

#[test]
fn too_many_arguments_prints_usage_and_exits_sixty_four() {
    Command::cargo_bin("lox")
        .unwrap()
        .arg("tests/fixtures/ok.lox")
        .arg("extra")
        .assert()
        .code(64)
        .stderr("Usage: lox [script]\n");
}

#[test]
fn a_missing_script_file_exits_seventy_four() {
    Command::cargo_bin("lox")
        .unwrap()
        .arg("tests/fixtures/does_not_exist.lox")
        .assert()
        .code(74);
}
