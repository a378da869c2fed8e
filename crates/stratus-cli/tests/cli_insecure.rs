use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn http_requires_insecure_flag() {
    let home_dir = tempfile::tempdir().expect("tempdir");
    let home = home_dir.path();

    Command::new(assert_cmd::cargo::cargo_bin!("stratus"))
        .env("HOME", home)
        .env_remove("OS_TOKEN")
        .args([
            "--auth-url",
            "http://identity.example.com/v2.0",
            "--username",
            "demo",
            "--password",
            "secret",
            "token",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "refusing to use http:// without --insecure",
        ));
}
