//! `<product> config` without a terminal.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn nomad_deploy() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("nomad-deploy"));
    cmd.env("NO_COLOR", "1").env_remove("NOMAD_DEPLOY_FILE");
    cmd
}

const TOPOLOGY: &str = "\
dcName: dc1
version: 1.10.0
gossipEnabled: true
tlsEnabled: true
servers:
  - address: 10.0.0.1
    number: 0
clients:
  - address: 10.0.0.2
    sshPort: 2222
    user: ops
    number: 0
sshKey: ~/.ssh/id_rsa
";

#[test]
fn test_config_show_prints_hosts_and_flags() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("consul.yaml"), TOPOLOGY).expect("write");
    nomad_deploy()
        .current_dir(dir.path())
        .args(["consul", "config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dc1"))
        .stdout(predicate::str::contains("root@10.0.0.1:22"))
        .stdout(predicate::str::contains("ops@10.0.0.2:2222"))
        .stdout(predicate::str::contains("client-0"));
}

#[test]
fn test_config_show_without_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    nomad_deploy()
        .current_dir(dir.path())
        .args(["nomad", "config", "--show"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nomad.yaml"));
}

#[test]
fn test_config_survey_refuses_non_interactive_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    nomad_deploy()
        .current_dir(dir.path())
        .env("CI", "1")
        .args(["consul", "config"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("interactive terminal"));
    assert!(!dir.path().join("consul.yaml").exists());
}
