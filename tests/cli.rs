use predicates::str::contains;
use std::path::Path;
use tempfile::tempdir;

fn zapcon_cmd(data_dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("zapcon");
    cmd.env("ZAPCON_DATA_DIR", data_dir);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn add_server(data_dir: &Path, args: &[&str]) {
    zapcon_cmd(data_dir)
        .arg("add")
        .args(args)
        .assert()
        .success()
        .stdout(contains("Added server"));
}

#[test]
fn add_and_list_servers() {
    let dir = tempdir().expect("tempdir");

    add_server(
        dir.path(),
        &[
            "--name",
            "office",
            "--host",
            "office.example.com",
            "--user",
            "me",
            "--port",
            "2222",
        ],
    );

    zapcon_cmd(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("office"))
        .stdout(contains("me@office.example.com"))
        .stdout(contains("2222"));
}

#[test]
fn list_without_servers() {
    let dir = tempdir().expect("tempdir");

    zapcon_cmd(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No servers found."));
}

#[test]
fn remove_server_clears_list() {
    let dir = tempdir().expect("tempdir");
    add_server(dir.path(), &["--name", "lab", "--host", "lab.example.com", "--user", "me"]);

    zapcon_cmd(dir.path())
        .args(["remove", "--name", "lab"])
        .assert()
        .success();

    zapcon_cmd(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No servers found."));
}

#[test]
fn update_changes_stored_server() {
    let dir = tempdir().expect("tempdir");
    add_server(dir.path(), &["--name", "lab", "--host", "old.example.com", "--user", "me"]);

    zapcon_cmd(dir.path())
        .args(["update", "--name", "lab", "--host", " new.example.com ", "--port", "2222"])
        .args(["--rename", "lab2"])
        .assert()
        .success()
        .stdout(contains("Updated server"))
        .stdout(contains("lab2"));

    zapcon_cmd(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("lab2"))
        .stdout(contains("me@new.example.com"))
        .stdout(contains("2222"));
}

#[test]
fn update_unknown_server_fails() {
    let dir = tempdir().expect("tempdir");

    zapcon_cmd(dir.path())
        .args(["update", "--id", "42", "--host", "h"])
        .assert()
        .failure()
        .stderr(contains("server 42 not found"));
}

#[test]
fn update_to_taken_name_fails() {
    let dir = tempdir().expect("tempdir");
    add_server(dir.path(), &["--name", "a", "--host", "a.example.com", "--user", "me"]);
    add_server(dir.path(), &["--name", "b", "--host", "b.example.com", "--user", "me"]);

    zapcon_cmd(dir.path())
        .args(["update", "--name", "b", "--rename", "a"])
        .assert()
        .failure()
        .stderr(contains("already exists"));
}

#[test]
fn add_duplicate_name_fails() {
    let dir = tempdir().expect("tempdir");
    add_server(dir.path(), &["--name", "prod", "--host", "prod.example.com", "--user", "deploy"]);

    zapcon_cmd(dir.path())
        .args(["add", "--name", "prod", "--host", "other.example.com", "--user", "deploy"])
        .assert()
        .failure()
        .stderr(contains("already exists"));
}

#[test]
fn add_with_blank_user_fails() {
    let dir = tempdir().expect("tempdir");

    zapcon_cmd(dir.path())
        .args(["add", "--host", "h", "--user", "  "])
        .assert()
        .failure()
        .stderr(contains("must not be empty"));
}

#[test]
fn connect_unknown_server_fails() {
    let dir = tempdir().expect("tempdir");

    zapcon_cmd(dir.path())
        .args(["connect", "--name", "nonexistent"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn connect_requires_a_selector() {
    let dir = tempdir().expect("tempdir");

    zapcon_cmd(dir.path()).arg("connect").assert().failure();
}

#[test]
fn config_sets_and_clears_terminal() {
    let dir = tempdir().expect("tempdir");

    zapcon_cmd(dir.path())
        .args(["config", "--terminal", " /usr/bin/xterm "])
        .assert()
        .success()
        .stdout(contains("terminal: /usr/bin/xterm"));

    let written = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert!(written.contains(r#""terminalPath": "/usr/bin/xterm""#));

    zapcon_cmd(dir.path())
        .args(["config", "--clear-terminal"])
        .assert()
        .success()
        .stdout(contains("auto-detect"));
}

#[cfg(all(unix, not(target_os = "macos")))]
mod posix {
    use super::*;

    #[test]
    fn connect_without_terminal_fails_and_spawns_nothing() {
        let dir = tempdir().expect("tempdir");
        add_server(dir.path(), &["--name", "box", "--host", "10.0.0.5", "--user", "root"]);

        zapcon_cmd(dir.path())
            .args(["connect", "--name", "box"])
            .assert()
            .failure()
            .stderr(contains("could not connect to box"));

        zapcon_cmd(dir.path())
            .args(["connect", "--name", "box", "--dry-run"])
            .assert()
            .failure()
            .stderr(contains("no terminal application configured"));
    }

    #[test]
    fn dry_run_shows_terminal_invocation() {
        let dir = tempdir().expect("tempdir");
        add_server(
            dir.path(),
            &["--name", "box", "--host", "10.0.0.5", "--user", "root", "--port", "2222"],
        );
        zapcon_cmd(dir.path())
            .args(["update", "--name", "box", "--key", "/keys/my key.pem"])
            .assert()
            .success();
        zapcon_cmd(dir.path())
            .args(["config", "--terminal", "/usr/bin/xterm"])
            .assert()
            .success();

        zapcon_cmd(dir.path())
            .args(["connect", "--name", "box", "--dry-run"])
            .assert()
            .success()
            .stdout(contains(concat!(
                r#"/usr/bin/xterm -- bash -c "#,
                r#"'ssh -i '"'"'/keys/my key.pem'"'"' -p 2222 root@10.0.0.5; exec bash'"#,
            )));
    }

    #[test]
    fn connect_with_missing_terminal_binary_fails() {
        let dir = tempdir().expect("tempdir");
        add_server(dir.path(), &["--name", "box", "--host", "h", "--user", "u"]);
        zapcon_cmd(dir.path())
            .args(["config", "--terminal", "/nonexistent/zapcon-terminal"])
            .assert()
            .success();

        zapcon_cmd(dir.path())
            .args(["connect", "--name", "box"])
            .assert()
            .failure()
            .stderr(contains("could not connect to box"));
    }
}
