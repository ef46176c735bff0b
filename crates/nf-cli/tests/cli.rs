//! Integration tests for the `nf` binary

#![allow(deprecated)]

use assert_cmd::{assert::OutputAssertExt, cargo::CommandCargoExt};
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

use nf_testkit::MockBackend;

fn nf(store: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nf").unwrap();
    cmd.env("NF_STORE_PATH", store.path().join("nf.db"))
        .env_remove("NF_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    nf(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("follow"));
}

#[test]
fn test_feed_without_login_is_redirected() {
    let tmp = TempDir::new().unwrap();
    nf(&tmp)
        .arg("feed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in. Run `nf login"));
}

#[test]
fn test_post_and_follow_without_login_are_redirected() {
    let tmp = TempDir::new().unwrap();
    nf(&tmp)
        .args(["post", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
    nf(&tmp)
        .args(["follow", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn test_whoami_signed_out() {
    let tmp = TempDir::new().unwrap();
    nf(&tmp)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}

#[test]
fn test_register_rejects_short_password_locally() {
    let tmp = TempDir::new().unwrap();
    nf(&tmp)
        .args(["register", "alice", "123", "--api-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password must be at least 6 characters"));
}

#[test]
fn test_network_commands_need_api_url() {
    let tmp = TempDir::new().unwrap();
    nf(&tmp)
        .args(["login", "alice", "secret1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API URL configured"));
}

#[test]
fn test_full_session_against_mock_backend() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let backend = rt.block_on(MockBackend::spawn()).unwrap();
    let bob = backend.seed_user("bob", "secret1");
    for i in 0..3 {
        backend.seed_post(bob, &format!("bob says {}", i), &format!("2024-03-01T10:0{}:00Z", i));
    }
    let url = backend.base_url.clone();
    let tmp = TempDir::new().unwrap();

    nf(&tmp)
        .args(["register", "alice", "secret1", "--api-url", &url])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome, alice!"));

    // username is not persisted between runs
    nf(&tmp)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::diff("Signed in.\n"));

    nf(&tmp)
        .args(["follow", &bob.to_string(), "--api-url", &url])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Successfully followed User #{}", bob)));
    assert!(backend.is_following(2, bob));

    nf(&tmp)
        .args(["follow", "abc", "--api-url", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a valid User ID"));

    nf(&tmp)
        .args(["post", "   ", "--api-url", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Post cannot be empty"));

    nf(&tmp)
        .args(["feed", "--json", "--api-url", &url])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"content\": \"bob says 2\""))
        .stdout(predicate::str::contains("\"authorId\""));

    nf(&tmp)
        .args(["feed", "--pages", "3", "--api-url", &url])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("NewsFeed | [Feed] | People | Logout\n"))
        .stdout(predicate::str::contains(format!("User #{} ·", bob)))
        .stdout(predicate::str::contains("You've reached the end."));

    nf(&tmp).arg("logout").assert().success();
    nf(&tmp)
        .args(["feed", "--api-url", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}
