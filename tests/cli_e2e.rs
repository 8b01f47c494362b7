//! End-to-end CLI tests for the album-dl binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn album_dl() -> Command {
    Command::cargo_bin("album-dl").unwrap()
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    album_dl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download every image"))
        .stdout(predicate::str::contains("--workers"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    album_dl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("album-dl"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    album_dl()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_rejects_out_of_range_workers() {
    album_dl()
        .args(["-w", "0", "https://example.com/album"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("workers"));
}

#[test]
fn test_binary_rejects_non_http_album_url() {
    let out = TempDir::new().unwrap();
    album_dl()
        .arg("ftp://example.com/album")
        .arg("-o")
        .arg(out.path())
        .write_stdin("")
        .assert()
        .failure();
}

#[test]
fn test_binary_rejects_invalid_selector() {
    let out = TempDir::new().unwrap();
    album_dl()
        .args(["https://example.com/album", "--image-selector", "div["])
        .arg("-o")
        .arg(out.path())
        .write_stdin("")
        .assert()
        .failure();
}

/// Empty piped stdin means there is nothing to download.
#[test]
fn test_binary_empty_stdin_exits_cleanly() {
    album_dl().write_stdin("").assert().success();
}

#[tokio::test]
async fn test_binary_downloads_url_list_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"first".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"second".to_vec()))
        .mount(&server)
        .await;

    let work = TempDir::new().unwrap();
    let list = work.path().join("urls.txt");
    std::fs::write(
        &list,
        format!("{uri}/1.jpg\n{uri}/2.jpg\n", uri = server.uri()),
    )
    .unwrap();
    let out = work.path().join("pics");

    let mut cmd = album_dl();
    cmd.arg("--urls-file")
        .arg(&list)
        .arg("-o")
        .arg(&out)
        .args(["-w", "2", "--name-prefix", "shot"]);

    // The binary blocks on its own runtime; keep it off this test's runtime.
    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Downloaded: shot_1.jpg"))
            .stdout(predicate::str::contains("Downloaded: shot_2.jpg"));
    })
    .await
    .unwrap();

    assert_eq!(std::fs::read(out.join("shot_1.jpg")).unwrap(), b"first");
    assert_eq!(std::fs::read(out.join("shot_2.jpg")).unwrap(), b"second");
}

async fn mount_single_image_album(server: &wiremock::MockServer) {
    Mock::given(method("GET"))
        .and(path("/album"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div class="photo"><img src="/img/1.jpg"></div>"#),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pixels".to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

/// Answers piped to the start-up prompts walk the album like typed ones.
#[tokio::test]
async fn test_binary_reads_piped_prompt_answers() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_single_image_album(&server).await;

    let work = TempDir::new().unwrap();
    let mut cmd = album_dl();
    cmd.current_dir(work.path())
        .write_stdin(format!("{}/album\nmy_out\n2\n", server.uri()));

    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Enter the album URL"))
            .stdout(predicate::str::contains("Downloaded: flickr_image_1.jpg"));
    })
    .await
    .unwrap();

    assert_eq!(
        std::fs::read(work.path().join("my_out").join("flickr_image_1.jpg")).unwrap(),
        b"pixels"
    );
    assert!(!work.path().join("downloaded_images").exists());
}

/// A URL argument without a terminal uses the default folder and worker count.
#[tokio::test]
async fn test_binary_url_argument_uses_defaults_without_terminal() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_single_image_album(&server).await;

    let work = TempDir::new().unwrap();
    let mut cmd = album_dl();
    cmd.current_dir(work.path())
        .arg(format!("{}/album", server.uri()))
        .write_stdin("");

    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Enter").not())
            .stdout(predicate::str::contains("Downloaded: flickr_image_1.jpg"));
    })
    .await
    .unwrap();

    assert_eq!(
        std::fs::read(
            work.path()
                .join("downloaded_images")
                .join("flickr_image_1.jpg")
        )
        .unwrap(),
        b"pixels"
    );
}
