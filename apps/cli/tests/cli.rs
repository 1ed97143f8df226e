use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

/// A `ctxkit` command isolated from the user's settings file.
fn ctxkit(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ctxkit").expect("ctxkit binary");
    cmd.env("HOME", home)
        .env_remove("CTXKIT_SETTINGS")
        .env_remove("RUST_LOG")
        .current_dir(home);
    cmd
}

/// Write an unparsable `~/.ctxkit/ctxkit.toml` under `home`.
fn write_broken_settings(home: &Path) -> std::io::Result<()> {
    let dir = home.join(".ctxkit");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("ctxkit.toml"), "[http\ntimeout_secs = ")
}

#[test]
fn messages_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;

    ctxkit(tmp.path())
        .args(["-m", "Hello", "-m", "Goodbye"])
        .assert()
        .success()
        .stdout("Hello\n\nGoodbye\n");
    Ok(())
}

#[test]
fn config_help() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;

    ctxkit(tmp.path())
        .arg("-g")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# The ctxkit configuration file format"));
    Ok(())
}

#[test]
fn no_items_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;

    ctxkit(tmp.path())
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("Error: no prompt items specified"));
    Ok(())
}

#[test]
fn broken_settings_do_not_mask_missing_items() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    write_broken_settings(tmp.path())?;

    ctxkit(tmp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error: no prompt items specified"));

    ctxkit(tmp.path())
        .arg("-g")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# The ctxkit configuration file format"));
    Ok(())
}

#[test]
fn broken_settings_are_reported_for_prompts() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    write_broken_settings(tmp.path())?;

    ctxkit(tmp.path())
        .args(["-m", "Hello"])
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("Error: settings error"));
    Ok(())
}

#[test]
fn invalid_config_reports_member() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("bad.json"), r#"{"items": [{"invalid": "x"}]}"#)?;

    ctxkit(tmp.path())
        .args(["-c", "bad.json"])
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("Error: Unknown member 'items.0.invalid'"));
    Ok(())
}

#[test]
fn missing_file_fails_without_partial_output() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;

    ctxkit(tmp.path())
        .args(["-m", "before", "-f", "missing.txt"])
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("missing.txt"));
    Ok(())
}

#[test]
fn config_with_files_and_vars() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let sub = tmp.path().join("prompts");
    fs::create_dir(&sub)?;
    fs::write(sub.join("notes.txt"), "Some notes\n")?;
    fs::write(
        sub.join("prompt.json"),
        r#"{"items": [
            {"message": "Review {{project}}:"},
            {"file": "notes.txt"}
        ]}"#,
    )?;

    ctxkit(tmp.path())
        .args(["-v", "project", "ctxkit", "-c", "prompts/prompt.json"])
        .assert()
        .success()
        .stdout("Review ctxkit:\n\n<prompts/notes.txt>\nSome notes\n</prompts/notes.txt>\n");
    Ok(())
}

#[test]
fn dir_items_use_ext_filter() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("src");
    fs::create_dir(&src)?;
    fs::write(src.join("main.rs"), "fn main() {}")?;
    fs::write(src.join("notes.md"), "# Notes")?;

    ctxkit(tmp.path())
        .args(["-d", "src", "-x", "rs"])
        .assert()
        .success()
        .stdout("<src/main.rs>\nfn main() {}\n</src/main.rs>\n");
    Ok(())
}

#[test]
fn dir_without_matches_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    fs::create_dir(tmp.path().join("empty"))?;
    fs::write(tmp.path().join("empty").join("a.md"), "text")?;

    ctxkit(tmp.path())
        .args(["-d", "empty", "-x", "rs"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No files found"));
    Ok(())
}

#[test]
fn init_settings_writes_default_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;

    ctxkit(tmp.path())
        .arg("--init-settings")
        .assert()
        .success()
        .stdout(predicate::str::contains("ctxkit.toml"));

    let written = fs::read_to_string(tmp.path().join(".ctxkit").join("ctxkit.toml"))?;
    assert!(written.contains("[http]"), "{written}");
    assert!(written.contains("[grok]"), "{written}");
    Ok(())
}

#[test]
fn grok_without_api_key_fails() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;

    ctxkit(tmp.path())
        .env_remove("XAI_API_KEY")
        .args(["--grok", "grok-test"])
        .write_stdin("Hello")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("XAI_API_KEY"));
    Ok(())
}
