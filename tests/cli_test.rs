use std::process::Command;
use tempfile::TempDir;

fn repowatch(dir: &std::path::Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_repowatch"))
        .args(args)
        .current_dir(dir)
        .env_remove("REPOWATCH_CONFIG")
        .output()
        .expect("Failed to run repowatch")
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = repowatch(temp_dir.path(), &["init"]);
    assert!(output.status.success());

    let content = std::fs::read_to_string(temp_dir.path().join("repowatch.toml")).unwrap();
    assert!(content.contains("repos_root"));
    assert!(content.contains("execute = \"make\""));

    // Second run without --force fails
    let output = repowatch(temp_dir.path(), &["init"]);
    assert!(!output.status.success());
}

#[test]
fn test_check_lists_repositories_from_legacy_json() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("repos");
    std::fs::create_dir_all(root.join("alpha/src")).unwrap();
    std::fs::create_dir_all(root.join("beta/docs")).unwrap();

    let config = format!(
        r#"{{"reposRoot": {:?}, "watchPath": "src", "watchRegexp": "\\.md$", "execute": "make"}}"#,
        root.display().to_string()
    );
    std::fs::write(temp_dir.path().join("config.json"), config).unwrap();

    let output = repowatch(temp_dir.path(), &["check"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("1 repositories"));
    assert!(stdout.contains("alpha"));
    assert!(!stdout.contains("beta"));
}

#[test]
fn test_config_command() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("custom.toml"),
        "repos_root = \"/srv/repos\"\nexecute = \"make\"\nshell = \"bash\"\n",
    )
    .unwrap();

    let output = repowatch(temp_dir.path(), &["config", "--config", "custom.toml"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("shell = \"bash\""));
    assert!(stdout.contains("repos_root = \"/srv/repos\""));
}

#[test]
fn test_invalid_pattern_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("repos")).unwrap();
    std::fs::write(
        temp_dir.path().join("repowatch.toml"),
        "repos_root = \"repos\"\nwatch_regexp = \"(\"\nexecute = \"make\"\n",
    )
    .unwrap();

    let output = repowatch(temp_dir.path(), &["watch"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid watch_regexp"));
}

#[test]
fn test_missing_root_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("repowatch.toml"),
        "repos_root = \"nowhere\"\nexecute = \"make\"\n",
    )
    .unwrap();

    let output = repowatch(temp_dir.path(), &["check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("does not exist"));
}
