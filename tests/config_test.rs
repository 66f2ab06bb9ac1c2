//! Integration tests for Settings loading from an explicit local file.
//!
//! These tests pass the config file explicitly, so the working directory's
//! `obtree.toml` is never consulted. Every load holds `ENV_LOCK` because the
//! `OBTREE_*` tests change process environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;

use obtree::application::ApplicationError;
use obtree::config::Settings;
use obtree::domain::{GrandChildNum, NumRange};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn load(path: &Path) -> Result<Settings, ApplicationError> {
    let _guard = lock_env();
    Settings::load(Some(path))
}

/// Load with `vars` set for the duration of the call only.
fn load_with_env(path: &Path, vars: &[(&str, &str)]) -> Result<Settings, ApplicationError> {
    let _guard = lock_env();
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = Settings::load(Some(path));
    for (key, _) in vars {
        std::env::remove_var(key);
    }
    result
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("obtree.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_local_config_with_scalars_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
seed = 42
count = 3

[build.child_num]
min = 5.0
max = 6.0
"#,
    );

    // Act
    let settings = load(&path).expect("load settings");

    // Assert
    assert_eq!(settings.seed, Some(42));
    assert_eq!(settings.count, 3);
    assert_eq!(settings.build.child_num, NumRange::new(5.0, 6.0));
    assert_eq!(settings.build.format.combo_separator, " -> ");
}

#[test]
fn given_local_config_with_zero_mode_when_load_then_policy_zero() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[build.grandchild_num]
mode = "zero"
"#,
    );

    let settings = load(&path).expect("load settings");

    assert_eq!(settings.build.grandchild_num, GrandChildNum::Zero);
}

#[test]
fn given_local_config_with_random_range_when_load_then_range_used() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[build.grandchild_num]
mode = "random"
min = 2.0
max = 4.0
"#,
    );

    let settings = load(&path).expect("load settings");

    assert_eq!(
        settings.build.grandchild_num,
        GrandChildNum::Random(NumRange::new(2.0, 4.0))
    );
}

#[test]
fn given_snapshot_path_with_tilde_when_load_then_expanded() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"snapshot = "~/snapshots/parent.json""#);

    let settings = load(&path).expect("load settings");

    let snapshot = settings.snapshot.expect("snapshot set");
    assert!(!snapshot.to_string_lossy().starts_with('~'));
    assert!(snapshot.ends_with("snapshots/parent.json"));
}

#[test]
fn given_missing_explicit_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = load(&missing).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn given_inverted_range_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[build.child_num]
min = 10.0
max = 1.0
"#,
    );

    let err = load(&path).unwrap_err();

    assert!(err.to_string().contains("build.child_num"));
}

#[test]
fn given_invalid_toml_when_load_then_config_error_names_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "count = [not toml");

    let err = load(&path).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
    assert!(err.to_string().contains("obtree.toml"));
}

#[test]
fn given_template_written_when_load_then_equals_defaults_apart_from_env() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &Settings::template());

    let settings = load(&path).expect("load settings");

    assert_eq!(settings.build, Settings::default().build);
}

// ============================================================
// OBTREE_* environment layer
// ============================================================

#[test]
fn given_env_seed_and_count_when_load_then_override_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "seed = 1\ncount = 2\n");

    let settings = load_with_env(&path, &[("OBTREE_SEED", "9"), ("OBTREE_COUNT", "5")])
        .expect("load settings");

    assert_eq!(settings.seed, Some(9));
    assert_eq!(settings.count, 5);
}

#[test]
fn given_env_nested_range_when_load_then_parsed_as_float() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let settings = load_with_env(
        &path,
        &[
            ("OBTREE_BUILD__CHILD_NUM__MIN", "2"),
            ("OBTREE_BUILD__CHILD_NUM__MAX", "50.5"),
        ],
    )
    .expect("load settings");

    assert_eq!(settings.build.child_num, NumRange::new(2.0, 50.5));
}

#[test]
fn given_env_zero_mode_when_load_then_policy_zero() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let settings = load_with_env(&path, &[("OBTREE_BUILD__GRANDCHILD_NUM__MODE", "zero")])
        .expect("load settings");

    assert_eq!(settings.build.grandchild_num, GrandChildNum::Zero);
}

#[test]
fn given_file_zero_and_env_random_mode_when_load_then_default_range() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[build.grandchild_num]
mode = "zero"
"#,
    );

    let settings = load_with_env(&path, &[("OBTREE_BUILD__GRANDCHILD_NUM__MODE", "random")])
        .expect("load settings");

    assert_eq!(
        settings.build.grandchild_num,
        GrandChildNum::Random(NumRange::new(0.0, 10.0))
    );
}

#[test]
fn given_env_unknown_mode_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let err = load_with_env(&path, &[("OBTREE_BUILD__GRANDCHILD_NUM__MODE", "bogus")])
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
    assert!(err.to_string().contains("bogus"));
}

#[test]
fn given_env_separator_when_load_then_format_overridden() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let settings = load_with_env(&path, &[("OBTREE_BUILD__FORMAT__COMBO_SEPARATOR", "+")])
        .expect("load settings");

    assert_eq!(settings.build.format.combo_separator, "+");
    assert_eq!(settings.build.format.name_separator, " ");
}
