//! Factory, snapshot files and action scripts through the service container.

use std::fs;

use rstest::rstest;
use tempfile::TempDir;

use obtree::application::services::{
    default_script, load_script, replay, ActionRecorder, ParentFactory, DEFAULT_COUNT,
};
use obtree::application::ApplicationError;
use obtree::config::Settings;
use obtree::domain::{
    ActionName, ChildType, DomainError, FixedSequence, GrandChildType, ParentSnapshot, ParentTree,
    TreeBuilder,
};
use obtree::infrastructure::di::ServiceContainer;
use obtree::infrastructure::traits::RealFileSystem;
use obtree::util::testing;

const SMALL: &str = r#"{
    "first": "Ada", "last": "Lovelace", "num1": 3, "num2": 4,
    "children": [
        {"type": "B", "num": 1.5, "children": [{"type": "X", "num": 2}, {"type": "Z", "num": 3}]},
        {"type": "C", "num": 2.5, "children": []}
    ]
}"#;

fn container_with_snapshot(dir: &TempDir, json: &str) -> ServiceContainer {
    let path = dir.path().join("parent.json");
    fs::write(&path, json).unwrap();
    let settings = Settings {
        snapshot: Some(path),
        seed: Some(1),
        ..Settings::default()
    };
    ServiceContainer::new(settings)
}

/// Same field values as `tree`, without observers.
fn rebuild(tree: &ParentTree) -> ParentTree {
    TreeBuilder::default().build(&tree.snapshot(), &mut FixedSequence::default())
}

// ============================================================
// Snapshot files
// ============================================================

#[test]
fn given_snapshot_file_when_creating_parent_then_built_from_file() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let container = container_with_snapshot(&dir, SMALL);

    let factory = container.factory().unwrap();
    let tree = factory.create_one_parent(&mut container.random(None));

    assert_eq!(tree.name(), "Ada Lovelace");
    assert_eq!(tree.sum(), 7.0);
    assert_eq!(tree.child_count(), 2);
    assert_eq!(tree.child_at(0).unwrap().kind(), ChildType::B);
    assert_eq!(tree.collect_sum(), 4.0);
    assert_eq!(tree.collect_deep_sum(), 5.0);
    assert_eq!(
        tree.child_at(0).unwrap().child_at(1).unwrap().kind(),
        GrandChildType::Z
    );
    assert_eq!(tree.child_at(1).unwrap().collect_sum(), 0.0);
}

#[test]
fn given_missing_snapshot_file_when_building_factory_then_not_found() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        snapshot: Some(dir.path().join("missing.json")),
        ..Settings::default()
    };

    let err = ParentFactory::from_settings(&settings, &RealFileSystem).unwrap_err();

    assert!(matches!(err, ApplicationError::SnapshotNotFound(_)));
}

#[test]
fn given_malformed_snapshot_file_when_building_factory_then_domain_error() {
    let dir = TempDir::new().unwrap();
    let container = container_with_snapshot(&dir, r#"{"first":"Foo"}"#);

    let err = container.factory().unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::MalformedSnapshot { .. })
    ));
}

#[test]
fn given_no_snapshot_setting_when_building_factory_then_standard_snapshot() {
    let factory = ParentFactory::from_settings(&Settings::default(), &RealFileSystem).unwrap();

    assert_eq!(factory.snapshot(), &ParentSnapshot::standard());
    assert_eq!(DEFAULT_COUNT, 10);
}

#[rstest]
#[case(Some(9))]
#[case(None)]
fn given_same_seed_when_creating_parents_then_reproducible(#[case] cli_seed: Option<u64>) {
    let dir = TempDir::new().unwrap();
    let template = ParentSnapshot::uniform("F", "B", 0.0, 0.0, 5, 5).to_json().unwrap();
    let container = container_with_snapshot(&dir, &template);
    let factory = container.factory().unwrap();

    let a = factory.create_parents(2, &mut container.random(cli_seed));
    let b = factory.create_parents(2, &mut container.random(cli_seed));

    assert_eq!(a[0].snapshot(), b[0].snapshot());
    assert_eq!(a[1].snapshot(), b[1].snapshot());
    assert_ne!(a[0].snapshot(), a[1].snapshot());
}

// ============================================================
// Action scripts
// ============================================================

#[test]
fn given_recorded_actions_when_saved_and_loaded_then_replay_converges() {
    let dir = TempDir::new().unwrap();
    let factory = ParentFactory::standard();
    let mut rng = FixedSequence::new(vec![0.3, 0.6, 0.9]);
    let mut source = factory.create_one_parent(&mut rng);
    let mut target = rebuild(&source);

    let (recorder, _) = ActionRecorder::attach(&mut source);
    replay(&mut source, &default_script()).unwrap();
    let path = dir.path().join("actions.json");
    fs::write(&path, recorder.to_json().unwrap()).unwrap();

    let script = load_script(&RealFileSystem, &path).unwrap();
    let applied = replay(&mut target, &script).unwrap();

    assert_eq!(applied, 3);
    assert_eq!(script[0].name, ActionName::SetNum1);
    assert_eq!(target.snapshot(), source.snapshot());
    assert_eq!(target.sum(), 1.0);
}

#[test]
fn given_unparsable_script_when_loading_then_malformed_script() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("actions.json");
    fs::write(&path, r#"[{"name":"set_everything","path":"","args":[]}]"#).unwrap();

    let err = load_script(&RealFileSystem, &path).unwrap_err();

    assert!(matches!(err, ApplicationError::MalformedScript { .. }));
    assert!(err.to_string().contains("actions.json"));
}

#[test]
fn given_recorded_non_finite_args_when_saved_and_loaded_then_values_kept() {
    let dir = TempDir::new().unwrap();
    let mut source = ParentFactory::standard().create_one_parent(&mut FixedSequence::new(vec![0.5]));
    let (recorder, _) = ActionRecorder::attach(&mut source);
    source.set_num2(f64::NAN);
    source.set_num1(f64::INFINITY);
    let path = dir.path().join("actions.json");
    fs::write(&path, recorder.to_json().unwrap()).unwrap();

    let script = load_script(&RealFileSystem, &path).unwrap();

    assert_eq!(script.len(), 2);
    assert!(script[0].args[0].is_nan());
    assert_eq!(script[1].args, vec![f64::INFINITY]);
    let mut target = rebuild(&source);
    replay(&mut target, &script).unwrap();
    assert!(target.num2().is_nan());
    assert_eq!(target.num1(), f64::INFINITY);
}

#[test]
fn given_missing_script_when_loading_then_error_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("none.json");

    let err = load_script(&RealFileSystem, &path).unwrap_err();

    assert!(err.to_string().contains("none.json"));
}
