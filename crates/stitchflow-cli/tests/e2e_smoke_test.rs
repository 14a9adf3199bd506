use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use stitchflow::{
    Engine, StitchflowError, TransitionError, config::AppConfig, identifier::Id,
    persistence::JsonFileStore,
};
use stitchflow_cli::{Args, CliError, run};

/// Collects all .json gesture scripts from a directory
fn collect_scripts(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn args(input: &Path, output: &Path) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        snapshot: None,
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
    }
}

fn load_output(path: &Path) -> Engine {
    Engine::load(&JsonFileStore::new(path), AppConfig::default()).expect("output snapshot loads")
}

#[test]
fn e2e_smoke_test_demo_scripts() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    // Demo scripts live at the workspace root
    let demos_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos");
    let scripts = collect_scripts(demos_path);

    assert!(!scripts.is_empty(), "No demo scripts found in demos/");

    let mut failed = Vec::new();

    for script in &scripts {
        let output = temp_dir
            .path()
            .join(script.file_name().unwrap().to_string_lossy().to_string());

        if let Err(e) = run(&args(script, &output)) {
            failed.push(format!("{}: {e}", script.display()));
            continue;
        }

        // The written snapshot attaches and is already settled
        let engine = load_output(&output);
        assert_eq!(engine.snapshot(), load_output(&output).snapshot());
    }

    assert!(failed.is_empty(), "Failed demo scripts:\n{}", failed.join("\n"));
}

#[test]
fn e2e_confirmed_group_is_written() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.json");
    let output = dir.path().join("out.json");
    fs::write(
        &script,
        r#"[
            {"op": "add_part", "id": "a", "label": "A", "x": 0, "y": 0},
            {"op": "add_part", "id": "b", "label": "B", "x": 300, "y": 0},
            {"op": "connect", "id": "e1", "source": "a", "target": "b"},
            {"op": "confirm", "target": "e1", "settings": {"step": "STEP 01", "process": "stitching"}}
        ]"#,
    )
    .unwrap();

    run(&args(&script, &output)).unwrap();

    let engine = load_output(&output);
    let connector = engine.graph().connector(Id::new("connector::a+b")).unwrap();
    assert!(connector.is_confirmed());
    assert!(!connector.is_hidden());
    assert!(engine.graph().edge(Id::new("e1")).unwrap().is_confirmed());
}

#[test]
fn e2e_continues_from_snapshot() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    let snapshot = dir.path().join("session.json");
    let output = dir.path().join("out.json");
    fs::write(
        &first,
        r#"[
            {"op": "add_part", "id": "a", "label": "A", "x": 0, "y": 0},
            {"op": "add_part", "id": "b", "label": "B", "x": 300, "y": 0},
            {"op": "connect", "id": "e1", "source": "a", "target": "b"},
            {"op": "confirm", "target": "e1", "settings": {"step": "STEP 01", "process": "stitching"}}
        ]"#,
    )
    .unwrap();
    fs::write(&second, r#"[{"op": "edit", "target": "e1"}]"#).unwrap();
    run(&args(&first, &snapshot)).unwrap();

    let mut resume = args(&second, &output);
    resume.snapshot = Some(snapshot.to_string_lossy().to_string());
    run(&resume).unwrap();

    let engine = load_output(&output);
    let connector = engine.graph().connector(Id::new("connector::a+b")).unwrap();
    assert!(!connector.is_confirmed());
    assert!(!engine.graph().part(Id::new("a")).unwrap().is_confirmed());
}

#[test]
fn e2e_rejected_gesture_reports_index() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.json");
    let output = dir.path().join("out.json");
    fs::write(
        &script,
        r#"[
            {"op": "add_part", "id": "a", "label": "A", "x": 0, "y": 0},
            {"op": "edit", "target": "a"}
        ]"#,
    )
    .unwrap();

    let err = run(&args(&script, &output)).unwrap_err();

    assert!(matches!(
        err,
        CliError::Gesture {
            index: 1,
            op: "edit",
            source: StitchflowError::Transition(TransitionError::NotConfirmed(_)),
        }
    ));
    assert!(!output.exists());
}

#[test]
fn e2e_malformed_script() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.json");
    fs::write(&script, r#"[{"op": "connect", "source": "a"}]"#).unwrap();

    let err = run(&args(&script, &dir.path().join("out.json"))).unwrap_err();

    assert!(matches!(err, CliError::Script { .. }));
}
