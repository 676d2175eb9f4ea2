use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use weft::admission::Coordinator;
use weft::config::Settings;
use weft::domain::{CodeUnit, HostError};
use weft::host::{Host, SearchPathKind, Transformer};
use weft::scripts;
use weft::transform::TransformPolicy;
use weft_common::{Command, ProbeScript};

struct EmptyHost;

impl Host for EmptyHost {
    fn loaded_units(&self) -> Vec<CodeUnit> {
        Vec::new()
    }

    fn is_modifiable(&self, _unit: &CodeUnit) -> bool {
        false
    }

    fn retransform(&self, _units: &[CodeUnit]) -> Result<(), HostError> {
        Ok(())
    }

    fn add_transformer(&self, _transformer: Arc<dyn Transformer>) {}

    fn append_search_path(&self, _kind: SearchPathKind, _path: &Path) -> Result<(), HostError> {
        Ok(())
    }
}

fn write_probe(path: &Path, name: &str) {
    let script = ProbeScript {
        name: name.to_string(),
        unit_patterns: vec!["app::*".to_string()],
        payload: "probe body".to_string(),
    };
    fs::write(path, serde_json::to_vec(&script).expect("serialize script")).expect("write script");
}

fn settings(pairs: &[(&str, String)]) -> Settings {
    let map: HashMap<String, String> =
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect();
    Settings::from_args(&map)
}

fn run_loader(settings: &Settings) -> Coordinator {
    let host: Arc<dyn Host> = Arc::new(EmptyHost);
    let coordinator = Coordinator::new(Arc::clone(&host), TransformPolicy::Batch);
    scripts::run(settings, &host, &coordinator);
    coordinator
}

#[test]
fn test_valid_script_is_admitted_and_acknowledged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script_path = dir.path().join("io.probe");
    let out_path = dir.path().join("io.trace");
    write_probe(&script_path, "io");

    let settings = settings(&[
        ("script", script_path.display().to_string()),
        ("scriptOutputFile", out_path.display().to_string()),
    ]);
    let coordinator = run_loader(&settings);

    assert_eq!(coordinator.active_clients(), 1);
    let ack = fs::read_to_string(&out_path).expect("output file");
    let command: Command = serde_json::from_str(ack.trim()).expect("ack line");
    assert_eq!(command, Command::Okay);
}

#[test]
fn test_directory_scan_skips_foreign_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_probe(&dir.path().join("good.probe"), "good");
    fs::write(dir.path().join("notes.txt"), b"not a script").expect("write decoy");
    fs::create_dir(dir.path().join("sub.probe")).expect("decoy dir");

    let out_path = dir.path().join("good.trace");
    let settings = settings(&[
        ("scriptdir", dir.path().display().to_string()),
        ("scriptOutputFile", out_path.display().to_string()),
    ]);
    let coordinator = run_loader(&settings);

    assert_eq!(coordinator.active_clients(), 1);
    assert!(out_path.is_file());
}

#[test]
fn test_missing_entry_does_not_stop_the_iteration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("ghost.probe");
    let script_path = dir.path().join("real.probe");
    let out_path = dir.path().join("real.trace");
    write_probe(&script_path, "real");

    let list = format!("{},{}", missing.display(), script_path.display());
    let settings = settings(&[
        ("script", list),
        ("scriptOutputFile", out_path.display().to_string()),
    ]);
    let coordinator = run_loader(&settings);

    // The ghost entry is skipped; the real one behind it still loads.
    assert_eq!(coordinator.active_clients(), 1);
    assert!(out_path.is_file());
}

#[test]
fn test_malformed_script_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script_path = dir.path().join("broken.probe");
    fs::write(&script_path, b"{ not json").expect("write script");

    let settings = settings(&[("script", script_path.display().to_string())]);
    let coordinator = run_loader(&settings);

    assert_eq!(coordinator.active_clients(), 0);
}
