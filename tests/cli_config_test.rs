use prost::Message;
use std::process::Command;
use symdex::scip;
use tempfile::TempDir;

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let output = Command::new(env!("CARGO_BIN_EXE_symdex"))
        .arg("init")
        .current_dir(temp_path)
        .output()
        .expect("Failed to run init command");
    assert!(output.status.success());

    let config_path = temp_path.join(".symdex/settings.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[index]"));
    assert!(content.contains("[rank]"));
    assert!(content.contains("[semantic]"));

    // A second init without --force must not clobber the file
    let output = Command::new(env!("CARGO_BIN_EXE_symdex"))
        .arg("init")
        .current_dir(temp_path)
        .output()
        .expect("Failed to run init command");
    assert!(!output.status.success());

    let output = Command::new(env!("CARGO_BIN_EXE_symdex"))
        .args(["init", "--force"])
        .current_dir(temp_path)
        .output()
        .expect("Failed to run init command");
    assert!(output.status.success());
}

#[test]
fn test_stats_command_reads_index() {
    let temp_dir = TempDir::new().unwrap();
    let index_path = temp_dir.path().join("project.scip");

    let symbol = "scip-python python demo 1 `demo`/main().".to_string();
    let index = scip::Index {
        documents: vec![scip::Document {
            relative_path: "demo.py".to_string(),
            text: "def main():\n    pass\n".to_string(),
            symbols: vec![scip::SymbolInformation {
                symbol: symbol.clone(),
                ..Default::default()
            }],
            occurrences: vec![scip::Occurrence {
                range: vec![0, 4, 8],
                symbol,
                symbol_roles: 1,
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    std::fs::write(&index_path, index.encode_to_vec()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_symdex"))
        .arg("--index")
        .arg(&index_path)
        .arg("stats")
        .current_dir(temp_dir.path())
        .output()
        .expect("Failed to run stats command");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("files:          1"));
    assert!(stdout.contains("symbols:        1"));
}

#[test]
fn test_missing_index_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_symdex"))
        .args(["--index", "absent.scip", "stats"])
        .current_dir(temp_dir.path())
        .output()
        .expect("Failed to run stats command");
    assert!(!output.status.success());
}
