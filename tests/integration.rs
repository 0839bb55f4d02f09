use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn pidx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pidx");
    path
}

/// Temp workspace with three raw documents and a config that needs no
/// embedding model.
fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let raw_dir = root.join("data/raw");
    fs::create_dir_all(&raw_dir).unwrap();
    fs::write(
        raw_dir.join("lease.txt"),
        "The tenant shall pay rent on the first day of each month.\n\nLate payments incur a fee.",
    )
    .unwrap();
    fs::write(
        raw_dir.join("handbook.txt"),
        "Employees accrue vacation monthly. Unused vacation carries over once.",
    )
    .unwrap();
    fs::write(raw_dir.join("blank.txt"), "\n   \n").unwrap();
    fs::write(raw_dir.join("ignored.md"), "not a text document").unwrap();

    let config_content = format!(
        r#"[paths]
raw_dir = "{root}/data/raw"
processed_dir = "{root}/data/processed"
index_dir = "{root}/data/embeddings"

[chunking]
chunk_size = 6
overlap = 2

[embedding]
provider = "disabled"

[server]
bind = "127.0.0.1:0"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("pidx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pidx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(pidx_binary())
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .expect("Failed to run pidx binary");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn test_chunk_writes_chunk_files() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_pidx(&config, &["chunk"]);
    assert!(success, "chunk failed: {}", stderr);
    assert!(stdout.contains("documents: 3"));
    assert!(stdout.contains("failed: 0"));

    let processed = tmp.path().join("data/processed");
    assert!(processed.join("lease_chunks.json").exists());
    assert!(processed.join("handbook_chunks.json").exists());
    assert!(processed.join("blank_chunks.json").exists());
    assert!(!processed.join("ignored_chunks.json").exists());
}

#[test]
fn test_chunk_file_format() {
    let (tmp, config) = setup_test_env();
    let (_, stderr, success) = run_pidx(&config, &["chunk"]);
    assert!(success, "chunk failed: {}", stderr);

    let text = fs::read_to_string(tmp.path().join("data/processed/handbook_chunks.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["file_name"], "handbook.txt");
    // 9 tokens, window 6, step 4 -> starts 0, 4, 8
    assert_eq!(json["total_chunks"], 3);
    let first = &json["chunks"][0];
    assert_eq!(first["chunk_id"], 0);
    assert_eq!(first["position"], 0);
    assert_eq!(first["word_count"], 6);
    assert_eq!(first["source_file"], "handbook.txt");
    assert_eq!(first["metadata"]["chunk_size"], 6);
    assert_eq!(first["metadata"]["overlap"], 2);
    assert_eq!(json["chunks"][1]["position"], 4);
    assert_eq!(json["chunks"][2]["word_count"], 1);
}

#[test]
fn test_chunk_idempotent() {
    let (tmp, config) = setup_test_env();
    run_pidx(&config, &["chunk"]);
    let path = tmp.path().join("data/processed/lease_chunks.json");
    let first = fs::read_to_string(&path).unwrap();
    run_pidx(&config, &["chunk"]);
    assert_eq!(first, fs::read_to_string(&path).unwrap());
}

#[test]
fn test_embed_with_disabled_provider_reports_failures() {
    let (_tmp, config) = setup_test_env();
    run_pidx(&config, &["chunk"]);
    let (stdout, stderr, success) = run_pidx(&config, &["embed"]);
    assert!(success, "embed should finish the batch: {}", stderr);
    assert!(stdout.contains("failed: 2"));
    assert!(stdout.contains("skipped (no chunks): 1"));
    assert!(stdout.contains("disabled"));
}

#[test]
fn test_embed_without_chunk_stage_fails() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_pidx(&config, &["embed"]);
    assert!(!success);
    assert!(stderr.contains("Processed directory does not exist"));
}

#[test]
fn test_documents_lists_load_failures() {
    let (_tmp, config) = setup_test_env();
    run_pidx(&config, &["chunk"]);
    let (stdout, _, success) = run_pidx(&config, &["documents"]);
    assert!(success);
    assert!(stdout.contains("failed to load: 3"));
    assert!(stdout.contains("missing index artifact"));
}

#[test]
fn test_serve_refuses_without_indexes() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_pidx(&config, &["serve"]);
    assert!(!success);
    assert!(stderr.contains("no indexes available"));
}

#[test]
fn test_invalid_chunking_config_rejected() {
    let (tmp, _) = setup_test_env();
    let path = tmp.path().join("config/bad.toml");
    fs::write(
        &path,
        r#"[paths]
raw_dir = "raw"
processed_dir = "processed"
index_dir = "embeddings"

[chunking]
chunk_size = 10
overlap = 10
"#,
    )
    .unwrap();
    let (_, stderr, success) = run_pidx(&path, &["chunk"]);
    assert!(!success);
    assert!(stderr.contains("overlap"));
}

#[test]
fn test_missing_config_file() {
    let (tmp, _) = setup_test_env();
    let (_, stderr, success) = run_pidx(&tmp.path().join("nope.toml"), &["documents"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
