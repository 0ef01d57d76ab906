//! End-to-end runs with the Typst renderer and the built-in plugins

use std::fs;
use std::path::PathBuf;

use certgen_core::{Orchestrator, OrchestratorConfig};
use certgen_model::{ExtensionConfig, Extras, OutcomeStatus, RenderStatus, TabularDataset};
use certgen_pdf::TypstRenderer;
use certgen_plugins::OutputManager;
use serde_json::json;
use tempfile::TempDir;

const TEMPLATE: &str = r#"#set page(width: 200mm, height: 140mm)

= Certificate of Completion

This certifies that *{{name}}* completed *{{course}}* on {{date}}.
"#;

fn write_template(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("certificate.typ");
    fs::write(&path, TEMPLATE).unwrap();
    path
}

fn recipients() -> TabularDataset {
    TabularDataset::from_rows([
        vec!["name", "date", "course"],
        vec!["John Doe", "2023-10-01", "Mathematics"],
        vec!["Jane Smith", "2023-10-02", "Physics"],
    ])
}

fn orchestrator(dir: &TempDir, manager: OutputManager) -> Orchestrator<TypstRenderer> {
    Orchestrator::new(
        TypstRenderer::new(),
        manager,
        OrchestratorConfig::default().with_temp_root(dir.path().join("tmp")),
    )
}

fn requests(value: serde_json::Value) -> Vec<ExtensionConfig> {
    match value {
        serde_json::Value::Object(map) => ExtensionConfig::from_json_map(map),
        _ => Vec::new(),
    }
}

#[tokio::test]
async fn test_renders_every_record_without_plugins() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir);
    let orchestrator = orchestrator(&dir, OutputManager::new());
    let run_dir = orchestrator.run_dir();

    let status = orchestrator
        .generate(&template, recipients(), &[], Extras::new())
        .await;

    assert_eq!(status.status, OutcomeStatus::Success, "{}", status.message);
    assert_eq!(status.records.len(), 2);
    assert!(status.extensions.is_empty());
    for index in 0..2 {
        let bytes = fs::read(run_dir.join(format!("{}.pdf", index))).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

#[tokio::test]
async fn test_short_row_fails_only_that_record() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir);
    let data = TabularDataset::from_rows([
        vec!["name", "date", "course"],
        vec!["John Doe", "2023-10-01"],
        vec!["Jane Smith", "2023-10-02", "Physics"],
    ]);

    let status = orchestrator(&dir, OutputManager::new())
        .generate(&template, data, &[], Extras::new())
        .await;

    assert_eq!(status.status, OutcomeStatus::Warning);
    assert_eq!(status.records[0].status, RenderStatus::MissingFields);
    assert!(status.records[0].message.contains("course"));
    assert!(status.records[1].is_success());
}

#[tokio::test]
async fn test_delivers_with_local_plugin_in_request_order() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir);
    let out = dir.path().join("delivered");

    let requests = requests(json!({
        "email": { "to": "nobody@example.com" },
        "local": {
            "output_folder": out.display().to_string(),
            "output_filename_col": "name"
        }
    }));

    let status = orchestrator(&dir, OutputManager::new())
        .generate(&template, recipients(), &requests, Extras::new())
        .await;

    assert_eq!(status.status, OutcomeStatus::Warning);
    assert_eq!(status.extensions.len(), 2);
    assert_eq!(status.extensions[0].plugin_id, "email");
    assert_eq!(status.extensions[0].status, OutcomeStatus::Failure);
    assert_eq!(status.extensions[1].plugin_id, "local");
    assert_eq!(
        status.extensions[1].status,
        OutcomeStatus::Success,
        "{}",
        status.extensions[1].message
    );
    assert!(out.join("John Doe.pdf").is_file());
    assert!(out.join("Jane Smith.pdf").is_file());
}

#[tokio::test]
async fn test_script_plugin_receives_extras() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir);
    let plugins = dir.path().join("plugins");
    fs::create_dir(&plugins).unwrap();
    fs::write(
        plugins.join("summary.rhai"),
        r#"
fn required_fields() { #{ path: "required" } }

fn run(settings, artifacts, data, metadata) {
    write_text(settings.path, `${metadata.extras.event}: ${artifacts.len()}`);
    #{ status: "success", message: "summary written" }
}
"#,
    )
    .unwrap();

    let mut manager = OutputManager::new();
    manager.set_plugins_dir(&plugins).unwrap();

    let summary = dir.path().join("summary.txt");
    let mut extras = Extras::new();
    extras.insert("event".into(), json!("RustConf"));

    let status = orchestrator(&dir, manager)
        .generate(
            &template,
            recipients(),
            &requests(json!({ "summary": { "path": summary.display().to_string() } })),
            extras,
        )
        .await;

    assert_eq!(status.status, OutcomeStatus::Success, "{}", status.message);
    assert_eq!(fs::read_to_string(summary).unwrap(), "RustConf: 2");
}

#[tokio::test]
async fn test_missing_template_does_no_work() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(&dir, OutputManager::new());
    let run_dir = orchestrator.run_dir();

    let status = orchestrator
        .generate(
            &dir.path().join("missing.typ"),
            recipients(),
            &requests(json!({ "local": { "output_folder": "out" } })),
            Extras::new(),
        )
        .await;

    assert_eq!(status.status, OutcomeStatus::Failure);
    assert!(status.records.is_empty());
    assert!(status.extensions.is_empty());
    assert!(!run_dir.exists());
}
