//! Integration tests for the certgen CLI
//!
//! These tests drive `generate_command` the way the binary does:
//! recipients file -> rendered PDFs -> output plugins.

use std::fs;
use std::path::{Path, PathBuf};

use certgen_cli::{format_status, generate_command, GenerateArgs, OutputFormat};
use certgen_model::{OutcomeStatus, RenderStatus};
use tempfile::TempDir;

const TEMPLATE: &str = "= Certificate\n\n{{name}} completed {{course}} on {{date}}.\n";

const RECIPIENTS: &str = "name,date,course
John Doe,2023-10-01,Mathematics
Jane Smith,2023-10-02,Physics
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("certificate.typ"), TEMPLATE).unwrap();
        fs::write(dir.path().join("recipients.csv"), RECIPIENTS).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn args(&self) -> GenerateArgs {
        GenerateArgs {
            recipients: self.path("recipients.csv"),
            sheet: None,
            template: self.path("certificate.typ"),
            plugins_config: None,
            metadata: None,
            tmp_folder: Some(self.path("tmp")),
            plugins_dir: None,
            config: None,
            format: OutputFormat::Text,
        }
    }
}

fn pdfs_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".pdf"))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_generate_without_plugins() {
    let fx = Fixture::new();
    let status = generate_command(&fx.args()).await.unwrap();

    assert_eq!(status.status, OutcomeStatus::Success, "{}", status.message);
    assert_eq!(status.records.len(), 2);
    let temp_dir = status.temp_dir.clone().unwrap();
    assert!(temp_dir.starts_with(fx.path("tmp")));
    assert_eq!(pdfs_in(&temp_dir), vec!["0.pdf", "1.pdf"]);
}

#[tokio::test]
async fn test_generate_with_local_plugin() {
    let fx = Fixture::new();
    let out = fx.path("certificates");
    let plugins = fx.write(
        "plugins.json",
        &format!(
            r#"{{ "local": {{ "output_folder": {:?}, "output_filename_col": "name" }} }}"#,
            out.display().to_string()
        ),
    );

    let mut args = fx.args();
    args.plugins_config = Some(plugins);
    let status = generate_command(&args).await.unwrap();

    assert_eq!(status.status, OutcomeStatus::Success, "{}", format_status(&status));
    assert_eq!(status.extensions.len(), 1);
    assert_eq!(pdfs_in(&out), vec!["Jane Smith.pdf", "John Doe.pdf"]);
}

#[tokio::test]
async fn test_script_plugin_and_metadata() {
    let fx = Fixture::new();
    let plugins_dir = fx.path("plugins");
    fs::create_dir(&plugins_dir).unwrap();
    fs::write(
        plugins_dir.join("roster.rhai"),
        r#"
fn required_fields() { #{ file: "required" } }

fn run(settings, artifacts, data, metadata) {
    let names = [];
    for artifact in artifacts {
        names.push(data[artifact.record + 1][0]);
    }
    write_text(settings.file, `${metadata.extras.event}|${names}`);
    #{ status: "success", message: "roster written" }
}
"#,
    )
    .unwrap();

    let roster = fx.path("roster.txt");
    let mut args = fx.args();
    args.plugins_dir = Some(plugins_dir);
    args.metadata = Some(fx.write("meta.toml", "event = \"RustConf\"\n"));
    args.plugins_config = Some(fx.write(
        "plugins.json",
        &format!(r#"{{ "roster": {{ "file": {:?} }} }}"#, roster.display().to_string()),
    ));

    let status = generate_command(&args).await.unwrap();
    assert_eq!(status.status, OutcomeStatus::Success, "{}", format_status(&status));

    let written = fs::read_to_string(roster).unwrap();
    assert!(written.starts_with("RustConf|"));
    assert!(written.contains("John Doe"));
    assert!(written.contains("Jane Smith"));
}

#[tokio::test]
async fn test_missing_column_warns_per_record() {
    let fx = Fixture::new();
    fx.write(
        "recipients.csv",
        "name,date,course\nJohn Doe,2023-10-01\nJane Smith,2023-10-02,Physics\n",
    );

    let status = generate_command(&fx.args()).await.unwrap();
    assert_eq!(status.status, OutcomeStatus::Warning);
    assert_eq!(status.records[0].status, RenderStatus::MissingFields);
    assert!(status.records[1].is_success());
    assert!(format_status(&status).contains("record 1: missing fields"));
}

#[tokio::test]
async fn test_unknown_plugin_reported() {
    let fx = Fixture::new();
    let mut args = fx.args();
    args.plugins_config = Some(fx.write("plugins.json", r#"{ "email": { "to": "x" } }"#));

    let status = generate_command(&args).await.unwrap();
    assert_eq!(status.status, OutcomeStatus::Warning);
    assert_eq!(status.extensions[0].message, "Plugin not found or invalid.");
}

#[tokio::test]
async fn test_missing_template_fails_run() {
    let fx = Fixture::new();
    let mut args = fx.args();
    args.template = fx.path("missing.typ");

    let status = generate_command(&args).await.unwrap();
    assert!(status.is_failure());
    assert!(status.records.is_empty());
}

#[tokio::test]
async fn test_unsupported_recipients_format() {
    let fx = Fixture::new();
    let mut args = fx.args();
    args.recipients = fx.write("recipients.json", "[]");

    let err = generate_command(&args).await.unwrap_err();
    assert!(format!("{:#}", err).contains("recipients.json"));
    assert!(!fx.path("tmp").exists());
}

#[tokio::test]
async fn test_missing_plugins_dir_is_fatal() {
    let fx = Fixture::new();
    let mut args = fx.args();
    args.plugins_dir = Some(fx.path("no-such-dir"));

    assert!(generate_command(&args).await.is_err());
}

#[tokio::test]
async fn test_config_file_settings() {
    let fx = Fixture::new();
    fx.write(
        "certificate.typ",
        "= Certificate\n\n<<name>> completed <<course>> on <<date>> for <<issuer>>.\n",
    );
    let config = fx.write(
        "certgen.toml",
        r#"
[output]
keep_artifacts = false

[render]
delimiter_start = "<<"
delimiter_end = ">>"

[constants]
issuer = "Rust Foundation"
"#,
    );

    let mut args = fx.args();
    args.config = Some(config);
    let status = generate_command(&args).await.unwrap();

    assert_eq!(status.status, OutcomeStatus::Success, "{}", format_status(&status));
    assert!(!status.temp_dir.unwrap().exists());
}
