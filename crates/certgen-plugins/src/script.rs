//! Rhai delivery scripts
//!
//! A script plugin is a `.rhai` file defining two functions:
//!
//! ```rhai
//! fn required_fields() {
//!     #{ output_file: "required", title: "optional" }
//! }
//!
//! fn run(settings, artifacts, data, metadata) {
//!     #{ status: "success", message: "Delivered" }
//! }
//! ```
//!
//! `artifacts` is an array of `#{ record, path }` maps, `data` the recipient
//! grid (row 0 is the header) and `metadata` the run metadata map.

use std::path::Path;
use std::sync::Arc;

use certgen_model::{ConfigFields, FieldRequirement, OutcomeStatus, Settings};
use rhai::{Dynamic, Engine, EvalAltResult, Map, Scope, AST};
use tracing::info;

use crate::error::{PluginError, Result};
use crate::plugin::{OutputPlugin, PluginContext, PluginReport};

/// The Rhai engine shared by all script plugins
pub struct ScriptEngine {
    engine: Engine,
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine {
    /// Create a new script engine with default configuration
    pub fn new() -> Self {
        let mut engine = Engine::new();

        // Set reasonable limits for safety
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(64);
        engine.set_max_operations(10_000_000);
        engine.set_max_modules(10);
        engine.set_max_string_size(10_000_000);
        engine.set_max_array_size(1_000_000);
        engine.set_max_map_size(10_000);

        Self::register_helpers(&mut engine);

        Self { engine }
    }

    /// Register host functions available to scripts
    fn register_helpers(engine: &mut Engine) {
        engine.register_fn(
            "copy_file",
            |from: &str, to: &str| -> std::result::Result<(), Box<EvalAltResult>> {
                std::fs::copy(from, to)
                    .map(|_| ())
                    .map_err(|e| format!("copy_file({}, {}): {}", from, to, e).into())
            },
        );

        engine.register_fn(
            "write_text",
            |path: &str, text: &str| -> std::result::Result<(), Box<EvalAltResult>> {
                std::fs::write(path, text).map_err(|e| format!("write_text({}): {}", path, e).into())
            },
        );

        engine.register_fn(
            "create_dir",
            |path: &str| -> std::result::Result<(), Box<EvalAltResult>> {
                std::fs::create_dir_all(path)
                    .map_err(|e| format!("create_dir({}): {}", path, e).into())
            },
        );

        engine.register_fn("path_join", |base: &str, name: &str| -> String {
            Path::new(base).join(name).display().to_string()
        });

        engine.register_fn(
            "to_json",
            |value: Dynamic| -> std::result::Result<String, Box<EvalAltResult>> {
                serde_json::to_string_pretty(&value).map_err(|e| e.to_string().into())
            },
        );

        engine.register_fn("log_info", |message: &str| {
            info!(target: "certgen::script", "{}", message);
        });
    }

    /// Compile a Rhai script into an AST
    pub fn compile(&self, script: &str) -> Result<AST> {
        self.engine
            .compile(script)
            .map_err(|e| PluginError::CompileError(e.to_string()))
    }

    /// Compile a Rhai script from a file
    pub fn compile_file(&self, path: &Path) -> Result<AST> {
        self.engine
            .compile_file(path.into())
            .map_err(|e| PluginError::CompileError(e.to_string()))
    }

    fn call(&self, ast: &AST, name: &str, args: impl rhai::FuncArgs) -> Result<Dynamic> {
        let mut scope = Scope::new();
        self.engine
            .call_fn::<Dynamic>(&mut scope, ast, name, args)
            .map_err(|e| PluginError::ExecutionError(e.to_string()))
    }
}

/// A delivery plugin implemented by a Rhai script
pub struct ScriptPlugin {
    engine: Arc<ScriptEngine>,
    ast: AST,
    fields: ConfigFields,
}

impl ScriptPlugin {
    /// Compile and validate a script file
    pub fn load(engine: Arc<ScriptEngine>, path: &Path) -> Result<Self> {
        let ast = engine.compile_file(path)?;
        Self::from_ast(engine, ast)
    }

    /// Validate an already compiled script against the plugin contract
    pub fn from_ast(engine: Arc<ScriptEngine>, ast: AST) -> Result<Self> {
        for (name, arity) in [("required_fields", 0), ("run", 4)] {
            let defined = ast
                .iter_functions()
                .any(|f| f.name == name && f.params.len() == arity);
            if !defined {
                return Err(PluginError::InvalidContract(format!(
                    "missing function {}() taking {} parameter(s)",
                    name, arity
                )));
            }
        }

        let declared = engine.call(&ast, "required_fields", ())?;
        let fields = parse_fields(declared)?;

        Ok(Self {
            engine,
            ast,
            fields,
        })
    }

    fn try_run(&self, settings: &Settings, ctx: &PluginContext) -> Result<PluginReport> {
        let args = (
            to_arg(settings)?,
            to_arg(&ctx.artifacts)?,
            to_arg(&ctx.dataset)?,
            to_arg(&ctx.metadata)?,
        );

        let result = self.engine.call(&self.ast, "run", args)?;
        parse_report(result)
    }
}

impl OutputPlugin for ScriptPlugin {
    fn required_fields(&self) -> ConfigFields {
        self.fields.clone()
    }

    fn run(&self, settings: &Settings, ctx: &PluginContext) -> PluginReport {
        self.try_run(settings, ctx)
            .unwrap_or_else(|e| PluginReport::failure(e.to_string()))
    }
}

fn to_arg<T: serde::Serialize>(value: &T) -> Result<Dynamic> {
    rhai::serde::to_dynamic(value)
        .map_err(|e| PluginError::ExecutionError(format!("Failed to convert input: {}", e)))
}

/// Turn the `required_fields()` return value into a settings contract
fn parse_fields(declared: Dynamic) -> Result<ConfigFields> {
    let map = declared.try_cast::<Map>().ok_or_else(|| {
        PluginError::InvalidContract("required_fields() must return a map".to_string())
    })?;

    let mut fields = ConfigFields::new();
    for (name, level) in map {
        let level = level
            .into_string()
            .ok()
            .and_then(|s| FieldRequirement::parse(&s))
            .ok_or_else(|| {
                PluginError::InvalidContract(format!(
                    "field '{}' must be \"required\" or \"optional\"",
                    name
                ))
            })?;
        fields.insert(name.to_string(), level);
    }
    Ok(fields)
}

/// Turn the `run()` return value into a report
fn parse_report(result: Dynamic) -> Result<PluginReport> {
    let map = result
        .try_cast::<Map>()
        .ok_or(PluginError::InvalidReturnType)?;

    let status = map
        .get("status")
        .and_then(|v| v.clone().into_string().ok())
        .and_then(|s| OutcomeStatus::parse(&s))
        .ok_or(PluginError::InvalidReturnType)?;

    let message = map
        .get("message")
        .map(|v| v.to_string())
        .unwrap_or_default();

    Ok(PluginReport::new(status, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use certgen_model::{Artifact, RunMetadata, TabularDataset};
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn engine() -> Arc<ScriptEngine> {
        Arc::new(ScriptEngine::new())
    }

    fn context() -> PluginContext {
        let issued = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        PluginContext {
            artifacts: vec![
                Artifact {
                    record: 0,
                    path: PathBuf::from("/tmp/run/0.pdf"),
                },
                Artifact {
                    record: 1,
                    path: PathBuf::from("/tmp/run/1.pdf"),
                },
            ],
            dataset: TabularDataset::from_rows([
                vec!["name", "course"],
                vec!["John Doe", "Mathematics"],
                vec!["Jane Smith", "Physics"],
            ]),
            metadata: RunMetadata::new(issued, "run-1"),
        }
    }

    fn plugin(script: &str) -> Result<ScriptPlugin> {
        let engine = engine();
        let ast = engine.compile(script)?;
        ScriptPlugin::from_ast(engine, ast)
    }

    const ECHO: &str = r#"
        fn required_fields() {
            #{ greeting: "required", suffix: "optional" }
        }

        fn run(settings, artifacts, data, metadata) {
            let header = data[0];
            #{
                status: "success",
                message: `${settings.greeting} ${artifacts.len()} ${header[1]} ${metadata.run_id}`
            }
        }
    "#;

    #[test]
    fn test_engine_new() {
        let engine = ScriptEngine::new();
        assert!(engine.compile("let x = 1; x").is_ok());
    }

    #[test]
    fn test_compile_invalid_script() {
        let engine = ScriptEngine::new();
        assert!(matches!(
            engine.compile("let x = {{{ invalid"),
            Err(PluginError::CompileError(_))
        ));
    }

    #[test]
    fn test_valid_script_fields() {
        let plugin = plugin(ECHO).unwrap();
        let fields = plugin.required_fields();
        assert_eq!(fields.get("greeting"), Some(&FieldRequirement::Required));
        assert_eq!(fields.get("suffix"), Some(&FieldRequirement::Optional));
    }

    #[test]
    fn test_run_sees_inputs() {
        let plugin = plugin(ECHO).unwrap();
        let mut settings = Settings::new();
        settings.insert("greeting".into(), "hello".into());

        let report = plugin.run(&settings, &context());
        assert_eq!(report.status, OutcomeStatus::Success);
        assert_eq!(report.message, "hello 2 course run-1");
    }

    #[test]
    fn test_missing_run_function() {
        let script = r#"fn required_fields() { #{} }"#;
        assert!(matches!(plugin(script), Err(PluginError::InvalidContract(_))));
    }

    #[test]
    fn test_wrong_run_arity() {
        let script = r#"
            fn required_fields() { #{} }
            fn run(settings) { #{ status: "success" } }
        "#;
        assert!(matches!(plugin(script), Err(PluginError::InvalidContract(_))));
    }

    #[test]
    fn test_unknown_requirement_level() {
        let script = r#"
            fn required_fields() { #{ folder: "mandatory" } }
            fn run(settings, artifacts, data, metadata) { #{ status: "success" } }
        "#;
        let err = plugin(script).err().unwrap();
        assert!(err.to_string().contains("folder"));
    }

    #[test]
    fn test_required_fields_not_a_map() {
        let script = r#"
            fn required_fields() { 42 }
            fn run(settings, artifacts, data, metadata) { #{ status: "success" } }
        "#;
        assert!(matches!(plugin(script), Err(PluginError::InvalidContract(_))));
    }

    #[test]
    fn test_invalid_return_type() {
        let script = r#"
            fn required_fields() { #{} }
            fn run(settings, artifacts, data, metadata) { 42 }
        "#;
        let report = plugin(script).unwrap().run(&Settings::new(), &context());
        assert_eq!(report.status, OutcomeStatus::Failure);
        assert!(report.message.contains("status"));
    }

    #[test]
    fn test_runtime_error_becomes_failure() {
        let script = r#"
            fn required_fields() { #{} }
            fn run(settings, artifacts, data, metadata) { throw "smtp unreachable"; }
        "#;
        let report = plugin(script).unwrap().run(&Settings::new(), &context());
        assert_eq!(report.status, OutcomeStatus::Failure);
        assert!(report.message.contains("smtp unreachable"));
    }

    #[test]
    fn test_warning_status_forwarded() {
        let script = r#"
            fn required_fields() { #{} }
            fn run(settings, artifacts, data, metadata) {
                #{ status: "warning", message: "partial delivery" }
            }
        "#;
        let report = plugin(script).unwrap().run(&Settings::new(), &context());
        assert_eq!(report, PluginReport::warning("partial delivery"));
    }

    #[test]
    fn test_host_functions() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = r#"
            fn required_fields() { #{ out: "required" } }
            fn run(settings, artifacts, data, metadata) {
                create_dir(settings.out);
                let target = path_join(settings.out, "manifest.json");
                write_text(target, to_json(#{ count: artifacts.len() }));
                #{ status: "success", message: target }
            }
        "#;
        let mut settings = Settings::new();
        settings.insert(
            "out".into(),
            dir.path().join("nested").display().to_string().into(),
        );

        let report = plugin(script).unwrap().run(&settings, &context());
        assert_eq!(report.status, OutcomeStatus::Success, "{}", report.message);
        let written = std::fs::read_to_string(&report.message).unwrap();
        assert!(written.contains("\"count\": 2"));
    }
}
