use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "llama3.2:1b-instruct-q4_K_M";
pub const DEFAULT_PROMPT: &str = "Summarize this into detailed notes";
pub const DEFAULT_CONFIG_FILE: &str = "quill.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct QuillConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// How `list_sessions` orders folders.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionOrder {
    /// Plain folder-name order; `_10` sorts before `_2`.
    #[default]
    Lexical,
    /// Date, then numeric sequence number.
    Chronological,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Sessions root. Unset means `sessions/` next to the executable.
    #[serde(default)]
    pub root_dir: Option<String>,
    #[serde(default)]
    pub order: SessionOrder,
}

impl StorageConfig {
    /// Resolve the sessions root, expanding `~`.
    pub fn resolve_root(&self) -> std::io::Result<PathBuf> {
        match &self.root_dir {
            Some(dir) => Ok(PathBuf::from(shellexpand::tilde(dir).as_ref())),
            None => {
                let exe = std::env::current_exe()?;
                let base = exe
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok(base.join("sessions"))
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub program: String,
    pub args: Vec<String>,
    pub model: String,
    pub prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            program: "ollama".to_string(),
            args: vec!["run".to_string()],
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConverterConfig {
    pub program: String,
    /// Extra arguments placed before the output flag.
    pub args: Vec<String>,
    pub output_flag: String,
    /// Arguments used after the input path when reading a summary back as text.
    pub read_args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "pandoc".to_string(),
            args: Vec::new(),
            output_flag: "-o".to_string(),
            read_args: vec!["-t".to_string(), "plain".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    /// No timeout when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl QuillConfig {
    /// Load from a TOML file plus `QUILL__SECTION__KEY` environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `quill.toml` in the working
    /// directory is read if present and built-in defaults apply otherwise.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let s = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("QUILL")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(" ")
                    .with_list_parse_key("llm.args")
                    .with_list_parse_key("converter.args")
                    .with_list_parse_key("converter.read_args")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize()
    }
}
