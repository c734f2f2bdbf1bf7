//! Configuration management
//!
//! A [`Config`] is built once at startup by layering, lowest first:
//! built-in defaults, an optional JSON file, environment variables and
//! finally command line flags (applied by the binary). Components receive
//! the finished value and never read the environment themselves.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::Result;
use crate::error::Error;

/// Environment variable holding the chat endpoint base URL.
pub const ENV_HOST: &str = "OLLAMA_HOST";
/// Environment variable holding the model identifier.
pub const ENV_MODEL: &str = "OLLAMA_MODEL";
/// Environment variable toggling debug logging (`1` enables).
pub const ENV_DEBUG: &str = "DEBUG";
/// Environment variable holding the tool server command line.
pub const ENV_SERVER_CMD: &str = "MCP_SERVER_CMD";

/// Name of the bundled tool server binary.
pub const TOOL_SERVER_BIN: &str = "toolbridge-tools";

/// What the agent loop does when a tool invocation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolErrorPolicy {
    /// Propagate the failure and abort the current turn.
    #[default]
    Abort,
    /// Record the failure as the tool's result and keep going.
    Report,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat endpoint base URL
    #[serde(default = "default_host")]
    pub ollama_host: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Verbose diagnostics on stderr
    #[serde(default)]
    pub debug: bool,

    /// Command line used to launch the tool server.
    /// `None` means the bundled `toolbridge-tools` next to the executable.
    #[serde(default)]
    pub server_cmd: Option<String>,

    /// Maximum chat requests per user turn
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Chat request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for the best-effort model unload at shutdown
    #[serde(default = "default_unload_timeout")]
    pub unload_timeout_secs: u64,

    /// Optional bound on a single tool call
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,

    #[serde(default)]
    pub tool_errors: ToolErrorPolicy,

    /// First message of every conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_host() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "gpt-oss:20b".to_string()
}

fn default_max_hops() -> usize {
    5
}

fn default_request_timeout() -> u64 {
    120
}

fn default_unload_timeout() -> u64 {
    10
}

fn default_system_prompt() -> String {
    "You are an assistant that can call tools. \
     When you need exact information (the current time, file contents and so on), \
     use a function call; otherwise answer directly. \
     Reflect tool results in a natural reply to the user."
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_host: default_host(),
            model: default_model(),
            debug: false,
            server_cmd: None,
            max_hops: default_max_hops(),
            request_timeout_secs: default_request_timeout(),
            unload_timeout_secs: default_unload_timeout(),
            tool_timeout_secs: None,
            tool_errors: ToolErrorPolicy::default(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Config {
    /// Override fields from environment-style variables.
    ///
    /// `lookup` returns the value for a variable name, so tests can feed a
    /// fixed table instead of the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|v| !v.trim().is_empty()) {
            self.ollama_host = host.trim().to_string();
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            self.debug = debug.trim() == "1";
        }
        if let Some(cmd) = lookup(ENV_SERVER_CMD).filter(|v| !v.trim().is_empty()) {
            self.server_cmd = Some(cmd.trim().to_string());
        }
    }

    /// Check that the configuration can drive a session.
    pub fn validate(&self) -> Result<()> {
        if !(self.ollama_host.starts_with("http://") || self.ollama_host.starts_with("https://")) {
            return Err(Error::Config(format!(
                "ollama_host must be an http(s) URL, got {:?}",
                self.ollama_host
            )));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        if self.max_hops == 0 {
            return Err(Error::Config("max_hops must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Command line for the tool server, falling back to the bundled binary.
    pub fn resolved_server_cmd(&self) -> Result<String> {
        if let Some(cmd) = &self.server_cmd {
            return Ok(cmd.clone());
        }
        let exe = std::env::current_exe()?;
        let dir = exe
            .parent()
            .ok_or_else(|| Error::Config(format!("No parent directory for {:?}", exe)))?;
        let bin = dir.join(format!("{}{}", TOOL_SERVER_BIN, std::env::consts::EXE_SUFFIX));
        Ok(format!("\"{}\"", bin.display()))
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".toolbridge")
}

/// Get the default config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Read a config file. Fields absent from the file keep their defaults.
pub fn load_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {:?}: {}", path, e)))?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load configuration from file and environment.
///
/// An explicit `path` must exist; the default path is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => {
            let default = config_path();
            if default.exists() {
                load_file(&default)?
            } else {
                Config::default()
            }
        }
    };

    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama_host, "http://127.0.0.1:11434");
        assert_eq!(config.model, "gpt-oss:20b");
        assert_eq!(config.max_hops, 5);
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.tool_errors, ToolErrorPolicy::Abort);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"model": "llama3.1", "tool_errors": "report"}"#).unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.tool_errors, ToolErrorPolicy::Report);
        assert_eq!(config.max_hops, 5);
        assert_eq!(config.ollama_host, "http://127.0.0.1:11434");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = load(Some(&tmp.path().join("nope.json")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_HOST, "http://gpu-box:11434"),
            (ENV_MODEL, "qwen2.5"),
            (ENV_DEBUG, "1"),
            (ENV_SERVER_CMD, "python -u server.py"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.ollama_host, "http://gpu-box:11434");
        assert_eq!(config.model, "qwen2.5");
        assert!(config.debug);
        assert_eq!(config.server_cmd.as_deref(), Some("python -u server.py"));
    }

    #[test]
    fn test_debug_only_on_literal_one() {
        let mut config = Config::default();
        config.apply_env(|k| (k == ENV_DEBUG).then(|| "true".to_string()));
        assert!(!config.debug);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.ollama_host = "127.0.0.1:11434".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.max_hops = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_server_cmd_wins() {
        let mut config = Config::default();
        config.server_cmd = Some("my-server --stdio".to_string());
        assert_eq!(config.resolved_server_cmd().unwrap(), "my-server --stdio");
    }
}
