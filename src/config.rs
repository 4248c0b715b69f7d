//! Configuration management for ResearchBuddy
//!
//! TOML file at ~/.researchbuddy/config.toml, written with defaults on
//! first load. API keys never live here; they come from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::AgentSettings;
use crate::engine::{GenerationOptions, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use crate::errors::{AgentError, Result};
use crate::tools::dispatcher::DispatchConfig;
use crate::tools::types::ToolContext;

/// Directory under $HOME holding config, history and sessions
const APP_DIR: &str = ".researchbuddy";

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub tools: ToolsConfig,
    pub paths: PathsConfig,
}

/// Reasoning engine connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Agent loop behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub memory_window: usize,
    /// Print reasoning steps after each answer
    pub verbose: bool,
    pub show_timing: bool,
}

/// Tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub search_results: usize,
    pub wikipedia_sentences: usize,
    pub parallel_timeout_secs: u64,
    pub python_timeout_secs: u64,
}

/// File system paths; `~/` is expanded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub sessions_dir: String,
    pub reports_dir: String,
    pub charts_dir: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 2000,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            memory_window: 5,
            verbose: true,
            show_timing: true,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_results: 5,
            wikipedia_sentences: 5,
            parallel_timeout_secs: 60,
            python_timeout_secs: 5,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sessions_dir: format!("~/{}/sessions", APP_DIR),
            reports_dir: "reports".to_string(),
            charts_dir: "output".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location (created if missing)
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(&config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AgentError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AgentError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load ~/.researchbuddy/config.toml, writing defaults on first run
    pub fn load_default() -> Result<Self> {
        let Some(config_path) = Self::default_path() else {
            return Ok(Config::default());
        };

        if config_path.exists() {
            return Self::load_from_file(&config_path);
        }

        let config = Config::default();
        config.save(&config_path)?;
        Ok(config)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        Self::app_dir().map(|dir| dir.join("config.toml"))
    }

    /// ~/.researchbuddy
    pub fn app_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR))
    }

    /// Readline history file
    pub fn history_path() -> Option<PathBuf> {
        Self::app_dir().map(|dir| dir.join("history"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.llm.base_url.starts_with("http://") && !self.llm.base_url.starts_with("https://") {
            return Err(AgentError::ConfigError(format!(
                "base_url must be an http(s) URL: {}",
                self.llm.base_url
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(AgentError::ConfigError("model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AgentError::ConfigError(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(AgentError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(AgentError::ConfigError(
                "max_iterations must be greater than 0".to_string(),
            ));
        }

        if !(1..=10).contains(&self.tools.search_results) {
            return Err(AgentError::ConfigError(
                "search_results must be between 1 and 10".to_string(),
            ));
        }

        if self.tools.parallel_timeout_secs == 0 || self.tools.python_timeout_secs == 0 {
            return Err(AgentError::ConfigError(
                "tool timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| AgentError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgentError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AgentError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Apply command-line overrides; `host`/`port` rebuild the base URL
    pub fn apply_overrides(&mut self, model: Option<&str>, host: Option<&str>, port: Option<u16>) {
        if let Some(model) = model {
            self.llm.model = model.to_string();
        }

        if host.is_some() || port.is_some() {
            let (current_host, current_port) = split_host_port(&self.llm.base_url);
            self.llm.base_url = format!(
                "http://{}:{}",
                host.unwrap_or(&current_host),
                port.unwrap_or(current_port)
            );
        }
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn sessions_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.sessions_dir)
    }

    pub fn reports_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.reports_dir)
    }

    pub fn charts_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.charts_dir)
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
        }
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            max_iterations: self.agent.max_iterations,
            memory_window: self.agent.memory_window,
        }
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::default().with_timeout(Duration::from_secs(self.tools.parallel_timeout_secs))
    }

    /// Tool context with these settings and keys from the environment
    pub fn tool_context(&self) -> Result<ToolContext> {
        Ok(ToolContext::new()?
            .with_search_results(self.tools.search_results)
            .with_wikipedia_sentences(self.tools.wikipedia_sentences)
            .with_python_timeout(Duration::from_secs(self.tools.python_timeout_secs))
            .with_charts_dir(self.charts_dir()))
    }
}

/// Host and port of an `http://host:port` URL, defaulting to 127.0.0.1:11434
fn split_host_port(url: &str) -> (String, u16) {
    let authority = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or_default();

    match authority.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(11434)),
        None if authority.is_empty() => ("127.0.0.1".to_string(), 11434),
        None => (authority.to_string(), 11434),
    }
}
