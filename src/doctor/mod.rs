//! Doctor command for system diagnostics
//!
//! Health checks for everything a research session depends on: the model
//! server, the configured model, `python3`, API keys, and writable output
//! directories.

use colored::*;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::engine::OllamaClient;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    client: OllamaClient,
    model: String,

    /// Directories the agent writes to: sessions, reports, charts
    output_dirs: Vec<PathBuf>,
}

impl Doctor {
    /// Create a new doctor instance
    pub fn new(client: OllamaClient, model: impl Into<String>, output_dirs: Vec<PathBuf>) -> Self {
        Self {
            client,
            model: model.into(),
            output_dirs,
        }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = vec![
            self.check_engine_api().await,
            self.check_model_available().await,
            check_python().await,
            check_api_key("OpenWeather Key", "OPENWEATHER_API_KEY", "weather"),
            check_api_key("Wolfram Alpha ID", "WOLFRAM_ALPHA_APP_ID", "wolfram_alpha"),
        ];

        for dir in &self.output_dirs {
            checks.push(check_writable(dir));
        }

        checks
    }

    async fn check_engine_api(&self) -> HealthCheck {
        match self.client.health_check().await {
            Ok(true) => HealthCheck::new("Ollama API", HealthStatus::Pass),
            Ok(false) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!("Not reachable at {}", self.client.base_url())),
            ),
            Err(e) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!("Error checking Ollama: {}", e)),
            ),
        }
    }

    async fn check_model_available(&self) -> HealthCheck {
        match self.client.list_models().await {
            Ok(models) => model_status(&self.model, &models),
            Err(e) => HealthCheck::new(
                "Model",
                HealthStatus::Fail(format!("Cannot list models: {}", e)),
            ),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "ResearchBuddy System Diagnostics".bold().cyan());
        println!("{:<20} Status", "Check");
        println!("{}", "=".repeat(60));

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass => "PASS".green().to_string(),
                HealthStatus::Warn(msg) => format!("WARN: {}", msg).yellow().to_string(),
                HealthStatus::Fail(msg) => format!("FAIL: {}", msg).red().to_string(),
            };
            println!("{:<20} {}", check.name, status);
        }

        println!();
    }

    /// False if any check failed
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

/// `name` matches an installed model exactly or with an implicit `:latest`
fn model_status(model: &str, installed: &[String]) -> HealthCheck {
    let found = installed
        .iter()
        .any(|m| m == model || m.strip_suffix(":latest") == Some(model));

    if found {
        HealthCheck::new("Model", HealthStatus::Pass)
    } else if installed.is_empty() {
        HealthCheck::new("Model", HealthStatus::Fail("No models installed".to_string()))
    } else {
        HealthCheck::new(
            "Model",
            HealthStatus::Fail(format!("{} not installed (run: ollama pull {})", model, model)),
        )
    }
}

async fn check_python() -> HealthCheck {
    match Command::new("python3").arg("--version").output().await {
        Ok(output) if output.status.success() => HealthCheck::new("Python", HealthStatus::Pass),
        _ => HealthCheck::new(
            "Python",
            HealthStatus::Warn("python3 not found; python_repl will fail".to_string()),
        ),
    }
}

fn check_api_key(name: &str, var: &str, tool: &str) -> HealthCheck {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => HealthCheck::new(name, HealthStatus::Pass),
        _ => HealthCheck::new(
            name,
            HealthStatus::Warn(format!("{} not set; {} is disabled", var, tool)),
        ),
    }
}

fn check_writable(dir: &Path) -> HealthCheck {
    let name = dir
        .file_name()
        .map(|n| format!("Dir {}", n.to_string_lossy()))
        .unwrap_or_else(|| "Dir".to_string());

    if let Err(e) = std::fs::create_dir_all(dir) {
        return HealthCheck::new(
            &name,
            HealthStatus::Fail(format!("Cannot create {}: {}", dir.display(), e)),
        );
    }

    let probe = dir.join(".researchbuddy_probe");
    match std::fs::write(&probe, "probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            HealthCheck::new(&name, HealthStatus::Pass)
        }
        Err(_) => HealthCheck::new(
            &name,
            HealthStatus::Fail(format!("No write permission in {}", dir.display())),
        ),
    }
}
