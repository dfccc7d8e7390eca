//! Project configuration.
//!
//! Configuration lives in the YAML frontmatter of a markdown file:
//! `.sheetwright/config.md` for the project and
//! `~/.config/sheetwright/config.md` for user-wide defaults. Project values
//! override global ones.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::provider::{endpoint_url, ProviderType};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Provider (gemini, openai, offline)
    #[serde(default)]
    pub provider: ProviderType,
    /// Base URL; the provider's public endpoint when unset
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Model name; the provider's default when unset
    #[serde(default)]
    pub model: Option<String>,
    /// API key; falls back to the provider's environment variable
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::default(),
            endpoint: None,
            model: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.provider.default_endpoint().to_string())
    }

    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Output directory, relative to the project root
    #[serde(default = "default_export_dir")]
    pub dir: String,
    /// Refuse to export while validation reports errors
    #[serde(default = "default_require_clean")]
    pub require_clean: bool,
}

fn default_export_dir() -> String {
    "export".to_string()
}

fn default_require_clean() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            require_clean: default_require_clean(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let frontmatter =
            extract_frontmatter(content).context("Failed to extract frontmatter from config")?;

        serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")
    }

    /// Load merged configuration from specified global and project config paths.
    /// Project config values override global config values.
    pub fn load_merged_from(global_path: Option<&Path>, project_path: &Path) -> Result<Self> {
        let global_config = global_path
            .filter(|p| p.exists())
            .map(PartialConfig::load_from)
            .transpose()?
            .unwrap_or_default();

        let project_config = PartialConfig::load_from(project_path)?;

        Ok(global_config.merge_with(project_config))
    }

    /// Hard configuration errors
    pub fn validate(&self) -> Result<()> {
        if self.ai.timeout_secs == 0 {
            bail!("ai.timeout_secs must be greater than 0");
        }
        if self.ai.provider != ProviderType::Offline {
            endpoint_url(&self.ai.endpoint(), "")
                .with_context(|| "ai.endpoint is not a usable URL")?;
            if self.ai.model().trim().is_empty() {
                bail!("ai.model must not be empty");
            }
        }
        if self.export.dir.trim().is_empty() {
            bail!("export.dir must not be empty");
        }
        Ok(())
    }

    /// Problems that do not stop the tool from working
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.project.name.trim().is_empty() {
            warnings.push("project.name is not set".to_string());
        }

        if let Some(var) = self.ai.provider.api_key_env() {
            let has_key = self.ai.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
                || std::env::var(var).is_ok_and(|k| !k.trim().is_empty());
            if !has_key {
                warnings.push(format!(
                    "No API key for {:?}: set ai.api_key or {}; AI features will fall back",
                    self.ai.provider, var
                ));
            }
        }

        if self.ai.api_key.is_some() {
            warnings.push(
                "ai.api_key is stored in the config file; prefer the environment variable"
                    .to_string(),
            );
        }

        warnings
    }
}

/// Returns the path to the global config file at ~/.config/sheetwright/config.md
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/sheetwright/config.md"))
}

/// Partial config for merging - all fields optional
#[derive(Debug, Deserialize, Default)]
struct PartialConfig {
    pub project: Option<PartialProjectConfig>,
    pub ai: Option<PartialAiConfig>,
    pub export: Option<PartialExportConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialProjectConfig {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialAiConfig {
    pub provider: Option<ProviderType>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialExportConfig {
    pub dir: Option<String>,
    pub require_clean: Option<bool>,
}

impl PartialConfig {
    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let frontmatter =
            extract_frontmatter(content).context("Failed to extract frontmatter from config")?;

        // An empty frontmatter block deserializes as unit, not a mapping
        if frontmatter.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")
    }

    /// Merge this global config with a project config.
    /// Values from the project config take precedence over global.
    fn merge_with(self, project: PartialConfig) -> Config {
        let global_ai = self.ai.unwrap_or_default();
        let global_export = self.export.unwrap_or_default();
        let project_project = project.project.unwrap_or_default();
        let project_ai = project.ai.unwrap_or_default();
        let project_export = project.export.unwrap_or_default();

        let provider = project_ai
            .provider
            .or(global_ai.provider)
            .unwrap_or_default();
        // A global model only applies to the provider it was set for
        let global_model = global_ai
            .model
            .filter(|_| global_ai.provider.unwrap_or_default() == provider);

        Config {
            project: ProjectConfig {
                // Project name only comes from the project config
                name: project_project.name.unwrap_or_default(),
            },
            ai: AiConfig {
                provider,
                endpoint: project_ai.endpoint.or(global_ai.endpoint),
                model: project_ai.model.or(global_model),
                api_key: project_ai.api_key.or(global_ai.api_key),
                timeout_secs: project_ai
                    .timeout_secs
                    .or(global_ai.timeout_secs)
                    .unwrap_or_else(default_timeout_secs),
            },
            export: ExportConfig {
                dir: project_export
                    .dir
                    .or(global_export.dir)
                    .unwrap_or_else(default_export_dir),
                require_clean: project_export
                    .require_clean
                    .or(global_export.require_clean)
                    .unwrap_or_else(default_require_clean),
            },
        }
    }
}

fn extract_frontmatter(content: &str) -> Option<String> {
    let content = content.trim();

    if !content.starts_with("---") {
        return None;
    }

    let rest = &content[3..];
    rest.find("\n---").map(|end| rest[..end].to_string())
}

/// A string as a double-quoted YAML scalar; JSON string syntax is valid YAML
fn yaml_scalar(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Default project config written by `sheetwright init`
pub fn default_config_content(project_name: &str) -> String {
    format!(
        r#"---
project:
  name: {}

ai:
  provider: gemini
  timeout_secs: {}

export:
  dir: {}
  require_clean: true
---

# Sheetwright Config

Set `GEMINI_API_KEY` (or `ai.provider: offline`) before using `search` and `rule add`.
"#,
        yaml_scalar(project_name),
        default_timeout_secs(),
        default_export_dir()
    )
}
