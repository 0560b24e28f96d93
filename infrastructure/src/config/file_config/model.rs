//! Model configuration from TOML (`[model]` section)

use relay_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Which gateway adapter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelProvider {
    #[default]
    Gemini,
    Scripted,
}

impl std::str::FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(ModelProvider::Gemini),
            "scripted" | "script" => Ok(ModelProvider::Scripted),
            other => Err(format!("unknown model provider: {}", other)),
        }
    }
}

/// Raw model configuration from TOML
///
/// # Example
///
/// ```toml
/// [model]
/// provider = "gemini"
/// name = "gemini-2.0-flash"
/// api_key_env = "GEMINI_API_KEY"
/// request_timeout_secs = 120
/// temperature = 0.2
///
/// # provider = "scripted"
/// # script = "fixtures/margin-check.json"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub provider: String,
    pub name: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub temperature: Option<f32>,
    /// Script file for the scripted provider
    pub script: Option<String>,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            name: DEFAULT_GEMINI_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: None,
            request_timeout_secs: 120,
            temperature: None,
            script: None,
        }
    }
}

impl FileModelConfig {
    /// Parse the provider string, returning warnings on failure.
    pub fn parse_provider(&self) -> (ModelProvider, Vec<ConfigIssue>) {
        match self.provider.parse::<ModelProvider>() {
            Ok(provider) => (provider, vec![]),
            Err(_) => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "model.provider".to_string(),
                        value: self.provider.clone(),
                        valid_values: vec!["gemini".to_string(), "scripted".to_string()],
                    },
                    format!(
                        "model.provider: unknown value '{}', falling back to 'gemini'",
                        self.provider
                    ),
                );
                (ModelProvider::default(), vec![issue])
            }
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let (provider, mut issues) = self.parse_provider();
        if self.request_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "model.request_timeout_secs".to_string(),
                },
                "model.request_timeout_secs cannot be 0",
            ));
        }
        if provider == ModelProvider::Gemini && self.name.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidEnumValue {
                    field: "model.name".to_string(),
                    value: self.name.clone(),
                    valid_values: vec![DEFAULT_GEMINI_MODEL.to_string()],
                },
                "model.name cannot be empty",
            ));
        }
        if provider == ModelProvider::Scripted && self.script.is_none() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidEnumValue {
                    field: "model.script".to_string(),
                    value: String::new(),
                    valid_values: vec![],
                },
                "model.provider is 'scripted' but model.script is not set; pass --script",
            ));
        }
        issues
    }
}
