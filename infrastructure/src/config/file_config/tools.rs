//! Tools configuration from TOML (`[tools]` section)
//!
//! Two kinds of tools can be declared in configuration:
//!
//! - `[tools.command.<name>]` wraps a shell command template with
//!   `{param_name}` placeholders.
//! - `[tools.http.<name>]` sends the argument object to an HTTP endpoint.
//!
//! ```toml
//! [tools.command.getAvailableMargin]
//! description = "Available margin of the trading account in USD"
//! command = "venue-cli margin --json"
//!
//! [tools.http.placeOrder]
//! description = "Place a limit order"
//! url = "http://localhost:8080/orders"
//! method = "post"
//!
//! [tools.http.placeOrder.parameters.symbol]
//! type = "string"
//! description = "Instrument symbol"
//!
//! [tools.http.placeOrder.parameters.size]
//! type = "number"
//! description = "Order size"
//! ```
//!
//! Tables are kept in `BTreeMap`s so the declaration order handed to the
//! model is stable: tools and parameters are sorted by name.

use relay_domain::{
    ConfigIssue, ConfigIssueCode, ParamType, ToolDefinition, ToolParameter,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter declaration shared by command and HTTP tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileToolParameter {
    /// Parameter type: "string", "number" or "object"
    #[serde(rename = "type", default = "default_string_type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
    /// Whether this parameter is required (default: true)
    #[serde(default = "default_true")]
    pub required: bool,
    /// Nested fields of an object parameter
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, FileToolParameter>,
}

fn default_string_type() -> String {
    "string".to_string()
}

fn default_true() -> bool {
    true
}

impl FileToolParameter {
    /// Build the domain parameter. Unknown types fall back to string with
    /// a warning.
    pub fn to_parameter(&self, tool: &str, name: &str) -> (ToolParameter, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let param_type = match self.param_type.parse::<ParamType>() {
            Ok(t) => t,
            Err(_) => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: format!("tools.{}.parameters.{}.type", tool, name),
                        value: self.param_type.clone(),
                        valid_values: vec![
                            "string".to_string(),
                            "number".to_string(),
                            "object".to_string(),
                        ],
                    },
                    format!(
                        "tools.{}.parameters.{}: unknown type '{}', treating it as a string",
                        tool, name, self.param_type
                    ),
                ));
                ParamType::String
            }
        };

        let mut param =
            ToolParameter::new(name, self.description.as_str(), self.required).with_type(param_type);
        for (child_name, child) in &self.properties {
            let (child_param, mut child_issues) = child.to_parameter(tool, child_name);
            issues.append(&mut child_issues);
            param = param.with_property(child_param);
        }

        (param, issues)
    }
}

fn build_definition(
    name: &str,
    description: &str,
    parameters: &BTreeMap<String, FileToolParameter>,
) -> (ToolDefinition, Vec<ConfigIssue>) {
    let mut issues = Vec::new();
    let mut definition = ToolDefinition::new(name, description);
    for (param_name, param) in parameters {
        let (parameter, mut found) = param.to_parameter(name, param_name);
        issues.append(&mut found);
        definition = definition.with_parameter(parameter);
    }
    (definition, issues)
}

fn invalid_tool(name: &str, message: String) -> ConfigIssue {
    ConfigIssue::error(
        ConfigIssueCode::InvalidToolConfig {
            name: name.to_string(),
        },
        message,
    )
}

/// Command tool definition (`[tools.command.<name>]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCommandToolConfig {
    pub description: String,
    /// Command template with `{param_name}` placeholders
    pub command: String,
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Exit code that marks a failure as fatal (default: 3)
    #[serde(default)]
    pub fatal_exit_code: Option<i32>,
    #[serde(default)]
    pub parameters: BTreeMap<String, FileToolParameter>,
}

impl FileCommandToolConfig {
    pub fn to_definition(&self, name: &str) -> (ToolDefinition, Vec<ConfigIssue>) {
        let (definition, mut issues) = build_definition(name, &self.description, &self.parameters);
        if self.command.trim().is_empty() {
            issues.push(invalid_tool(
                name,
                format!("tools.command.{}: command cannot be empty", name),
            ));
        }
        (definition, issues)
    }
}

/// HTTP verb used by an HTTP tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

/// HTTP tool definition (`[tools.http.<name>]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHttpToolConfig {
    pub description: String,
    pub url: String,
    /// "post" (JSON body) or "get" (query parameters)
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, FileToolParameter>,
}

fn default_method() -> String {
    "post".to_string()
}

impl FileHttpToolConfig {
    /// Parse the method string, returning warnings on failure.
    pub fn parse_method(&self, name: &str) -> (HttpMethod, Vec<ConfigIssue>) {
        match self.method.parse::<HttpMethod>() {
            Ok(method) => (method, vec![]),
            Err(_) => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: format!("tools.http.{}.method", name),
                        value: self.method.clone(),
                        valid_values: vec!["get".to_string(), "post".to_string()],
                    },
                    format!(
                        "tools.http.{}.method: unknown value '{}', falling back to 'post'",
                        name, self.method
                    ),
                );
                (HttpMethod::default(), vec![issue])
            }
        }
    }

    pub fn to_definition(&self, name: &str) -> (ToolDefinition, Vec<ConfigIssue>) {
        let (definition, mut issues) = build_definition(name, &self.description, &self.parameters);
        issues.extend(self.parse_method(name).1);
        let url = self.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            issues.push(invalid_tool(
                name,
                format!("tools.http.{}: url must start with http:// or https://", name),
            ));
        }
        (definition, issues)
    }
}

/// Raw `[tools]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    pub command: BTreeMap<String, FileCommandToolConfig>,
    pub http: BTreeMap<String, FileHttpToolConfig>,
}

impl FileToolsConfig {
    pub fn is_empty(&self) -> bool {
        self.command.is_empty() && self.http.is_empty()
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (name, tool) in &self.command {
            issues.extend(tool.to_definition(name).1);
        }
        for (name, tool) in &self.http {
            issues.extend(tool.to_definition(name).1);
            if self.command.contains_key(name) {
                issues.push(invalid_tool(
                    name,
                    format!("tool '{}' is declared as both a command and an HTTP tool", name),
                ));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::Severity;

    #[test]
    fn test_deserialize_tools() {
        let toml_str = r#"
[command.getPositions]
description = "Open positions"
command = "venue-cli positions --json"

[command.getQuote]
description = "Quote for a symbol"
command = "venue-cli quote {symbol}"
fatal_exit_code = 42

[command.getQuote.parameters.symbol]
type = "string"
description = "Instrument symbol"

[http.placeOrder]
description = "Place a limit order"
url = "http://localhost:8080/orders"

[http.placeOrder.parameters.size]
type = "number"
description = "Order size"

[http.placeOrder.parameters.bracket]
type = "object"
description = "Optional bracket"
required = false

[http.placeOrder.parameters.bracket.properties.stop]
type = "number"
description = "Stop price"
"#;
        let config: FileToolsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.command.len(), 2);
        assert_eq!(config.command["getQuote"].fatal_exit_code, Some(42));
        assert!(config.validate().is_empty());

        let (definition, issues) = config.http["placeOrder"].to_definition("placeOrder");
        assert!(issues.is_empty());
        // Parameters come out sorted by name
        let names: Vec<&str> = definition.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bracket", "size"]);
        assert_eq!(definition.parameters[0].param_type, ParamType::Object);
        assert!(!definition.parameters[0].required);
        assert_eq!(definition.parameters[0].properties[0].name, "stop");
        assert_eq!(definition.parameters[1].param_type, ParamType::Number);
        assert_eq!(config.http["placeOrder"].parse_method("placeOrder").0, HttpMethod::Post);
    }

    #[test]
    fn test_unknown_param_type_warns() {
        let param = FileToolParameter {
            param_type: "boolean".to_string(),
            description: "flag".to_string(),
            required: true,
            properties: BTreeMap::new(),
        };
        let (parameter, issues) = param.to_parameter("t", "flag");
        assert_eq!(parameter.param_type, ParamType::String);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_invalid_tools_are_errors() {
        let mut config = FileToolsConfig::default();
        config.command.insert(
            "empty".to_string(),
            FileCommandToolConfig {
                description: String::new(),
                command: "  ".to_string(),
                working_dir: None,
                fatal_exit_code: None,
                parameters: BTreeMap::new(),
            },
        );
        config.http.insert(
            "noscheme".to_string(),
            FileHttpToolConfig {
                description: String::new(),
                url: "localhost:8080".to_string(),
                method: "delete".to_string(),
                headers: BTreeMap::new(),
                parameters: BTreeMap::new(),
            },
        );

        let issues = config.validate();
        let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
        let warnings = issues.iter().filter(|i| i.severity == Severity::Warning).count();
        assert_eq!(errors, 2);
        assert_eq!(warnings, 1);
    }
}
