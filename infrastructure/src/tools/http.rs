//! HTTP tool handler: forward the argument object to an HTTP endpoint.
//!
//! `POST` tools send the arguments as a JSON body; `GET` tools send them
//! as query parameters. A JSON response body is returned as-is, anything
//! else as a string.

use async_trait::async_trait;
use relay_application::ports::tool_handler::ToolHandler;
use relay_domain::tool::{
    entities::{ToolCall, ToolDefinition},
    value_objects::ToolError,
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{FileHttpToolConfig, HttpMethod};

/// Length of the body excerpt quoted in failure messages
const ERROR_EXCERPT_LEN: usize = 200;

/// Maximum response body size (5 MB)
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

/// Handler calling a fixed URL
#[derive(Debug, Clone)]
pub struct HttpToolHandler {
    client: reqwest::Client,
    tool_name: String,
    url: String,
    method: HttpMethod,
    headers: BTreeMap<String, String>,
    required: Vec<String>,
}

impl HttpToolHandler {
    pub fn new(
        client: reqwest::Client,
        definition: &ToolDefinition,
        url: impl Into<String>,
        method: HttpMethod,
    ) -> Self {
        Self {
            client,
            tool_name: definition.name.clone(),
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            required: definition
                .required_parameters()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_config(
        client: reqwest::Client,
        definition: &ToolDefinition,
        config: &FileHttpToolConfig,
    ) -> Self {
        let (method, _) = config.parse_method(&definition.name);
        Self::new(client, definition, config.url.as_str(), method).with_headers(config.headers.clone())
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    fn request(&self, call: &ToolCall) -> reqwest::RequestBuilder {
        let mut request = match self.method {
            HttpMethod::Post => self.client.post(&self.url).json(&call.arguments_json()),
            HttpMethod::Get => {
                let query: Vec<(&str, String)> = call
                    .arguments
                    .iter()
                    .map(|(k, v)| {
                        let value = match v {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (k.as_str(), value)
                    })
                    .collect();
                self.client.get(&self.url).query(&query)
            }
        };

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        request
    }
}

#[async_trait]
impl ToolHandler for HttpToolHandler {
    async fn call(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        if let Some(missing) = self
            .required
            .iter()
            .find(|name| !call.arguments.contains_key(name.as_str()))
        {
            return Err(ToolError::invalid_argument(format!(
                "Missing required argument: {}",
                missing
            )));
        }

        debug!(
            tool = %self.tool_name,
            method = self.method.as_str(),
            url = %self.url,
            "Calling HTTP tool"
        );

        let response = self.request(call).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::execution_failed(format!("Request to {} timed out", self.url))
            } else {
                ToolError::execution_failed(format!("Failed to reach {}: {}", self.url, e))
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            ToolError::execution_failed(format!("Failed to read response body: {}", e))
        })?;
        if body.len() > MAX_BODY_SIZE {
            return Err(ToolError::execution_failed(format!(
                "Response too large: {} bytes (max: {} bytes)",
                body.len(),
                MAX_BODY_SIZE
            )));
        }
        let text = String::from_utf8_lossy(&body);

        if !status.is_success() {
            let excerpt: String = text.trim().chars().take(ERROR_EXCERPT_LEN).collect();
            return Err(ToolError::execution_failed(format!(
                "HTTP {} {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                excerpt
            )));
        }

        Ok(serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::Value::String(text.trim().to_string())))
    }
}
