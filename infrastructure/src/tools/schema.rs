//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`] producing the declaration
//! objects handed to the model:
//!
//! ```json
//! {"name": "placeOrder", "description": "...",
//!  "parameters": {"type": "object", "required": ["symbol"],
//!                 "properties": {"symbol": {"type": "string", "description": "..."}}}}
//! ```

use relay_application::ports::tool_schema::ToolSchemaPort;
use relay_domain::tool::entities::{ParamType, ToolDefinition, ToolParameter};
use serde_json::{Map, Value, json};

/// Default implementation producing provider-neutral JSON Schema.
///
/// Object parameters recurse: their fields are described under
/// `properties` with their own `required` list.
pub struct JsonSchemaToolConverter;

fn object_schema(params: &[ToolParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        properties.insert(param.name.clone(), parameter_schema(param));
        if param.required {
            required.push(json!(param.name));
        }
    }

    json!({
        "type": "object",
        "required": required,
        "properties": properties,
    })
}

fn parameter_schema(param: &ToolParameter) -> Value {
    match param.param_type {
        ParamType::Object => {
            let mut schema = object_schema(&param.properties);
            schema["description"] = json!(param.description);
            schema
        }
        other => json!({
            "type": other.as_str(),
            "description": param.description,
        }),
    }
}

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": object_schema(&tool.parameters),
        })
    }
}
