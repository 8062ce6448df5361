//! Adapts tool input schemas to function-calling parameter schemas.
//!
//! Function-calling APIs accept a narrow subset of JSON Schema: an object
//! type, flat properties with a type and description, optional enums and a
//! required list. Everything else a server puts in `inputSchema` is dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::ToolDescriptor;
use crate::registry::ToolRegistry;

/// One property of an adapted parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: String,
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Value>,
}

/// Parameter schema in function-calling form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
    /// Absent only when the source schema was empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ParameterSchema {
    /// The schema used for tools that declare no input.
    pub fn empty() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: None,
        }
    }

    /// Required property names, empty when none were declared.
    pub fn required(&self) -> &[String] {
        self.required.as_deref().unwrap_or(&[])
    }

    /// Render as a JSON value.
    pub fn to_value(&self) -> Value {
        // Only strings and maps of strings; serialization cannot fail.
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// A tool described for a function-calling model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptedTool {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

/// Convert a tool's `inputSchema` into a parameter schema.
///
/// An empty or non-object schema becomes `{type: "object", properties: {}}`.
/// Otherwise `type` defaults to `"object"`, `required` to `[]`, and each
/// property keeps its `type` (default `"string"`), `description` (default
/// `""`) and `enum` when present.
pub fn adapt_input_schema(input_schema: &Value) -> ParameterSchema {
    let schema = match input_schema.as_object() {
        Some(schema) if !schema.is_empty() => schema,
        _ => return ParameterSchema::empty(),
    };

    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| (name.clone(), adapt_property(prop)))
                .collect()
        })
        .unwrap_or_default();

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    ParameterSchema {
        schema_type: schema
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("object")
            .to_string(),
        properties,
        required: Some(required),
    }
}

fn adapt_property(prop: &Value) -> PropertySchema {
    PropertySchema {
        property_type: prop
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("string")
            .to_string(),
        description: prop
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        enum_values: prop.get("enum").cloned(),
    }
}

/// Describe one tool for a function-calling model.
pub fn function_declaration(tool: &ToolDescriptor) -> AdaptedTool {
    AdaptedTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: adapt_input_schema(&tool.input_schema),
    }
}

/// Describe every registered tool, in registry order.
pub fn function_declarations(registry: &ToolRegistry) -> Vec<AdaptedTool> {
    registry.iter().map(function_declaration).collect()
}
