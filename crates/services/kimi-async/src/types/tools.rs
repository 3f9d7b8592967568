use serde::{Deserialize, Serialize};

/// Function signature offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDef {
    /// Tool name
    pub name: String,
    /// Optional tool description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema for the tool's arguments
    pub parameters: serde_json::Value,
}

/// Tool definition in the OpenAI-compatible `{"type": "function"}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    /// Function-calling tool
    Function {
        /// The function signature
        function: FunctionDef,
    },
}

impl Tool {
    /// Builds a function tool from name, description and parameter schema.
    #[must_use]
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self::Function {
            function: FunctionDef {
                name: name.into(),
                description: Some(description.into()),
                parameters,
            },
        }
    }

    /// The tool's function name.
    #[must_use]
    pub fn name(&self) -> &str {
        let Self::Function { function } = self;
        &function.name
    }
}

/// Tool choice strategy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolChoice {
    /// One of the string modes: `auto`, `none`, `required`
    Mode(ToolChoiceMode),
    /// Force the model to call a specific named function
    Named {
        /// Always `function`
        #[serde(rename = "type")]
        kind: String,
        /// The forced function
        function: NamedFunction,
    },
}

/// String-valued tool choice modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoiceMode {
    /// Let the model decide whether to call tools
    Auto,
    /// Disable tool use
    None,
    /// Force the model to call at least one tool
    Required,
}

/// Reference to a function by name for forced tool choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedFunction {
    /// Function name
    pub name: String,
}

impl ToolChoice {
    /// `"auto"` strategy.
    #[must_use]
    pub const fn auto() -> Self {
        Self::Mode(ToolChoiceMode::Auto)
    }

    /// Force a specific function by name.
    #[must_use]
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Named {
            kind: "function".into(),
            function: NamedFunction { name: name.into() },
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    /// Call identifier
    pub id: String,
    /// Always `function`
    #[serde(rename = "type")]
    pub kind: String,
    /// Invoked function and raw arguments
    pub function: FunctionCall,
}

/// Function name plus its JSON-encoded arguments string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// Arguments as a JSON-encoded string (per the wire format)
    pub arguments: String,
}

/// Type-safe tool schema generation (requires schemars feature)
#[cfg(feature = "schemars")]
pub mod schema {
    use super::*;
    use schemars::JsonSchema;

    /// Generate a function tool whose parameter schema is derived from a
    /// type implementing `JsonSchema`.
    #[must_use]
    pub fn tool_from_schema<T: JsonSchema>(name: &str, description: &str) -> Tool {
        let root = schemars::schema_for!(T);
        let schema_value = serde_json::to_value(root.schema).expect("valid schema");
        Tool::function(name, description, schema_value)
    }
}
