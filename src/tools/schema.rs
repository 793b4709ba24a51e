//! Declared tool parameters and validation of model-supplied arguments.

use serde_json::{json, Map, Value};

use super::error::ToolError;

/// Argument name that the model must never control. Anything supplied under
/// this name is dropped before the handler runs.
pub const RESERVED_ARGUMENT: &str = "working_directory";

/// Type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    StringArray,
}

impl ParamKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ParamKind::String => "a string",
            ParamKind::StringArray => "an array of strings",
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

/// JSON schema advertised to the model for a parameter list.
pub fn json_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    for param in params {
        let schema = match param.kind {
            ParamKind::String => json!({
                "type": "string",
                "description": param.description,
            }),
            ParamKind::StringArray => json!({
                "type": "array",
                "description": param.description,
                "items": { "type": "string" },
            }),
        };
        properties.insert(param.name.to_string(), schema);
    }
    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name)
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Arguments that passed validation against a tool's declared parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    /// Check `raw` against `params`.
    ///
    /// The reserved argument is discarded, undeclared names are rejected,
    /// every required parameter must be present, and every value must have
    /// the declared type.
    pub fn validate(params: &[ParamSpec], raw: &Map<String, Value>) -> Result<Self, ToolError> {
        let mut values = Map::new();

        for (name, value) in raw {
            if name == RESERVED_ARGUMENT {
                tracing::warn!("Discarding model-supplied '{}' argument", RESERVED_ARGUMENT);
                continue;
            }
            let Some(param) = params.iter().find(|p| p.name == name) else {
                return Err(ToolError::InvalidArguments(format!(
                    "unexpected argument '{}'",
                    name
                )));
            };
            if !param.kind.matches(value) {
                return Err(ToolError::InvalidArguments(format!(
                    "argument '{}' must be {}",
                    name,
                    param.kind.describe()
                )));
            }
            values.insert(name.clone(), value.clone());
        }

        if let Some(missing) = params
            .iter()
            .find(|p| p.required && !values.contains_key(p.name))
        {
            return Err(ToolError::InvalidArguments(format!(
                "missing required argument '{}'",
                missing.name
            )));
        }

        Ok(Self { values })
    }

    /// A required string argument.
    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        self.opt_str(name).ok_or_else(|| {
            ToolError::InvalidArguments(format!("missing required argument '{}'", name))
        })
    }

    /// An optional string argument.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// An optional string-array argument; absent means empty.
    pub fn string_list(&self, name: &str) -> Vec<String> {
        self.values
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validated arguments as a JSON object, for logging.
    pub fn as_json(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
