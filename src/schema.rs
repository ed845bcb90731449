//! Schema Builder.
//!
//! Pure constructors for the three nested descriptor shapes an LLM
//! tool-calling API consumes:
//!
//! ```text
//! ParameterSpec        name / type / description / required
//!       |
//!       v  make_parameters
//! ParametersBlock      {"type":"object","properties":{..},"required":[..]}
//!       |
//!       v  make_tool
//! ToolSchema           {"type":"function","function":{name,strict,description,parameters}}
//! ```
//!
//! Nothing here does I/O. The only logic beyond record construction is
//! [`ParametersBlock::validate`], which the dispatcher uses in strict mode.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

const OBJECT_KIND: &str = "object";
const FUNCTION_KIND: &str = "function";

// --- ParameterSpec ---

/// One declared input to a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    name: String,
    ty: String,
    description: String,
    required: bool,
}

impl ParameterSpec {
    /// A required parameter with an empty description.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: String::new(),
            required: true,
        }
    }

    /// Mark the parameter as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type tag (`string`, `integer`, ...).
    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Build a [`ParameterSpec`]. The type tag is not checked against any enum.
pub fn make_parameter(
    name: impl Into<String>,
    ty: impl Into<String>,
    required: bool,
    description: impl Into<String>,
) -> ParameterSpec {
    ParameterSpec {
        name: name.into(),
        ty: ty.into(),
        description: description.into(),
        required,
    }
}

// --- ParametersBlock ---

/// The `{type, description}` pair stored per property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub ty: String,
    pub description: String,
}

/// The `parameters` object of a tool schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParametersBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: IndexMap<String, PropertySchema>,
    required: Vec<String>,
}

/// Collapse a list of specs into a [`ParametersBlock`].
///
/// Duplicate names overwrite earlier entries in `properties` (last one wins,
/// keeping the first position). `required` lists every spec flagged as
/// required, in input order.
pub fn make_parameters(specs: &[ParameterSpec]) -> ParametersBlock {
    let mut properties = IndexMap::with_capacity(specs.len());
    let mut required = Vec::new();
    for spec in specs {
        if spec.required {
            required.push(spec.name.clone());
        }
        properties.insert(
            spec.name.clone(),
            PropertySchema {
                ty: spec.ty.clone(),
                description: spec.description.clone(),
            },
        );
    }
    ParametersBlock {
        kind: OBJECT_KIND,
        properties,
        required,
    }
}

impl ParametersBlock {
    /// Always `"object"`.
    pub fn kind(&self) -> &str {
        self.kind
    }

    pub fn properties(&self) -> &IndexMap<String, PropertySchema> {
        &self.properties
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Check caller-supplied arguments against this block.
    ///
    /// Required names must be present, declared properties must match their
    /// type tag (`null` is accepted for optional ones), and undeclared keys
    /// are rejected unless listed in `exempt`.
    pub fn validate(&self, args: &Map<String, Value>, exempt: &[&str]) -> Result<(), ArgumentError> {
        if let Some(missing) = self.required.iter().find(|name| !args.contains_key(name.as_str())) {
            return Err(ArgumentError::MissingRequired(missing.clone()));
        }

        for (key, value) in args {
            let Some(property) = self.properties.get(key) else {
                if exempt.contains(&key.as_str()) {
                    continue;
                }
                return Err(ArgumentError::Undeclared(key.clone()));
            };
            if value.is_null() && !self.required.contains(key) {
                continue;
            }
            if !value_matches(&property.ty, value) {
                return Err(ArgumentError::TypeMismatch {
                    name: key.clone(),
                    expected: property.ty.clone(),
                    found: json_type_name(value),
                });
            }
        }
        Ok(())
    }
}

/// Why a set of arguments failed [`ParametersBlock::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("missing required parameter: '{0}'")]
    MissingRequired(String),

    #[error("parameter '{name}' expects type '{expected}', got {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: &'static str,
    },

    #[error("undeclared parameter: '{0}'")]
    Undeclared(String),
}

fn value_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown tags are documentary only.
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// --- ToolSchema ---

/// The nested `function` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDescriptor {
    name: String,
    strict: bool,
    description: String,
    parameters: ParametersBlock,
}

/// Declarative descriptor for one callable capability.
///
/// Serializes to the shape LLM tool-calling APIs expect:
/// `{"type":"function","function":{"name",..,"strict":true,..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDescriptor,
}

/// Wrap a parameters block into a [`ToolSchema`].
///
/// Name uniqueness is not checked here; that is the registry's concern.
pub fn make_tool(
    name: impl Into<String>,
    parameters: ParametersBlock,
    description: impl Into<String>,
) -> ToolSchema {
    ToolSchema {
        kind: FUNCTION_KIND,
        function: FunctionDescriptor {
            name: name.into(),
            strict: true,
            description: description.into(),
            parameters,
        },
    }
}

impl ToolSchema {
    /// Always `"function"`.
    pub fn kind(&self) -> &str {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn description(&self) -> &str {
        &self.function.description
    }

    /// Always `true`: undeclared parameters are not accepted.
    pub fn strict(&self) -> bool {
        self.function.strict
    }

    pub fn parameters(&self) -> &ParametersBlock {
        &self.function.parameters
    }

    pub fn function(&self) -> &FunctionDescriptor {
        &self.function
    }

    /// The schema as a JSON value, ready to go into a request body.
    pub fn to_json(&self) -> Value {
        json!({
            "type": self.kind,
            "function": {
                "name": self.function.name,
                "strict": self.function.strict,
                "description": self.function.description,
                "parameters": self.function.parameters,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_single_required_parameter() {
        let path = make_parameter("path", "string", true, "target path");
        let block = make_parameters(&[path]);
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "target path" }
                },
                "required": ["path"]
            })
        );
    }

    #[test]
    fn test_empty_parameter_list() {
        let block = make_parameters(&[]);
        assert_eq!(block.kind(), "object");
        assert!(block.properties().is_empty());
        assert!(block.required().is_empty());
    }

    #[test]
    fn test_required_keeps_input_order() {
        let block = make_parameters(&[
            ParameterSpec::new("c", "string"),
            ParameterSpec::new("a", "integer").optional(),
            ParameterSpec::new("b", "boolean"),
        ]);
        assert_eq!(block.required(), ["c", "b"]);
        let names: Vec<&str> = block.properties().keys().map(String::as_str).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_names_last_one_wins() {
        let block = make_parameters(&[
            make_parameter("mode", "string", false, "first"),
            make_parameter("other", "integer", false, ""),
            make_parameter("mode", "integer", true, "second"),
        ]);
        assert_eq!(block.properties().len(), 2);
        let mode = &block.properties()["mode"];
        assert_eq!(mode.ty, "integer");
        assert_eq!(mode.description, "second");
        assert_eq!(block.required(), ["mode"]);
    }

    #[test]
    fn test_builder_defaults() {
        let spec = ParameterSpec::new("file_path", "string");
        assert!(spec.is_required());
        assert_eq!(spec.describe(), "");
        let spec = spec.optional().description("where");
        assert!(!spec.is_required());
        assert_eq!(spec.describe(), "where");
        assert_eq!(spec.ty(), "string");
    }

    #[test]
    fn test_make_tool_shape() {
        let schema = make_tool(
            "read_file",
            make_parameters(&[ParameterSpec::new("file_path", "string")]),
            "Read a file",
        );
        assert_eq!(schema.kind(), "function");
        assert!(schema.strict());
        assert_eq!(
            schema.to_json(),
            json!({
                "type": "function",
                "function": {
                    "name": "read_file",
                    "strict": true,
                    "description": "Read a file",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "file_path": { "type": "string", "description": "" }
                        },
                        "required": ["file_path"]
                    }
                }
            })
        );
        assert_eq!(schema.to_json(), serde_json::to_value(&schema).unwrap());
    }

    #[test]
    fn test_make_tool_always_strict_function() {
        for name in ["", "x", "summary_by_ai"] {
            let schema = make_tool(name, make_parameters(&[]), "");
            assert!(schema.strict());
            assert_eq!(schema.kind(), "function");
            assert_eq!(schema.name(), name);
        }
    }

    #[test]
    fn test_validate_accepts_matching_args() {
        let block = make_parameters(&[
            ParameterSpec::new("command", "string"),
            ParameterSpec::new("timeout", "integer").optional(),
        ]);
        assert_eq!(block.validate(&args(json!({ "command": "ls" })), &[]), Ok(()));
        assert_eq!(
            block.validate(&args(json!({ "command": "ls", "timeout": 5 })), &[]),
            Ok(())
        );
        assert_eq!(
            block.validate(&args(json!({ "command": "ls", "timeout": null })), &[]),
            Ok(())
        );
    }

    #[test]
    fn test_validate_missing_required() {
        let block = make_parameters(&[ParameterSpec::new("command", "string")]);
        assert_eq!(
            block.validate(&Map::new(), &[]),
            Err(ArgumentError::MissingRequired("command".to_string()))
        );
    }

    #[test]
    fn test_validate_type_mismatch() {
        let block = make_parameters(&[ParameterSpec::new("count", "integer")]);
        let err = block.validate(&args(json!({ "count": 1.5 })), &[]).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::TypeMismatch {
                name: "count".to_string(),
                expected: "integer".to_string(),
                found: "number",
            }
        );
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn test_validate_undeclared_and_exempt() {
        let block = make_parameters(&[ParameterSpec::new("content", "string")]);
        let supplied = args(json!({ "content": "x", "messages": [] }));
        assert_eq!(
            block.validate(&supplied, &[]),
            Err(ArgumentError::Undeclared("messages".to_string()))
        );
        assert_eq!(block.validate(&supplied, &["messages"]), Ok(()));
    }

    #[test]
    fn test_unknown_type_tag_accepts_anything() {
        let block = make_parameters(&[ParameterSpec::new("blob", "any")]);
        assert_eq!(block.validate(&args(json!({ "blob": [1, "two"] })), &[]), Ok(()));
    }
}
