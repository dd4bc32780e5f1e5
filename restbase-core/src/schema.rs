// restbase-core/src/schema.rs
// Per-resource record validation: a compiled subset of JSON Schema
// (required, typed properties, enum, pattern, minItems/maxItems).
//
// Unlike a fail-fast validator, `validate_errors` collects every
// field-level failure: the HTTP contract surfaces the full list in the
// 400 payload.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use crate::error::{FieldError, RestError, Result};

/// Compiled property schema with extended validation constraints
#[derive(Clone, Debug)]
pub struct PropertySchema {
    pub schema_type: SchemaType,
    pub enum_values: Option<Vec<Value>>, // enum validation
    pub pattern: Option<Regex>,          // regex pattern validation
    pub min_items: Option<usize>,        // array minimum length
    pub max_items: Option<usize>,        // array maximum length
}

impl PropertySchema {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            enum_values: None,
            pattern: None,
            min_items: None,
            max_items: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CompiledSchema {
    required: Vec<String>,
    properties: HashMap<String, PropertySchema>,
}

#[derive(Clone, Copy, Debug)]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl SchemaType {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "string" => Some(Self::String),
            "number" | "integer" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            _ => None,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.is_number(),
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Object => value.is_object(),
            SchemaType::Array => value.is_array(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
        }
    }
}

impl CompiledSchema {
    pub fn from_value(schema: &Value) -> Result<Self> {
        let obj = schema
            .as_object()
            .ok_or_else(|| RestError::Schema("Schema must be a JSON object".to_string()))?;

        if let Some(schema_type) = obj.get("type") {
            let type_str = schema_type
                .as_str()
                .ok_or_else(|| RestError::Schema("Schema type must be a string".to_string()))?;
            if type_str != "object" {
                return Err(RestError::Schema(
                    "Only object schemas are supported".to_string(),
                ));
            }
        }

        let mut required = Vec::new();
        if let Some(required_value) = obj.get("required") {
            let arr = required_value.as_array().ok_or_else(|| {
                RestError::Schema("required must be an array of field names".to_string())
            })?;
            for entry in arr {
                let field = entry.as_str().ok_or_else(|| {
                    RestError::Schema("required entries must be strings".to_string())
                })?;
                required.push(field.to_string());
            }
        }

        let mut properties = HashMap::new();
        if let Some(props) = obj.get("properties") {
            let props_obj = props
                .as_object()
                .ok_or_else(|| RestError::Schema("properties must be an object".to_string()))?;
            for (field, spec) in props_obj {
                if let Some(type_value) = spec.get("type") {
                    let type_str = type_value.as_str().ok_or_else(|| {
                        RestError::Schema(format!("Property '{}' type must be a string", field))
                    })?;
                    let parsed_type = SchemaType::from_str(type_str).ok_or_else(|| {
                        RestError::Schema(format!(
                            "Unsupported type '{}' for field '{}'",
                            type_str, field
                        ))
                    })?;

                    let mut prop_schema = PropertySchema::new(parsed_type);

                    if let Some(enum_value) = spec.get("enum") {
                        let enum_arr = enum_value.as_array().ok_or_else(|| {
                            RestError::Schema(format!("Property '{}' enum must be an array", field))
                        })?;
                        prop_schema.enum_values = Some(enum_arr.clone());
                    }

                    if let Some(pattern_value) = spec.get("pattern") {
                        let pattern_str = pattern_value.as_str().ok_or_else(|| {
                            RestError::Schema(format!(
                                "Property '{}' pattern must be a string",
                                field
                            ))
                        })?;
                        let regex = Regex::new(pattern_str).map_err(|e| {
                            RestError::Schema(format!(
                                "Property '{}' has invalid regex pattern: {}",
                                field, e
                            ))
                        })?;
                        prop_schema.pattern = Some(regex);
                    }

                    if let Some(min_value) = spec.get("minItems") {
                        let min = min_value.as_u64().ok_or_else(|| {
                            RestError::Schema(format!(
                                "Property '{}' minItems must be a non-negative integer",
                                field
                            ))
                        })?;
                        prop_schema.min_items = Some(min as usize);
                    }

                    if let Some(max_value) = spec.get("maxItems") {
                        let max = max_value.as_u64().ok_or_else(|| {
                            RestError::Schema(format!(
                                "Property '{}' maxItems must be a non-negative integer",
                                field
                            ))
                        })?;
                        prop_schema.max_items = Some(max as usize);
                    }

                    properties.insert(field.clone(), prop_schema);
                }
            }
        }

        Ok(Self {
            required,
            properties,
        })
    }

    /// Validate a record, collecting every field-level failure.
    /// An empty list means the record passed.
    pub fn validate_errors(&self, value: &Value) -> Vec<FieldError> {
        let Some(obj) = value.as_object() else {
            return vec![FieldError::new("", "Record must be a JSON object")];
        };

        let mut errors = Vec::new();

        for field in &self.required {
            if !obj.contains_key(field) {
                errors.push(FieldError::new(field, "Missing required field"));
            }
        }

        for (field, prop_schema) in &self.properties {
            let Some(field_value) = obj.get(field) else {
                continue;
            };

            if !prop_schema.schema_type.matches(field_value) {
                errors.push(FieldError::new(
                    field,
                    format!("Expected type {}", prop_schema.schema_type.as_str()),
                ));
                continue;
            }

            if let Some(enum_values) = &prop_schema.enum_values {
                if !enum_values.contains(field_value) {
                    errors.push(FieldError::new(field, "Value not in allowed enum values"));
                }
            }

            if let Some(pattern) = &prop_schema.pattern {
                if let Some(s) = field_value.as_str() {
                    if !pattern.is_match(s) {
                        errors.push(FieldError::new(field, "Does not match required pattern"));
                    }
                }
            }

            if let Some(arr) = field_value.as_array() {
                if let Some(min) = prop_schema.min_items {
                    if arr.len() < min {
                        errors.push(FieldError::new(
                            field,
                            format!("Has {} items, minimum required is {}", arr.len(), min),
                        ));
                    }
                }
                if let Some(max) = prop_schema.max_items {
                    if arr.len() > max {
                        errors.push(FieldError::new(
                            field,
                            format!("Has {} items, maximum allowed is {}", arr.len(), max),
                        ));
                    }
                }
            }
        }

        errors
    }
}
