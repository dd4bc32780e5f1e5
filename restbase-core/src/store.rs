// restbase-core/src/store.rs
// The in-memory document store: one JSON object whose top-level entries
// are either collections (arrays of records) or singular resources
// (bare records).
//
// The store owns all collections for its lifetime. Request-scoped reads
// take the read lock and work over the borrowed map; mutations take the
// write lock for the duration of one request's list surgery and release
// it before the post-mutation flush.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{FieldError, RestError, Result};
use crate::log_error;
use crate::schema::CompiledSchema;
use crate::value_utils::loose_eq;

/// How a top-level store entry is exposed over REST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceShape {
    /// An array of records: full collection routes.
    Plural,
    /// A bare record: replace/patch only, no collection semantics.
    Singular,
}

pub struct Store {
    path: Option<PathBuf>,
    data: RwLock<Map<String, Value>>,
    schemas: HashMap<String, CompiledSchema>,
}

impl Store {
    /// Build a store over an already-parsed JSON document. The root must
    /// be an object mapping resource names to collections or records.
    pub fn from_value(root: Value) -> Result<Self> {
        let Value::Object(data) = root else {
            return Err(RestError::Schema(
                "Store root must be a JSON object of resources".to_string(),
            ));
        };
        Ok(Store {
            path: None,
            data: RwLock::new(data),
            schemas: HashMap::new(),
        })
    }

    /// Load a store from a JSON data file. The file becomes the flush
    /// target for `save`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let root: Value = serde_json::from_str(&content)?;
        let mut store = Self::from_value(root)?;
        store.path = Some(path.as_ref().to_path_buf());
        Ok(store)
    }

    /// Load per-resource schemas from a directory of
    /// `<resource>.schema.json` files. Resources without a schema file
    /// accept any record.
    pub fn load_schemas(&mut self, dir: &Path) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(resource) = file_name.strip_suffix(".schema.json") else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            let schema_value: Value = serde_json::from_str(&content)?;
            let compiled = CompiledSchema::from_value(&schema_value)
                .map_err(|e| RestError::Schema(format!("{}: {}", file_name, e)))?;
            self.schemas.insert(resource.to_string(), compiled);
        }
        Ok(())
    }

    /// Register a compiled schema for a resource. Mostly for tests and
    /// embedded use; the CLI goes through `load_schemas`.
    pub fn set_schema(&mut self, resource: impl Into<String>, schema: CompiledSchema) {
        self.schemas.insert(resource.into(), schema);
    }

    /// Classify every top-level entry, failing on the first entry that is
    /// neither a record nor a list of records. Called once at startup;
    /// routing cannot be constructed over an unsupported shape.
    pub fn verify_shapes(&self) -> Result<Vec<(String, ResourceShape)>> {
        let data = self.data.read();
        let mut shapes = Vec::with_capacity(data.len());
        for (name, value) in data.iter() {
            let shape = match value {
                Value::Array(_) => ResourceShape::Plural,
                Value::Object(_) => ResourceShape::Singular,
                other => {
                    return Err(RestError::UnsupportedShape {
                        resource: name.clone(),
                        found: type_name(other),
                    })
                }
            };
            shapes.push((name.clone(), shape));
        }
        Ok(shapes)
    }

    /// Shape of one resource, `None` when the name is not in the store.
    pub fn shape_of(&self, name: &str) -> Option<ResourceShape> {
        match self.data.read().get(name) {
            Some(Value::Array(_)) => Some(ResourceShape::Plural),
            Some(Value::Object(_)) => Some(ResourceShape::Singular),
            _ => None,
        }
    }

    /// Borrow the whole store for a request-scoped read.
    pub fn data(&self) -> RwLockReadGuard<'_, Map<String, Value>> {
        self.data.read()
    }

    /// Borrow the whole store mutably for one mutation.
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Map<String, Value>> {
        self.data.write()
    }

    /// Clone the named resource (collection array or singular record).
    pub fn get(&self, name: &str) -> Option<Value> {
        self.data.read().get(name).cloned()
    }

    /// Clone the record with the given id from the named collection.
    pub fn get_by_id(&self, name: &str, id: &str) -> Option<Value> {
        let data = self.data.read();
        data.get(name)?
            .as_array()?
            .iter()
            .find(|record| {
                record
                    .get("id")
                    .is_some_and(|record_id| loose_eq(record_id, id))
            })
            .cloned()
    }

    /// Replace the named resource wholesale.
    pub fn set(&self, name: &str, value: Value) {
        self.data.write().insert(name.to_string(), value);
    }

    /// Merge a partial record into a singular resource: incoming
    /// top-level fields override, others are retained.
    pub fn update(&self, name: &str, partial: &Value) {
        let mut data = self.data.write();
        if let (Some(Value::Object(existing)), Some(incoming)) =
            (data.get_mut(name), partial.as_object())
        {
            for (key, value) in incoming {
                existing.insert(key.clone(), value.clone());
            }
        }
    }

    /// Generate an id for a record entering the named collection.
    pub fn create_id(&self, _name: &str, _record: &Value) -> String {
        Uuid::new_v4().to_string()
    }

    /// Validate a record against the resource's schema. An empty list
    /// means the record passed (or the resource has no schema).
    pub fn validate(&self, name: &str, record: &Value) -> Vec<FieldError> {
        match self.schemas.get(name) {
            Some(schema) => schema.validate_errors(record),
            None => Vec::new(),
        }
    }

    /// Flush the store to its data file. A no-op for in-memory stores.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = {
            let data = self.data.read();
            serde_json::to_string_pretty(&Value::Object((*data).clone()))?
        };
        fs::write(path, content)?;
        Ok(())
    }

    /// Post-mutation flush hook: fire-and-forget. Persistence failures
    /// are logged, never surfaced to the caller, never retried.
    pub fn save_after_mutation(&self) {
        if let Err(e) = self.save() {
            log_error!("failed to persist store: {}", e);
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
