// restbase-core/src/mutation.rs
//! Mutation engine: create / replace / update / destroy against one
//! collection, plus the replace/update pair for singular resources.
//!
//! Invariants enforced here, not by storage:
//! - id uniqueness within a collection (create conflicts on a duplicate)
//! - schema validation before any commit
//! - batch replace/update validates every member before committing any
//!
//! Every committed mutation ends with the store's fire-and-forget flush.

use serde_json::{json, Value};

use crate::error::{RestError, Result};
use crate::store::Store;
use crate::value_utils::{loose_eq, loose_eq_values, to_text};

/// How a batch write resolves each incoming record against the
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// `put`: the incoming record wins wholesale; absent ids are
    /// generated.
    Replace,
    /// `patch`: the incoming record must name an existing id and is
    /// merged field-by-field over it.
    Merge,
}

/// `POST` on a collection. Appends the validated record as-is; no id is
/// generated (supplying one is the client's or the schema's business).
pub fn create(store: &Store, name: &str, record: Value) -> Result<Value> {
    if let Some(id) = record.get("id") {
        if find_existing(store, name, id) {
            return Err(RestError::Conflict {
                body: json!({
                    "errors": {"id": format!("ID already exists: {}", to_text(id))}
                }),
            });
        }
    }

    let errors = store.validate(name, &record);
    if !errors.is_empty() {
        return Err(RestError::Validation {
            resource: None,
            errors,
        });
    }

    {
        let mut data = store.data_mut();
        if let Some(collection) = data.get_mut(name).and_then(Value::as_array_mut) {
            collection.push(record.clone());
        }
    }
    store.save_after_mutation();
    Ok(record)
}

/// `POST` on a singular resource: always a conflict, the resource
/// already exists by definition.
pub fn create_singular() -> RestError {
    RestError::Conflict {
        body: json!({"error": "Already exists, use PUT to replace"}),
    }
}

/// `PUT` on a collection: replace (or append) one record or a batch.
pub fn replace(store: &Store, name: &str, body: Value) -> Result<Value> {
    write_many(store, name, body, WriteMode::Replace)
}

/// `PATCH` on a collection: merge one record or a batch into existing
/// records; every member must name an existing id.
pub fn update(store: &Store, name: &str, body: Value) -> Result<Value> {
    write_many(store, name, body, WriteMode::Merge)
}

fn write_many(store: &Store, name: &str, body: Value, mode: WriteMode) -> Result<Value> {
    let was_batch = body.is_array();
    let incoming: Vec<Value> = match body {
        Value::Array(records) => records,
        single => vec![single],
    };

    // Validation pass: all-or-nothing. The first failing member rejects
    // the whole batch before anything commits.
    let mut outgoing = Vec::with_capacity(incoming.len());
    for resource in incoming {
        let next = match mode {
            WriteMode::Merge => {
                let id = resource
                    .get("id")
                    .cloned()
                    .ok_or_else(|| RestError::NotFound("PATCH requires id".to_string()))?;
                let existing = store
                    .get_by_id(name, &to_text(&id))
                    .ok_or_else(|| {
                        RestError::NotFound(format!("No resource with such id: {}", to_text(&id)))
                    })?;
                merge_records(existing, &resource)
            }
            WriteMode::Replace => {
                let mut next = resource.clone();
                if next.get("id").is_none() {
                    let new_id = store.create_id(name, &next);
                    if let Some(obj) = next.as_object_mut() {
                        obj.insert("id".to_string(), json!(new_id));
                    }
                }
                next
            }
        };

        let errors = store.validate(name, &next);
        if !errors.is_empty() {
            return Err(RestError::Validation {
                resource: Some(resource),
                errors,
            });
        }
        outgoing.push(next);
    }

    // Commit pass: per record, overwrite the same-id record when found,
    // append otherwise.
    {
        let mut data = store.data_mut();
        if let Some(collection) = data.get_mut(name).and_then(Value::as_array_mut) {
            for record in &outgoing {
                let position = collection.iter().position(|existing| {
                    match (existing.get("id"), record.get("id")) {
                        (Some(a), Some(b)) => loose_eq_values(a, b),
                        _ => false,
                    }
                });
                match position {
                    Some(index) => collection[index] = record.clone(),
                    None => collection.push(record.clone()),
                }
            }
        }
    }
    store.save_after_mutation();

    Ok(if was_batch {
        Value::Array(outgoing)
    } else {
        outgoing.into_iter().next().unwrap_or(Value::Null)
    })
}

/// `DELETE /:id`: remove exactly one record by identity. The response
/// body is the empty record.
pub fn destroy(store: &Store, name: &str, id: &str) -> Result<Value> {
    let removed = {
        let mut data = store.data_mut();
        match data.get_mut(name).and_then(Value::as_array_mut) {
            Some(collection) => {
                let position = collection.iter().position(|record| {
                    record
                        .get("id")
                        .is_some_and(|record_id| loose_eq(record_id, id))
                });
                match position {
                    Some(index) => {
                        collection.remove(index);
                        true
                    }
                    None => false,
                }
            }
            None => false,
        }
    };

    if !removed {
        return Err(RestError::NotFound(format!("No such item: {}", id)));
    }
    store.save_after_mutation();
    Ok(json!({}))
}

/// `PUT` on a singular resource: validate, then replace wholesale.
pub fn replace_singular(store: &Store, name: &str, record: Value) -> Result<Value> {
    let errors = store.validate(name, &record);
    if !errors.is_empty() {
        return Err(RestError::Validation {
            resource: Some(record),
            errors,
        });
    }
    store.set(name, record.clone());
    store.save_after_mutation();
    Ok(record)
}

/// `PATCH` on a singular resource: merge the partial record into the
/// sole existing one, validate the merged result, then commit.
pub fn update_singular(store: &Store, name: &str, partial: Value) -> Result<Value> {
    let existing = store
        .get(name)
        .ok_or_else(|| RestError::NotFound(format!("No such resource: {}", name)))?;
    let merged = merge_records(existing, &partial);

    let errors = store.validate(name, &merged);
    if !errors.is_empty() {
        return Err(RestError::Validation {
            resource: Some(merged),
            errors,
        });
    }
    store.update(name, &partial);
    store.save_after_mutation();
    Ok(merged)
}

/// Field-level merge: incoming top-level fields override, others are
/// retained.
fn merge_records(existing: Value, incoming: &Value) -> Value {
    let mut merged = existing;
    if let (Some(target), Some(source)) = (merged.as_object_mut(), incoming.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn find_existing(store: &Store, name: &str, id: &Value) -> bool {
    store.get_by_id(name, &to_text(id)).is_some()
}
