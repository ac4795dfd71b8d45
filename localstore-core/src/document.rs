//! Core types for document representation.
//!
//! A [`Document`] is a schemaless set of [`Fields`] scoped under a type name and
//! addressed by a store-wide unique guid. This module also provides the helpers that
//! turn caller-supplied JSON into validated field objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// The caller-supplied body of a document: an arbitrary JSON object.
pub type Fields = Map<String, Value>;

/// All documents of one type, keyed by guid.
pub type CollectionMap = HashMap<String, Document>;

/// The whole store: type name -> (guid -> document).
pub type StoreMap = HashMap<String, CollectionMap>;

/// A single stored record.
///
/// `guid` and `type_name` are assigned by the store on creation and never change;
/// only `fields` is replaced by an update.
///
/// # Example
///
/// ```ignore
/// use localstore_core::document::Document;
/// use serde_json::json;
///
/// let doc = Document::new("0a1b2c3d4e5f60718293a4b5", "users", fields);
/// assert_eq!(
///     doc.to_json()?,
///     json!({ "guid": "0a1b2c3d4e5f60718293a4b5", "type": "users", "fields": { "name": "Alice" } }),
/// );
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub guid: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub fields: Fields,
}

impl Document {
    /// Creates a document from its parts.
    pub fn new(guid: impl Into<String>, type_name: impl Into<String>, fields: Fields) -> Self {
        Self {
            guid: guid.into(),
            type_name: type_name.into(),
            fields,
        }
    }

    /// Converts this document to its `{guid, type, fields}` JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Creates a document from its `{guid, type, fields}` JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not have the document shape.
    pub fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Normalizes a `fields` argument into a batch of field objects.
///
/// A single object becomes a one-element batch; a list must contain only objects.
/// `null`, `{}` and `[]` count as an absent argument.
///
/// # Errors
///
/// Returns [`DocumentStoreError::MissingArgument`] for absent/empty input and
/// [`DocumentStoreError::InvalidFields`] for anything that is not an object.
pub fn fields_batch(value: Option<Value>) -> DocumentStoreResult<Vec<Fields>> {
    match value {
        None | Some(Value::Null) => Err(DocumentStoreError::MissingArgument("fields")),
        Some(Value::Array(items)) if items.is_empty() => {
            Err(DocumentStoreError::MissingArgument("fields"))
        }
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(DocumentStoreError::InvalidFields(format!(
                    "element {index} is {}, expected an object",
                    kind_of(&other)
                ))),
            })
            .collect(),
        other => Ok(vec![fields_object(other)?]),
    }
}

/// Extracts a single non-empty field object, as required by `update`.
///
/// # Errors
///
/// Returns [`DocumentStoreError::MissingArgument`] for absent/empty input and
/// [`DocumentStoreError::InvalidFields`] when the value is not an object.
pub fn fields_object(value: Option<Value>) -> DocumentStoreResult<Fields> {
    match value {
        None | Some(Value::Null) => Err(DocumentStoreError::MissingArgument("fields")),
        Some(Value::Object(map)) if map.is_empty() => {
            Err(DocumentStoreError::MissingArgument("fields"))
        }
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(DocumentStoreError::InvalidFields(format!(
            "got {}, expected an object",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_serializes_with_type_key() {
        let fields = json!({ "a": 1 }).as_object().cloned().unwrap();
        let doc = Document::new("abc", "things", fields);

        assert_eq!(
            doc.to_json().unwrap(),
            json!({ "guid": "abc", "type": "things", "fields": { "a": 1 } })
        );
        assert_eq!(Document::from_json(doc.to_json().unwrap()).unwrap(), doc);
    }

    #[test]
    fn single_object_becomes_one_element_batch() {
        let batch = fields_batch(Some(json!({ "a": 1 }))).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].get("a"), Some(&json!(1)));
    }

    #[test]
    fn list_of_objects_is_kept_in_order() {
        let batch = fields_batch(Some(json!([{ "x": 1 }, { "x": 2 }]))).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].get("x"), Some(&json!(2)));
    }

    #[test]
    fn empty_or_absent_fields_are_missing() {
        for value in [None, Some(Value::Null), Some(json!({})), Some(json!([]))] {
            assert_eq!(
                fields_batch(value),
                Err(DocumentStoreError::MissingArgument("fields"))
            );
        }
    }

    #[test]
    fn non_object_fields_are_invalid() {
        assert!(matches!(
            fields_batch(Some(json!([{ "x": 1 }, 7]))),
            Err(DocumentStoreError::InvalidFields(_))
        ));
        assert!(matches!(
            fields_object(Some(json!("text"))),
            Err(DocumentStoreError::InvalidFields(_))
        ));
    }
}
