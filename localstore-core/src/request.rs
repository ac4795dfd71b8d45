//! Request and response shapes of the action-based API.
//!
//! A [`Request`] carries an action selector plus the `type`, `guid` and `fields`
//! arguments. It can be built with the typed constructors or decoded from JSON:
//!
//! ```ignore
//! use localstore_core::request::Request;
//! use serde_json::json;
//!
//! let typed = Request::read("users", "0a1b2c3d4e5f60718293a4b5");
//! let decoded = Request::from_json(json!({
//!     "action": "read",
//!     "type": "users",
//!     "guid": "0a1b2c3d4e5f60718293a4b5",
//! }))?;
//! assert_eq!(typed, decoded);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::{
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// The recognized action selectors.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    List,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::List => "list",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "list" => Ok(Action::List),
            "delete" => Ok(Action::Delete),
            other => Err(DocumentStoreError::UnknownAction(other.to_string())),
        }
    }
}

/// A single API call.
///
/// The action is kept as a raw string so an unrecognized selector reaches the
/// dispatcher and fails there with [`DocumentStoreError::UnknownAction`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Request {
    #[serde(default, alias = "act", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
}

impl Request {
    fn with_action(action: Action) -> Self {
        Self {
            action: Some(action.as_str().to_string()),
            ..Default::default()
        }
    }

    /// `create` with a single object or a list of objects.
    pub fn create(type_name: impl Into<String>, fields: Value) -> Self {
        Self {
            type_name: Some(type_name.into()),
            fields: Some(fields),
            ..Self::with_action(Action::Create)
        }
    }

    pub fn read(type_name: impl Into<String>, guid: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            guid: Some(guid.into()),
            ..Self::with_action(Action::Read)
        }
    }

    pub fn update(type_name: impl Into<String>, guid: impl Into<String>, fields: Value) -> Self {
        Self {
            type_name: Some(type_name.into()),
            guid: Some(guid.into()),
            fields: Some(fields),
            ..Self::with_action(Action::Update)
        }
    }

    pub fn list(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::with_action(Action::List)
        }
    }

    pub fn delete(type_name: impl Into<String>, guid: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            guid: Some(guid.into()),
            ..Self::with_action(Action::Delete)
        }
    }

    /// Decodes a request from its JSON form.
    ///
    /// The selector may be spelled `action` or `act`. A selector that is not a
    /// string, or two spellings that disagree, decode fine and are rejected later
    /// by [`action`](Self::action).
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Serialization`] if the value is not a request object.
    pub fn from_json(mut value: Value) -> DocumentStoreResult<Self> {
        let selector = match value.as_object_mut() {
            Some(object) => merge_selectors(object.remove("action"), object.remove("act")),
            None => None,
        };

        let mut request: Self = serde_json::from_value(value)?;
        request.action = selector;
        Ok(request)
    }

    /// Resolves the action selector.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnknownAction`] when the selector is absent or unrecognized.
    pub fn action(&self) -> DocumentStoreResult<Action> {
        match self.action.as_deref() {
            None | Some("") => Err(DocumentStoreError::UnknownAction("<none>".to_string())),
            Some(action) => action.parse(),
        }
    }

    /// The non-empty `type` argument.
    pub fn require_type(&self) -> DocumentStoreResult<&str> {
        non_empty(self.type_name.as_deref(), "type")
    }

    /// The non-empty `guid` argument.
    pub fn require_guid(&self) -> DocumentStoreResult<&str> {
        non_empty(self.guid.as_deref(), "guid")
    }
}

fn selector_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Disagreeing spellings collapse into a selector no action matches.
fn merge_selectors(action: Option<Value>, act: Option<Value>) -> Option<String> {
    match (action.and_then(selector_text), act.and_then(selector_text)) {
        (Some(action), Some(act)) if action != act => Some(format!("{action}|{act}")),
        (action, act) => action.or(act),
    }
}

fn non_empty<'a>(value: Option<&'a str>, name: &'static str) -> DocumentStoreResult<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DocumentStoreError::MissingArgument(name)),
    }
}

/// Summary returned by a multi-document `create`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateSummary {
    pub status: &'static str,
    pub count: usize,
}

impl CreateSummary {
    pub fn ok(count: usize) -> Self {
        Self { status: "OK", count }
    }
}

/// Result of a `list`: the documents of one type, in no particular order.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DocumentList {
    pub count: usize,
    pub list: Vec<Document>,
}

impl From<Vec<Document>> for DocumentList {
    fn from(list: Vec<Document>) -> Self {
        Self {
            count: list.len(),
            list,
        }
    }
}

/// The empty placeholder, serialized as `{}`.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Empty {}

/// The result channel of a dispatched request.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Response {
    /// A single document (single create, read hit, update, delete hit).
    Document(Document),
    /// Multi-document create.
    Created(CreateSummary),
    /// List of one type's documents.
    List(DocumentList),
    /// Read or delete miss.
    Empty(Empty),
}

impl Response {
    pub fn empty() -> Self {
        Response::Empty(Empty {})
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Response::Empty(_))
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Response::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            Response::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&DocumentList> {
        match self {
            Response::List(list) => Some(list),
            _ => None,
        }
    }

    /// Converts this response to the JSON shape the hosted API returns.
    pub fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<Option<Document>> for Response {
    fn from(doc: Option<Document>) -> Self {
        doc.map(Response::Document)
            .unwrap_or_else(Response::empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_json_request_with_act_alias() {
        let request = Request::from_json(json!({
            "act": "update",
            "type": "users",
            "guid": "abc",
            "fields": { "name": "Bob" },
        }))
        .unwrap();

        assert_eq!(request, Request::update("users", "abc", json!({ "name": "Bob" })));
        assert_eq!(request.action().unwrap(), Action::Update);
    }

    #[test]
    fn absent_or_unknown_action_is_rejected() {
        assert!(matches!(
            Request::default().action(),
            Err(DocumentStoreError::UnknownAction(_))
        ));

        let request = Request {
            action: Some("upsert".to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.action(),
            Err(DocumentStoreError::UnknownAction("upsert".to_string()))
        );
    }

    #[test]
    fn malformed_selectors_decode_then_fail_as_unknown_action() {
        let numeric = Request::from_json(json!({ "action": 5, "type": "T" })).unwrap();
        assert_eq!(
            numeric.action(),
            Err(DocumentStoreError::UnknownAction("5".to_string()))
        );

        let conflicting =
            Request::from_json(json!({ "action": "read", "act": "list", "type": "T" })).unwrap();
        assert!(matches!(
            conflicting.action(),
            Err(DocumentStoreError::UnknownAction(_))
        ));

        let agreeing =
            Request::from_json(json!({ "action": "list", "act": "list", "type": "T" })).unwrap();
        assert_eq!(agreeing, Request::list("T"));

        let null = Request::from_json(json!({ "action": null, "type": "T" })).unwrap();
        assert!(matches!(null.action(), Err(DocumentStoreError::UnknownAction(_))));
    }

    #[test]
    fn empty_arguments_count_as_missing() {
        let request = Request::read("", "abc");
        assert_eq!(request.require_type(), Err(DocumentStoreError::MissingArgument("type")));
        assert_eq!(request.require_guid(), Ok("abc"));
    }

    #[test]
    fn responses_serialize_to_api_shapes() {
        assert_eq!(Response::empty().to_json().unwrap(), json!({}));
        assert_eq!(
            Response::Created(CreateSummary::ok(2)).to_json().unwrap(),
            json!({ "status": "OK", "count": 2 })
        );
        assert_eq!(
            Response::List(DocumentList::from(vec![])).to_json().unwrap(),
            json!({ "count": 0, "list": [] })
        );
    }
}
