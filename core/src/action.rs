//! Actions: plain records describing an intended state change.
//!
//! An [`Action`] carries a mandatory `type` discriminator plus any number of
//! additional JSON fields. On the wire it is a JSON object:
//!
//! ```
//! use holdfast_core::Action;
//! use serde_json::json;
//!
//! let action = Action::new("ADD_TODO").with_payload("write docs");
//! assert_eq!(
//!     serde_json::to_value(&action).unwrap(),
//!     json!({ "type": "ADD_TODO", "payload": "write docs" })
//! );
//! ```
//!
//! The store reserves a few action types for itself ([`ReservedType`]). They
//! live in their own [`ActionType`] variant, and deserializing never produces
//! that variant, so no application input can collide with them.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Keys a flux-standard action may carry besides `type`.
const FLUX_STANDARD_KEYS: [&str; 3] = ["payload", "error", "meta"];

/// Action types reserved by the store.
///
/// For any action it does not recognise a reducer must return its current
/// state, or its initial state when the current state is absent. Do not match
/// on these types in application reducers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedType {
    /// Dispatched once when a store is created, to populate initial state.
    Init,
    /// Dispatched after the store's reducer has been replaced.
    Replace,
    /// Used by the reducer combinator to probe sub-reducers with an unknown type.
    ProbeUnknown,
}

impl ReservedType {
    /// String form used when a reserved action is serialized or displayed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "@@holdfast/INIT",
            Self::Replace => "@@holdfast/REPLACE",
            Self::ProbeUnknown => "@@holdfast/PROBE_UNKNOWN_ACTION",
        }
    }
}

impl fmt::Display for ReservedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` discriminator of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionType {
    /// A type reserved by the store.
    Reserved(ReservedType),
    /// An application type. Any JSON value is accepted; strings are the convention.
    Custom(Value),
}

impl ActionType {
    /// String form of the type, if it is a reserved type or a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Reserved(reserved) => Some(reserved.as_str()),
            Self::Custom(value) => value.as_str(),
        }
    }

    /// Whether this type is reserved by the store.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved(_))
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Reserved(reserved) => Value::String(reserved.as_str().to_string()),
            Self::Custom(value) => value.clone(),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved(reserved) => f.write_str(reserved.as_str()),
            Self::Custom(Value::String(name)) => f.write_str(name),
            Self::Custom(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ActionType {
    fn from(name: &str) -> Self {
        Self::Custom(Value::String(name.to_string()))
    }
}

impl From<String> for ActionType {
    fn from(name: String) -> Self {
        Self::Custom(Value::String(name))
    }
}

impl From<Value> for ActionType {
    fn from(value: Value) -> Self {
        Self::Custom(value)
    }
}

impl From<ReservedType> for ActionType {
    fn from(reserved: ReservedType) -> Self {
        Self::Reserved(reserved)
    }
}

/// A plain, serializable record describing an intended state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Action {
    kind: ActionType,
    fields: Map<String, Value>,
}

impl Action {
    /// Create an action with the given type and no other fields.
    #[must_use]
    pub fn new(kind: impl Into<ActionType>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Create one of the store's reserved actions.
    ///
    /// Only the store and the reducer combinator send these. A store refuses
    /// a reserved action passed to `dispatch` with
    /// [`StoreError::InvalidAction`](crate::StoreError::InvalidAction), so
    /// applications only need this to call reducers directly in tests.
    #[must_use]
    pub fn reserved(kind: ReservedType) -> Self {
        Self::new(kind)
    }

    /// The action's `type`.
    #[must_use]
    pub const fn kind(&self) -> &ActionType {
        &self.kind
    }

    /// Whether the action has the given application type.
    ///
    /// Reserved actions never match.
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        match &self.kind {
            ActionType::Custom(Value::String(name)) => name == kind,
            _ => false,
        }
    }

    /// Whether the action is the given reserved action.
    #[must_use]
    pub fn is_reserved(&self, kind: ReservedType) -> bool {
        self.kind == ActionType::Reserved(kind)
    }

    /// Additional field by name.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All additional fields (everything but `type`).
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The `payload` field.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.field("payload")
    }

    /// Whether the `error` field is `true`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.field("error").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Set an additional field.
    ///
    /// Setting `type` replaces the action's discriminator.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key == "type" {
            self.kind = ActionType::Custom(value.into());
        } else {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// Set the `payload` field.
    #[must_use]
    pub fn with_payload(self, payload: impl Into<Value>) -> Self {
        self.with_field("payload", payload)
    }

    /// Set the `error` field.
    #[must_use]
    pub fn with_error(self, error: bool) -> Self {
        self.with_field("error", error)
    }

    /// Set the `meta` field.
    #[must_use]
    pub fn with_meta(self, meta: impl Into<Value>) -> Self {
        self.with_field("meta", meta)
    }

    /// Whether this is a flux-standard action: a string type and no fields
    /// other than `payload`, `error` and `meta`.
    #[must_use]
    pub fn is_flux_standard(&self) -> bool {
        matches!(self.kind, ActionType::Custom(Value::String(_)))
            && self
                .fields
                .keys()
                .all(|key| FLUX_STANDARD_KEYS.contains(&key.as_str()))
    }
}

/// Short name of a JSON value's kind, used in error messages.
pub(crate) const fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl TryFrom<Value> for Action {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(StoreError::InvalidAction {
                    received: describe_value(&other).to_string(),
                });
            },
        };
        let kind = fields.remove("type").ok_or(StoreError::MissingActionType)?;

        Ok(Self {
            kind: ActionType::Custom(kind),
            fields,
        })
    }
}

impl From<Action> for Value {
    fn from(action: Action) -> Self {
        let mut object = Map::with_capacity(action.fields.len() + 1);
        object.insert("type".to_string(), action.kind.to_value());
        object.extend(action.fields);
        Self::Object(object)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_conversion() {
        let action = Action::try_from(json!({ "type": "INC", "by": 2 })).unwrap();
        assert!(action.is("INC"));
        assert_eq!(action.field("by"), Some(&json!(2)));
        assert!(action.field("type").is_none());
    }

    #[test]
    fn test_non_record_is_invalid() {
        let error = Action::try_from(json!([1, 2, 3])).unwrap_err();
        assert_eq!(
            error,
            StoreError::InvalidAction {
                received: "an array".to_string()
            }
        );
    }

    #[test]
    fn test_missing_type() {
        let error = Action::try_from(json!({ "payload": 1 })).unwrap_err();
        assert_eq!(error, StoreError::MissingActionType);
    }

    #[test]
    fn test_null_type_is_allowed() {
        let action = Action::try_from(json!({ "type": null })).unwrap();
        assert_eq!(action.kind(), &ActionType::Custom(Value::Null));
    }

    #[test]
    fn test_reserved_types_cannot_be_forged() {
        let forged: Action =
            serde_json::from_value(json!({ "type": "@@holdfast/INIT" })).unwrap();
        assert!(!forged.is_reserved(ReservedType::Init));
        assert_ne!(forged, Action::reserved(ReservedType::Init));
    }

    #[test]
    fn test_reserved_action_serializes_to_string_type() {
        let value = serde_json::to_value(Action::reserved(ReservedType::Replace)).unwrap();
        assert_eq!(value, json!({ "type": "@@holdfast/REPLACE" }));
        assert!(!Action::reserved(ReservedType::Replace).is("@@holdfast/REPLACE"));
    }

    #[test]
    fn test_with_field_type_replaces_discriminator() {
        let action = Action::new("A").with_field("type", "B");
        assert!(action.is("B"));
        assert!(action.fields().is_empty());
    }

    #[test]
    fn test_flux_standard() {
        assert!(Action::new("FETCH").with_payload(1).with_meta("m").is_flux_standard());
        assert!(!Action::new("FETCH").with_field("extra", 1).is_flux_standard());
        assert!(!Action::new(json!(7)).is_flux_standard());
        assert!(!Action::reserved(ReservedType::Init).is_flux_standard());
    }

    #[test]
    fn test_error_flag() {
        assert!(Action::new("FETCH").with_error(true).is_error());
        assert!(!Action::new("FETCH").is_error());
        assert!(!Action::new("FETCH").with_field("error", "yes").is_error());
    }
}
