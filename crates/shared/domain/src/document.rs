//! Schema-less document entity.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::constants::ID_PROPERTY;
use crate::error::{DomainError, DomainResult};

/// A JSON object stored in a partitioned collection.
///
/// The data-access layer never interprets fields beyond `id`; everything else
/// belongs to the caller. Typed entities converted with [`Document::from_entity`]
/// are expected to use camelCase property names
/// (`#[serde(rename_all = "camelCase")]`), which is the naming used on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Serialize a typed entity into a document.
    pub fn from_entity<T: Serialize>(entity: &T) -> DomainResult<Self> {
        let value = serde_json::to_value(entity)
            .map_err(|e| DomainError::invalid_document(e.to_string()))?;
        Self::try_from(value)
    }

    /// Deserialize the document into a typed entity.
    pub fn to_entity<T: DeserializeOwned>(&self) -> DomainResult<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| DomainError::invalid_document(e.to_string()))
    }

    /// Document identifier, if present and a string
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_PROPERTY).and_then(Value::as_str)
    }

    /// Assign a random identifier when the document has none.
    ///
    /// Returns the identifier the document ends up with.
    pub fn ensure_id(&mut self) -> String {
        if let Some(id) = self.id() {
            return id.to_string();
        }

        let id = Uuid::new_v4().to_string();
        self.0.insert(ID_PROPERTY.to_string(), Value::String(id.clone()));
        id
    }

    /// Get a property value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a property value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the document, returning the underlying JSON object
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Object(document.0)
    }
}

impl TryFrom<Value> for Document {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::invalid_document(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
