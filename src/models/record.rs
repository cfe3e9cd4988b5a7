//! Record Module
//!
//! The registry's only entity and the change notifications emitted for it.

use serde::{Deserialize, Serialize};

// == Record ==
/// A stored name/value pair with its store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the store; immutable
    pub id: String,
    pub name: String,
    pub value: String,
}

// == New Record ==
/// Fields of a record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub name: String,
    pub value: String,
}

impl NewRecord {
    /// Builds the record from caller input, rejecting empty fields.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let value = value.into();
        if name.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self { name, value })
    }

    /// Attaches the identifier chosen by the store.
    pub fn with_id(self, id: impl Into<String>) -> Record {
        Record {
            id: id.into(),
            name: self.name,
            value: self.value,
        }
    }
}

// == Notification ==
/// Change event published after each registry operation.
///
/// Serialized as `{"action": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "lowercase")]
pub enum Notification {
    /// A record was created
    Register(Record),
    /// The full list was read from the store
    Retrieve(Vec<Record>),
    /// The record with this id was deleted
    Remove(String),
}

impl Notification {
    /// Action tag, used for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Notification::Register(_) => "register",
            Notification::Retrieve(_) => "retrieve",
            Notification::Remove(_) => "remove",
        }
    }
}
