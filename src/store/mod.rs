//! Document store capability.
//!
//! The wall only needs two things from a document database: create a
//! document with some fields in a collection, and stream a collection back
//! ordered by a field. [`DocumentStore`] is that seam. [`FirestoreStore`]
//! talks to Cloud Firestore (or its emulator) over REST; [`MemoryStore`]
//! keeps everything in process.

mod firestore;
mod memory;

use std::collections::BTreeMap;
use std::cmp::Ordering;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// Named field values of one document.
pub type Fields = BTreeMap<String, Value>;

/// A lazy, finite stream of query results. Dropping it releases whatever
/// network resources back it.
pub type DocumentStream = BoxStream<'static, Result<Document, StoreError>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("building client: {0}")]
    Client(String),

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {body}")]
    Api { status: u16, body: String },

    #[error("access token: {0}")]
    Token(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A stored document: its resource name (assigned by the store) and fields.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A single field value, in Firestore's tagged JSON shape
/// (`{"stringValue": "hi"}`).
///
/// Kinds the wall never writes (timestamps, maps, arrays, references and so
/// on) decode into [`Value::Other`] as raw JSON.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// Firestore sends 64-bit integers as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    StringValue(String),
    #[serde(untagged)]
    Other(serde_json::Value),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) => Some(s),
            _ => None,
        }
    }

    /// Firestore's cross-type ordering: null, booleans, numbers, strings.
    /// Other kinds sort after strings and tie with each other.
    pub(crate) fn order(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::NullValue(()) => 0,
                Value::BooleanValue(_) => 1,
                Value::IntegerValue(_) | Value::DoubleValue(_) => 2,
                Value::StringValue(_) => 3,
                Value::Other(_) => 4,
            }
        }
        fn number(v: &Value) -> f64 {
            match v {
                Value::IntegerValue(i) => i.parse().unwrap_or(f64::NAN),
                Value::DoubleValue(d) => *d,
                _ => f64::NAN,
            }
        }

        match (self, other) {
            (Self::BooleanValue(a), Self::BooleanValue(b)) => a.cmp(b),
            (Self::StringValue(a), Self::StringValue(b)) => a.cmp(b),
            (a, b) if rank(a) == 2 && rank(b) == 2 => number(a).total_cmp(&number(b)),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Self::StringValue(s) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::StringValue(s.to_owned()) }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A whole-collection query with an ordering.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    pub collection: String,
    pub order_by: Vec<(String, Direction)>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self { collection: name.into(), order_by: Vec::new() }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push((field.into(), direction));
        self
    }
}

/// A collection-oriented document database.
///
/// Implementations are shared by every request task and must be safe for
/// concurrent use.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a new document in `collection`; the store picks its id.
    /// Returns the created document with its assigned name.
    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError>;

    /// Runs `query`. Documents lacking any ordered-by field are excluded.
    async fn query(&self, query: &Query) -> Result<DocumentStream, StoreError>;
}
