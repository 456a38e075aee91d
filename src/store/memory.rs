//! In-process [`DocumentStore`].
//!
//! Used by tests to run the wall without a Firestore project.
//! Ordering follows Firestore: documents missing an ordered-by field are
//! left out, and ties fall back to the document name.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::RwLock;

use super::{Direction, Document, DocumentStore, DocumentStream, Fields, Query, StoreError};

const ID_LEN: usize = 20;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections.read().await.get(collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_LEN)
            .map(char::from)
            .collect();
        let doc = Document { name: Some(format!("{collection}/{id}")), fields };

        self.collections
            .write()
            .await
            .entry(collection.to_owned())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn query(&self, query: &Query) -> Result<DocumentStream, StoreError> {
        let mut docs: Vec<Document> = self
            .collections
            .read()
            .await
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| query.order_by.iter().all(|(f, _)| d.fields.contains_key(f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        docs.sort_by(|a, b| {
            query
                .order_by
                .iter()
                .map(|(field, dir)| {
                    // Both present: filtered above.
                    let ord = match (a.field(field), b.field(field)) {
                        (Some(x), Some(y)) => x.order(y),
                        _ => std::cmp::Ordering::Equal,
                    };
                    match dir {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                })
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.name.cmp(&b.name))
        });

        Ok(futures::stream::iter(docs.into_iter().map(Ok)).boxed())
    }
}
