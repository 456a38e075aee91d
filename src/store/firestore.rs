//! Cloud Firestore over its v1 REST API.
//!
//! In production, bearer tokens come from Application Default Credentials:
//! a service-account key named by `GOOGLE_APPLICATION_CREDENTIALS`, the
//! gcloud user login, or the metadata server that App Engine, Cloud Run and
//! GCE expose to every instance. The first token is fetched while the client
//! is built, so a host without credentials fails at startup. Against the
//! emulator no token is needed; it accepts the fixed `owner` credential.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Direction, Document, DocumentStore, DocumentStream, Fields, Query, StoreError};

const API_ROOT: &str = "https://firestore.googleapis.com/v1";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/datastore"];
const EMULATOR_TOKEN: &str = "owner";

/// A Firestore client bound to one project's default database.
///
/// Cheap to share behind an `Arc`: the inner `reqwest::Client` is a
/// connection pool and the credential provider caches its tokens.
pub struct FirestoreStore {
    http: reqwest::Client,
    documents_url: String,
    tokens: Box<dyn TokenSource>,
}

/// Where bearer tokens come from.
#[async_trait]
trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, StoreError>;
}

struct DefaultCredentials(Arc<dyn gcp_auth::TokenProvider>);

#[async_trait]
impl TokenSource for DefaultCredentials {
    async fn token(&self) -> Result<String, StoreError> {
        let token = self
            .0
            .token(SCOPES)
            .await
            .map_err(|e| StoreError::Token(e.to_string()))?;
        Ok(token.as_str().to_owned())
    }
}

struct EmulatorToken;

#[async_trait]
impl TokenSource for EmulatorToken {
    async fn token(&self) -> Result<String, StoreError> {
        Ok(EMULATOR_TOKEN.to_owned())
    }
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    fields: &'a Fields,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
    structured_query: StructuredQuery<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredQuery<'a> {
    from: [CollectionSelector<'a>; 1],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<Order<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector<'a> {
    collection_id: &'a str,
}

#[derive(Serialize)]
struct Order<'a> {
    field: FieldReference<'a>,
    direction: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference<'a> {
    field_path: &'a str,
}

/// One element of the `runQuery` response array. Elements that only report
/// progress (`readTime`, `skippedResults`) carry no document.
#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
}

impl FirestoreStore {
    /// Client for the production Firestore service.
    ///
    /// Resolves Application Default Credentials and fetches a first token;
    /// either failing is a [`StoreError::Token`].
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        check_project(project_id)?;
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| StoreError::Token(e.to_string()))?;
        Self::connect(API_ROOT, project_id, Box::new(DefaultCredentials(provider))).await
    }

    /// Client for a Firestore emulator listening on `host` (`host:port`).
    pub fn emulator(project_id: &str, host: &str) -> Result<Self, StoreError> {
        Self::build(&format!("http://{host}/v1"), project_id, Box::new(EmulatorToken))
    }

    async fn connect(
        root: &str,
        project_id: &str,
        tokens: Box<dyn TokenSource>,
    ) -> Result<Self, StoreError> {
        let store = Self::build(root, project_id, tokens)?;
        store.tokens.token().await?;
        debug!(project = project_id, "credentials resolved");
        Ok(store)
    }

    fn build(root: &str, project_id: &str, tokens: Box<dyn TokenSource>) -> Result<Self, StoreError> {
        check_project(project_id)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Client(e.to_string()))?;

        Ok(Self {
            http,
            documents_url: format!("{root}/projects/{project_id}/databases/(default)/documents"),
            tokens,
        })
    }

    async fn post(&self, url: &str, body: &impl Serialize) -> Result<reqwest::Response, StoreError> {
        let res = self
            .http
            .post(url)
            .bearer_auth(self.tokens.token().await?)
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(StoreError::Api { status: status.as_u16(), body })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        let url = format!("{}/{collection}", self.documents_url);
        let res = self.post(&url, &CreateRequest { fields: &fields }).await?;
        Ok(res.json().await?)
    }

    async fn query(&self, query: &Query) -> Result<DocumentStream, StoreError> {
        let url = format!("{}:runQuery", self.documents_url);
        let res = self.post(&url, &run_query_request(query)).await?;

        // The body is only read once the caller starts pulling.
        let stream = futures::stream::once(async move {
            res.json::<Vec<RunQueryItem>>().await.map_err(StoreError::from)
        })
        .flat_map(|batch| {
            let items: Vec<Result<Document, StoreError>> = match batch {
                Ok(items) => items.into_iter().filter_map(|i| i.document).map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            futures::stream::iter(items)
        });
        Ok(stream.boxed())
    }
}

fn run_query_request(query: &Query) -> RunQueryRequest<'_> {
    RunQueryRequest {
        structured_query: StructuredQuery {
            from: [CollectionSelector { collection_id: &query.collection }],
            order_by: query
                .order_by
                .iter()
                .map(|(field, dir)| Order {
                    field: FieldReference { field_path: field },
                    direction: match dir {
                        Direction::Ascending => "ASCENDING",
                        Direction::Descending => "DESCENDING",
                    },
                })
                .collect(),
        },
    }
}

fn check_project(project_id: &str) -> Result<(), StoreError> {
    if project_id.is_empty() {
        return Err(StoreError::Client("empty project id".to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    #[test]
    fn query_body_matches_rest_shape() {
        let q = Query::collection("Wall").order_by("User", Direction::Ascending);
        let body = serde_json::to_value(run_query_request(&q)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "structuredQuery": {
                    "from": [{"collectionId": "Wall"}],
                    "orderBy": [{"field": {"fieldPath": "User"}, "direction": "ASCENDING"}]
                }
            }),
        );
    }

    #[test]
    fn unordered_query_omits_order_by() {
        let body = serde_json::to_value(run_query_request(&Query::collection("Wall"))).unwrap();
        assert!(body["structuredQuery"].get("orderBy").is_none());
    }

    #[test]
    fn create_body_wraps_fields() {
        let fields: Fields = [("Note".to_owned(), Value::from("hi"))].into_iter().collect();
        let body = serde_json::to_value(CreateRequest { fields: &fields }).unwrap();
        assert_eq!(body, serde_json::json!({"fields": {"Note": {"stringValue": "hi"}}}));
    }

    #[test]
    fn run_query_items_without_document_are_progress_only() {
        let items: Vec<RunQueryItem> = serde_json::from_str(
            r#"[{"readTime": "2024-01-01T00:00:00Z"},
                {"document": {"name": "n", "fields": {}}, "readTime": "2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        assert!(items[0].document.is_none());
        assert_eq!(items[1].document.as_ref().unwrap().name.as_deref(), Some("n"));
    }

    #[test]
    fn unknown_value_kinds_keep_the_rest_of_the_batch() {
        let items: Vec<RunQueryItem> = serde_json::from_str(
            r#"[{"document": {"name": "a", "fields": {"User": {"stringValue": "Amy"}}}},
                {"document": {"name": "b", "fields": {
                    "User": {"stringValue": "Zoe"},
                    "Created": {"timestampValue": "2024-05-01T00:00:00Z"}}}}]"#,
        )
        .unwrap();

        let docs: Vec<Document> = items.into_iter().filter_map(|i| i.document).collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].field("User"), Some(&Value::from("Zoe")));
        assert!(matches!(docs[1].field("Created"), Some(Value::Other(_))));
    }

    struct Fixed;

    #[async_trait]
    impl TokenSource for Fixed {
        async fn token(&self) -> Result<String, StoreError> {
            Ok("t0ken".to_owned())
        }
    }

    struct NoCredentials;

    #[async_trait]
    impl TokenSource for NoCredentials {
        async fn token(&self) -> Result<String, StoreError> {
            Err(StoreError::Token("no credentials found".to_owned()))
        }
    }

    #[tokio::test]
    async fn urls_are_scoped_to_project() {
        let store = FirestoreStore::emulator("demo", "127.0.0.1:8681").unwrap();
        assert_eq!(
            store.documents_url,
            "http://127.0.0.1:8681/v1/projects/demo/databases/(default)/documents",
        );
        let store = FirestoreStore::connect(API_ROOT, "prod", Box::new(Fixed)).await.unwrap();
        assert!(store.documents_url.starts_with("https://firestore.googleapis.com/v1/projects/prod/"));
        assert_eq!(store.tokens.token().await.unwrap(), "t0ken");
    }

    #[tokio::test]
    async fn missing_credentials_fail_construction() {
        let err = FirestoreStore::connect(API_ROOT, "prod", Box::new(NoCredentials))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::Token(_)));
    }

    #[tokio::test]
    async fn empty_project_is_rejected() {
        assert!(matches!(FirestoreStore::new("").await, Err(StoreError::Client(_))));
        assert!(matches!(FirestoreStore::emulator("", "127.0.0.1:1"), Err(StoreError::Client(_))));
    }

    #[tokio::test]
    async fn emulator_uses_owner_token() {
        let store = FirestoreStore::emulator("demo", "127.0.0.1:1").unwrap();
        assert_eq!(store.tokens.token().await.unwrap(), "owner");
    }
}
