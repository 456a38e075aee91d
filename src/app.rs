//! The guestbook itself: list the wall, add a note, wire both to routes.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info};

use crate::config::{Config, PostRoute};
use crate::handler::Handler;
use crate::method::Method;
use crate::record::{COLLECTION, Record, USER_FIELD};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;
use crate::store::{Direction, DocumentStore, FirestoreStore, Query, StoreError};
use crate::template::PAGE;

/// Shared state behind every handler: the document store.
pub struct Wall {
    store: Arc<dyn DocumentStore>,
}

impl Wall {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Renders every note, ordered by user.
    ///
    /// Store failures are logged and the page is rendered with whatever was
    /// read before the failure. Documents that don't decode are skipped.
    pub async fn list(&self, req: Request) -> Response {
        if req.path() != "/" {
            return Response::status(Status::NotFound);
        }
        let records = self.records().await;
        Response::html(PAGE.render(&records).into_bytes())
    }

    /// Stores the submitted `user` and `note`. The response is always the
    /// empty `200 OK`; a failed write is only logged.
    pub async fn create(&self, req: Request) {
        let record = Record::new(req.form_value("user"), req.form_value("note"));
        debug!(user = %record.user, note = %record.note, "got form");

        match self.store.create(COLLECTION, record.into_fields()).await {
            Ok(doc) => info!(doc = doc.name.as_deref().unwrap_or(""), "note created"),
            Err(e) => error!(error = %e, "create failed"),
        }
    }

    async fn records(&self) -> Vec<Record> {
        let query = Query::collection(COLLECTION).order_by(USER_FIELD, Direction::Ascending);
        let mut docs = match self.store.query(&query).await {
            Ok(docs) => docs,
            Err(e) => {
                error!(error = %e, "query failed");
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        while let Some(item) = docs.next().await {
            match item {
                Ok(doc) => match Record::from_document(&doc) {
                    Ok(record) => records.push(record),
                    Err(e) => debug!(doc = doc.name.as_deref().unwrap_or(""), error = %e, "skipping document"),
                },
                Err(e) => {
                    error!(error = %e, read = records.len(), "query stream failed");
                    break;
                }
            }
        }
        records
    }
}

/// Builds the store client `config` asks for. Outside the emulator this
/// resolves credentials, so a host without any fails here.
pub async fn store_for(config: &Config) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store = match &config.emulator_host {
        Some(host) => {
            info!(%host, "using Firestore emulator");
            FirestoreStore::emulator(&config.project_id, host)?
        }
        None => FirestoreStore::new(&config.project_id).await?,
    };
    Ok(Arc::new(store))
}

/// Routes `GET /` to the list, and `POST /` to whichever handler `post`
/// selects. Everything else is a 404.
pub fn router(wall: Arc<Wall>, post: PostRoute) -> Router {
    let router = Router::new().on(Method::Get, "/", list(Arc::clone(&wall)));
    match post {
        PostRoute::List => router.on(Method::Post, "/", list(wall)),
        PostRoute::Create => router.on(Method::Post, "/", create(wall)),
    }
}

fn list(wall: Arc<Wall>) -> impl Handler {
    move |req: Request| {
        let wall = Arc::clone(&wall);
        async move { wall.list(req).await }
    }
}

fn create(wall: Arc<Wall>) -> impl Handler {
    move |req: Request| {
        let wall = Arc::clone(&wall);
        async move { wall.create(req).await }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::store::{Document, DocumentStream, Fields, MemoryStore, Value};

    fn request(method: &str, path: &str, body: &str) -> Request {
        Request::new(
            method.to_owned(),
            path.to_owned(),
            None,
            vec![("content-type".to_owned(), "application/x-www-form-urlencoded".to_owned())],
            body.as_bytes().to_vec(),
        )
    }

    fn html(res: &Response) -> &str {
        std::str::from_utf8(res.body()).unwrap()
    }

    /// Fails every call.
    struct Down;

    #[async_trait]
    impl DocumentStore for Down {
        async fn create(&self, _: &str, _: Fields) -> Result<Document, StoreError> {
            Err(StoreError::Api { status: 503, body: "unavailable".to_owned() })
        }

        async fn query(&self, _: &Query) -> Result<DocumentStream, StoreError> {
            Err(StoreError::Api { status: 503, body: "unavailable".to_owned() })
        }
    }

    /// Yields one good document, one undecodable one, then a stream error.
    struct Flaky;

    #[async_trait]
    impl DocumentStore for Flaky {
        async fn create(&self, _: &str, _: Fields) -> Result<Document, StoreError> {
            unreachable!()
        }

        async fn query(&self, _: &Query) -> Result<DocumentStream, StoreError> {
            let good = Document { name: None, fields: Record::new("amy", "hi").into_fields() };
            let bad = Document {
                name: None,
                fields: Fields::from([("User".to_owned(), Value::BooleanValue(true))]),
            };
            let items = vec![
                Ok(good),
                Ok(bad),
                Err(StoreError::InvalidResponse("truncated".to_owned())),
            ];
            Ok(futures::stream::iter(items).boxed())
        }
    }

    #[tokio::test]
    async fn create_then_list_shows_note() {
        let store = Arc::new(MemoryStore::new());
        let wall = Wall::new(store.clone());

        wall.create(request("POST", "/", "user=amy&note=hello")).await;
        wall.create(request("POST", "/", "")).await;
        assert_eq!(store.count(COLLECTION).await, 2);

        let res = wall.list(request("GET", "/", "")).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
        let page = html(&res);
        assert!(page.contains("<h2>amy</h2>"));
        assert!(page.contains("<p>hello</p>"));
        assert!(page.contains("<h2></h2>"));
    }

    #[tokio::test]
    async fn list_orders_by_user() {
        let wall = Wall::new(Arc::new(MemoryStore::new()));
        wall.create(request("POST", "/", "user=Zoe&note=hi")).await;
        wall.create(request("POST", "/", "user=Amy&note=yo")).await;

        let res = wall.list(request("GET", "/", "")).await;
        let page = html(&res);
        let amy = page.find("<h2>Amy</h2>").unwrap();
        let zoe = page.find("<h2>Zoe</h2>").unwrap();
        assert!(amy < zoe);
    }

    #[tokio::test]
    async fn list_rejects_other_paths() {
        let wall = Wall::new(Arc::new(MemoryStore::new()));
        let res = wall.list(request("GET", "/missing", "")).await;
        assert_eq!(res.status_code(), Status::NotFound);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn store_outage_renders_empty_wall() {
        let wall = Wall::new(Arc::new(Down));
        let res = wall.list(request("GET", "/", "")).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert!(!html(&res).contains("<li>"));

        // Logged only.
        wall.create(request("POST", "/", "user=a&note=b")).await;
    }

    #[tokio::test]
    async fn partial_results_survive_bad_documents_and_stream_errors() {
        let wall = Wall::new(Arc::new(Flaky));
        let res = wall.list(request("GET", "/", "")).await;
        let page = html(&res);
        assert_eq!(page.matches("<li>").count(), 1);
        assert!(page.contains("<h2>amy</h2>"));
    }

    #[tokio::test]
    async fn observed_wiring_lists_on_post() {
        let store = Arc::new(MemoryStore::new());
        let app = router(Arc::new(Wall::new(store.clone())), PostRoute::List);

        let res = app.handle(request("POST", "/", "user=amy&note=hi")).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert!(html(&res).contains("<form"));
        assert_eq!(store.count(COLLECTION).await, 0);
    }

    #[tokio::test]
    async fn create_wiring_stores_on_post() {
        let store = Arc::new(MemoryStore::new());
        let app = router(Arc::new(Wall::new(store.clone())), PostRoute::Create);

        let res = app.handle(request("POST", "/", "user=amy&note=hi")).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert!(res.body().is_empty());
        assert_eq!(store.count(COLLECTION).await, 1);
    }

    #[tokio::test]
    async fn store_for_builds_emulator_client() {
        let config = Config {
            port: 8080,
            project_id: "demo".to_owned(),
            emulator_host: Some("127.0.0.1:8681".to_owned()),
            post_route: PostRoute::List,
        };
        assert!(store_for(&config).await.is_ok());
    }
}
