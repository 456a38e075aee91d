//! # wall
//!
//! A guestbook wall. Visitors leave a name and a note through a form; every
//! note is stored as a document in Cloud Firestore and the home page shows
//! all of them, ordered by name.
//!
//! ## Surface
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | `GET`  | `/` | the wall, rendered from the `Wall` collection |
//! | `POST` | `/` | see [`PostRoute`] |
//! | any    | anything else | `404 Not Found` |
//!
//! ## Pieces
//!
//! - [`store`]: the [`DocumentStore`](store::DocumentStore) seam, with a
//!   Firestore REST client and an in-memory store.
//! - [`template`]: the page, parsed once, values always HTML-escaped.
//! - [`app`]: the two handlers and their routes.
//! - [`Router`] / [`Server`]: radix-tree routing over hyper, graceful
//!   shutdown on SIGTERM.
//!
//! ## Running against the emulator
//!
//! ```text
//! gcloud emulators firestore start --host-port=127.0.0.1:8681
//! FIRESTORE_EMULATOR_HOST=127.0.0.1:8681 GOOGLE_CLOUD_PROJECT=demo \
//!     WALL_POST_HANDLER=create cargo run
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod app;
pub mod config;
pub mod record;
pub mod store;
pub mod template;

pub use config::{Config, PostRoute};
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use record::Record;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::Server;
pub use status::Status;
