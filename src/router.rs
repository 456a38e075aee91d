//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. A request whose method is
//! unknown, or whose method has no tree, or whose path matches nothing in
//! that tree, is answered with `404 Not Found`.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// ```rust
    /// # use wall::{Method, Request, Response, Router};
    /// # async fn list(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get,  "/", list)
    ///     .on(Method::Post, "/", list);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern or conflicts with one
    /// already registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Option<BoxedHandler> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        Some(Arc::clone(matched.value))
    }

    /// Routes one request and runs its handler.
    pub(crate) async fn handle(&self, req: Request) -> Response {
        let Ok(method) = req.method.parse::<Method>() else {
            return Response::status(Status::NotFound);
        };
        match self.lookup(method, &req.path) {
            Some(handler) => handler.call(req).await,
            None => Response::status(Status::NotFound),
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
