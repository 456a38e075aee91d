//! HTTP server and graceful shutdown.
//!
//! On SIGTERM (what App Engine and Cloud Run send before stopping an
//! instance) or Ctrl-C the server:
//! 1. stops accepting new connections,
//! 2. lets every in-flight request finish and closes idle keep-alive
//!    connections,
//! 3. returns from [`Server::serve`] so `main` can exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server, already bound to its listening socket.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds the listening socket. Failing here is fatal for the process;
    /// nothing is retried.
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), wall::Error> {
    /// use wall::{Router, Server};
    /// let server = Server::bind(([0, 0, 0, 0], 8080).into()).await?;
    /// server.serve(Router::new()).await
    /// # }
    /// ```
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves `router` until `shutdown` resolves, then waits for in-flight
    /// connections to finish.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let router = Arc::new(router);
        let addr = self.local_addr()?;
        info!(%addr, "wall listening");

        let mut tasks = tokio::task::JoinSet::new();
        // Dropping the sender tells every connection to wind down.
        let (stop_tx, stop_rx) = watch::channel(());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    let mut stop = stop_rx.clone();

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, remote_addr).await }
                        });

                        // HTTP/1.1 or HTTP/2, whatever the client negotiates.
                        let builder = ConnBuilder::new(TokioExecutor::new());
                        let conn = builder.serve_connection(io, svc);
                        tokio::pin!(conn);

                        let res = tokio::select! {
                            res = conn.as_mut() => res,
                            _ = stop.changed() => {
                                // Finish the request in flight, close if idle.
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(e) = res {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(stop_tx);
        while tasks.join_next().await.is_some() {}

        info!("wall stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response, inside a span carrying the
/// method and path. Never fails: every outcome is a response.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let span = info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        peer = %remote_addr,
    );

    async move {
        let started = Instant::now();
        let response = match read_request(req).await {
            Ok(req) => router.handle(req).await,
            Err(e) => {
                warn!("reading request body: {e}");
                Response::status(Status::BadRequest)
            }
        };
        info!(
            status = u16::from(response.status_code()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished",
        );
        Ok(response.into_inner())
    }
    .instrument(span)
    .await
}

/// Buffers the body and copies out what handlers can see. Header values that
/// aren't visible ASCII are left out.
async fn read_request(req: hyper::Request<Incoming>) -> Result<Request, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes().to_vec();

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();

    Ok(Request::new(
        parts.method.as_str().to_owned(),
        parts.uri.path().to_owned(),
        parts.uri.query().map(str::to_owned),
        headers,
        body,
    ))
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On non-Unix platforms
/// only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
