//! Runs the wall.
//!
//!   GOOGLE_CLOUD_PROJECT=my-project PORT=8080 RUST_LOG=info cargo run
//!
//! Missing configuration, missing Google credentials, or a port that can't
//! be bound all end the process with exit code 1.

use std::process::ExitCode;
use std::sync::{Arc, LazyLock};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wall::app::{self, Wall};
use wall::config::POST_HANDLER_VAR;
use wall::template::PAGE;
use wall::{Config, PostRoute, Server};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), wall::Error> {
    let config = Config::from_env()?;
    let store = app::store_for(&config).await?;
    LazyLock::force(&PAGE);

    match config.post_route {
        PostRoute::List => warn!(
            "POST / renders the wall and does not store notes; set {POST_HANDLER_VAR}=create to store them"
        ),
        PostRoute::Create => info!("POST / stores notes"),
    }

    let router = app::router(Arc::new(Wall::new(store)), config.post_route);
    let server = Server::bind(config.listen_addr()).await?;
    info!(port = config.port, project = %config.project_id, "starting");
    server.serve(router).await
}
