//! Process configuration read from the environment.

use std::net::{Ipv4Addr, SocketAddr};

pub const PORT_VAR: &str = "PORT";
pub const PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";
pub const EMULATOR_VAR: &str = "FIRESTORE_EMULATOR_HOST";
pub const POST_HANDLER_VAR: &str = "WALL_POST_HANDLER";

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is not a valid port: {value:?}")]
    InvalidPort { var: &'static str, value: String },
}

/// Which handler answers `POST /`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PostRoute {
    /// `POST /` renders the wall, exactly like `GET /`. Submissions are not
    /// stored.
    #[default]
    List,
    /// `POST /` stores the submitted note.
    Create,
}

/// Everything the process needs to start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub project_id: String,
    pub emulator_host: Option<String>,
    pub post_route: PostRoute,
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = match get(PORT_VAR) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidPort { var: PORT_VAR, value })?,
            None => DEFAULT_PORT,
        };
        let project_id = get(PROJECT_VAR).ok_or(ConfigError::Missing(PROJECT_VAR))?;
        let post_route = match get(POST_HANDLER_VAR).as_deref() {
            Some("create") => PostRoute::Create,
            _ => PostRoute::List,
        };

        Ok(Self {
            port,
            project_id,
            emulator_host: get(EMULATOR_VAR),
            post_route,
        })
    }

    /// The address to listen on: every interface, configured port.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
