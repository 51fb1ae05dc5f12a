use bloglist_common::{
    snowflake::{ProcessId, WorkerId},
    util::{NonPositiveDurationError, PositiveDuration},
};
use serde::Deserialize;
use std::{
    fmt::{Debug, Formatter},
    net::IpAddr,
};

const DEFAULT_SESSION_LIFETIME_SECONDS: i64 = 60 * 60;

fn default_session_lifetime_seconds() -> i64 {
    DEFAULT_SESSION_LIFETIME_SECONDS
}

/// Process configuration, read from the environment by `envy`.
#[derive(Clone, Eq, PartialEq, Hash, Deserialize)]
pub struct Env {
    pub server_address: IpAddr,
    pub server_port: u16,
    /// Without it, everything is kept in memory.
    pub database_url: Option<String>,
    pub session_secret: String,
    #[serde(default = "default_session_lifetime_seconds")]
    pub session_lifetime_seconds: i64,
    #[serde(default)]
    pub snowflake_worker_id: WorkerId,
    #[serde(default)]
    pub snowflake_process_id: ProcessId,
}

impl Env {
    pub fn session_lifetime(&self) -> Result<PositiveDuration, NonPositiveDurationError> {
        PositiveDuration::from_seconds(self.session_lifetime_seconds)
    }
}

impl Debug for Env {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("server_address", &self.server_address)
            .field("server_port", &self.server_port)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("session_secret", &"[redacted]")
            .field("session_lifetime_seconds", &self.session_lifetime_seconds)
            .field("snowflake_worker_id", &self.snowflake_worker_id)
            .field("snowflake_process_id", &self.snowflake_process_id)
            .finish()
    }
}
