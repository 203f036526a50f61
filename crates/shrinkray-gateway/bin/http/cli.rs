use clap::{Parser, ValueEnum};
use shrinkray_shortener::config::{DEFAULT_DEADLINE, DEFAULT_MAX_ATTEMPTS};
use shrinkray_shortener::ShortenerConfig;
use shrinkray_telemetry::TelemetryArgs;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "SHRINKRAY_HTTP_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "SHRINKRAY_STORAGE_BACKEND";
pub const POSTGRES_URL_ENV: &str = "SHRINKRAY_POSTGRES_URL";
pub const POSTGRES_MAX_CONNECTIONS_ENV: &str = "SHRINKRAY_POSTGRES_MAX_CONNECTIONS";
pub const REQUEST_TIMEOUT_ENV: &str = "SHRINKRAY_REQUEST_TIMEOUT_MS";
pub const MAX_ATTEMPTS_ENV: &str = "SHRINKRAY_MAX_ATTEMPTS";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shrinkray-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = POSTGRES_URL_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_url: Option<String>,

    #[arg(long, env = POSTGRES_MAX_CONNECTIONS_ENV, default_value_t = 10)]
    pub postgres_max_connections: u32,

    /// Deadline for a single create or redirect, in milliseconds.
    #[arg(long, env = REQUEST_TIMEOUT_ENV, default_value_t = DEFAULT_DEADLINE.as_millis() as u64)]
    pub request_timeout_ms: u64,

    /// Candidate tokens tried per request; 0 retries until the deadline.
    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[command(flatten)]
    pub telemetry: TelemetryArgs,
}

impl CLI {
    pub fn shortener_config(&self) -> ShortenerConfig {
        ShortenerConfig::builder()
            .deadline(Duration::from_millis(self.request_timeout_ms))
            .max_attempts(NonZeroU32::new(self.max_attempts))
            .build()
    }
}
