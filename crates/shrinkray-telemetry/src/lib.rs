//! Logging and tracing setup shared by the shrinkray binaries.
//!
//! Events are always written to stderr through `tracing_subscriber::fmt`,
//! filtered by `RUST_LOG` (default `info`). Spans can additionally be
//! exported through OpenTelemetry, either to an OTLP collector over gRPC or
//! to stdout for local debugging.

use clap::{Args, ValueEnum};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_FORMAT_ENV: &str = "SHRINKRAY_LOG_FORMAT";
pub const TRACE_EXPORTER_ENV: &str = "SHRINKRAY_TRACE_EXPORTER";
pub const OTLP_ENDPOINT_ENV: &str = "SHRINKRAY_OTLP_ENDPOINT";

pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";
const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceExporter {
    #[value(name = "none")]
    None,
    #[value(name = "otlp")]
    Otlp,
    #[value(name = "stdout")]
    Stdout,
}

impl Display for TraceExporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceExporter::None => write!(f, "none"),
            TraceExporter::Otlp => write!(f, "otlp"),
            TraceExporter::Stdout => write!(f, "stdout"),
        }
    }
}

/// Command line flags controlling telemetry, meant to be flattened into a
/// binary's own CLI.
#[derive(Debug, Clone, Args)]
pub struct TelemetryArgs {
    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[arg(long, env = TRACE_EXPORTER_ENV, value_enum, default_value_t = TraceExporter::None)]
    pub trace_exporter: TraceExporter,

    #[arg(long, env = OTLP_ENDPOINT_ENV, default_value = DEFAULT_OTLP_ENDPOINT)]
    pub otlp_endpoint: String,
}

/// Keeps the tracer provider alive; flushes and shuts it down on drop.
#[must_use = "dropping the guard shuts span export down"]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are exported anywhere besides the log output.
    pub fn exports_spans(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(err) = provider.force_flush() {
                eprintln!("Error flushing traces: {err:#?}");
            }
            if let Err(err) = provider.shutdown() {
                eprintln!("Error shutting down tracer: {err:#?}");
            }
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init(
    service_name: &'static str,
    args: &TelemetryArgs,
) -> Result<TelemetryGuard, TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = match args.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let provider = tracer_provider(service_name, args)?;
    let otel_layer = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    if let Some(provider) = &provider {
        opentelemetry::global::set_tracer_provider(provider.clone());
    }

    Ok(TelemetryGuard { provider })
}

fn tracer_provider(
    service_name: &'static str,
    args: &TelemetryArgs,
) -> Result<Option<SdkTracerProvider>, TelemetryError> {
    let builder = SdkTracerProvider::builder()
        .with_resource(Resource::builder().with_service_name(service_name).build());

    let provider = match args.trace_exporter {
        TraceExporter::None => return Ok(None),
        TraceExporter::Otlp => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(args.otlp_endpoint.clone())
                .build()?;
            builder.with_batch_exporter(exporter).build()
        }
        TraceExporter::Stdout => builder
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build(),
    };

    Ok(Some(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        telemetry: TelemetryArgs,
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["test"]).unwrap();

        assert_eq!(cli.telemetry.log_format, LogFormat::Pretty);
        assert_eq!(cli.telemetry.trace_exporter, TraceExporter::None);
        assert_eq!(cli.telemetry.otlp_endpoint, DEFAULT_OTLP_ENDPOINT);
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "test",
            "--log-format",
            "json",
            "--trace-exporter",
            "otlp",
            "--otlp-endpoint",
            "http://collector:4317",
        ])
        .unwrap();

        assert_eq!(cli.telemetry.log_format, LogFormat::Json);
        assert_eq!(cli.telemetry.trace_exporter, TraceExporter::Otlp);
        assert_eq!(cli.telemetry.otlp_endpoint, "http://collector:4317");
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["test", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn init_installs_subscriber_once() {
        let args = Cli::try_parse_from(["test"]).unwrap().telemetry;

        let guard = init("shrinkray-test", &args).unwrap();
        assert!(!guard.exports_spans());

        assert!(matches!(
            init("shrinkray-test", &args),
            Err(TelemetryError::Subscriber(_))
        ));
    }
}
