use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::LoggingError;

/// Collects event fields as JSON values.
#[derive(Default)]
struct JsonFieldVisitor {
    fields: Map<String, Value>,
}

impl Visit for JsonFieldVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{:?}", value).into());
    }
}

/// One JSON object per line, laid out like an OpenTelemetry log record.
#[derive(Clone)]
struct OtelJsonFormatter {
    service_name: String,
    service_version: String,
}

fn severity_number(level: &Level) -> u64 {
    match *level {
        Level::TRACE => 1,
        Level::DEBUG => 5,
        Level::INFO => 9,
        Level::WARN => 13,
        Level::ERROR => 17,
    }
}

impl OtelJsonFormatter {
    fn record(&self, metadata: &Metadata<'_>, mut attributes: Map<String, Value>) -> Value {
        let body = match attributes.remove("message") {
            Some(Value::String(message)) => message,
            _ => metadata.name().to_string(),
        };
        attributes.insert("code.target".into(), metadata.target().into());
        if let Some(file) = metadata.file() {
            attributes.insert("code.filepath".into(), file.into());
        }
        if let Some(line) = metadata.line() {
            attributes.insert("code.lineno".into(), line.into());
        }

        serde_json::json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "severity_text": metadata.level().as_str(),
            "severity_number": severity_number(metadata.level()),
            "body": body,
            "resource": {
                "service.name": self.service_name,
                "service.version": self.service_version,
            },
            "attributes": attributes,
        })
    }
}

impl<S, N> FormatEvent<S, N> for OtelJsonFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let record = self.record(event.metadata(), visitor.fields);
        let line = serde_json::to_string(&record).map_err(|_| std::fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

/// Parse a `logging.level` value.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => Err(LoggingError::InvalidLevel(level.to_string())),
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean. `RUST_LOG` directives, when set, refine the configured level.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), LoggingError> {
    let level = parse_level(&logging_config.level)?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match logging_config.format.trim().to_lowercase().as_str() {
        "json" => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .event_format(OtelJsonFormatter {
                        service_name: logging_config
                            .service_name
                            .clone()
                            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
                        service_version: logging_config
                            .service_version
                            .clone()
                            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
                    }),
            )
            .try_init(),
        "console" => registry
            .with(fmt::layer().with_writer(std::io::stderr).pretty())
            .try_init(),
        "compact" => registry
            .with(fmt::layer().with_writer(std::io::stderr).compact())
            .try_init(),
        other => return Err(LoggingError::InvalidFormat(other.to_string())),
    };
    installed.map_err(|_| LoggingError::AlreadyInitialized)
}
