//! Observability setup: structured logging.
//!
//! **Important**: This module never writes to stdout, which carries command
//! output (and `--json` documents). Two layers are installed:
//!
//! - a compact human-readable layer on stderr, silent unless `-v`/`-vv` or
//!   `RUST_LOG` asks for it, so a plain `git commit` stays quiet;
//! - an optional JSONL file layer, enabled by `VSIXBUMP_LOG_PATH`,
//!   `VSIXBUMP_LOG_DIR`, or the `log_dir` config key.

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::Event;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "VSIXBUMP_LOG_PATH";
const ENV_LOG_DIR: &str = "VSIXBUMP_LOG_DIR";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Configuration for observability setup.
#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    /// The service name used for the log file name.
    pub service: String,
    /// Directory for JSONL log files from configuration.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Create config with the configured log directory, if any.
    pub fn from_env_with_overrides(log_dir: Option<PathBuf>) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            log_dir,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogTarget {
    dir: PathBuf,
    file_name: String,
}

/// Guard that must be held for the lifetime of the application so the
/// JSONL writer flushes on exit.
pub struct ObservabilityGuard {
    _log_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize observability (logging).
///
/// Returns a guard that must be held for the application lifetime. A log
/// file that cannot be opened is reported on stderr and skipped; a hook must
/// not fail because logging is misconfigured.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_observability(
    cfg: &ObservabilityConfig,
    stderr_filter: EnvFilter,
    file_filter: EnvFilter,
) -> Result<ObservabilityGuard> {
    let file = match resolve_log_target(&cfg.service, cfg.log_dir.as_deref()) {
        Ok(Some(target)) => {
            let appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            Some((JsonLogLayer::new(writer).with_filter(file_filter), guard))
        }
        Ok(None) => None,
        Err(err) => {
            eprintln!("Warning: {err}. File logging disabled.");
            None
        }
    };
    let (file_layer, log_guard) = file.unzip();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(stderr_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!("observability initialized");

    Ok(ObservabilityGuard {
        _log_guard: log_guard,
    })
}

/// Build the stderr `EnvFilter` from CLI flags and environment.
///
/// Priority: quiet flag > verbose flag > RUST_LOG env > off
pub fn stderr_filter(quiet: bool, verbose: u8) -> EnvFilter {
    if quiet {
        return EnvFilter::new("off");
    }

    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Build the JSONL file `EnvFilter`: RUST_LOG env > configured level.
pub fn file_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

// ============================================================================
// JSON Log Layer
// ============================================================================

struct JsonLogLayer<W> {
    writer: W,
}

impl<W> JsonLogLayer<W> {
    const fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<S, W> Layer<S> for JsonLogLayer<W>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: LayerContext<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            let mut visitor = JsonVisitor::default();
            attrs.record(&mut visitor);
            span.extensions_mut().insert(SpanFields {
                values: visitor.values,
            });
        }
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: LayerContext<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            let mut extensions = span.extensions_mut();
            if let Some(fields) = extensions.get_mut::<SpanFields>() {
                fields.values.extend(visitor.values);
            } else {
                extensions.insert(SpanFields {
                    values: visitor.values,
                });
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: LayerContext<'_, S>) {
        let mut map = Map::new();
        map.insert("timestamp".to_string(), Value::String(timestamp()));
        map.insert(
            "level".to_string(),
            Value::String(event.metadata().level().as_str().to_lowercase()),
        );
        map.insert(
            "target".to_string(),
            Value::String(event.metadata().target().to_string()),
        );

        // Span fields first so event fields win on name clashes
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    map.extend(fields.values.clone());
                }
            }
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        map.extend(visitor.values);

        let mut writer = self.writer.make_writer();
        if serde_json::to_writer(&mut writer, &Value::Object(map)).is_ok() {
            let _ = writer.write_all(b"\n");
        }
    }
}

#[derive(Clone, Debug)]
struct SpanFields {
    values: Map<String, Value>,
}

#[derive(Default)]
struct JsonVisitor {
    values: Map<String, Value>,
}

impl JsonVisitor {
    fn put(&mut self, field: &tracing::field::Field, value: Value) {
        self.values.insert(field.name().to_string(), value);
    }
}

impl tracing::field::Visit for JsonVisitor {
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.put(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.put(field, Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        // NaN and infinities have no JSON number form
        match serde_json::Number::from_f64(value) {
            Some(number) => self.put(field, Value::Number(number)),
            None => self.put(field, Value::String(value.to_string())),
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }
}

/// RFC 3339 timestamp from the subscriber's own system-time formatter.
fn timestamp() -> String {
    let mut buf = String::new();
    if SystemTime.format_time(&mut Writer::new(&mut buf)).is_err() {
        buf.clear();
    }
    buf
}

// ============================================================================
// Log Target Resolution
// ============================================================================

fn resolve_log_target(service: &str, config_log_dir: Option<&Path>) -> Result<Option<LogTarget>, String> {
    resolve_log_target_with(
        service,
        std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
        std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
        config_log_dir.map(PathBuf::from),
    )
}

/// Precedence: explicit path > env directory > config directory > no file.
fn resolve_log_target_with(
    service: &str,
    path_override: Option<PathBuf>,
    dir_override: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Result<Option<LogTarget>, String> {
    if let Some(path) = path_override {
        return log_target_from_path(path).map(Some);
    }

    match dir_override.or(config_dir) {
        Some(dir) => log_target_from_dir(dir, service).map(Some),
        None => Ok(None),
    }
}

fn log_target_from_dir(dir: PathBuf, service: &str) -> Result<LogTarget, String> {
    let file_name = format!("{service}{LOG_FILE_SUFFIX}");
    ensure_writable(&dir, &file_name)?;
    Ok(LogTarget { dir, file_name })
}

fn log_target_from_path(path: PathBuf) -> Result<LogTarget, String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("{ENV_LOG_PATH} must end in a UTF-8 file name"))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_writable(&dir, &file_name)?;

    Ok(LogTarget { dir, file_name })
}

fn ensure_writable(dir: &Path, file_name: &str) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create log directory {}: {e}", dir.display()))?;

    let path = dir.join(file_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("Failed to open log file {}: {e}", path.display()))?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_filter_quiet_is_off() {
        assert_eq!(stderr_filter(true, 3).to_string(), "off");
    }

    #[test]
    fn stderr_filter_verbose_maps_to_debug_and_trace() {
        assert_eq!(stderr_filter(false, 1).to_string(), "debug");
        assert_eq!(stderr_filter(false, 2).to_string(), "trace");
    }

    #[test]
    fn no_overrides_means_no_log_file() {
        let target = resolve_log_target_with("demo", None, None, None).unwrap();
        assert!(target.is_none());
    }

    #[test]
    fn path_override_wins() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file_path = tmp.path().join("override.jsonl");
        let dir = tmp.path().join("ignored");

        let target = resolve_log_target_with("demo", Some(file_path), Some(dir.clone()), Some(dir))
            .unwrap()
            .unwrap();
        assert_eq!(target.dir, tmp.path());
        assert_eq!(target.file_name, "override.jsonl");
    }

    #[test]
    fn env_dir_beats_config_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let env_dir = tmp.path().join("env");
        let config_dir = tmp.path().join("config");

        let target = resolve_log_target_with("demo", None, Some(env_dir.clone()), Some(config_dir))
            .unwrap()
            .unwrap();
        assert_eq!(
            target,
            LogTarget {
                dir: env_dir,
                file_name: format!("demo{LOG_FILE_SUFFIX}"),
            }
        );
    }

    #[test]
    fn config_dir_is_created() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config_dir = tmp.path().join("nested").join("logs");

        let target = resolve_log_target_with("demo", None, None, Some(config_dir.clone()))
            .unwrap()
            .unwrap();
        assert_eq!(target.dir, config_dir);
        assert!(config_dir.join("demo.jsonl").is_file());
    }

    #[test]
    fn bare_file_name_logs_to_current_dir() {
        let target = log_target_from_path(PathBuf::from("vsixbump-test-bare.jsonl")).unwrap();
        assert_eq!(target.dir, PathBuf::from("."));
        let _ = std::fs::remove_file("vsixbump-test-bare.jsonl");
    }

    #[test]
    fn float_fields_are_json_numbers() {
        let (writer, buf) = CaptureWriter::new();
        let subscriber = tracing_subscriber::registry().with(JsonLogLayer::new(writer));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(ratio = 0.5_f64, nan = f64::NAN, "measured");
        });

        let line = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        let json: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(json["ratio"], serde_json::json!(0.5));
        assert_eq!(json["nan"], "NaN");
        assert_eq!(json["message"], "measured");
    }

    #[derive(Clone)]
    struct CaptureWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl CaptureWriter {
        fn new() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
            let buf = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
            (Self(buf.clone()), buf)
        }
    }

    impl Write for CaptureWriter {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'), "timestamp should end with Z: {ts}");
        assert_eq!(&ts[4..5], "-", "year-month separator");
        assert_eq!(&ts[10..11], "T", "date-time separator");
    }
}
