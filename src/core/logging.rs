//! Logging setup on top of flexi_logger
//!
//! The library itself only emits `log` records. The binary calls
//! [`init_logging`] once at startup; afterwards only the level can be changed.

use colored::Colorize;
use flexi_logger::{DeferredNow, FileSpec, Logger, LoggerHandle};
use std::sync::{Mutex, OnceLock};

static LOGGER_HANDLE: OnceLock<Mutex<LoggerHandle>> = OnceLock::new();

/// Output formats accepted by `--log-format` and the `[logging]` config table
pub const LOG_FORMATS: [&str; 3] = ["text", "ext", "json"];

/// Start the global logger
///
/// `log_format` is one of [`LOG_FORMATS`] (default `text`); `ext` adds the
/// source location to each line. When `log_file` is set output goes to that
/// file instead of stderr.
pub fn init_logging(
    log_level: Option<&str>,
    log_format: Option<&str>,
    log_file: Option<&str>,
    color_enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let level_str = log_level.unwrap_or("info");
    let mut logger = Logger::try_with_str(level_str)?;

    logger = match (log_format.unwrap_or("text"), color_enabled) {
        ("json", _) => logger.format(json_format),
        ("ext", true) => logger.format(extended_color_format),
        ("ext", false) => logger.format(extended_format),
        (_, true) => logger.format(simple_color_format),
        (_, false) => logger.format(simple_format),
    };

    if let Some(file_path) = log_file {
        let file_spec = FileSpec::try_from(std::path::Path::new(file_path))?;
        logger = logger.log_to_file(file_spec);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(Mutex::new(handle));

    Ok(())
}

/// Change the log level of the running logger
///
/// Format and output target are fixed at initialisation.
pub(crate) fn reconfigure_logging(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let handle_mutex = LOGGER_HANDLE
        .get()
        .ok_or("Logger handle not initialised. Call init_logging first.")?;
    let mut handle = handle_mutex
        .lock()
        .map_err(|_| "Could not acquire logger handle lock")?;
    handle.parse_new_spec(log_level)?;
    Ok(())
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

// "YYYY-MM-DD HH:mm:ss.fff INF message"
fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args()
    )
}

fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        colored_level(record.level()),
        record.args()
    )
}

// "YYYY-MM-DD HH:mm:ss.fff INF message (queue/listener.rs:42)"
fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line())
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        colored_level(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line()).dimmed()
    )
}

fn colored_level(level: log::Level) -> colored::ColoredString {
    let abbr = level_abbr(level);
    match level {
        log::Level::Error => abbr.red().bold(),
        log::Level::Warn => abbr.yellow(),
        log::Level::Info => abbr.green(),
        log::Level::Debug => abbr.blue(),
        log::Level::Trace => abbr.magenta(),
    }
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let json_obj = serde_json::json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_abbr(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line())
    });

    match serde_json::to_string(&json_obj) {
        Ok(json_string) => w.write_all(json_string.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

// packet_dispatch::queue::listener -> queue/listener.rs
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = match target.strip_prefix("packet_dispatch::") {
        Some(without_prefix) => without_prefix.replace("::", "/") + ".rs",
        None => target.replace("::", "/"),
    };

    match line {
        Some(line_num) => format!("{}:{}", path_like, line_num),
        None => path_like,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(
        formatter: fn(&mut dyn std::io::Write, &mut DeferredNow, &log::Record) -> Result<(), std::io::Error>,
        target: &str,
    ) -> String {
        let mut buffer = Vec::new();
        let mut now = DeferredNow::new();
        formatter(
            &mut buffer,
            &mut now,
            &log::Record::builder()
                .level(log::Level::Info)
                .target(target)
                .line(Some(42))
                .args(format_args!("Listener started"))
                .build(),
        )
        .expect("Format function should succeed");
        String::from_utf8(buffer).expect("Output should be valid UTF-8")
    }

    #[test]
    fn test_target_formatting() {
        assert_eq!(
            format_target_as_path("packet_dispatch::queue::listener", Some(42)),
            "queue/listener.rs:42"
        );
        assert_eq!(format_target_as_path("tokio::net", None), "tokio/net");
    }

    #[test]
    fn test_simple_format() {
        let output = render(simple_format, "packet_dispatch::queue::store");
        assert!(output.contains("INF Listener started"), "got: {}", output);
        assert!(!output.contains("queue/store.rs"));
    }

    #[test]
    fn test_extended_format_includes_location() {
        let output = render(extended_format, "packet_dispatch::queue::store");
        assert!(output.contains("INF Listener started"), "got: {}", output);
        assert!(output.ends_with("(queue/store.rs:42)"), "got: {}", output);
    }

    #[test]
    fn test_json_format() {
        let output = render(json_format, "packet_dispatch::network::server");
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");

        assert_eq!(value["level"], "INF");
        assert_eq!(value["message"], "Listener started");
        assert_eq!(value["target"], "network/server.rs:42");
        assert!(value["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_level_abbreviations() {
        assert_eq!(level_abbr(log::Level::Error), "ERR");
        assert_eq!(level_abbr(log::Level::Trace), "TRC");
    }

    #[test]
    #[serial_test::serial]
    fn test_reconfigure_matches_logger_state() {
        match LOGGER_HANDLE.get() {
            Some(_) => assert!(reconfigure_logging("debug").is_ok()),
            None => assert!(reconfigure_logging("debug").is_err()),
        }
    }
}
