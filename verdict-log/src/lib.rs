//! Verdict Logging
//!
//! Structured logging for the Verdict validation crates, controlled through
//! `VERDICT_*` environment variables.
//!
//! # Usage
//!
//! ```rust
//! use verdict_log::{debug, info, warn, error, trace};
//!
//! debug!("Compiling rule set");
//! info!("Validated {} fields", 3);
//! warn!("Unknown locale, falling back");
//! error!("Rule set rejected");
//!
//! let rule = "min:6";
//! debug!(target: "verdict::registry", "Resolved rule {}", rule);
//! ```
//!
//! Key-value pairs can be attached with [`event`]:
//!
//! ```rust
//! use verdict_log::{event, Level};
//!
//! event(Level::Info, "verdict::engine", "run finished", &[("failures", "2".into())]);
//! ```
//!
//! # Environment Variables
//!
//! - `VERDICT_DEBUG=1` - Enable debug logging
//! - `VERDICT_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `VERDICT_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `VERDICT_LOG_COLOR=1|0` - Enable/disable colors
//! - `VERDICT_LOG_TIMESTAMPS=1|0` - Include timestamps
//! - `VERDICT_LOG_MODULE=1|0` - Include the log target

use once_cell::sync::Lazy;
use std::env;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ============================================================================
// Log Levels
// ============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// Trace level (most verbose)
    Trace = 0,
    /// Debug level
    Debug = 1,
    /// Info level
    Info = 2,
    /// Warning level
    Warn = 3,
    /// Error level
    Error = 4,
    /// Off (no logging)
    Off = 5,
}

impl Level {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }

    #[cfg(feature = "color")]
    fn colored(&self) -> colored::ColoredString {
        use colored::Colorize;
        match self {
            Level::Trace => "TRACE".magenta(),
            Level::Debug => "DEBUG".blue(),
            Level::Info => "INFO".green(),
            Level::Warn => "WARN".yellow(),
            Level::Error => "ERROR".red().bold(),
            Level::Off => "OFF".white(),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Level::Trace,
            log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human readable, one record per line with aligned level
    Pretty,
    /// Short single-letter level, time only
    Compact,
    /// One JSON object per line
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Global Configuration
// ============================================================================

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub debug: bool,
    pub level: Level,
    pub format: Format,
    pub color: bool,
    pub timestamps: bool,
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            color: false,
            timestamps: true,
            module_path: true,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl LogConfig {
    /// Build the configuration from `VERDICT_*` variables and publish the
    /// level to the global atomics.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let debug = env_flag("VERDICT_DEBUG").unwrap_or(false);

        let level = env::var("VERDICT_LOG_LEVEL")
            .ok()
            .and_then(|s| Level::parse(&s))
            .unwrap_or(if debug { Level::Debug } else { defaults.level });

        let format = env::var("VERDICT_LOG_FORMAT")
            .ok()
            .and_then(|s| Format::parse(&s))
            .unwrap_or(defaults.format);

        // NO_COLOR wins over terminal detection
        let color = env_flag("VERDICT_LOG_COLOR")
            .unwrap_or_else(|| env::var("NO_COLOR").is_err() && env::var("TERM").is_ok());

        let config = Self {
            debug,
            level,
            format,
            color,
            timestamps: env_flag("VERDICT_LOG_TIMESTAMPS").unwrap_or(defaults.timestamps),
            module_path: env_flag("VERDICT_LOG_MODULE").unwrap_or(defaults.module_path),
        };

        DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);
        LOG_LEVEL.store(config.level as u8, Ordering::SeqCst);
        config
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Force configuration loading. Log macros call this lazily.
pub fn init() {
    Lazy::force(&CONFIG);
}

#[inline]
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Whether records at `level` are written. Debug mode also admits `Debug`
/// records when the level is set higher.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    init();
    if level == Level::Off {
        return false;
    }
    level as u8 >= LOG_LEVEL.load(Ordering::Relaxed) || (level == Level::Debug && is_debug_enabled())
}

pub fn current_level() -> Level {
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Change the level at runtime.
pub fn set_level(level: Level) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Toggle debug mode at runtime. Enabling it lowers the level to `Debug`.
pub fn set_debug(enabled: bool) {
    init();
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        LOG_LEVEL.store(Level::Debug as u8, Ordering::SeqCst);
    }
}

pub fn config() -> &'static LogConfig {
    &CONFIG
}

// ============================================================================
// Output
// ============================================================================

/// Emit a plain message. Used by the macros.
#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    event(level, target, message, &[]);
}

/// Emit a message with structured key-value fields.
pub fn event(level: Level, target: &str, message: &str, fields: &[(&str, String)]) {
    if !is_level_enabled(level) {
        return;
    }

    let config = config();
    match config.format {
        Format::Pretty => write_pretty(level, target, message, fields, config),
        Format::Compact => write_compact(level, target, message, fields, config),
        Format::Json => write_json(level, target, message, fields),
    }
}

fn write_fields(out: &mut impl Write, fields: &[(&str, String)]) {
    for (key, value) in fields {
        let _ = write!(out, " {}={}", key, value);
    }
}

fn write_pretty(
    level: Level,
    target: &str,
    message: &str,
    fields: &[(&str, String)],
    config: &LogConfig,
) {
    let mut stderr = std::io::stderr().lock();

    if config.timestamps {
        let now = chrono::Local::now();
        let _ = write!(stderr, "{} ", now.format("%Y-%m-%d %H:%M:%S%.3f"));
    }

    #[cfg(feature = "color")]
    if config.color {
        let _ = write!(stderr, "{:5} ", level.colored());
    } else {
        let _ = write!(stderr, "{:5} ", level.as_str());
    }

    #[cfg(not(feature = "color"))]
    let _ = write!(stderr, "{:5} ", level.as_str());

    if config.module_path && !target.is_empty() {
        let _ = write!(stderr, "[{}] ", target);
    }

    let _ = write!(stderr, "{}", message);
    write_fields(&mut stderr, fields);
    let _ = writeln!(stderr);
}

fn write_compact(
    level: Level,
    target: &str,
    message: &str,
    fields: &[(&str, String)],
    config: &LogConfig,
) {
    let mut stderr = std::io::stderr().lock();

    if config.timestamps {
        let _ = write!(stderr, "{} ", chrono::Local::now().format("%H:%M:%S"));
    }

    let _ = write!(stderr, "{} ", level.as_str().chars().next().unwrap_or('?'));

    if config.module_path && !target.is_empty() {
        let _ = write!(stderr, "{}: ", target);
    }

    let _ = write!(stderr, "{}", message);
    write_fields(&mut stderr, fields);
    let _ = writeln!(stderr);
}

#[cfg(feature = "json")]
fn write_json(level: Level, target: &str, message: &str, fields: &[(&str, String)]) {
    let mut entry = serde_json::Map::new();
    entry.insert(
        "timestamp".into(),
        chrono::Utc::now().to_rfc3339().into(),
    );
    entry.insert("level".into(), level.as_str().into());
    entry.insert("target".into(), target.into());
    entry.insert("message".into(), message.into());
    for (key, value) in fields {
        entry.insert((*key).to_string(), value.clone().into());
    }

    if let Ok(json) = serde_json::to_string(&entry) {
        eprintln!("{}", json);
    }
}

#[cfg(not(feature = "json"))]
fn write_json(level: Level, target: &str, message: &str, fields: &[(&str, String)]) {
    let mut line = format!(
        r#"{{"timestamp":"{}","level":"{}","target":"{}","message":"{}""#,
        chrono::Utc::now().to_rfc3339(),
        level.as_str(),
        escape_json(target),
        escape_json(message)
    );
    for (key, value) in fields {
        line.push_str(&format!(r#","{}":"{}""#, escape_json(key), escape_json(value)));
    }
    line.push('}');
    eprintln!("{}", line);
}

#[cfg(not(feature = "json"))]
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result
}

// ============================================================================
// `log` facade bridge
// ============================================================================

/// Routes records emitted through the `log` crate into Verdict's output.
pub struct LogBridge;

static BRIDGE: LogBridge = LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        is_level_enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            crate::log(
                record.level().into(),
                record.target(),
                &record.args().to_string(),
            );
        }
    }

    fn flush(&self) {}
}

/// Install [`LogBridge`] as the global `log` logger.
///
/// Fails if another logger was installed first.
pub fn install_log_bridge() -> Result<(), log::SetLoggerError> {
    init();
    log::set_logger(&BRIDGE)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

// ============================================================================
// Macros
// ============================================================================

/// Log a trace message.
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Trace) {
            $crate::log($crate::Level::Trace, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Trace) {
            $crate::log($crate::Level::Trace, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log a debug message.
///
/// Enabled by `VERDICT_DEBUG=1` or `VERDICT_LOG_LEVEL=debug`.
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Debug) {
            $crate::log($crate::Level::Debug, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Debug) {
            $crate::log($crate::Level::Debug, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log an info message.
#[macro_export]
macro_rules! info {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Info) {
            $crate::log($crate::Level::Info, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Info) {
            $crate::log($crate::Level::Info, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log a warning message.
#[macro_export]
macro_rules! warn {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Warn) {
            $crate::log($crate::Level::Warn, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Warn) {
            $crate::log($crate::Level::Warn, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log an error message.
#[macro_export]
macro_rules! error {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Error) {
            $crate::log($crate::Level::Error, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Error) {
            $crate::log($crate::Level::Error, module_path!(), &format!($($arg)+));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Off);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("debug"), Some(Level::Debug));
        assert_eq!(Level::parse(" INFO "), Some(Level::Info));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse("none"), Some(Level::Off));
        assert_eq!(Level::parse("loud"), None);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(Format::parse("pretty"), Some(Format::Pretty));
        assert_eq!(Format::parse("JSON"), Some(Format::Json));
        assert_eq!(Format::parse("xml"), None);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(Level::from(log::Level::Warn), Level::Warn);
        assert_eq!(Level::from(log::Level::Trace), Level::Trace);
    }

    // the level is process-wide, so these checks share one test
    #[test]
    fn test_runtime_level_changes() {
        let original_level = current_level();
        let original_debug = is_debug_enabled();

        set_level(Level::Trace);
        assert!(!is_level_enabled(Level::Off));
        assert!(is_level_enabled(Level::Trace));

        set_level(Level::Error);
        assert!(!is_level_enabled(Level::Warn));
        set_debug(true);
        assert!(is_debug_enabled());
        assert_eq!(current_level(), Level::Debug);

        // debug mode keeps debug records flowing under a higher level
        set_level(Level::Info);
        assert!(is_level_enabled(Level::Debug));
        assert!(!is_level_enabled(Level::Trace));
        set_debug(false);
        assert!(!is_level_enabled(Level::Debug));

        set_level(Level::Trace);
        let bridge = LogBridge;
        let metadata = log::Metadata::builder()
            .level(log::Level::Trace)
            .target("verdict::test")
            .build();
        assert!(log::Log::enabled(&bridge, &metadata));
        set_level(Level::Warn);
        assert!(!log::Log::enabled(&bridge, &metadata));

        set_debug(original_debug);
        set_level(original_level);
    }

    #[test]
    fn test_install_log_bridge_once() {
        assert!(install_log_bridge().is_ok());
        assert_eq!(log::max_level(), log::LevelFilter::Trace);
        log::warn!(target: "verdict::test", "routed through {}", "the bridge");
        assert!(install_log_bridge().is_err());
    }

    #[test]
    fn test_macros_and_events() {
        trace!("trace message");
        debug!("debug message");
        info!(target: "verdict::test", "rule {} compiled", "min:6");
        warn!("warn message");
        error!(target: "verdict::test", "error message");
        event(
            Level::Info,
            "verdict::test",
            "run finished",
            &[("fields", "2".to_string()), ("failures", "0".to_string())],
        );
    }
}
