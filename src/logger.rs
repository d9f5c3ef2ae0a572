//! log4rs setup: a stderr console appender, plus a size-rolled file when a
//! log directory is configured. Query output goes to stdout, so the two
//! streams never interleave.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

use crate::errors::DbError;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;
const LOG_FILE: &str = "listings-cluster.log";

/// error|warn|info|debug|trace, case-insensitive; anything else is `Info`.
#[must_use]
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Builds the logging configuration without installing it.
///
/// # Errors
/// `Io` if the log directory cannot be created, `Configuration` if log4rs
/// rejects the appenders.
pub fn build_config(dir: Option<&Path>, level: &str) -> Result<Config, DbError> {
    let lvl = parse_level(level);
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let mut builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
        let pattern = format!("{}", dir.join("listings-cluster.{}.log").display());
        let roller = FixedWindowRoller::builder()
            .build(&pattern, DEFAULT_RETENTION)
            .map_err(|e| DbError::Configuration(format!("log roller: {e}")))?;
        let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
        let file = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(dir.join(LOG_FILE), Box::new(policy))?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    // The driver's own heartbeat chatter is only useful when debugging.
    builder = builder.logger(Logger::builder().build("mongodb", LevelFilter::Warn));

    builder.build(root.build(lvl)).map_err(|e| DbError::Configuration(format!("logging: {e}")))
}

/// Installs the process-wide logger. A second call is a no-op.
///
/// # Errors
/// See [`build_config`].
pub fn configure_logging(dir: Option<&Path>, level: &str) -> Result<(), DbError> {
    let config = build_config(dir, level)?;
    if log4rs::init_config(config).is_err() {
        log::debug!("logger already initialized");
    }
    Ok(())
}
