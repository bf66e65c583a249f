//! log4rs setup: records go to stderr at the configured level, and to an
//! optional log file at every level.

use log::{LevelFilter, SetLoggerError};
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Logger, Root},
    encode::{pattern::PatternEncoder, Encode},
    filter::threshold::ThresholdFilter,
};
use std::{backtrace, env};

const LOGGING_PATTERN: &str = "{d} {l} {f}:{L} - {m}\n";

/// Per-statement driver logging, held at the configured level when the file
/// appender raises the root to `Trace`.
const DRIVER_TARGETS: [&str; 2] = ["tokio_postgres", "postgres"];

/// Appends a captured backtrace to error records when `RUST_BACKTRACE` or
/// `RUST_LIB_BACKTRACE` is set.
#[derive(Debug)]
struct BacktracePatternEncoder {
    pattern_encoder: PatternEncoder,
    is_backtrace_enabled: bool,
}

impl BacktracePatternEncoder {
    fn new(pattern: &str) -> Self {
        BacktracePatternEncoder {
            pattern_encoder: PatternEncoder::new(pattern),
            is_backtrace_enabled: env::var("RUST_BACKTRACE").is_ok()
                || env::var("RUST_LIB_BACKTRACE").is_ok(),
        }
    }
}

impl Encode for BacktracePatternEncoder {
    fn encode(
        &self,
        w: &mut dyn log4rs::encode::Write,
        record: &log::Record<'_>,
    ) -> anyhow::Result<()> {
        if record.level() == log::Level::Error && self.is_backtrace_enabled {
            let args = format_args!(
                "{}\nBacktrace:\n{}",
                record.args(),
                backtrace::Backtrace::capture()
            );
            let new_record = log::Record::builder()
                .args(args)
                .level(record.level())
                .target(record.target())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build();
            self.pattern_encoder.encode(w, &new_record)?;
        } else {
            self.pattern_encoder.encode(w, record)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file: {0}")]
    File(#[from] std::io::Error),
    #[error("invalid logging config: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),
    #[error("logger already set: {0}")]
    SetLogger(#[from] SetLoggerError),
}

pub fn initialize_logger(
    log_level: LevelFilter,
    file_path: Option<&str>,
) -> Result<(), LoggingError> {
    let config = build_config(log_level, file_path)?;
    let _handle = log4rs::init_config(config)?;

    Ok(())
}

fn build_config(log_level: LevelFilter, file_path: Option<&str>) -> Result<Config, LoggingError> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
        .build();

    let mut config_builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");
    let mut root_level = log_level;

    if let Some(path) = file_path {
        // Pattern: https://docs.rs/log4rs/*/log4rs/encode/pattern/index.html
        let logfile = FileAppender::builder()
            .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
            .build(path)?;
        config_builder =
            config_builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
        root_level = LevelFilter::Trace;
    }

    for target in DRIVER_TARGETS {
        config_builder = config_builder.logger(Logger::builder().build(target, log_level));
    }

    Ok(config_builder.build(root.build(root_level))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_only_uses_configured_level() {
        let config = build_config(LevelFilter::Warn, None).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Warn);
        assert_eq!(config.appenders().len(), 1);
    }

    #[test]
    fn log_file_keeps_drivers_at_configured_level() {
        let path = env::temp_dir().join(format!("index-bench-log-{}.log", std::process::id()));
        let config = build_config(LevelFilter::Info, path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.root().level(), LevelFilter::Trace);
        assert_eq!(config.appenders().len(), 2);
        for target in DRIVER_TARGETS {
            let logger = config
                .loggers()
                .iter()
                .find(|l| l.name() == target)
                .unwrap();
            assert_eq!(logger.level(), LevelFilter::Info);
        }
    }
}
