//! Console logger behind the `log` facade
//!
//! Level comes from `LOG` (`ERROR`, `WARN`, `INFO`, `DEBUG`, `TRACE`) unless
//! the caller passes one explicitly. Output goes to stderr, colored only when
//! stderr is a terminal, and is tagged with the thread name (`mmu`, `pager`).

use crate::error::{VmError, VmResult};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::{stderr, IsTerminal};
use std::thread;

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let current = thread::current();
        let who = current.name().unwrap_or("-");
        if stderr().is_terminal() {
            eprintln!(
                "\u{1B}[{}m[{:>5}][{}] {}\u{1B}[0m",
                level_to_color_code(record.level()),
                record.level(),
                who,
                record.args(),
            );
        } else {
            eprintln!("[{:>5}][{}] {}", record.level(), who, record.args());
        }
    }
    fn flush(&self) {}
}

fn level_to_color_code(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 34,  // Blue
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_uppercase().as_str() {
        "ERROR" => Some(LevelFilter::Error),
        "WARN" => Some(LevelFilter::Warn),
        "INFO" => Some(LevelFilter::Info),
        "DEBUG" => Some(LevelFilter::Debug),
        "TRACE" => Some(LevelFilter::Trace),
        "OFF" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// Level to run at. An explicit `level` must name a level; an unknown `LOG`
/// value leaves logging off.
fn max_level(level: Option<&str>, env: Option<&str>) -> VmResult<LevelFilter> {
    match level {
        Some(name) => parse_level(name)
            .ok_or_else(|| VmError::InvalidArgument(format!("unknown log level `{}`", name))),
        None => Ok(env.and_then(parse_level).unwrap_or(LevelFilter::Off)),
    }
}

/// install the logger; `level` wins over the `LOG` environment variable
pub fn init(level: Option<&str>) -> VmResult<()> {
    let env = std::env::var("LOG").ok();
    let max = max_level(level, env.as_deref())?;
    static LOGGER: SimpleLogger = SimpleLogger;
    log::set_logger(&LOGGER)
        .map_err(|_| VmError::InvalidArgument("logger already installed".into()))?;
    log::set_max_level(max);
    Ok(())
}
