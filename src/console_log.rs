use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// `log` backend for the terminal UI: records become console lines sent to
/// the render loop, since stderr is unusable in raw mode.
pub struct ConsoleLogger {
    level: LevelFilter,
    tx: Mutex<Sender<String>>,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> (Self, Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        let logger = Self {
            level,
            tx: Mutex::new(tx),
        };
        (logger, rx)
    }

    /// Installs the logger globally and returns the line receiver.
    pub fn install(level: LevelFilter) -> Result<Receiver<String>, SetLoggerError> {
        let (logger, rx) = Self::new(level);
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
        Ok(rx)
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            &chrono::Local::now().format("%H:%M:%S").to_string(),
            record.level(),
            &record.args().to_string(),
        );
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(line);
        }
    }

    fn flush(&self) {}
}

pub fn format_line(time: &str, level: log::Level, msg: &str) -> String {
    format!("[{time}] [{}] {msg}", level.as_str())
}
