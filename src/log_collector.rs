//! Logging pipeline for patch runs.
//!
//! ```text
//! log::info!() etc.
//!     |
//! [LogCollector]
//!     +--> stderr (immediate)
//!     +--> crossbeam channel --> [file writer thread] --> log file (attached later)
//! ```
//!
//! stdout stays reserved for user-facing status lines and `--json` output.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Internal log line or special marker
enum LogMessage {
    Line(String),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// Format: `[HH:MM:SS.mmm] [LEVEL] message`
pub fn format_line(level: Level, message: &str) -> String {
    format!("[{}] [{}] {}", Local::now().format("%H:%M:%S%.3f"), level, message)
}

/// Logger that writes to stderr and, once a file is attached, appends to it.
///
/// Clones share the file sink, so a file attached after [`LogCollector::install`]
/// is picked up by the installed logger too.
#[derive(Clone)]
pub struct LogCollector {
    level: LevelFilter,
    /// File writer channel; `None` until a log file is attached.
    tx: Arc<Mutex<Option<Sender<LogMessage>>>>,
    log_file: Arc<Mutex<Option<PathBuf>>>,
}

impl LogCollector {
    pub fn new(level: LevelFilter, log_file: Option<&Path>) -> Result<Self, String> {
        let collector = LogCollector {
            level,
            tx: Arc::new(Mutex::new(None)),
            log_file: Arc::new(Mutex::new(None)),
        };
        if let Some(path) = log_file {
            collector.attach_file(path)?;
        }
        Ok(collector)
    }

    /// Start appending to `path`. Lines logged earlier only went to stderr.
    pub fn attach_file(&self, path: &Path) -> Result<(), String> {
        // Create parent directory and open in append mode
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create log directory: {}", e))?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))?;

        let (tx, rx) = unbounded::<LogMessage>();

        // Plain OS thread with blocking recv(); lives until every sender is dropped.
        std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        if let Err(e) = writeln!(file, "{}", line) {
                            eprintln!("[Log] Failed to write to log file: {}", e);
                        }
                    }
                    LogMessage::Flush(done) => {
                        let _ = file.flush();
                        let _ = done.send(());
                    }
                }
            }
        });

        // Flush whatever the previous sink still holds before swapping it out
        let previous = {
            let mut guard = self.tx.lock().map_err(|e| format!("Failed to lock log sink: {}", e))?;
            guard.replace(tx)
        };
        if let Some(previous) = previous {
            flush_sender(&previous)?;
        }
        if let Ok(mut current) = self.log_file.lock() {
            *current = Some(path.to_path_buf());
        }
        Ok(())
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_file.lock().ok().and_then(|p| p.clone())
    }

    /// Register a clone as the global `log` backend.
    pub fn install(&self) -> Result<(), String> {
        log::set_boxed_logger(Box::new(self.clone()))
            .map(|()| log::set_max_level(self.level))
            .map_err(|e| format!("Failed to set global logger: {}", e))
    }

    /// Block until every line sent before this call has reached the log file.
    pub fn flush_and_wait(&self) -> Result<(), String> {
        let sender = self
            .tx
            .lock()
            .map_err(|e| format!("Failed to lock log sink: {}", e))?
            .clone();
        match sender {
            Some(tx) => flush_sender(&tx),
            None => Ok(()),
        }
    }
}

fn flush_sender(tx: &Sender<LogMessage>) -> Result<(), String> {
    let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
    tx.send(LogMessage::Flush(done_tx))
        .map_err(|e| format!("Failed to send flush marker: {}", e))?;
    done_rx
        .recv()
        .map_err(|e| format!("Flush signal interrupted: {}", e))
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), &record.args().to_string());
        eprintln!("{}", line);
        if let Ok(guard) = self.tx.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(LogMessage::Line(line));
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
