// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Logger writing `LEVEL: message` lines to stdout/stderr and, optionally,
//! to an execution log file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::{LevelFilter, Metadata, Record};

pub const LOG_FILE_NAME: &str = "log.txt";

pub struct Logger {
    pub level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl Logger {
    /// Create a logger, appending to `<log_dir>/log.txt` if a directory is
    /// given.
    pub fn new(level: LevelFilter, log_dir: Option<&Path>) -> Result<Self> {
        let file = match log_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                let path = dir.join(LOG_FILE_NAME);
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                Some(Mutex::new(file))
            }
            None => None,
        };
        Ok(Logger { level, file })
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = format!("{}: {}", record.level(), record.args());
        if record.metadata().level() == LevelFilter::Error {
            eprintln!("{}", msg);
        } else {
            println!("{}", msg);
        }
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                // Nowhere left to report a failure to log.
                let _ = writeln!(file, "{}", msg);
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Set up logging.
pub fn init(debug: bool, log_dir: Option<&Path>) -> Result<()> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let logger = Logger::new(level, log_dir)?;
    log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(level))?;
    Ok(())
}
