// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Command line argument parsing.

use clap::Parser;
use std::path::PathBuf;

const DEFAULT_LOG_PATH: &str = "/tmp/provisionservice/";

/// Provision a ChromeOS DUT from a JSON request.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Provisioning request (JSON)
    #[arg(long)]
    pub input: PathBuf,

    /// Write the install response (JSON) here as well as to stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory for the execution log
    #[arg(long, default_value = DEFAULT_LOG_PATH)]
    pub log_path: PathBuf,

    /// Print the states that would run and exit without touching the DUT
    #[arg(long)]
    pub dry_run: bool,

    /// Show debug output
    #[arg(long)]
    pub debug: bool,
}
