// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Provision a ChromeOS DUT over ssh.
//!
//! Reads a `ProvisionRequest`, runs the provisioning state machine against
//! the DUT and reports an `InstallResponse`.

mod command_line;
mod logger;

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use libprovision::context::Context;
use log::{error, info};

use command_line::Args;
use cros_provision::config::ProvisionRequest;
use cros_provision::service::CrosService;
use cros_provision::ssh_adapter::SshAdapter;
use cros_provision::state_machine;
use cros_provision::status::{InstallResponse, StatusCode};

/// Where the execution log goes. A dry run leaves no trace on the host.
fn log_dir(args: &Args) -> Option<&Path> {
    if args.dry_run {
        None
    } else {
        Some(args.log_path.as_path())
    }
}

/// Write the response to `output`, or to stdout if no file is given.
fn write_response(response: &InstallResponse, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(response)?;
    match output {
        Some(output) => fs::write(output, &json)
            .with_context(|| format!("failed to write {}", output.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    logger::init(args.debug, log_dir(&args))?;

    let request = ProvisionRequest::from_file(&args.input)?;
    let ctx = match request.timeout_secs {
        Some(secs) => Context::background().with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    };

    let adapter = Arc::new(SshAdapter::new(&request.dut, request.prevent_reboot));
    let address = request.dut.address.clone();
    let mut cs = CrosService::from_request(adapter, request);

    if args.dry_run {
        for (state, runs) in state_machine::plan(&cs) {
            println!("{}: {}", state.name(), if runs { "run" } else { "skip" });
        }
        return Ok(ExitCode::SUCCESS);
    }

    info!("provisioning {} with {}", address, cs.image_path.path);
    let response = InstallResponse::from(state_machine::run(&ctx, &mut cs));
    if let Some(err) = &response.error {
        error!("provisioning failed ({}): {}", response.status, err);
    }

    write_response(&response, args.output.as_deref())?;

    Ok(if response.status == StatusCode::Ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
