// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Best-effort upstart job control.
//!
//! Stopping or starting a daemon never fails provisioning: jobs that are
//! already in the requested state make `stop`/`start` exit non-zero, and
//! the daemons come back on the next reboot anyway.

use anyhow::Result;
use libprovision::context::Context;
use log::warn;

use super::Command;
use crate::service::CrosService;

fn control_job(cs: &CrosService, ctx: &Context, action: &str, job: &str) {
    if let Err(err) = cs.run_cmd(ctx, action, &[job]) {
        warn!("failed to {} {}: {:#}", action, job, err);
    }
}

/// Stop the UI and update-engine so they don't touch the partitions being
/// written.
pub struct StopSystemDaemonsCommand {
    ctx: Context,
}

impl StopSystemDaemonsCommand {
    pub fn new(ctx: &Context) -> Self {
        StopSystemDaemonsCommand { ctx: ctx.clone() }
    }
}

impl Command for StopSystemDaemonsCommand {
    fn name(&self) -> &'static str {
        "StopSystemDaemonsCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        control_job(cs, &self.ctx, "stop", "ui");
        control_job(cs, &self.ctx, "stop", "update-engine");
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to stop system daemons"
    }
}

pub struct StopDlcserviceCommand {
    ctx: Context,
}

impl StopDlcserviceCommand {
    pub fn new(ctx: &Context) -> Self {
        StopDlcserviceCommand { ctx: ctx.clone() }
    }
}

impl Command for StopDlcserviceCommand {
    fn name(&self) -> &'static str {
        "StopDlcserviceCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        control_job(cs, &self.ctx, "stop", "dlcservice");
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to stop dlcservice"
    }
}

pub struct StartDlcserviceCommand {
    ctx: Context,
}

impl StartDlcserviceCommand {
    pub fn new(ctx: &Context) -> Self {
        StartDlcserviceCommand { ctx: ctx.clone() }
    }
}

impl Command for StartDlcserviceCommand {
    fn name(&self) -> &'static str {
        "StartDlcserviceCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        control_job(cs, &self.ctx, "start", "dlcservice");
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to start dlcservice"
    }
}
