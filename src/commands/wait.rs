// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Commands that poll the DUT until it reaches some state.

use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use libprovision::context::Context;
use log::{debug, info};

use super::Command;
use crate::service::CrosService;
use crate::status::StatusCode;

#[cfg(not(test))]
const POLL_INTERVAL: Duration = Duration::from_secs(2);
#[cfg(test)]
const POLL_INTERVAL: Duration = Duration::from_millis(5);

const STABILIZE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const STICKY_KERNEL_TIMEOUT: Duration = Duration::from_secs(100);

/// Call `check` every `POLL_INTERVAL` until it returns true.
///
/// Gives up once `timeout` has elapsed or `ctx` is done. The wall-clock
/// bound also applies when `ctx` has no deadline. Errors from `check` are
/// retried; the DUT may still be coming up.
fn poll_until<F>(ctx: &Context, timeout: Duration, what: &str, mut check: F) -> Result<()>
where
    F: FnMut(&Context) -> Result<bool>,
{
    let ctx = ctx.with_timeout(timeout);
    let give_up = Instant::now() + timeout;
    loop {
        match check(&ctx) {
            Ok(true) => return Ok(()),
            Ok(false) => debug!("still waiting for {}", what),
            Err(err) => debug!("{} check failed: {:#}", what, err),
        }
        if Instant::now() >= give_up {
            bail!("timed out waiting for {}", what);
        }
        ctx.sleep(POLL_INTERVAL)
            .map_err(|err| anyhow!("{} while waiting for {}", err, what))?;
    }
}

/// Wait until upstart reports the system services as started.
pub struct WaitForDutToStabilizeCommand {
    ctx: Context,
}

impl WaitForDutToStabilizeCommand {
    pub fn new(ctx: &Context) -> Self {
        WaitForDutToStabilizeCommand { ctx: ctx.clone() }
    }
}

impl Command for WaitForDutToStabilizeCommand {
    fn name(&self) -> &'static str {
        "WaitForDutToStabilizeCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        poll_until(&self.ctx, STABILIZE_TIMEOUT, "system services", |ctx| {
            let status = cs.run_cmd(ctx, "status", &["system-services"])?;
            Ok(status.contains("start/running"))
        })?;
        info!("DUT is stable");
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to wait for DUT to stabilize"
    }

    fn status(&self) -> StatusCode {
        StatusCode::StabilizeDutFailed
    }
}

/// Wait until the firmware marks the booted kernel successful, so the next
/// reboot will not fall back to the other slot.
pub struct WaitForStickyKernelCommand {
    ctx: Context,
}

impl WaitForStickyKernelCommand {
    pub fn new(ctx: &Context) -> Self {
        WaitForStickyKernelCommand { ctx: ctx.clone() }
    }
}

impl Command for WaitForStickyKernelCommand {
    fn name(&self) -> &'static str {
        "WaitForStickyKernelCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let root_info = cs.root_info()?;
        let kernel_num = root_info.partition_info.active_kernel_num.to_string();
        let root_disk = root_info.root_disk.as_str();
        poll_until(&self.ctx, STICKY_KERNEL_TIMEOUT, "sticky kernel", |ctx| {
            let successful = cs.run_cmd(
                ctx,
                "cgpt",
                &["show", "-S", "-i", kernel_num.as_str(), root_disk],
            )?;
            Ok(successful.trim() == "1")
        })?;
        info!("kernel {} is sticky", kernel_num);
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to wait for sticky kernel"
    }

    fn status(&self) -> StatusCode {
        StatusCode::PostProvisionSetupFailed
    }
}
