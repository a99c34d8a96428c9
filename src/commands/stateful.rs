// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Commands that touch the stateful partition.

use anyhow::{anyhow, Context as _, Result};
use libprovision::context::Context;
use log::{info, warn};

use super::Command;
use crate::service::CrosService;

pub const STATEFUL_IMAGE: &str = "stateful.tgz";

/// Request a stateful wipe (keeping the test image) and reboot to apply it.
pub struct WipeStatefulCommand {
    ctx: Context,
}

impl WipeStatefulCommand {
    pub fn new(ctx: &Context) -> Self {
        WipeStatefulCommand { ctx: ctx.clone() }
    }
}

impl Command for WipeStatefulCommand {
    fn name(&self) -> &'static str {
        "WipeStatefulCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let reset_file = cs.config.factory_reset_file();
        cs.run_cmd(
            &self.ctx,
            "echo",
            &["'fast keepimg'", ">", reset_file.as_str()],
        )
        .context("failed to write factory reset marker")?;
        cs.connection
            .restart(&self.ctx)
            .context("failed to reboot after requesting wipe")
    }

    fn error_message(&self) -> &'static str {
        "failed to wipe stateful"
    }
}

/// Stage the new stateful contents and reboot so they get applied.
pub struct ProvisionStatefulCommand {
    ctx: Context,
}

impl ProvisionStatefulCommand {
    pub fn new(ctx: &Context) -> Self {
        ProvisionStatefulCommand { ctx: ctx.clone() }
    }
}

impl Command for ProvisionStatefulCommand {
    fn name(&self) -> &'static str {
        "ProvisionStatefulCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let ctx = &self.ctx;
        let config = &cs.config;
        let update_available = config.update_stateful_file();
        let [var_new, dev_image_new] = config.stateful_staging_dirs();

        cs.run_cmd(
            ctx,
            "rm",
            &[
                "-rf",
                update_available.as_str(),
                var_new.as_str(),
                dev_image_new.as_str(),
            ],
        )
        .context("failed to remove previous stateful update")?;

        let source = cs.image_path.join(STATEFUL_IMAGE)?;
        let pipeline = format!(
            "tar --ignore-command-error --overwrite --directory={} --selinux -xzf -",
            config.stateful_path
        );
        cs.connection.pipe_data(ctx, &source, &pipeline)?;

        cs.run_cmd(
            ctx,
            "echo",
            &["-n", "clobber", ">", update_available.as_str()],
        )
        .context("failed to create update available file")?;

        cs.connection
            .restart(ctx)
            .context("failed to reboot after staging stateful")
    }

    fn revert(&mut self, cs: &CrosService) -> Result<()> {
        let ctx = Context::background();
        let [var_new, dev_image_new] = cs.config.stateful_staging_dirs();
        let update_available = cs.config.update_stateful_file();
        if let Err(err) = cs.run_cmd(
            &ctx,
            "rm",
            &[
                "-rf",
                var_new.as_str(),
                dev_image_new.as_str(),
                update_available.as_str(),
            ],
        ) {
            warn!("failed to remove staged stateful files: {:#}", err);
        }
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to provision stateful"
    }
}

/// Unpack the overwrite payload tarball over the root of the DUT.
pub struct OverwriteInstallCommand {
    ctx: Context,
}

impl OverwriteInstallCommand {
    pub fn new(ctx: &Context) -> Self {
        OverwriteInstallCommand { ctx: ctx.clone() }
    }
}

impl Command for OverwriteInstallCommand {
    fn name(&self) -> &'static str {
        "OverwriteInstallCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let payload = cs
            .overwrite_payload
            .as_ref()
            .ok_or_else(|| anyhow!("no overwrite payload requested"))?;
        let source = payload.remote_path()?;
        info!("applying overwrite payload {}", source);
        cs.connection.pipe_data(&self.ctx, source, "tar xf - -C /")
    }

    fn error_message(&self) -> &'static str {
        "failed to install overwrite payload"
    }
}
