// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::{Context as _, Result};
use libprovision::context::Context;
use log::warn;

use super::Command;
use crate::service::CrosService;
use crate::status::StatusCode;

/// Run `postinst` from the freshly written root, which marks the inactive
/// slot bootable.
pub struct PostInstallCommand {
    ctx: Context,
}

impl PostInstallCommand {
    pub fn new(ctx: &Context) -> Self {
        PostInstallCommand { ctx: ctx.clone() }
    }
}

impl Command for PostInstallCommand {
    fn name(&self) -> &'static str {
        "PostInstallCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let ctx = &self.ctx;
        let inactive_root = cs.root_info()?.partition_info.inactive_root.as_str();

        let tmp_dir = cs
            .run_cmd(ctx, "mktemp", &["-d"])
            .context("failed to create temporary directory")?;
        let tmp_dir = tmp_dir.trim();
        cs.run_cmd(ctx, "mount", &["-o", "ro", inactive_root, tmp_dir])
            .context("failed to mount inactive root")?;
        cs.run_cmd(ctx, &format!("{}/postinst", tmp_dir), &[inactive_root])
            .context("failed to postinst from inactive root")?;
        cs.run_cmd(ctx, "umount", &[tmp_dir])
            .context("failed to umount temporary directory")?;
        cs.run_cmd(ctx, "rmdir", &[tmp_dir])
            .context("failed to remove temporary directory")?;
        Ok(())
    }

    /// Drop any staged stateful update and point the bootloader back at the
    /// active root.
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

        let active_root = cs.root_info()?.partition_info.active_root.as_str();
        if let Err(err) = cs.run_cmd(&ctx, "/postinst", &[active_root, "2>&1"]) {
            warn!("failed to postinst from active root: {:#}", err);
        }
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to post install"
    }

    fn status(&self) -> StatusCode {
        StatusCode::PostProvisionSetupFailed
    }
}
