// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::{bail, Context as _, Result};
use libprovision::context::Context;

use super::daemons::{StartDlcserviceCommand, StopDlcserviceCommand};
use super::Command;
use crate::service::CrosService;

/// Drop the `verified` markers of the inactive slot so dlcservice does not
/// trust DLC images left over from the build being replaced.
pub struct ClearDlcArtifactsCommand {
    ctx: Context,
}

impl ClearDlcArtifactsCommand {
    pub fn new(ctx: &Context) -> Self {
        ClearDlcArtifactsCommand { ctx: ctx.clone() }
    }

    fn remove_inactive_markers(&self, cs: &CrosService) -> Result<()> {
        let inactive = cs.root_info()?.slot.other();
        let markers = format!(
            "{}/*/*/{}/{}",
            cs.config.dlc_cache_dir,
            inactive.dlc_dir(),
            cs.config.dlc_verified
        );
        cs.run_cmd(&self.ctx, "rm", &["-f", markers.as_str()])
            .context("failed to remove inactive verified DLCs")?;
        Ok(())
    }
}

impl Command for ClearDlcArtifactsCommand {
    fn name(&self) -> &'static str {
        "ClearDlcArtifactsCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let exists = cs
            .connection
            .path_exists(&self.ctx, &cs.config.dlc_lib_dir)
            .context("failed to check DLC library directory")?;
        if !exists {
            bail!("DLC library directory {} does not exist", cs.config.dlc_lib_dir);
        }

        StopDlcserviceCommand::new(&self.ctx).execute(cs)?;
        let result = self.remove_inactive_markers(cs);
        // dlcservice comes back whether or not the markers were removed.
        StartDlcserviceCommand::new(&self.ctx).execute(cs)?;
        result
    }

    fn error_message(&self) -> &'static str {
        "failed to clear DLC artifacts"
    }
}
