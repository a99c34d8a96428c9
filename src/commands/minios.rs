// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::{Context as _, Result};
use libprovision::context::Context;
use log::info;

use super::Command;
use crate::service::CrosService;

pub const MINIOS_IMAGE: &str = "full_dev_part_MINIOS.bin.gz";

/// Write the MiniOS recovery image to both MiniOS partitions.
///
/// Boards without MiniOS support carry placeholder partitions with a
/// dedicated type GUID; the install is skipped if either has it.
pub struct InstallMiniOsCommand {
    ctx: Context,
}

impl InstallMiniOsCommand {
    pub fn new(ctx: &Context) -> Self {
        InstallMiniOsCommand { ctx: ctx.clone() }
    }

    /// Both MiniOS partition types are read before deciding.
    fn minios_supported(&self, cs: &CrosService, root_disk: &str) -> Result<bool> {
        let mut supported = true;
        for part_num in cs.config.partitions.minios() {
            let part_num = part_num.to_string();
            let guid = cs
                .run_cmd(
                    &self.ctx,
                    "cgpt",
                    &["show", "-t", root_disk, "-i", part_num.as_str()],
                )
                .with_context(|| format!("failed to read type of partition {}", part_num))?;
            if guid
                .trim()
                .eq_ignore_ascii_case(&cs.config.minios_unsupported_guid)
            {
                supported = false;
            }
        }
        Ok(supported)
    }
}

impl Command for InstallMiniOsCommand {
    fn name(&self) -> &'static str {
        "InstallMiniOsCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let root_info = cs.root_info()?;
        if !self.minios_supported(cs, &root_info.root_disk)? {
            info!("MiniOS is not supported on this device, skipping");
            return Ok(());
        }
        let partitions = &root_info.partition_info;
        cs.install_zipped_image(&self.ctx, MINIOS_IMAGE, &partitions.minios_a)
            .context("install MiniOS A")?;
        cs.install_zipped_image(&self.ctx, MINIOS_IMAGE, &partitions.minios_b)
            .context("install MiniOS B")?;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to install MiniOS"
    }
}
