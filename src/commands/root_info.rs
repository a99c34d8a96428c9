// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::{Context as _, Result};
use libprovision::context::Context;
use libprovision::partition::{compute_partition_info, compute_root_part_number};
use log::info;

use super::Command;
use crate::service::{CrosService, RootInfo};
use crate::status::StatusCode;

/// Read the root device and disk from the DUT and derive the partition
/// paths of both slots.
pub struct GetRootInfoCommand {
    ctx: Context,
}

impl GetRootInfoCommand {
    pub fn new(ctx: &Context) -> Self {
        GetRootInfoCommand { ctx: ctx.clone() }
    }
}

impl Command for GetRootInfoCommand {
    fn name(&self) -> &'static str {
        "GetRootInfoCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let root = cs
            .run_cmd(&self.ctx, "rootdev", &["-s"])
            .context("failed to get root device")?
            .trim()
            .to_owned();
        let root_disk = cs
            .run_cmd(&self.ctx, "rootdev", &["-s", "-d"])
            .context("failed to get root disk")?
            .trim()
            .to_owned();
        let layout = &cs.config.partitions;
        let slot = compute_root_part_number(layout, &root)
            .context("failed to get root partition number")?;
        let partition_info = compute_partition_info(layout, &root, &root_disk, slot);
        info!(
            "root {} on {} (slot {:?}), inactive root {}",
            root, root_disk, slot, partition_info.inactive_root
        );

        cs.machine_metadata.root_info = Some(RootInfo {
            root,
            root_disk,
            slot,
            partition_info,
        });
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to get root info"
    }

    fn status(&self) -> StatusCode {
        StatusCode::PreProvisionSetupFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;
    use libprovision::adapter::MockServiceAdapter;
    use libprovision::partition::Slot;
    use mockall::Sequence;

    #[test]
    fn test_get_root_info() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_cmd(&mut mock, &mut seq, "rootdev", &["-s"], "/dev/nvme0n1p5\n");
        expect_cmd(&mut mock, &mut seq, "rootdev", &["-s", "-d"], "/dev/nvme0n1\n");

        let mut cs = service(mock);
        GetRootInfoCommand::new(&Context::background())
            .execute(&mut cs)
            .unwrap();

        let root_info = cs.root_info().unwrap();
        assert_eq!(root_info.root, "/dev/nvme0n1p5");
        assert_eq!(root_info.root_disk, "/dev/nvme0n1");
        assert_eq!(root_info.slot, Slot::B);
        assert_eq!(root_info.partition_info.inactive_root, "/dev/nvme0n1p3");
        assert_eq!(root_info.partition_info.inactive_kernel, "/dev/nvme0n1p2");
    }

    #[test]
    fn test_get_root_info_bad_partition() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_cmd(&mut mock, &mut seq, "rootdev", &["-s"], "/dev/sda1");
        expect_cmd(&mut mock, &mut seq, "rootdev", &["-s", "-d"], "/dev/sda");

        let mut cs = service(mock);
        let err = GetRootInfoCommand::new(&Context::background())
            .execute(&mut cs)
            .unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "failed to get root partition number: unexpected root partition number of 1"
        );
        assert!(cs.machine_metadata.root_info.is_none());
    }
}
