// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::{Context as _, Result};
use libprovision::context::Context;

use super::Command;
use crate::service::CrosService;

pub const KERNEL_IMAGE: &str = "full_dev_part_KERN.bin.gz";
pub const ROOT_IMAGE: &str = "full_dev_part_ROOT.bin.gz";

/// Write the new kernel and root filesystem to the inactive slot.
///
/// The kernel goes first and the root is only written once the kernel
/// finished, so a failure leaves no doubt about which one is incomplete.
pub struct InstallPartitionsCommand {
    ctx: Context,
}

impl InstallPartitionsCommand {
    pub fn new(ctx: &Context) -> Self {
        InstallPartitionsCommand { ctx: ctx.clone() }
    }
}

impl Command for InstallPartitionsCommand {
    fn name(&self) -> &'static str {
        "InstallPartitionsCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let partitions = &cs.root_info()?.partition_info;
        cs.install_zipped_image(&self.ctx, KERNEL_IMAGE, &partitions.inactive_kernel)
            .context("install kernel")?;
        cs.install_zipped_image(&self.ctx, ROOT_IMAGE, &partitions.inactive_root)
            .context("install root")?;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to install partitions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;
    use libprovision::adapter::MockServiceAdapter;
    use mockall::Sequence;

    #[test]
    fn test_install_partitions_in_order() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_pipe(
            &mut mock,
            &mut seq,
            "gs://path/to/image/full_dev_part_KERN.bin.gz",
            "gzip -d | dd of=root_diskroot4 obs=2M \n",
        );
        expect_pipe(
            &mut mock,
            &mut seq,
            "gs://path/to/image/full_dev_part_ROOT.bin.gz",
            "gzip -d | dd of=root_diskroot5 obs=2M \n",
        );

        let mut cs = service_with_root(mock);
        InstallPartitionsCommand::new(&Context::background())
            .execute(&mut cs)
            .unwrap();
    }

    #[test]
    fn test_kernel_failure_skips_root() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_pipe_err(
            &mut mock,
            &mut seq,
            "gs://path/to/image/full_dev_part_KERN.bin.gz",
            "gsutil: not found",
        );

        let mut cs = service_with_root(mock);
        let err = InstallPartitionsCommand::new(&Context::background())
            .execute(&mut cs)
            .unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "install kernel: failed to install image: gsutil: not found"
        );
    }
}
