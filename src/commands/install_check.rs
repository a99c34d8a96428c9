// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Decide whether the OS needs to be installed at all.

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use libprovision::context::Context;
use log::info;
use regex::Regex;

use super::lsb_release::{builder_path_regex, read_lsb_release_value};
use super::Command;
use crate::service::CrosService;
use crate::status::StatusCode;

lazy_static! {
    static ref CQ_BUILD_REGEX: Regex = Regex::new(r".*-cq/.*").unwrap();
}

/// Record the build the DUT is currently running.
pub struct GetVersionCommand {
    ctx: Context,
}

impl GetVersionCommand {
    pub fn new(ctx: &Context) -> Self {
        GetVersionCommand { ctx: ctx.clone() }
    }
}

impl Command for GetVersionCommand {
    fn name(&self) -> &'static str {
        "GetVersionCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let version = read_lsb_release_value(cs, &self.ctx, builder_path_regex())?;
        info!("current version: {}", version);
        cs.machine_metadata.version = version;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to get version"
    }

    fn status(&self) -> StatusCode {
        StatusCode::PreProvisionSetupFailed
    }
}

/// Compare the requested build with the running one.
///
/// CQ builds reuse version numbers, so they are always installed.
#[derive(Default)]
pub struct CheckInstallNeededCommand;

impl CheckInstallNeededCommand {
    pub fn new() -> Self {
        CheckInstallNeededCommand
    }
}

impl Command for CheckInstallNeededCommand {
    fn name(&self) -> &'static str {
        "CheckInstallNeededCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let target = cs
            .image_path
            .builder_path()
            .ok_or_else(|| anyhow!("no builder path in image path {}", cs.image_path.path))?;
        cs.update_cros = if CQ_BUILD_REGEX.is_match(&target) {
            info!("{} is a CQ build, forcing install", target);
            true
        } else {
            target != cs.machine_metadata.version
        };
        if !cs.update_cros {
            info!("DUT already runs {}, skipping OS install", target);
        }
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to check if install is needed"
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
    use libprovision::storage::StoragePath;
    use mockall::Sequence;

    fn check(image_path: &str, version: &str) -> bool {
        let mut cs = service(MockServiceAdapter::new());
        cs.image_path = StoragePath::gs(image_path);
        cs.machine_metadata.version = version.into();
        CheckInstallNeededCommand::new().execute(&mut cs).unwrap();
        cs.update_cros
    }

    #[test]
    fn test_same_release_build_skips_install() {
        assert!(!check(
            "gs://chromeos-image-archive/eve-release/R120-15662.0.0",
            "eve-release/R120-15662.0.0"
        ));
    }

    #[test]
    fn test_different_build_installs() {
        assert!(check(
            "chromeos-image-archive/eve-release/R120-15663.0.0",
            "eve-release/R120-15662.0.0"
        ));
    }

    #[test]
    fn test_cq_build_always_installs() {
        assert!(check(
            "chromeos-image-archive/eve-cq/R120-15662.0.0-1234",
            "eve-cq/R120-15662.0.0-1234"
        ));
    }

    #[test]
    fn test_get_version() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_cmd(
            &mut mock,
            &mut seq,
            "cat",
            &["/etc/lsb-release"],
            "CHROMEOS_RELEASE_BOARD=eve\nCHROMEOS_RELEASE_BUILDER_PATH=eve-release/R120-15662.0.0\n",
        );

        let mut cs = service(mock);
        GetVersionCommand::new(&Context::background())
            .execute(&mut cs)
            .unwrap();
        assert_eq!(cs.machine_metadata.version, "eve-release/R120-15662.0.0");
    }
}
