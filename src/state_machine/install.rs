// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Write the new OS to the inactive slot and boot into it.

use libprovision::context::Context;

use crate::commands::{
    run_commands, ClearDlcArtifactsCommand, ClearTpmCommand, InstallPartitionsCommand,
    PostInstallCommand, RebootCommand, StopSystemDaemonsCommand,
};
use crate::error;
use crate::service::CrosService;

pub(super) fn execute(ctx: &Context, cs: &mut CrosService) -> error::Result<()> {
    run_commands(
        cs,
        &mut [
            &mut StopSystemDaemonsCommand::new(ctx),
            &mut ClearDlcArtifactsCommand::new(ctx),
            &mut InstallPartitionsCommand::new(ctx),
            &mut PostInstallCommand::new(ctx),
            &mut ClearTpmCommand::new(ctx),
            &mut RebootCommand::new(ctx),
        ],
    )
}
