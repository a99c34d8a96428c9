// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! First state: learn about the DUT. Nothing destructive happens here.

use libprovision::context::Context;

use crate::commands::{
    run_commands, CheckInstallNeededCommand, CheckStoragePathsCommand,
    CreateProvisionMarkerCommand, GetBoardCommand, GetRootInfoCommand, GetVersionCommand,
};
use crate::error;
use crate::service::CrosService;

pub(super) fn execute(ctx: &Context, cs: &mut CrosService) -> error::Result<()> {
    run_commands(
        cs,
        &mut [
            &mut CheckStoragePathsCommand,
            &mut CreateProvisionMarkerCommand::new(ctx),
            &mut GetRootInfoCommand::new(ctx),
            &mut GetBoardCommand::new(ctx),
        ],
    )?;
    if cs.check_install_needed {
        run_commands(
            cs,
            &mut [
                &mut GetVersionCommand::new(ctx),
                &mut CheckInstallNeededCommand::new(),
            ],
        )?;
    }
    Ok(())
}
