// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Update the AP firmware with the updater shipped in the new OS.

use std::time::Duration;

use libprovision::context::Context;
use log::info;

use crate::commands::{
    run_command, run_commands, CheckFirmwareSlotCommand, CheckFirmwareUpdaterCommand,
    RebootCommand, RunFirmwareUpdaterCommand, VerifyFirmwareCommand,
    WaitForDutToStabilizeCommand,
};
use crate::error;
use crate::service::CrosService;

/// Rebooting into new firmware takes longer than a plain reboot.
const FIRMWARE_REBOOT_TIMEOUT: Duration = Duration::from_secs(300);

pub(super) fn execute(ctx: &Context, cs: &mut CrosService) -> error::Result<()> {
    let mut check_updater = CheckFirmwareUpdaterCommand::new(ctx);
    run_command(cs, &mut check_updater)?;
    if !check_updater.updater_exists {
        info!("State: Skip firmware update as the build has no firmware updater");
        return Ok(());
    }

    let mut check_slot = CheckFirmwareSlotCommand::new(ctx);
    run_commands(
        cs,
        &mut [
            &mut WaitForDutToStabilizeCommand::new(ctx),
            &mut RunFirmwareUpdaterCommand::new(ctx),
            &mut check_slot,
        ],
    )?;

    if check_slot.reboot_required {
        run_command(cs, &mut RebootCommand::with_timeout(FIRMWARE_REBOOT_TIMEOUT))?;
    } else {
        info!("no firmware slot change detected, skipping post firmware update reboot");
    }
    run_command(cs, &mut VerifyFirmwareCommand::new(ctx))
}
