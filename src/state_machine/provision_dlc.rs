// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Install the requested DLCs into the new OS.

use libprovision::context::Context;

use crate::commands::{
    run_command, CorrectDlcPermissionsCommand, InstallDlcsCommand, StartDlcserviceCommand,
    StopDlcserviceCommand,
};
use crate::error;
use crate::service::CrosService;

pub(super) fn execute(ctx: &Context, cs: &mut CrosService) -> error::Result<()> {
    run_command(cs, &mut StopDlcserviceCommand::new(ctx))?;
    let installed = run_command(cs, &mut InstallDlcsCommand::new(ctx));
    // dlcservice is restarted even if some DLCs failed.
    run_command(cs, &mut StartDlcserviceCommand::new(ctx))?;
    installed?;
    run_command(cs, &mut CorrectDlcPermissionsCommand::new(ctx))
}
