// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Last state: refresh the MiniOS recovery partitions.

use libprovision::context::Context;

use crate::commands::{run_command, InstallMiniOsCommand};
use crate::error;
use crate::service::CrosService;

pub(super) fn execute(ctx: &Context, cs: &mut CrosService) -> error::Result<()> {
    run_command(cs, &mut InstallMiniOsCommand::new(ctx))
}
