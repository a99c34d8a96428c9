// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::Result;
use libprovision::context::Context;

use super::Command;
use crate::service::CrosService;
use crate::status::StatusCode;

/// Touch the provision marker. It only disappears when stateful is
/// reinstalled, so a surviving marker flags an incomplete provision.
pub struct CreateProvisionMarkerCommand {
    ctx: Context,
}

impl CreateProvisionMarkerCommand {
    pub fn new(ctx: &Context) -> Self {
        CreateProvisionMarkerCommand { ctx: ctx.clone() }
    }
}

impl Command for CreateProvisionMarkerCommand {
    fn name(&self) -> &'static str {
        "CreateProvisionMarkerCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        cs.run_cmd(&self.ctx, "touch", &[cs.config.provision_marker.as_str()])?;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to create provision marker"
    }

    fn status(&self) -> StatusCode {
        StatusCode::PreProvisionSetupFailed
    }
}
