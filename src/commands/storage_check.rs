// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::{Context as _, Result};

use super::Command;
use crate::service::CrosService;
use crate::status::StatusCode;

/// Fail before touching the DUT if an artifact is not in remote storage.
pub struct CheckStoragePathsCommand;

impl Command for CheckStoragePathsCommand {
    fn name(&self) -> &'static str {
        "CheckStoragePathsCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        cs.image_path.remote_path().context("image path")?;
        if let Some(payload) = &cs.overwrite_payload {
            payload.remote_path().context("overwrite payload")?;
        }
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "unsupported storage path"
    }

    fn status(&self) -> StatusCode {
        StatusCode::PreProvisionSetupFailed
    }
}
