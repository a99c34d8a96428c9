// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::Result;
use libprovision::context::Context;
use log::info;

use super::Command;
use crate::service::CrosService;

/// Ask the firmware to clear the TPM owner on the next boot.
pub struct ClearTpmCommand {
    ctx: Context,
}

impl ClearTpmCommand {
    pub fn new(ctx: &Context) -> Self {
        ClearTpmCommand { ctx: ctx.clone() }
    }
}

impl Command for ClearTpmCommand {
    fn name(&self) -> &'static str {
        "ClearTpmCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let board = &cs.machine_metadata.board;
        if cs
            .config
            .clear_tpm_skip_boards
            .iter()
            .any(|prefix| board.starts_with(prefix.as_str()))
        {
            info!("not clearing the TPM on {}", board);
            return Ok(());
        }
        cs.run_cmd(&self.ctx, "crossystem", &["clear_tpm_owner_request=1"])?;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to clear TPM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;
    use libprovision::adapter::MockServiceAdapter;
    use mockall::Sequence;

    #[test]
    fn test_clear_tpm() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_cmd(&mut mock, &mut seq, "crossystem", &["clear_tpm_owner_request=1"], "");

        let mut cs = service(mock);
        cs.machine_metadata.board = "not_reven".into();
        ClearTpmCommand::new(&Context::background())
            .execute(&mut cs)
            .unwrap();
    }

    #[test]
    fn test_skipped_on_reven() {
        // No adapter calls are expected.
        let mut cs = service(MockServiceAdapter::new());
        cs.machine_metadata.board = "reven-vmtest".into();
        ClearTpmCommand::new(&Context::background())
            .execute(&mut cs)
            .unwrap();
    }
}
