// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::time::Duration;

use anyhow::Result;
use libprovision::context::Context;
use log::info;

use super::Command;
use crate::service::CrosService;
use crate::status::StatusCode;

/// Reboot the DUT and wait for it to come back.
pub struct RebootCommand {
    ctx: Context,
}

impl RebootCommand {
    pub fn new(ctx: &Context) -> Self {
        RebootCommand { ctx: ctx.clone() }
    }

    /// Reboot under a deadline of its own, independent of the caller's.
    pub fn with_timeout(timeout: Duration) -> Self {
        RebootCommand {
            ctx: Context::background().with_timeout(timeout),
        }
    }
}

impl Command for RebootCommand {
    fn name(&self) -> &'static str {
        "RebootCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        info!("rebooting DUT");
        cs.connection.restart(&self.ctx)
    }

    fn error_message(&self) -> &'static str {
        "failed to reboot DUT"
    }

    fn status(&self) -> StatusCode {
        StatusCode::DutUnreachablePostProvision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;
    use anyhow::anyhow;
    use libprovision::adapter::MockServiceAdapter;

    #[test]
    fn test_reboot_with_own_deadline() {
        let mut mock = MockServiceAdapter::new();
        mock.expect_restart()
            .withf(|ctx| {
                ctx.remaining()
                    .map_or(false, |left| left > Duration::from_secs(200))
            })
            .times(1)
            .return_once(|_| Ok(()));

        let mut cs = service(mock);
        RebootCommand::with_timeout(Duration::from_secs(300))
            .execute(&mut cs)
            .unwrap();
    }

    #[test]
    fn test_reboot_failure() {
        let mut mock = MockServiceAdapter::new();
        mock.expect_restart()
            .times(1)
            .return_once(|_| Err(anyhow!("DUT unreachable")));

        let mut cs = service(mock);
        let mut command = RebootCommand::new(&Context::background());
        let err = crate::commands::run_command(&mut cs, &mut command).unwrap_err();
        assert_eq!(err.to_string(), "failed to reboot DUT, DUT unreachable");
        assert_eq!(err.status(), StatusCode::DutUnreachablePostProvision);
    }
}
