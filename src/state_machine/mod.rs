// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The provisioning state machine.
//!
//! Provisioning is a fixed chain of states:
//!
//! Init -> Install -> UpdateFirmware -> PostInstall -> Verify -> ProvisionDlc
//! -> InstallMiniOs
//!
//! Each state runs a list of commands and either completes or stops the
//! whole run. States whose preconditions don't hold are skipped. A failed
//! run is never resumed mid-chain; callers retry from `Init`.

mod init;
mod install;
mod install_minios;
mod post_install;
mod provision_dlc;
mod update_firmware;

use libprovision::context::Context;
use log::info;

use crate::error::{self, ProvisionError};
use crate::service::CrosService;
use crate::status::StatusCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    Init,
    Install,
    UpdateFirmware,
    PostInstall,
    Verify,
    ProvisionDlc,
    InstallMiniOs,
}

impl StateKind {
    /// Every state, in the order they run.
    pub const CHAIN: [StateKind; 7] = [
        StateKind::Init,
        StateKind::Install,
        StateKind::UpdateFirmware,
        StateKind::PostInstall,
        StateKind::Verify,
        StateKind::ProvisionDlc,
        StateKind::InstallMiniOs,
    ];

    /// The state that follows this one, or `None` for the last state.
    pub fn next(self) -> Option<StateKind> {
        match self {
            StateKind::Init => Some(StateKind::Install),
            StateKind::Install => Some(StateKind::UpdateFirmware),
            StateKind::UpdateFirmware => Some(StateKind::PostInstall),
            StateKind::PostInstall => Some(StateKind::Verify),
            StateKind::Verify => Some(StateKind::ProvisionDlc),
            StateKind::ProvisionDlc => Some(StateKind::InstallMiniOs),
            StateKind::InstallMiniOs => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StateKind::Init => "CrOS Init",
            StateKind::Install => "CrOS Install",
            StateKind::UpdateFirmware => "CrOS Update Firmware",
            StateKind::PostInstall => "CrOS Post-Install",
            StateKind::Verify => "CrOS Verify",
            StateKind::ProvisionDlc => "CrOS Provision DLC",
            StateKind::InstallMiniOs => "CrOS Install MiniOS",
        }
    }

    /// Whether the state has work to do given what is known so far.
    ///
    /// Init may clear `update_cros`, so the answer for later states can
    /// change once Init has run.
    pub fn should_run(self, cs: &CrosService) -> bool {
        match self {
            StateKind::Install | StateKind::PostInstall => cs.update_cros,
            StateKind::UpdateFirmware => cs.update_firmware,
            StateKind::ProvisionDlc => !cs.dlc_specs.is_empty(),
            StateKind::Init | StateKind::Verify | StateKind::InstallMiniOs => true,
        }
    }

    /// Run the state against the DUT.
    pub fn execute(self, ctx: &Context, cs: &mut CrosService) -> error::Result<()> {
        if !self.should_run(cs) {
            info!("State: Skip {}", self.name());
            return Ok(());
        }
        if let Some(err) = ctx.err() {
            return Err(ProvisionError::new(
                StatusCode::ProvisioningFailed,
                format!("{} not started, {}", self.name(), err),
            ));
        }

        info!("State: Execute {}", self.name());
        match self {
            StateKind::Init => init::execute(ctx, cs)?,
            StateKind::Install => install::execute(ctx, cs)?,
            StateKind::UpdateFirmware => update_firmware::execute(ctx, cs)?,
            StateKind::PostInstall => post_install::execute(ctx, cs)?,
            // Firmware is already verified by UpdateFirmware; nothing else
            // is checked after install.
            StateKind::Verify => (),
            StateKind::ProvisionDlc => provision_dlc::execute(ctx, cs)?,
            StateKind::InstallMiniOs => install_minios::execute(ctx, cs)?,
        }
        info!("State: {} Completed", self.name());
        Ok(())
    }
}

/// Every state with whether it would run for `cs` as currently configured.
pub fn plan(cs: &CrosService) -> Vec<(StateKind, bool)> {
    StateKind::CHAIN
        .iter()
        .map(|state| (*state, state.should_run(cs)))
        .collect()
}

/// Run the whole chain, stopping at the first failing state.
pub fn run(ctx: &Context, cs: &mut CrosService) -> error::Result<()> {
    let mut state = Some(StateKind::Init);
    while let Some(current) = state {
        current.execute(ctx, cs)?;
        state = current.next();
    }
    info!("provisioning completed");
    Ok(())
}
