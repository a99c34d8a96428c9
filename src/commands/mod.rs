// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Individual provisioning steps.
//!
//! Each command performs one unit of work on the DUT through the service's
//! connection. States run commands in order with `run_commands`, which
//! unwinds the already-run commands of the state when one of them fails.

mod clear_dlc_artifacts;
mod clear_tpm;
mod daemons;
mod dlc;
mod firmware;
mod install_check;
mod install_partitions;
mod lsb_release;
mod marker;
mod minios;
mod post_install;
mod reboot;
mod root_info;
mod stateful;
mod storage_check;
mod wait;

pub use clear_dlc_artifacts::ClearDlcArtifactsCommand;
pub use clear_tpm::ClearTpmCommand;
pub use daemons::{StartDlcserviceCommand, StopDlcserviceCommand, StopSystemDaemonsCommand};
pub use dlc::{CorrectDlcPermissionsCommand, InstallDlcsCommand, MAX_CONCURRENT_DLC_INSTALLS};
pub use firmware::{
    CheckFirmwareSlotCommand, CheckFirmwareUpdaterCommand, RunFirmwareUpdaterCommand,
    VerifyFirmwareCommand,
};
pub use install_check::{CheckInstallNeededCommand, GetVersionCommand};
pub use install_partitions::InstallPartitionsCommand;
pub use lsb_release::GetBoardCommand;
pub use marker::CreateProvisionMarkerCommand;
pub use minios::InstallMiniOsCommand;
pub use post_install::PostInstallCommand;
pub use reboot::RebootCommand;
pub use root_info::GetRootInfoCommand;
pub use stateful::{OverwriteInstallCommand, ProvisionStatefulCommand, WipeStatefulCommand};
pub use storage_check::CheckStoragePathsCommand;
pub use wait::{WaitForDutToStabilizeCommand, WaitForStickyKernelCommand};

use anyhow::Result;
use log::{error, info};

use crate::error::{self, ProvisionError};
use crate::service::CrosService;
use crate::status::StatusCode;

pub trait Command {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn execute(&mut self, cs: &mut CrosService) -> Result<()>;

    /// Undo what `execute` did, as far as possible.
    ///
    /// Called with the service state left by the failing command. Reverts
    /// run on a fresh background context, never the caller's.
    fn revert(&mut self, _cs: &CrosService) -> Result<()> {
        Ok(())
    }

    /// Summary prefixed onto the error returned by `execute`.
    fn error_message(&self) -> &'static str;

    fn status(&self) -> StatusCode {
        StatusCode::ProvisioningFailed
    }
}

/// Run `commands` in order.
///
/// If command `i` fails, commands `i` down to `0` are reverted in that order
/// and the error of command `i` is returned. Revert failures are logged but
/// never replace the original error.
pub fn run_commands(cs: &mut CrosService, commands: &mut [&mut dyn Command]) -> error::Result<()> {
    for i in 0..commands.len() {
        info!("Start {}", commands[i].name());
        if let Err(err) = commands[i].execute(cs) {
            let failure = ProvisionError::from_command(&*commands[i], &err);
            error!("{} failed: {}", commands[i].name(), failure);
            for command in commands[..=i].iter_mut().rev() {
                info!("Revert {}", command.name());
                if let Err(err) = command.revert(cs) {
                    error!("failed to revert {}: {:#}", command.name(), err);
                }
            }
            return Err(failure);
        }
        info!("{} succeeded", commands[i].name());
    }
    Ok(())
}

/// Run a single command, reverting it if it fails.
pub fn run_command(cs: &mut CrosService, command: &mut dyn Command) -> error::Result<()> {
    run_commands(cs, &mut [command])
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for scripting a `MockServiceAdapter`.

    use std::sync::Arc;

    use anyhow::anyhow;
    use libprovision::adapter::MockServiceAdapter;
    use libprovision::partition::{compute_partition_info, PartitionLayout, Slot};
    use libprovision::storage::StoragePath;
    use mockall::Sequence;

    use crate::service::{CrosService, RootInfo};

    pub const IMAGE_PATH: &str = "path/to/image";

    /// Root device reported by the mock DUT, booted from slot A.
    pub fn root_info(slot: Slot) -> RootInfo {
        let layout = PartitionLayout::default();
        let root = format!("root{}", layout.root(slot));
        RootInfo {
            partition_info: compute_partition_info(&layout, &root, "root_disk", slot),
            root,
            root_disk: "root_disk".into(),
            slot,
        }
    }

    pub fn service(mock: MockServiceAdapter) -> CrosService {
        CrosService::new(Arc::new(mock), StoragePath::gs(IMAGE_PATH))
    }

    /// A service whose root info has already been read, booted from slot A.
    pub fn service_with_root(mock: MockServiceAdapter) -> CrosService {
        let mut cs = service(mock);
        cs.machine_metadata.root_info = Some(root_info(Slot::A));
        cs
    }

    fn owned(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    pub fn expect_cmd(
        mock: &mut MockServiceAdapter,
        seq: &mut Sequence,
        cmd: &str,
        args: &[&str],
        output: &str,
    ) {
        let cmd = cmd.to_owned();
        let args = owned(args);
        let output = output.to_owned();
        mock.expect_run_cmd()
            .withf(move |_, c, a| c == cmd && a == args.as_slice())
            .times(1)
            .in_sequence(seq)
            .return_once(move |_, _, _| Ok(output));
    }

    pub fn expect_cmd_err(
        mock: &mut MockServiceAdapter,
        seq: &mut Sequence,
        cmd: &str,
        args: &[&str],
        message: &'static str,
    ) {
        let cmd = cmd.to_owned();
        let args = owned(args);
        mock.expect_run_cmd()
            .withf(move |_, c, a| c == cmd && a == args.as_slice())
            .times(1)
            .in_sequence(seq)
            .return_once(move |_, _, _| Err(anyhow!(message)));
    }

    pub fn expect_path_exists(
        mock: &mut MockServiceAdapter,
        seq: &mut Sequence,
        path: &str,
        exists: bool,
    ) {
        let path = path.to_owned();
        mock.expect_path_exists()
            .withf(move |_, p| p == path)
            .times(1)
            .in_sequence(seq)
            .return_once(move |_, _| Ok(exists));
    }

    pub fn expect_pipe(
        mock: &mut MockServiceAdapter,
        seq: &mut Sequence,
        src: &str,
        pipeline_prefix: &str,
    ) {
        let src = src.to_owned();
        let pipeline_prefix = pipeline_prefix.to_owned();
        mock.expect_pipe_data()
            .withf(move |_, s, p| s == src && p.starts_with(pipeline_prefix.as_str()))
            .times(1)
            .in_sequence(seq)
            .return_once(|_, _, _| Ok(()));
    }

    pub fn expect_pipe_err(
        mock: &mut MockServiceAdapter,
        seq: &mut Sequence,
        src: &str,
        message: &'static str,
    ) {
        let src = src.to_owned();
        mock.expect_pipe_data()
            .withf(move |_, s, _| s == src)
            .times(1)
            .in_sequence(seq)
            .return_once(move |_, _, _| Err(anyhow!(message)));
    }

    pub const UPDATER: &str = "/usr/sbin/chromeos-firmwareupdate";
    pub const CROSID: &str = "SKU=33\nCONFIG_INDEX=9\nFIRMWARE_MANIFEST_KEY='babytiger'\n";
    pub const MANIFEST: &str = r#"{
  "babytiger": {
    "host": { "versions": { "ro": "Google_Coral.10068.113.0", "rw": "Google_Coral.10068.113.0" },
      "keys": { "root": "b11d74edd286c144e1135b49e7f0bc20cf041f10" },
      "image": "images/bios-coral.ro-10068-113-0.rw-10068-113-0.bin" },
    "ec": { "versions": { "ro": "coral_v1.1.7302-d2b56e247", "rw": "coral_v1.1.7302-d2b56e247" } },
    "signature_id": "babytiger"
  }
}
"#;

    /// Script a verification that reads `fwid` as the running firmware.
    pub fn expect_verify(mock: &mut MockServiceAdapter, seq: &mut Sequence, fwid: &str) {
        expect_cmd(mock, seq, UPDATER, &["--manifest"], MANIFEST);
        expect_cmd(mock, seq, "crosid", &[], CROSID);
        expect_cmd(mock, seq, "crossystem", &["fwid"], fwid);
    }

    pub fn expect_restart(mock: &mut MockServiceAdapter, seq: &mut Sequence) {
        mock.expect_restart()
            .times(1)
            .in_sequence(seq)
            .return_once(|_| Ok(()));
    }
}
