// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Reset and repopulate stateful on the freshly booted OS.

use libprovision::context::Context;

use crate::commands::{
    run_commands, Command, GetRootInfoCommand, OverwriteInstallCommand, ProvisionStatefulCommand,
    RebootCommand, StopSystemDaemonsCommand, WaitForDutToStabilizeCommand,
    WaitForStickyKernelCommand, WipeStatefulCommand,
};
use crate::error;
use crate::service::CrosService;

pub(super) fn execute(ctx: &Context, cs: &mut CrosService) -> error::Result<()> {
    let mut wait = WaitForDutToStabilizeCommand::new(ctx);
    let mut wipe = WipeStatefulCommand::new(ctx);
    let mut stop_daemons = StopSystemDaemonsCommand::new(ctx);
    let mut provision_stateful = ProvisionStatefulCommand::new(ctx);
    let mut overwrite = OverwriteInstallCommand::new(ctx);
    let mut overwrite_reboot = RebootCommand::new(ctx);
    // The DUT now boots from the other slot.
    let mut root_info = GetRootInfoCommand::new(ctx);
    let mut sticky_kernel = WaitForStickyKernelCommand::new(ctx);

    let mut commands: Vec<&mut dyn Command> = vec![&mut wait];
    if !cs.preserve_stateful {
        commands.push(&mut wipe);
    }
    commands.push(&mut stop_daemons);
    commands.push(&mut provision_stateful);
    if cs.overwrite_payload.is_some() {
        commands.push(&mut overwrite);
        commands.push(&mut overwrite_reboot);
    }
    commands.push(&mut root_info);
    if cs.wait_for_sticky_kernel {
        commands.push(&mut sticky_kernel);
    }
    run_commands(cs, &mut commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;
    use libprovision::adapter::MockServiceAdapter;
    use libprovision::storage::StoragePath;
    use mockall::Sequence;

    const STATEFUL_PIPELINE: &str =
        "tar --ignore-command-error --overwrite --directory=/mnt/stateful_partition --selinux -xzf -";

    fn expect_stateful_until_copy(mock: &mut MockServiceAdapter, seq: &mut Sequence) {
        expect_cmd(mock, seq, "stop", &["ui"], "");
        expect_cmd(mock, seq, "stop", &["update-engine"], "");
        expect_cmd(
            mock,
            seq,
            "rm",
            &[
                "-rf",
                "/mnt/stateful_partition/.update_available",
                "/mnt/stateful_partition/var_new",
                "/mnt/stateful_partition/dev_image_new",
            ],
            "",
        );
    }

    fn expect_stateful_after_copy(mock: &mut MockServiceAdapter, seq: &mut Sequence) {
        expect_cmd(
            mock,
            seq,
            "echo",
            &[
                "-n",
                "clobber",
                ">",
                "/mnt/stateful_partition/.update_available",
            ],
            "",
        );
        expect_restart(mock, seq);
    }

    fn expect_root_info(mock: &mut MockServiceAdapter, seq: &mut Sequence) {
        expect_cmd(mock, seq, "rootdev", &["-s"], "root3");
        expect_cmd(mock, seq, "rootdev", &["-s", "-d"], "root_disk");
    }

    #[test]
    fn test_preserve_stateful_skips_wipe() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_cmd(&mut mock, &mut seq, "status", &["system-services"], "start/running");
        expect_stateful_until_copy(&mut mock, &mut seq);
        expect_pipe(&mut mock, &mut seq, "gs://path/to/image/stateful.tgz", STATEFUL_PIPELINE);
        expect_stateful_after_copy(&mut mock, &mut seq);
        expect_root_info(&mut mock, &mut seq);

        let mut cs = service_with_root(mock);
        cs.preserve_stateful = true;
        execute(&Context::background(), &mut cs).unwrap();
    }

    #[test]
    fn test_stateful_failure_is_reverted() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_cmd(&mut mock, &mut seq, "status", &["system-services"], "start/running");
        expect_stateful_until_copy(&mut mock, &mut seq);
        expect_pipe_err(&mut mock, &mut seq, "gs://path/to/image/stateful.tgz", "copy error");
        expect_cmd(
            &mut mock,
            &mut seq,
            "rm",
            &[
                "-rf",
                "/mnt/stateful_partition/var_new",
                "/mnt/stateful_partition/dev_image_new",
                "/mnt/stateful_partition/.update_available",
            ],
            "",
        );

        let mut cs = service_with_root(mock);
        cs.preserve_stateful = true;
        let err = execute(&Context::background(), &mut cs).unwrap_err();
        assert_eq!(err.to_string(), "failed to provision stateful, copy error");
    }

    #[test]
    fn test_overwrite_payload_and_sticky_kernel() {
        let mut mock = MockServiceAdapter::new();
        let mut seq = Sequence::new();
        expect_cmd(&mut mock, &mut seq, "status", &["system-services"], "start/running");
        expect_cmd(
            &mut mock,
            &mut seq,
            "echo",
            &[
                "'fast keepimg'",
                ">",
                "/mnt/stateful_partition/factory_install_reset",
            ],
            "",
        );
        expect_restart(&mut mock, &mut seq);
        expect_stateful_until_copy(&mut mock, &mut seq);
        expect_pipe(&mut mock, &mut seq, "gs://path/to/image/stateful.tgz", STATEFUL_PIPELINE);
        expect_stateful_after_copy(&mut mock, &mut seq);
        expect_pipe(&mut mock, &mut seq, "path/to/image/overwite.tar", "tar xf - -C /");
        expect_restart(&mut mock, &mut seq);
        expect_cmd(&mut mock, &mut seq, "rootdev", &["-s"], "root5");
        expect_cmd(&mut mock, &mut seq, "rootdev", &["-s", "-d"], "root_disk");
        expect_cmd(
            &mut mock,
            &mut seq,
            "cgpt",
            &["show", "-S", "-i", "4", "root_disk"],
            "1",
        );

        let mut cs = service_with_root(mock);
        cs.overwrite_payload = Some(StoragePath::gs("path/to/image/overwite.tar"));
        cs.wait_for_sticky_kernel = true;
        execute(&Context::background(), &mut cs).unwrap();
        assert_eq!(
            cs.root_info().unwrap().partition_info.active_root,
            "root_diskroot5"
        );
    }
}
