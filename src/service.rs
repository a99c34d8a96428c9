// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The per-run provisioning service shared by every state and command.

use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use libprovision::adapter::ServiceAdapter;
use libprovision::context::Context;
use libprovision::partition::{PartitionInfo, Slot};
use libprovision::storage::StoragePath;
use log::debug;

use crate::config::{DlcSpec, ProvisionConfig, ProvisionRequest};

/// Root device facts gathered from the DUT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootInfo {
    /// e.g. /dev/nvme0n1p3
    pub root: String,
    /// e.g. /dev/nvme0n1
    pub root_disk: String,
    pub slot: Slot,
    pub partition_info: PartitionInfo,
}

/// What is known about the DUT so far. Filled in by commands as they run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MachineMetadata {
    pub board: String,
    pub version: String,
    pub root_info: Option<RootInfo>,
}

pub struct CrosService {
    pub connection: Arc<dyn ServiceAdapter>,
    pub image_path: StoragePath,
    pub overwrite_payload: Option<StoragePath>,
    pub preserve_stateful: bool,
    pub dlc_specs: Vec<DlcSpec>,
    pub update_firmware: bool,
    /// Whether the OS itself is (re)installed. Cleared by the install check
    /// when the DUT already runs the requested build.
    pub update_cros: bool,
    pub check_install_needed: bool,
    pub wait_for_sticky_kernel: bool,
    pub config: ProvisionConfig,
    pub machine_metadata: MachineMetadata,
}

impl CrosService {
    pub fn new(connection: Arc<dyn ServiceAdapter>, image_path: StoragePath) -> Self {
        CrosService {
            connection,
            image_path,
            overwrite_payload: None,
            preserve_stateful: false,
            dlc_specs: Vec::new(),
            update_firmware: false,
            update_cros: true,
            check_install_needed: false,
            wait_for_sticky_kernel: false,
            config: ProvisionConfig::default(),
            machine_metadata: MachineMetadata::default(),
        }
    }

    pub fn from_request(connection: Arc<dyn ServiceAdapter>, request: ProvisionRequest) -> Self {
        CrosService {
            overwrite_payload: request.overwrite_payload,
            preserve_stateful: request.preserve_stateful,
            dlc_specs: request.dlc_specs,
            update_firmware: request.update_firmware,
            check_install_needed: request.check_install_needed,
            wait_for_sticky_kernel: request.wait_for_sticky_kernel,
            config: request.config,
            ..CrosService::new(connection, request.image_path)
        }
    }

    /// Run `cmd` on the DUT.
    pub fn run_cmd(&self, ctx: &Context, cmd: &str, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        let output = self.connection.run_cmd(ctx, cmd, &args)?;
        debug!("{} {}: {}", cmd, args.join(" "), output.trim_end());
        Ok(output)
    }

    /// The root device facts, which must have been gathered already.
    pub fn root_info(&self) -> Result<&RootInfo> {
        self.machine_metadata
            .root_info
            .as_ref()
            .ok_or_else(|| anyhow!("root info has not been read from the DUT"))
    }

    /// Stream the gzipped image `remote_file` from the image directory into
    /// the block device `output_device`.
    pub fn install_zipped_image(
        &self,
        ctx: &Context,
        remote_file: &str,
        output_device: &str,
    ) -> Result<()> {
        let source = self.image_path.join(remote_file)?;
        let pipeline = format!(
            "gzip -d | dd of={} obs=2M {}",
            output_device,
            pipestatus_handler(&self.image_path.path, output_device)
        );
        self.connection
            .pipe_data(ctx, &source, &pipeline)
            .context("failed to install image")
    }
}

/// Shell snippet reporting which stage of a fetch | gzip | dd pipeline
/// failed.
fn pipestatus_handler(image_path: &str, output_device: &str) -> String {
    format!(
        "
pipestatus=(\"${{PIPESTATUS[@]}}\")
if [[ \"${{pipestatus[0]}}\" -ne 0 ]]; then
  echo \"$(date --rfc-3339=seconds) ERROR: Fetching {image_path} failed.\" >&2
  exit 1
elif [[ \"${{pipestatus[1]}}\" -ne 0 ]]; then
  echo \"$(date --rfc-3339=seconds) ERROR: Decompressing {image_path} failed.\" >&2
  exit 1
elif [[ \"${{pipestatus[2]}}\" -ne 0 ]]; then
  echo \"$(date --rfc-3339=seconds) ERROR: Writing to {output_device} failed.\" >&2
  exit 1
fi"
    )
}
