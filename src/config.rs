// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Provisioning request and the on-device layout it operates on.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use libprovision::partition::PartitionLayout;
use libprovision::storage::StoragePath;
use serde::{Deserialize, Serialize};

/// Paths and constants of the ChromeOS image being provisioned.
///
/// The defaults describe a stock ChromeOS test image; tests and unusual
/// boards can override individual fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Created at the start of every run and wiped along with stateful, so
    /// its presence after a run means provisioning failed.
    pub provision_marker: String,
    pub stateful_path: String,
    pub dlc_cache_dir: String,
    pub dlc_lib_dir: String,
    pub dlc_package: String,
    pub dlc_image: String,
    pub dlc_verified: String,
    pub firmware_updater_path: String,
    pub crossystem_current_fw_slot_key: String,
    pub crossystem_next_fw_slot_key: String,
    /// GPT type GUID of MiniOS partitions on boards without MiniOS support.
    pub minios_unsupported_guid: String,
    /// Boards (by prefix) whose TPM owner must not be cleared.
    pub clear_tpm_skip_boards: Vec<String>,
    pub partitions: PartitionLayout,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        ProvisionConfig {
            provision_marker: "/var/tmp/provision_failed".into(),
            stateful_path: "/mnt/stateful_partition".into(),
            dlc_cache_dir: "/var/cache/dlc".into(),
            dlc_lib_dir: "/var/lib/dlcservice/dlc".into(),
            dlc_package: "package".into(),
            dlc_image: "dlc.img".into(),
            dlc_verified: "verified".into(),
            firmware_updater_path: "/usr/sbin/chromeos-firmwareupdate".into(),
            crossystem_current_fw_slot_key: "mainfw_act".into(),
            crossystem_next_fw_slot_key: "fw_try_next".into(),
            minios_unsupported_guid: "09845860-705F-4BB5-B16C-8A8A099CAF52".into(),
            clear_tpm_skip_boards: vec!["reven".into()],
            partitions: PartitionLayout::default(),
        }
    }
}

impl ProvisionConfig {
    /// Marker telling the next boot to apply the staged stateful contents.
    pub fn update_stateful_file(&self) -> String {
        format!("{}/.update_available", self.stateful_path)
    }

    /// Marker requesting a stateful wipe on the next boot.
    pub fn factory_reset_file(&self) -> String {
        format!("{}/factory_install_reset", self.stateful_path)
    }

    pub fn stateful_staging_dirs(&self) -> [String; 2] {
        [
            format!("{}/var_new", self.stateful_path),
            format!("{}/dev_image_new", self.stateful_path),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlcSpec {
    pub id: String,
}

impl DlcSpec {
    pub fn new<S: Into<String>>(id: S) -> Self {
        DlcSpec { id: id.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutAddress {
    pub address: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
}

/// Everything needed to provision one DUT, as read from `--input`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub dut: DutAddress,
    pub image_path: StoragePath,
    #[serde(default)]
    pub overwrite_payload: Option<StoragePath>,
    #[serde(default)]
    pub preserve_stateful: bool,
    #[serde(default)]
    pub dlc_specs: Vec<DlcSpec>,
    #[serde(default)]
    pub update_firmware: bool,
    #[serde(default)]
    pub prevent_reboot: bool,
    /// Skip the OS install when the DUT already runs the requested build.
    #[serde(default)]
    pub check_install_needed: bool,
    #[serde(default)]
    pub wait_for_sticky_kernel: bool,
    /// Overall deadline for the run.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub config: ProvisionConfig,
}

impl ProvisionRequest {
    /// Read and validate a JSON request from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let request: ProvisionRequest = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dut.address.is_empty() {
            bail!("DUT address not specified");
        }
        self.image_path.remote_path().context("image path")?;
        if let Some(payload) = &self.overwrite_payload {
            payload.remote_path().context("overwrite payload")?;
        }
        let mut seen = HashSet::new();
        for spec in &self.dlc_specs {
            if spec.id.is_empty() {
                bail!("DLC spec with an empty id");
            }
            if !seen.insert(spec.id.as_str()) {
                bail!("duplicate DLC id {}", spec.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libprovision::storage::HostType;

    const MINIMAL_REQUEST: &str = r#"
{
  "dut": { "address": "chromeos1-row1-host1" },
  "image_path": { "host_type": "GS", "path": "chromeos-image-archive/eve-release/R120-15662.0.0" }
}
"#;

    #[test]
    fn test_minimal_request_defaults() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("request.json");
        fs::write(&path, MINIMAL_REQUEST).unwrap();

        let request = ProvisionRequest::from_file(&path).unwrap();
        assert_eq!(request.image_path.host_type, HostType::Gs);
        assert!(request.dlc_specs.is_empty());
        assert!(!request.preserve_stateful);
        assert!(!request.update_firmware);
        assert_eq!(request.overwrite_payload, None);
        assert_eq!(request.config, ProvisionConfig::default());
    }

    #[test]
    fn test_partial_config_override() {
        let request: ProvisionRequest = serde_json::from_str(
            r#"
{
  "dut": { "address": "dut", "port": 2222 },
  "image_path": { "host_type": "GS", "path": "bucket/board-release/R1-1.0.0" },
  "dlc_specs": [{ "id": "sample-dlc" }],
  "config": { "stateful_path": "/mnt/other", "partitions": { "root_a": 13 } }
}
"#,
        )
        .unwrap();
        assert_eq!(request.dut.port, Some(2222));
        assert_eq!(request.config.stateful_path, "/mnt/other");
        assert_eq!(
            request.config.update_stateful_file(),
            "/mnt/other/.update_available"
        );
        assert_eq!(request.config.partitions.root_a, 13);
        assert_eq!(request.config.partitions.root_b, 5);
        assert_eq!(request.config.dlc_cache_dir, "/var/cache/dlc");
    }

    #[test]
    fn test_request_errors() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("request.json");

        // Path does not exist.
        assert!(ProvisionRequest::from_file(&path).is_err());

        // File contains invalid data.
        fs::write(&path, "invalid data").unwrap();
        assert!(ProvisionRequest::from_file(&path).is_err());
    }

    #[test]
    fn test_local_paths_rejected() {
        let mut request: ProvisionRequest = serde_json::from_str(MINIMAL_REQUEST).unwrap();
        request.overwrite_payload = Some(StoragePath {
            host_type: HostType::Local,
            path: "/tmp/overwite.tar".into(),
        });
        let err = request.validate().unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "overwrite payload: only GS copying is implemented"
        );

        request.overwrite_payload = None;
        request.image_path.host_type = HostType::Unspecified;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_duplicate_dlc_ids_rejected() {
        let mut request: ProvisionRequest = serde_json::from_str(MINIMAL_REQUEST).unwrap();
        request.dlc_specs = vec![DlcSpec::new("a"), DlcSpec::new("b")];
        request.validate().unwrap();

        request.dlc_specs.push(DlcSpec::new("a"));
        assert!(request.validate().is_err());
    }
}
