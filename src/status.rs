// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Machine-readable outcome of a provisioning run.
//!
//! Callers decide whether to retry based on the status alone, so the names
//! match the ones used by the test lab, typo included.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    #[serde(rename = "STATUS_OK")]
    Ok,
    #[serde(rename = "STATUS_PRE_PROVISION_SETUP_FAILED")]
    PreProvisionSetupFailed,
    #[serde(rename = "STATUS_DOWNLOADING_IMAGE_FAILED")]
    DownloadingImageFailed,
    #[serde(rename = "STATUS_PROVISIONING_FAILED")]
    ProvisioningFailed,
    #[serde(rename = "STATUS_UPDATE_FIRMWARE_FAILED")]
    UpdateFirmwareFailed,
    #[serde(rename = "STATUS_FIRMWARE_MISMATCH_POST_FIRMWARE_UPDATE")]
    FirmwareMismatchPostFirmwareUpdate,
    #[serde(rename = "STATUS_STABLIZE_DUT_FAILED")]
    StabilizeDutFailed,
    #[serde(rename = "STATUS_POST_PROVISION_SETUP_FAILED")]
    PostProvisionSetupFailed,
    #[serde(rename = "STATUS_DUT_UNREACHABLE_POST_PROVISION")]
    DutUnreachablePostProvision,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Ok => "STATUS_OK",
            StatusCode::PreProvisionSetupFailed => "STATUS_PRE_PROVISION_SETUP_FAILED",
            StatusCode::DownloadingImageFailed => "STATUS_DOWNLOADING_IMAGE_FAILED",
            StatusCode::ProvisioningFailed => "STATUS_PROVISIONING_FAILED",
            StatusCode::UpdateFirmwareFailed => "STATUS_UPDATE_FIRMWARE_FAILED",
            StatusCode::FirmwareMismatchPostFirmwareUpdate => {
                "STATUS_FIRMWARE_MISMATCH_POST_FIRMWARE_UPDATE"
            }
            StatusCode::StabilizeDutFailed => "STATUS_STABLIZE_DUT_FAILED",
            StatusCode::PostProvisionSetupFailed => "STATUS_POST_PROVISION_SETUP_FAILED",
            StatusCode::DutUnreachablePostProvision => "STATUS_DUT_UNREACHABLE_POST_PROVISION",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a provisioning run reports back to its caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResponse {
    pub status: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), ProvisionError>> for InstallResponse {
    fn from(result: Result<(), ProvisionError>) -> Self {
        match result {
            Ok(()) => InstallResponse {
                status: StatusCode::Ok,
                error: None,
            },
            Err(err) => InstallResponse {
                status: err.status(),
                error: Some(err.to_string()),
            },
        }
    }
}
