// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Updating the AP firmware with the updater bundled in the new OS.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context as _, Result};
use lazy_static::lazy_static;
use libprovision::context::Context;
use log::{info, warn};
use regex::Regex;
use serde::Deserialize;

use super::Command;
use crate::service::CrosService;
use crate::status::StatusCode;

lazy_static! {
    static ref FIRMWARE_MANIFEST_KEY_REGEX: Regex =
        Regex::new(r"FIRMWARE_MANIFEST_KEY='(.*)'").unwrap();
}

/// Output of `chromeos-firmwareupdate --manifest`, keyed by model. Only the
/// fields needed to find the bundled RW version are kept.
type FirmwareManifest = HashMap<String, FirmwareManifestEntry>;

#[derive(Debug, Deserialize)]
struct FirmwareManifestEntry {
    host: FirmwareImage,
}

#[derive(Debug, Deserialize)]
struct FirmwareImage {
    versions: FirmwareVersions,
}

#[derive(Debug, Deserialize)]
struct FirmwareVersions {
    rw: String,
}

/// Look for the firmware updater on the DUT. Builds without one (e.g.
/// public builds) skip the firmware update.
pub struct CheckFirmwareUpdaterCommand {
    ctx: Context,
    pub updater_exists: bool,
}

impl CheckFirmwareUpdaterCommand {
    pub fn new(ctx: &Context) -> Self {
        CheckFirmwareUpdaterCommand {
            ctx: ctx.clone(),
            updater_exists: false,
        }
    }
}

impl Command for CheckFirmwareUpdaterCommand {
    fn name(&self) -> &'static str {
        "CheckFirmwareUpdaterCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        self.updater_exists = cs
            .connection
            .path_exists(&self.ctx, &cs.config.firmware_updater_path)?;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to check if firmware updater exists"
    }

    fn status(&self) -> StatusCode {
        StatusCode::UpdateFirmwareFailed
    }
}

pub struct RunFirmwareUpdaterCommand {
    ctx: Context,
}

impl RunFirmwareUpdaterCommand {
    pub fn new(ctx: &Context) -> Self {
        RunFirmwareUpdaterCommand { ctx: ctx.clone() }
    }
}

impl Command for RunFirmwareUpdaterCommand {
    fn name(&self) -> &'static str {
        "RunFirmwareUpdaterCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        cs.run_cmd(
            &self.ctx,
            &cs.config.firmware_updater_path,
            &["--wp=1", "--mode=autoupdate"],
        )?;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to run firmware updater"
    }

    fn status(&self) -> StatusCode {
        StatusCode::UpdateFirmwareFailed
    }
}

/// Check whether the updater switched the firmware slot to boot next,
/// which takes a reboot to apply.
pub struct CheckFirmwareSlotCommand {
    ctx: Context,
    pub reboot_required: bool,
}

impl CheckFirmwareSlotCommand {
    pub fn new(ctx: &Context) -> Self {
        CheckFirmwareSlotCommand {
            ctx: ctx.clone(),
            reboot_required: false,
        }
    }
}

impl Command for CheckFirmwareSlotCommand {
    fn name(&self) -> &'static str {
        "CheckFirmwareSlotCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let current = cs
            .run_cmd(
                &self.ctx,
                "crossystem",
                &[cs.config.crossystem_current_fw_slot_key.as_str()],
            )
            .context("failed to read current firmware slot")?;
        let next = cs
            .run_cmd(
                &self.ctx,
                "crossystem",
                &[cs.config.crossystem_next_fw_slot_key.as_str()],
            )
            .context("failed to read next firmware slot")?;
        let (current, next) = (current.trim(), next.trim());
        info!("firmware slot: current {}, next {}", current, next);
        self.reboot_required = current != next;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to check firmware slot"
    }

    fn status(&self) -> StatusCode {
        StatusCode::UpdateFirmwareFailed
    }
}

/// Compare the running RW firmware with the version bundled in the OS.
///
/// Only an actual mismatch fails; being unable to read either version is
/// logged and ignored.
pub struct VerifyFirmwareCommand {
    ctx: Context,
}

impl VerifyFirmwareCommand {
    pub fn new(ctx: &Context) -> Self {
        VerifyFirmwareCommand { ctx: ctx.clone() }
    }

    fn firmware_target(&self, cs: &CrosService) -> Result<String> {
        let crosid = cs.run_cmd(&self.ctx, "crosid", &[])?;
        FIRMWARE_MANIFEST_KEY_REGEX
            .captures(&crosid)
            .and_then(|caps| caps.get(1))
            .map(|key| key.as_str().to_owned())
            .ok_or_else(|| anyhow!("unable to parse FIRMWARE_MANIFEST_KEY from crosid"))
    }

    fn available_version(&self, cs: &CrosService) -> Result<String> {
        let manifest = cs
            .run_cmd(&self.ctx, &cs.config.firmware_updater_path, &["--manifest"])
            .context("failed to get firmware manifest")?;
        let mut manifest: FirmwareManifest =
            serde_json::from_str(&manifest).context("failed to parse firmware manifest")?;
        let model = self
            .firmware_target(cs)
            .context("failed to get firmware target")?;
        let entry = manifest
            .remove(&model)
            .ok_or_else(|| anyhow!("no firmware for {} in manifest", model))?;
        Ok(entry.host.versions.rw)
    }

    fn current_version(&self, cs: &CrosService) -> Result<String> {
        let fwid = cs
            .run_cmd(&self.ctx, "crossystem", &["fwid"])
            .context("failed to read current firmware")?;
        Ok(fwid.trim().to_owned())
    }
}

impl Command for VerifyFirmwareCommand {
    fn name(&self) -> &'static str {
        "VerifyFirmwareCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let expected = match self.available_version(cs) {
            Ok(version) => version,
            Err(err) => {
                warn!("skipping firmware verification: {:#}", err);
                return Ok(());
            }
        };
        let actual = match self.current_version(cs) {
            Ok(version) => version,
            Err(err) => {
                warn!("skipping firmware verification: {:#}", err);
                return Ok(());
            }
        };
        info!("firmware: expected {}, actual {}", expected, actual);
        if expected != actual {
            bail!(
                "firmware version mismatch after update, expected: {}, actual: {}",
                expected,
                actual
            );
        }
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "firmware installed does not match with OS bundled firmware"
    }

    fn status(&self) -> StatusCode {
        StatusCode::FirmwareMismatchPostFirmwareUpdate
    }
}
