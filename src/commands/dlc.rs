// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Installing DLC images into the dlcservice cache.

use std::thread;

use anyhow::{anyhow, bail, Context as _, Result};
use crossbeam_channel::{bounded, unbounded};
use libprovision::context::Context;
use libprovision::partition::Slot;
use log::info;

use super::Command;
use crate::config::DlcSpec;
use crate::error::chain_to_string;
use crate::service::CrosService;

/// Upper bound on DLC downloads running at the same time.
pub const MAX_CONCURRENT_DLC_INSTALLS: usize = 8;

/// Install every requested DLC for the active slot.
///
/// DLCs are independent of each other, so they are fetched in parallel by a
/// bounded set of workers. Every DLC is attempted even if others fail, and
/// all failures are reported together.
pub struct InstallDlcsCommand {
    ctx: Context,
}

impl InstallDlcsCommand {
    pub fn new(ctx: &Context) -> Self {
        InstallDlcsCommand { ctx: ctx.clone() }
    }
}

fn install_dlc(cs: &CrosService, ctx: &Context, spec: &DlcSpec, slot: Slot) -> Result<()> {
    let config = &cs.config;
    let id = spec.id.as_str();

    let verified_marker = format!(
        "{}/{}/{}/{}",
        config.dlc_lib_dir,
        id,
        slot.dlc_dir(),
        config.dlc_verified
    );
    let verified = cs
        .connection
        .path_exists(ctx, &verified_marker)
        .with_context(|| format!("failed to check if DLC {} is verified", id))?;
    if verified {
        info!("DLC {} is already verified, skipping", id);
        return Ok(());
    }

    let source = cs.image_path.join(&format!(
        "dlc/{}/{}/{}",
        id, config.dlc_package, config.dlc_image
    ))?;
    let output_dir = format!(
        "{}/{}/{}/{}",
        config.dlc_cache_dir,
        id,
        config.dlc_package,
        slot.dlc_dir()
    );
    let output_image = format!("{}/{}", output_dir, config.dlc_image);
    cs.connection
        .create_directories(ctx, &[output_dir])
        .with_context(|| format!("failed to create DLC directories {}", id))?;
    cs.connection
        .copy_data(ctx, &source, &output_image)
        .with_context(|| format!("failed to download DLC {}", id))?;
    info!("installed DLC {}", id);
    Ok(())
}

impl Command for InstallDlcsCommand {
    fn name(&self) -> &'static str {
        "InstallDlcsCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        if cs.dlc_specs.is_empty() {
            return Ok(());
        }
        let cs: &CrosService = cs;
        let ctx = &self.ctx;
        let slot = cs.root_info()?.slot;

        let (job_tx, job_rx) = unbounded::<&DlcSpec>();
        for spec in &cs.dlc_specs {
            job_tx
                .send(spec)
                .map_err(|_| anyhow!("DLC job queue closed"))?;
        }
        drop(job_tx);

        // Room for every result, so workers never block on reporting.
        let (result_tx, result_rx) = bounded(cs.dlc_specs.len());
        let workers = cs.dlc_specs.len().min(MAX_CONCURRENT_DLC_INSTALLS);
        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for spec in job_rx.iter() {
                        if result_tx.send(install_dlc(cs, ctx, spec, slot)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let failures: Vec<String> = result_rx
            .iter()
            .filter_map(|result| result.err())
            .map(|err| chain_to_string(&err))
            .collect();
        if !failures.is_empty() {
            bail!("{}", failures.join(", "));
        }
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to install DLCs"
    }
}

/// Hand the DLC cache back to dlcservice after files were copied in as root.
pub struct CorrectDlcPermissionsCommand {
    ctx: Context,
}

impl CorrectDlcPermissionsCommand {
    pub fn new(ctx: &Context) -> Self {
        CorrectDlcPermissionsCommand { ctx: ctx.clone() }
    }
}

impl Command for CorrectDlcPermissionsCommand {
    fn name(&self) -> &'static str {
        "CorrectDlcPermissionsCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let cache_dir = cs.config.dlc_cache_dir.as_str();
        cs.run_cmd(&self.ctx, "chown", &["-R", "dlcservice:dlcservice", cache_dir])
            .context("failed to change DLC cache owner")?;
        cs.run_cmd(&self.ctx, "chmod", &["-R", "0755", cache_dir])
            .context("failed to change DLC cache permissions")?;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to correct DLC permissions"
    }
}
