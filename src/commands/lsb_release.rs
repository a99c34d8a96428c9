// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Facts read from `/etc/lsb-release` on the DUT.

use anyhow::{anyhow, Context as _, Result};
use lazy_static::lazy_static;
use libprovision::context::Context;
use log::info;
use regex::Regex;

use super::Command;
use crate::service::CrosService;
use crate::status::StatusCode;

pub const LSB_RELEASE_PATH: &str = "/etc/lsb-release";

lazy_static! {
    static ref BOARD_REGEX: Regex = Regex::new(r"CHROMEOS_RELEASE_BOARD=(.*)").unwrap();
    static ref BUILDER_PATH_REGEX: Regex =
        Regex::new(r"CHROMEOS_RELEASE_BUILDER_PATH=(.*)").unwrap();
}

/// Read `/etc/lsb-release` and extract the value captured by `regex`.
pub(crate) fn read_lsb_release_value(
    cs: &CrosService,
    ctx: &Context,
    regex: &Regex,
) -> Result<String> {
    let lsb_release = cs
        .run_cmd(ctx, "cat", &[LSB_RELEASE_PATH])
        .context("failed to read lsb-release")?;
    regex
        .captures(&lsb_release)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().trim().to_owned())
        .ok_or_else(|| anyhow!("failed to parse {} from lsb-release", regex.as_str()))
}

pub(crate) fn builder_path_regex() -> &'static Regex {
    &BUILDER_PATH_REGEX
}

pub struct GetBoardCommand {
    ctx: Context,
}

impl GetBoardCommand {
    pub fn new(ctx: &Context) -> Self {
        GetBoardCommand { ctx: ctx.clone() }
    }
}

impl Command for GetBoardCommand {
    fn name(&self) -> &'static str {
        "GetBoardCommand"
    }

    fn execute(&mut self, cs: &mut CrosService) -> Result<()> {
        let board = read_lsb_release_value(cs, &self.ctx, &BOARD_REGEX)?;
        info!("board: {}", board);
        cs.machine_metadata.board = board;
        Ok(())
    }

    fn error_message(&self) -> &'static str {
        "failed to get board"
    }

    fn status(&self) -> StatusCode {
        StatusCode::PreProvisionSetupFailed
    }
}
