// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! `ServiceAdapter` reaching the DUT with the local `ssh` client.
//!
//! Storage objects are fetched on the host with `gsutil` and streamed to the
//! DUT over the same ssh connection, so the DUT needs no storage credentials.

use std::process::Command;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context as _, Result};
use libprovision::adapter::ServiceAdapter;
use libprovision::context::Context;
use libprovision::storage::bucket_join;
use log::{debug, info};

use crate::config::DutAddress;
use crate::process_util::{check_output, command_to_string, run_piped, run_with_context};

const SSH_PROGRAM: &str = "ssh";
const GSUTIL_PROGRAM: &str = "gsutil";
const CONNECT_TIMEOUT_SECS: u32 = 10;
/// ssh exits with this code when the connection itself failed.
const SSH_CONNECTION_ERROR: i32 = 255;

/// Changes on every boot of the DUT.
const BOOT_ID_PATH: &str = "/proc/sys/kernel/random/boot_id";

const RESTART_TIMEOUT: Duration = Duration::from_secs(300);
#[cfg(not(test))]
const RESTART_POLL_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const RESTART_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r#"'\''"#))
}

pub struct SshAdapter {
    ssh_program: String,
    address: String,
    port: Option<u16>,
    user: String,
    prevent_reboot: bool,
}

impl SshAdapter {
    pub fn new(dut: &DutAddress, prevent_reboot: bool) -> Self {
        SshAdapter {
            ssh_program: SSH_PROGRAM.to_string(),
            address: dut.address.clone(),
            port: dut.port,
            user: dut.user.clone().unwrap_or_else(|| "root".to_string()),
            prevent_reboot,
        }
    }

    /// Build the local `ssh` invocation running `remote` on the DUT.
    fn ssh_command(&self, remote: &str) -> Command {
        let mut cmd = Command::new(&self.ssh_program);
        cmd.args([
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            "UserKnownHostsFile=/dev/null",
            "-o",
            "BatchMode=yes",
            "-o",
            "LogLevel=ERROR",
            "-o",
        ])
        .arg(format!("ConnectTimeout={}", CONNECT_TIMEOUT_SECS));
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        cmd.arg(format!("{}@{}", self.user, self.address))
            .arg(remote);
        cmd
    }

    fn gsutil_cat(src: &str) -> Command {
        let mut cmd = Command::new(GSUTIL_PROGRAM);
        cmd.arg("cat").arg(bucket_join(src, ""));
        cmd
    }

    /// Run `remote` on the DUT, failing on a non-zero exit.
    fn run_remote(&self, ctx: &Context, remote: &str) -> Result<String> {
        let cmd = self.ssh_command(remote);
        let cmd_str = command_to_string(&cmd);
        let output = check_output(cmd_str, run_with_context(ctx, cmd)?)?;
        Ok(String::from_utf8(output.stdout)?)
    }

    fn boot_id(&self, ctx: &Context) -> Result<String> {
        Ok(self
            .run_remote(ctx, &format!("cat {}", BOOT_ID_PATH))?
            .trim()
            .to_string())
    }

    /// Poll until the DUT answers with a boot id other than `old_boot_id`.
    fn wait_for_reboot(&self, ctx: &Context, old_boot_id: &str) -> Result<()> {
        let ctx = ctx.with_timeout(RESTART_TIMEOUT);
        let start = Instant::now();
        loop {
            match self.boot_id(&ctx) {
                Ok(boot_id) if boot_id != old_boot_id => {
                    info!("DUT back after {:?}", start.elapsed());
                    return Ok(());
                }
                Ok(_) => debug!("DUT has not rebooted yet"),
                Err(err) => debug!("DUT not reachable yet: {:#}", err),
            }
            ctx.sleep(RESTART_POLL_INTERVAL)
                .map_err(|err| anyhow!("{} while waiting for DUT to reboot", err))?;
        }
    }
}

/// The remote command line for `cmd` and `args`.
///
/// Arguments are joined unquoted so redirections reach the remote shell.
fn remote_command_line(cmd: &str, args: &[String]) -> String {
    if args.is_empty() {
        cmd.to_string()
    } else {
        format!("{} {}", cmd, args.join(" "))
    }
}

/// The remote side of `pipe_data`. The leading `cat` keeps the fetch as the
/// first `PIPESTATUS` entry of `pipeline`.
fn remote_pipeline(pipeline: &str) -> String {
    format!("bash -c {}", shell_quote(&format!("cat | {}", pipeline)))
}

impl ServiceAdapter for SshAdapter {
    fn run_cmd(&self, ctx: &Context, cmd: &str, args: &[String]) -> Result<String> {
        self.run_remote(ctx, &remote_command_line(cmd, args))
    }

    fn path_exists(&self, ctx: &Context, path: &str) -> Result<bool> {
        let cmd = self.ssh_command(&format!("test -e {}", shell_quote(path)));
        let cmd_str = command_to_string(&cmd);
        let output = run_with_context(ctx, cmd)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(code) if code != SSH_CONNECTION_ERROR => Ok(false),
            _ => {
                check_output(cmd_str, output)?;
                bail!("unexpected status checking {}", path)
            }
        }
    }

    fn copy_data(&self, ctx: &Context, src: &str, dst: &str) -> Result<()> {
        let consumer = self.ssh_command(&format!("cat > {}", shell_quote(dst)));
        run_piped(ctx, Self::gsutil_cat(src), consumer)
            .with_context(|| format!("failed to copy {} to {}", src, dst))
    }

    fn pipe_data(&self, ctx: &Context, src: &str, pipeline: &str) -> Result<()> {
        let consumer = self.ssh_command(&remote_pipeline(pipeline));
        run_piped(ctx, Self::gsutil_cat(src), consumer)
            .with_context(|| format!("failed to pipe {}", src))
    }

    fn create_directories(&self, ctx: &Context, paths: &[String]) -> Result<()> {
        let quoted: Vec<String> = paths.iter().map(|p| shell_quote(p)).collect();
        self.run_remote(ctx, &format!("mkdir -p {}", quoted.join(" ")))?;
        Ok(())
    }

    fn delete_directory(&self, ctx: &Context, path: &str) -> Result<()> {
        self.run_remote(ctx, &format!("rm -rf {}", shell_quote(path)))?;
        Ok(())
    }

    fn restart(&self, ctx: &Context) -> Result<()> {
        if self.prevent_reboot {
            info!("reboot of {} prevented by request", self.address);
            return Ok(());
        }
        let boot_id = self
            .boot_id(ctx)
            .context("failed to read boot id before reboot")?;
        // The connection usually drops before ssh reports a status.
        if let Err(err) = self.run_remote(ctx, "reboot") {
            debug!("reboot: {:#}", err);
        }
        self.wait_for_reboot(ctx, &boot_id)
    }
}
