// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::context::Context;
use anyhow::Result;

/// Connection to a device under test.
///
/// Every provisioning step goes through this trait; nothing above it knows
/// whether the DUT is reached over SSH, a DUT service or something else.
/// Implementations must be safe to share between threads since DLC installs
/// are issued concurrently.
#[cfg_attr(feature = "test_util", mockall::automock)]
pub trait ServiceAdapter: Send + Sync {
    /// Run `cmd` with `args` on the DUT and return its stdout.
    ///
    /// The arguments are handed to the remote shell, so redirections such
    /// as `>` work.
    fn run_cmd(&self, ctx: &Context, cmd: &str, args: &[String]) -> Result<String>;

    /// Check whether `path` exists on the DUT.
    fn path_exists(&self, ctx: &Context, path: &str) -> Result<bool>;

    /// Copy the storage object `src` to the DUT file `dst`.
    fn copy_data(&self, ctx: &Context, src: &str, dst: &str) -> Result<()>;

    /// Stream the storage object `src` into the stdin of the shell
    /// `pipeline` run on the DUT.
    fn pipe_data(&self, ctx: &Context, src: &str, pipeline: &str) -> Result<()>;

    /// Create `paths` on the DUT, including missing parents.
    fn create_directories(&self, ctx: &Context, paths: &[String]) -> Result<()>;

    /// Recursively delete `path` on the DUT.
    fn delete_directory(&self, ctx: &Context, path: &str) -> Result<()>;

    /// Reboot the DUT and block until it is reachable again.
    fn restart(&self, ctx: &Context) -> Result<()>;
}
