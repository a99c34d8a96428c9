// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use thiserror::Error;

use crate::commands::Command;
use crate::status::StatusCode;

/// Failure of a provisioning state, as reported to the caller.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ProvisionError {
    status: StatusCode,
    message: String,
}

impl ProvisionError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        ProvisionError {
            status,
            message: message.into(),
        }
    }

    /// Wrap the error returned by `command`, prefixed with its summary.
    pub fn from_command(command: &dyn Command, err: &anyhow::Error) -> Self {
        ProvisionError {
            status: command.status(),
            message: format!("{}, {}", command.error_message(), chain_to_string(err)),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Flatten an error and all of its causes into one line, outermost first.
pub fn chain_to_string(err: &anyhow::Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
