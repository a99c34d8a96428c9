// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Provisioning of a ChromeOS device under test (DUT).
//!
//! A run walks a fixed chain of states (`state_machine`), each made of
//! revertible steps (`commands`) issued through a `ServiceAdapter`.

pub mod commands;
pub mod config;
pub mod error;
pub mod process_util;
pub mod service;
pub mod ssh_adapter;
pub mod state_machine;
pub mod status;
