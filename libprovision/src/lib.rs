// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Building blocks shared by the provisioning state machine: the device
//! connection contract, cancellation, storage paths and the A/B slot model.

pub mod adapter;
pub mod context;
pub mod partition;
pub mod storage;
