// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! A/B slot arithmetic for the ChromeOS disk layout.
//!
//! Everything here is pure: device paths are derived from the root device,
//! the root disk and the active slot, and never from the DUT directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("no partition number found in root device {0:?}")]
    MissingPartitionNumber(String),
    #[error("unexpected root partition number of {0}")]
    InvalidPartitionNumber(String),
}

/// One of the two redundant kernel/root partition sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    /// Name of the per-slot directory dlcservice keeps images and markers in.
    pub fn dlc_dir(self) -> &'static str {
        match self {
            Slot::A => "dlc_a",
            Slot::B => "dlc_b",
        }
    }
}

/// GPT partition numbers of the ChromeOS layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionLayout {
    pub kernel_a: u32,
    pub kernel_b: u32,
    pub root_a: u32,
    pub root_b: u32,
    pub minios_a: u32,
    pub minios_b: u32,
}

impl Default for PartitionLayout {
    fn default() -> Self {
        PartitionLayout {
            kernel_a: 2,
            kernel_b: 4,
            root_a: 3,
            root_b: 5,
            minios_a: 9,
            minios_b: 10,
        }
    }
}

impl PartitionLayout {
    pub fn root(&self, slot: Slot) -> u32 {
        match slot {
            Slot::A => self.root_a,
            Slot::B => self.root_b,
        }
    }

    pub fn kernel(&self, slot: Slot) -> u32 {
        match slot {
            Slot::A => self.kernel_a,
            Slot::B => self.kernel_b,
        }
    }

    /// The MiniOS partitions, A first.
    pub fn minios(&self) -> [u32; 2] {
        [self.minios_a, self.minios_b]
    }

    /// Map a root partition number to its slot.
    pub fn slot_for_root(&self, part_num: u32) -> Option<Slot> {
        if part_num == self.root_a {
            Some(Slot::A)
        } else if part_num == self.root_b {
            Some(Slot::B)
        } else {
            None
        }
    }
}

/// Device paths of the active and inactive partitions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionInfo {
    /// e.g. /dev/nvme0n1p2
    pub active_kernel: String,
    pub active_kernel_num: u32,
    pub inactive_kernel: String,
    pub inactive_kernel_num: u32,
    /// e.g. /dev/nvme0n1p3
    pub active_root: String,
    pub inactive_root: String,
    pub minios_a: String,
    pub minios_b: String,
}

/// Extract the root slot from the output of `rootdev -s`.
///
/// The trailing digits of the device name are the partition number, which
/// must be one of the two root partitions.
pub fn compute_root_part_number(
    layout: &PartitionLayout,
    rootdev_output: &str,
) -> Result<Slot, PartitionError> {
    let root = rootdev_output.trim();
    let digits = &root[root.trim_end_matches(|c: char| c.is_ascii_digit()).len()..];
    if digits.is_empty() {
        return Err(PartitionError::MissingPartitionNumber(root.to_owned()));
    }
    digits
        .parse::<u32>()
        .ok()
        .and_then(|num| layout.slot_for_root(num))
        .ok_or_else(|| PartitionError::InvalidPartitionNumber(digits.to_owned()))
}

/// Compute the partition device paths for a DUT booted from `active`.
///
/// `root` is the root device (`/dev/nvme0n1p3`) and `root_disk` the disk it
/// lives on (`/dev/nvme0n1`). Whatever sits between the disk name and the
/// partition number (`p` for NVMe/eMMC, nothing for SATA) is kept as the
/// partition delimiter.
pub fn compute_partition_info(
    layout: &PartitionLayout,
    root: &str,
    root_disk: &str,
    active: Slot,
) -> PartitionInfo {
    let root_part_num = layout.root(active).to_string();
    let after_disk = root.strip_prefix(root_disk).unwrap_or(root);
    let delim = after_disk
        .strip_suffix(root_part_num.as_str())
        .unwrap_or(after_disk);
    let part = |num: u32| format!("{root_disk}{delim}{num}");

    let inactive = active.other();
    // The MiniOS pair is named relative to the active slot.
    let (minios_a, minios_b) = match active {
        Slot::A => (layout.minios_a, layout.minios_b),
        Slot::B => (layout.minios_b, layout.minios_a),
    };

    PartitionInfo {
        active_kernel: part(layout.kernel(active)),
        active_kernel_num: layout.kernel(active),
        inactive_kernel: part(layout.kernel(inactive)),
        inactive_kernel_num: layout.kernel(inactive),
        active_root: part(layout.root(active)),
        inactive_root: part(layout.root(inactive)),
        minios_a: part(minios_a),
        minios_b: part(minios_b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_root_part_number() {
        let layout = PartitionLayout::default();
        assert_eq!(
            compute_root_part_number(&layout, "/dev/nvme0n1p3\n"),
            Ok(Slot::A)
        );
        assert_eq!(compute_root_part_number(&layout, "/dev/sda5"), Ok(Slot::B));
        assert_eq!(compute_root_part_number(&layout, "root3"), Ok(Slot::A));
    }

    #[test]
    fn test_compute_root_part_number_errors() {
        let layout = PartitionLayout::default();
        assert_eq!(
            compute_root_part_number(&layout, "/dev/sda"),
            Err(PartitionError::MissingPartitionNumber("/dev/sda".into()))
        );
        assert_eq!(
            compute_root_part_number(&layout, ""),
            Err(PartitionError::MissingPartitionNumber("".into()))
        );
        // Partitions that are not a root slot.
        for dev in ["/dev/sda1", "/dev/sda4", "/dev/nvme0n1p13", "/dev/sda99999999999999"] {
            assert!(matches!(
                compute_root_part_number(&layout, dev),
                Err(PartitionError::InvalidPartitionNumber(_))
            ));
        }
    }

    #[test]
    fn test_partition_info_nvme_slot_a() {
        let layout = PartitionLayout::default();
        let info = compute_partition_info(&layout, "/dev/nvme0n1p3", "/dev/nvme0n1", Slot::A);
        assert_eq!(
            info,
            PartitionInfo {
                active_kernel: "/dev/nvme0n1p2".into(),
                active_kernel_num: 2,
                inactive_kernel: "/dev/nvme0n1p4".into(),
                inactive_kernel_num: 4,
                active_root: "/dev/nvme0n1p3".into(),
                inactive_root: "/dev/nvme0n1p5".into(),
                minios_a: "/dev/nvme0n1p9".into(),
                minios_b: "/dev/nvme0n1p10".into(),
            }
        );
    }

    #[test]
    fn test_partition_info_sata_slot_b() {
        let layout = PartitionLayout::default();
        let info = compute_partition_info(&layout, "/dev/sda5", "/dev/sda", Slot::B);
        assert_eq!(info.active_root, "/dev/sda5");
        assert_eq!(info.inactive_root, "/dev/sda3");
        assert_eq!(info.active_kernel, "/dev/sda4");
        assert_eq!(info.inactive_kernel, "/dev/sda2");
        assert_eq!(info.minios_a, "/dev/sda10");
        assert_eq!(info.minios_b, "/dev/sda9");
    }

    #[test]
    fn test_partition_info_is_symmetric() {
        let layout = PartitionLayout::default();
        let a = compute_partition_info(&layout, "/dev/mmcblk0p3", "/dev/mmcblk0", Slot::A);
        let b = compute_partition_info(&layout, "/dev/mmcblk0p5", "/dev/mmcblk0", Slot::B);
        assert_ne!(a.active_root, a.inactive_root);
        assert_ne!(b.active_root, b.inactive_root);
        assert_eq!(a.active_root, b.inactive_root);
        assert_eq!(a.inactive_root, b.active_root);
        assert_eq!(a.active_kernel, b.inactive_kernel);
        assert_eq!(a.inactive_kernel, b.active_kernel);
    }

    #[test]
    fn test_partition_info_is_deterministic() {
        let layout = PartitionLayout::default();
        let first = compute_partition_info(&layout, "/dev/sda3", "/dev/sda", Slot::A);
        let second = compute_partition_info(&layout, "/dev/sda3", "/dev/sda", Slot::A);
        assert_eq!(first, second);
    }

    /// The root device does not have to start with the disk name; the
    /// remainder is then kept in full as the delimiter.
    #[test]
    fn test_partition_info_unrelated_names() {
        let layout = PartitionLayout::default();
        let info = compute_partition_info(&layout, "root3", "root_disk", Slot::A);
        assert_eq!(info.inactive_kernel, "root_diskroot4");
        assert_eq!(info.inactive_root, "root_diskroot5");
        assert_eq!(info.active_root, "root_diskroot3");
    }

    #[test]
    fn test_custom_layout() {
        let layout = PartitionLayout {
            root_a: 13,
            root_b: 15,
            ..Default::default()
        };
        assert_eq!(compute_root_part_number(&layout, "/dev/sda15"), Ok(Slot::B));
        assert!(compute_root_part_number(&layout, "/dev/sda3").is_err());
    }
}
