// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Locations of provisioning artifacts in remote storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const GS_SCHEME: &str = "gs://";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostType {
    #[default]
    #[serde(rename = "HOSTTYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "LOCAL")]
    Local,
    #[serde(rename = "GS")]
    Gs,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("only GS copying is implemented")]
    NotRemote(HostType),
}

/// A storage location such as an image directory.
///
/// `path` is bucket-relative (`chromeos-image-archive/eve-release/R120-...`);
/// a leading `gs://` is tolerated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePath {
    #[serde(default)]
    pub host_type: HostType,
    pub path: String,
}

impl StoragePath {
    pub fn gs<S: Into<String>>(path: S) -> Self {
        StoragePath {
            host_type: HostType::Gs,
            path: path.into(),
        }
    }

    /// Get the path, failing unless it lives in remote storage.
    pub fn remote_path(&self) -> Result<&str, StorageError> {
        match self.host_type {
            HostType::Gs => Ok(&self.path),
            other => Err(StorageError::NotRemote(other)),
        }
    }

    /// Get the `gs://` URL of `file` under this path.
    pub fn join(&self, file: &str) -> Result<String, StorageError> {
        Ok(bucket_join(self.remote_path()?, file))
    }

    /// The last two components of the path, e.g. `eve-release/R120-15662.0.0`.
    ///
    /// This is the form ChromeOS records as `CHROMEOS_RELEASE_BUILDER_PATH`.
    pub fn builder_path(&self) -> Option<String> {
        let components: Vec<&str> = self
            .path
            .trim_start_matches(GS_SCHEME)
            .split('/')
            .filter(|c| !c.is_empty())
            .collect();
        match components.as_slice() {
            [.., builder, version] => Some(format!("{builder}/{version}")),
            _ => None,
        }
    }
}

/// Join a bucket-relative directory and a file name into a `gs://` URL.
pub fn bucket_join(bucket_path: &str, file: &str) -> String {
    let bucket_path = bucket_path.trim_start_matches(GS_SCHEME).trim_end_matches('/');
    let file = file.trim_start_matches('/');
    if file.is_empty() {
        format!("{GS_SCHEME}{bucket_path}")
    } else {
        format!("{GS_SCHEME}{bucket_path}/{file}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_join() {
        assert_eq!(
            bucket_join("path/to/image", "full_dev_part_KERN.bin.gz"),
            "gs://path/to/image/full_dev_part_KERN.bin.gz"
        );
        assert_eq!(
            bucket_join("gs://path/to/image/", "/stateful.tgz"),
            "gs://path/to/image/stateful.tgz"
        );
        assert_eq!(bucket_join("bucket", ""), "gs://bucket");
    }

    #[test]
    fn test_local_paths_are_rejected() {
        for host_type in [HostType::Local, HostType::Unspecified] {
            let path = StoragePath {
                host_type,
                path: "/tmp/image".into(),
            };
            let err = path.join("stateful.tgz").unwrap_err();
            assert_eq!(err, StorageError::NotRemote(host_type));
            assert_eq!(err.to_string(), "only GS copying is implemented");
        }
    }

    #[test]
    fn test_builder_path() {
        let path = StoragePath::gs("gs://chromeos-image-archive/eve-release/R120-15662.0.0");
        assert_eq!(
            path.builder_path().as_deref(),
            Some("eve-release/R120-15662.0.0")
        );

        let path = StoragePath::gs("chromeos-image-archive/eve-cq/R120-15662.0.0-1234/");
        assert_eq!(
            path.builder_path().as_deref(),
            Some("eve-cq/R120-15662.0.0-1234")
        );

        assert_eq!(StoragePath::gs("image").builder_path(), None);
    }

    #[test]
    fn test_deserialize_host_type() {
        let path: StoragePath =
            serde_json::from_str(r#"{"host_type": "GS", "path": "bucket/dir"}"#).unwrap();
        assert_eq!(path, StoragePath::gs("bucket/dir"));

        let path: StoragePath = serde_json::from_str(r#"{"path": "bucket/dir"}"#).unwrap();
        assert_eq!(path.host_type, HostType::Unspecified);
    }
}
