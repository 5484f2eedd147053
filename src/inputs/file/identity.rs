// SPDX-License-Identifier: Apache-2.0

//! File identity, used to notice when the tailed path stops referring to the
//! file a session opened.

use std::fs::Metadata;

/// Identity of the file backing a tail session.
///
/// On Unix this is the device/inode pair, which is stable across renames and
/// changes when the path is recreated. Elsewhere the creation timestamp
/// stands in; rotation schemes that preserve it are still caught by the
/// size-decrease check at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    created: Option<std::time::SystemTime>,
}

impl FileIdentity {
    #[cfg(unix)]
    pub fn of(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    #[cfg(not(unix))]
    pub fn of(meta: &Metadata) -> Self {
        Self {
            created: meta.created().ok(),
        }
    }
}
