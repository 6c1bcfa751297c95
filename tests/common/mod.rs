//! Common utilities for tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mini_vsfs::{
    disk::{BlockDevice, RamDisk},
    FileSystem, Layout,
};
use uuid::Uuid;

/// A path under the system temp dir that is removed on drop.
pub struct Scratch(PathBuf);

impl Scratch {
    pub fn new(tag: &str) -> Self {
        Scratch(std::env::temp_dir().join(format!("mini-vsfs-{}-{}", tag, Uuid::new_v4())))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Formats a fresh image into a ram disk.
pub fn formatted(size_kib: u32, inodes: u32) -> RamDisk {
    let layout = Layout::compute(size_kib, inodes).unwrap();
    let disk = RamDisk::new(layout.total_blocks);
    FileSystem::format(&disk, &layout).unwrap();
    disk
}

/// An empty ram disk with the same geometry as `disk`.
pub fn blank_like(disk: &impl BlockDevice) -> RamDisk {
    RamDisk::new(disk.num_blocks())
}

/// Deterministic non-zero payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 + 1).collect()
}
