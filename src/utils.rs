use std::{ffi::OsStr, path::Path};

use chrono::Utc;

use crate::fs::error::{FileSystemError, Result};

/// 当前 Unix 时间（秒）
pub fn current_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// 路径的最后一段，作为目录项名字（unix 上保留原始字节）
pub fn base_name(path: &Path) -> Result<Vec<u8>> {
    path.file_name().map(os_str_bytes).ok_or_else(|| {
        FileSystemError::InvalidArguments(format!("{} has no file name", path.display()))
    })
}

#[cfg(unix)]
fn os_str_bytes(name: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;

    name.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn os_str_bytes(name: &OsStr) -> Vec<u8> {
    name.to_string_lossy().into_owned().into_bytes()
}
