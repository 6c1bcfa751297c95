//! MiniVSFS：离线构建和修改一个极简的平面文件系统镜像。

pub mod disk;
pub mod fs;
pub mod utils;

pub use fs::{
    error::{FileSystemError, Result},
    format::format_image,
    ingest::{ingest, ingest_file, Ingestion},
    inspect::ImageReport,
    layout::{FormatParams, Layout},
    FileSystem,
};
