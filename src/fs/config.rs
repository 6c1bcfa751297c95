// 镜像标识 "MVSF"
pub const MAGIC: u32 = 0x4D56_5346;
pub const VERSION: u32 = 1;

pub const SUPER_BLOCK_BLOCK_ID: u64 = 0;
pub const INODE_BITMAP_BLOCK_ID: u64 = 1;
pub const DATA_BLOCK_BITMAP_BLOCK_ID: u64 = 2;
pub const INODE_TABLE_START_BLOCK_ID: u64 = 3;

// 两张位图各占 1 块
pub const BITMAP_BLOCKS: u64 = 1;

// 超级块记录本身的长度（其余部分补零）
pub const SUPER_BLOCK_SIZE: usize = 116;

// 每个 Inode 128 字节，一个 4KB 块可以存 32 个 Inode
pub const INODE_SIZE: usize = 128;
// inode 校验和覆盖的前缀长度，后 8 字节是校验和本身
pub const INODE_CRC_COVERED: usize = 120;

pub const DIRECT_PTRS: usize = 12;

// 目录项 64 字节，目录只占一个块，所以最多 64 项
pub const DIRENT_SIZE: usize = 64;
pub const DIRENT_NAME_LEN: usize = 58;
pub const DIRENTS_PER_BLOCK: usize = 4096 / DIRENT_SIZE;

pub const ROOT_INODE: u32 = 1;

// 本工具写出的 inode 一律带上这个项目号
pub const DEFAULT_PROJ_ID: u32 = 4;

/** 格式化参数范围 */
pub const MIN_SIZE_KIB: u32 = 180;
pub const MAX_SIZE_KIB: u32 = 4096;
pub const MIN_INODES: u32 = 128;
pub const MAX_INODES: u32 = 512;
