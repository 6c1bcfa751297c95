use bincode::Options;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        checksum::Crc32,
        config::{DEFAULT_PROJ_ID, DIRECT_PTRS, INODE_SIZE},
        error::{FileSystemError, Result},
        record_codec,
    },
};

bitflags! {
    /// 原样保存的 mode 位，只区分文件类型
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InodeMode: u16 {
        const DIRECTORY = 0o040000;
        const REGULAR = 0o100000;
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Inode {
    pub mode: u16,       // 文件类型位
    pub links: u16,      // 硬链接数（有多少目录项链接到该 inode）
    pub uid: u32,        // 所属用户
    pub gid: u32,        // 所属组
    pub size_bytes: u64, // 文件大小（字节）
    pub atime: u64,      // 最后访问时间（Access Time）
    pub mtime: u64,      // 最后修改时间（Modify Time）
    pub ctime: u64,      // 状态改变时间（Change Time）

    // 块索引区，0 表示未使用，非 0 是绝对块号
    pub direct: [u32; DIRECT_PTRS],

    pub reserved: [u32; 3],
    pub proj_id: u32,
    pub uid16_gid16: u32,
    pub xattr_ptr: u64,
    pub inode_crc: u64,
}

impl Inode {
    /// 根目录：两个链接（"." 和 ".."），占一个数据块
    pub fn new_directory(data_block: u32, size_bytes: u64, now: u64) -> Self {
        let mut direct = [0; DIRECT_PTRS];
        direct[0] = data_block;
        Self {
            mode: InodeMode::DIRECTORY.bits(),
            links: 2,
            size_bytes,
            atime: now,
            mtime: now,
            ctime: now,
            direct,
            proj_id: DEFAULT_PROJ_ID,
            ..Self::default()
        }
    }

    /// 普通文件，blocks 按顺序填进直接块指针
    pub fn new_file(size_bytes: u64, blocks: &[u32], now: u64) -> Result<Self> {
        if blocks.len() > DIRECT_PTRS {
            return Err(FileSystemError::FileTooLarge {
                size: size_bytes,
                blocks: blocks.len() as u64,
            });
        }
        let mut direct = [0; DIRECT_PTRS];
        direct[..blocks.len()].copy_from_slice(blocks);
        Ok(Self {
            mode: InodeMode::REGULAR.bits(),
            links: 1,
            size_bytes,
            atime: now,
            mtime: now,
            ctime: now,
            direct,
            proj_id: DEFAULT_PROJ_ID,
            ..Self::default()
        })
    }

    pub fn mode(&self) -> InodeMode {
        InodeMode::from_bits_retain(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.mode().contains(InodeMode::DIRECTORY)
    }

    // 增加硬链接计数
    pub fn inc_link(&mut self) {
        self.links = self.links.saturating_add(1);
    }

    // 块管理
    pub fn blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct.iter().copied().filter(|&b| b != 0)
    }

    pub fn block_count(&self) -> u64 {
        self.blocks().count() as u64
    }

    pub fn to_bytes(&self) -> Result<[u8; INODE_SIZE]> {
        let bytes = record_codec().serialize(self)?;
        let mut record = [0u8; INODE_SIZE];
        record.copy_from_slice(&bytes);
        Ok(record)
    }

    /// 编码并重新计算校验和，任何字段变化之后都要调用
    pub fn seal(&mut self, crc: &Crc32) -> Result<[u8; INODE_SIZE]> {
        let mut record = self.to_bytes()?;
        self.inode_crc = crc.finalize_inode(&mut record);
        Ok(record)
    }

    pub fn from_bytes(record: &[u8]) -> Result<Self> {
        Ok(record_codec().deserialize(&record[..INODE_SIZE])?)
    }
}

/// inode 表的原始字节，按槽位编解码
///
/// 保留整段区域（包括最后一块里 inode_count 之后的填充），写回时逐字节不变。
#[derive(Debug, Clone)]
pub struct InodeTable {
    bytes: Vec<u8>,
    pub start_block: u64,
    pub total_inodes: u64,
}

impl InodeTable {
    pub fn new(start_block: u64, table_blocks: u64, total_inodes: u64) -> Self {
        Self {
            bytes: vec![0; table_blocks as usize * BLOCK_SIZE],
            start_block,
            total_inodes,
        }
    }

    fn slot_range(&self, slot: u64) -> Result<std::ops::Range<usize>> {
        if slot >= self.total_inodes {
            return Err(FileSystemError::Format(format!(
                "inode slot {} is beyond the table of {} inodes",
                slot, self.total_inodes
            )));
        }
        let start = slot as usize * INODE_SIZE;
        Ok(start..start + INODE_SIZE)
    }

    pub fn raw(&self, slot: u64) -> Result<[u8; INODE_SIZE]> {
        let range = self.slot_range(slot)?;
        let mut record = [0u8; INODE_SIZE];
        record.copy_from_slice(&self.bytes[range]);
        Ok(record)
    }

    pub fn get_inode(&self, slot: u64) -> Result<Inode> {
        Inode::from_bytes(&self.raw(slot)?)
    }

    /// 写入一个已经编码好的记录
    pub fn put_raw(&mut self, slot: u64, record: &[u8; INODE_SIZE]) -> Result<()> {
        let range = self.slot_range(slot)?;
        self.bytes[range].copy_from_slice(record);
        Ok(())
    }

    /// 重新计算校验和并写入槽位
    pub fn put_inode(&mut self, slot: u64, inode: &mut Inode, crc: &Crc32) -> Result<()> {
        let record = inode.seal(crc)?;
        self.put_raw(slot, &record)
    }

    pub fn load(
        disk: &impl BlockDevice,
        start_block: u64,
        table_blocks: u64,
        total_inodes: u64,
    ) -> std::io::Result<Self> {
        let mut table = Self::new(start_block, table_blocks, total_inodes);
        let mut block_buf: Block = [0; BLOCK_SIZE];

        for (i, chunk) in table.bytes.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            disk.read_block(start_block + i as u64, &mut block_buf)?;
            chunk.copy_from_slice(&block_buf);
        }
        Ok(table)
    }

    pub fn sync(&self, disk: &impl BlockDevice) -> std::io::Result<()> {
        let mut block_buf: Block = [0; BLOCK_SIZE];

        for (i, chunk) in self.bytes.chunks_exact(BLOCK_SIZE).enumerate() {
            block_buf.copy_from_slice(chunk);
            disk.write_block(self.start_block + i as u64, &block_buf)?;
        }
        Ok(())
    }
}
