use log::{debug, warn};

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        bitmap::Bitmap,
        checksum::Crc32,
        config::SUPER_BLOCK_BLOCK_ID,
        directory::Directory,
        error::{FileSystemError, Result},
        inode_table::{Inode, InodeTable},
        super_block::SuperBlock,
    },
};

pub mod bitmap;
pub mod checksum;
pub mod config;
pub mod directory;
pub mod error;
pub mod format;
pub mod ingest;
pub mod inode_table;
pub mod inspect;
pub mod layout;
pub mod super_block;

/// 定长记录的编码方式：定长整数、小端、字段紧挨着排列
pub(crate) fn record_codec() -> impl bincode::Options {
    use bincode::Options;

    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

/// 一次操作期间驻留内存的全部元数据
#[derive(Debug)]
pub struct FileSystem {
    pub crc: Crc32,
    pub super_block: SuperBlock,      // 文件系统总体信息
    pub super_block_ok: bool,         // 加载时校验和是否吻合
    pub inode_bitmap: Bitmap,         // inode 分配信息
    pub data_bitmap: Bitmap,          // 数据块分配信息
    pub inode_table: InodeTable,      // 所有 inode
    pub root_dir: Directory,          // 根目录唯一的数据块
}

impl FileSystem {
    /// 读取并校验一个已有镜像的元数据
    pub fn load(disk: &impl BlockDevice) -> Result<Self> {
        let crc = Crc32::new();

        let mut block: Block = [0; BLOCK_SIZE];
        disk.read_block(SUPER_BLOCK_BLOCK_ID, &mut block)
            .map_err(|e| FileSystemError::Format(format!("cannot read superblock: {}", e)))?;
        let super_block = SuperBlock::from_block(&block)?;
        super_block.validate()?;

        let super_block_ok = crc.verify_superblock(&block);
        if !super_block_ok {
            warn!("superblock checksum mismatch (stored {:#010x})", super_block.checksum);
        }

        if disk.num_blocks() < super_block.total_blocks {
            return Err(FileSystemError::Format(format!(
                "image holds {} blocks but the superblock declares {}",
                disk.num_blocks(),
                super_block.total_blocks
            )));
        }

        let inode_bitmap = Bitmap::load(disk, super_block.inode_bitmap_start)?;
        let data_bitmap = Bitmap::load(disk, super_block.data_bitmap_start)?;
        let inode_table = InodeTable::load(
            disk,
            super_block.inode_table_start,
            super_block.inode_table_blocks,
            super_block.inode_count,
        )?;

        let root = inode_table.get_inode(root_slot(&super_block))?;
        let root_block = root.direct[0] as u64;
        let data_end = super_block.data_region_start + super_block.data_region_blocks;
        if !root.is_dir() || root_block < super_block.data_region_start || root_block >= data_end {
            return Err(FileSystemError::Format(format!(
                "root inode does not point at a directory block in the data region (block {})",
                root_block
            )));
        }
        disk.read_block(root_block, &mut block)?;
        let root_dir = Directory::from_block(root_block, &block);

        debug!(
            "loaded image: {} blocks, {} inodes, data region {}+{}",
            super_block.total_blocks,
            super_block.inode_count,
            super_block.data_region_start,
            super_block.data_region_blocks
        );

        Ok(Self {
            crc,
            super_block,
            super_block_ok,
            inode_bitmap,
            data_bitmap,
            inode_table,
            root_dir,
        })
    }

    pub fn root_inode(&self) -> Result<Inode> {
        self.inode_table.get_inode(root_slot(&self.super_block))
    }

    /// 把内存中的元数据写回：超级块、两张位图、inode 表、根目录块
    pub fn sync(&self, disk: &impl BlockDevice) -> Result<()> {
        disk.write_block(SUPER_BLOCK_BLOCK_ID, &self.super_block.to_block()?)?;
        self.inode_bitmap.sync(disk)?;
        self.data_bitmap.sync(disk)?;
        self.inode_table.sync(disk)?;
        disk.write_block(self.root_dir.block_id, &self.root_dir.to_block())?;
        Ok(())
    }
}

// inode 号从 1 开始，槽位从 0 开始
pub(crate) fn root_slot(super_block: &SuperBlock) -> u64 {
    super_block.root_inode - 1
}
