use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BITS_PER_BLOCK, BLOCK_SIZE},
    fs::{
        checksum::Crc32,
        config::{BITMAP_BLOCKS, INODE_SIZE, MAGIC, ROOT_INODE, SUPER_BLOCK_SIZE, VERSION},
        error::{FileSystemError, Result},
        layout::Layout,
        record_codec,
    },
};

/// 块 0 开头的 116 字节记录，字段顺序即磁盘顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub magic: u32,      //魔数，用于识别文件系统
    pub version: u32,    // 格式版本
    pub block_size: u32, // 每块大小（字节），固定 4096
    pub total_blocks: u64,
    pub inode_count: u64,
    /** 位图信息 */
    pub inode_bitmap_start: u64,
    pub inode_bitmap_blocks: u64,
    pub data_bitmap_start: u64,
    pub data_bitmap_blocks: u64,
    /** inode 表 */
    pub inode_table_start: u64,
    pub inode_table_blocks: u64,
    /** 数据区 */
    pub data_region_start: u64,
    pub data_region_blocks: u64,
    /** 其他元信息 */
    pub root_inode: u64,
    pub mtime_epoch: u64, // 创建时间
    pub flags: u32,
    pub checksum: u32,
}

impl SuperBlock {
    pub fn new(layout: &Layout, now: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            block_size: BLOCK_SIZE as u32,
            total_blocks: layout.total_blocks,
            inode_count: layout.inode_count,
            inode_bitmap_start: layout.inode_bitmap_start,
            inode_bitmap_blocks: BITMAP_BLOCKS,
            data_bitmap_start: layout.data_bitmap_start,
            data_bitmap_blocks: BITMAP_BLOCKS,
            inode_table_start: layout.inode_table_start,
            inode_table_blocks: layout.inode_table_blocks,
            data_region_start: layout.data_region_start,
            data_region_blocks: layout.data_region_blocks,
            root_inode: ROOT_INODE as u64,
            mtime_epoch: now,
            flags: 0,
            checksum: 0,
        }
    }

    /// 按当前字段原样编码成整块，不重新计算校验和
    pub fn to_block(&self) -> Result<Block> {
        let bytes = record_codec().serialize(self)?;
        debug_assert_eq!(bytes.len(), SUPER_BLOCK_SIZE);

        let mut block: Block = [0; BLOCK_SIZE];
        block[..bytes.len()].copy_from_slice(&bytes);
        Ok(block)
    }

    /// 编码并写入新的校验和，所有字段都设置好之后最后调用
    pub fn seal(&mut self, crc: &Crc32) -> Result<Block> {
        let mut block = self.to_block()?;
        self.checksum = crc.finalize_superblock(&mut block);
        Ok(block)
    }

    pub fn from_block(block: &Block) -> Result<Self> {
        Ok(record_codec().deserialize(&block[..SUPER_BLOCK_SIZE])?)
    }

    /// 检查魔数和区域划分，保证后续按这些字段读写不会越界
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(FileSystemError::Format(format!(
                "bad magic number {:#010x}",
                self.magic
            )));
        }
        if self.block_size as usize != BLOCK_SIZE {
            return Err(FileSystemError::Format(format!(
                "unsupported block size {}",
                self.block_size
            )));
        }

        let bitmap_limit = BITS_PER_BLOCK as u64;
        if self.inode_count == 0 || self.inode_count > bitmap_limit {
            return Err(FileSystemError::Format(format!(
                "inode count {} does not fit one bitmap block",
                self.inode_count
            )));
        }
        if self.data_region_blocks == 0 || self.data_region_blocks > bitmap_limit {
            return Err(FileSystemError::Format(format!(
                "data region of {} blocks does not fit one bitmap block",
                self.data_region_blocks
            )));
        }
        let regions = [
            (self.inode_bitmap_start, 1),
            (self.data_bitmap_start, 1),
            (self.inode_table_start, self.inode_table_blocks),
            (self.data_region_start, self.data_region_blocks),
        ];
        for (start, len) in regions {
            match start.checked_add(len) {
                Some(end) if start >= 1 && end <= self.total_blocks => {}
                _ => {
                    return Err(FileSystemError::Format(format!(
                        "region at block {} (+{}) lies outside the {}-block image",
                        start, len, self.total_blocks
                    )))
                }
            }
        }
        // 区域都在镜像内之后再换算字节数，乘法溢出同样视为镜像损坏
        let table_bytes = self.inode_table_blocks.checked_mul(BLOCK_SIZE as u64);
        if table_bytes.map_or(true, |bytes| bytes < self.inode_count * INODE_SIZE as u64) {
            return Err(FileSystemError::Format(
                "inode table is smaller than the inode count".to_string(),
            ));
        }
        if self.root_inode == 0 || self.root_inode > self.inode_count {
            return Err(FileSystemError::Format(format!(
                "root inode {} is out of range",
                self.root_inode
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SuperBlock {
        SuperBlock::new(&Layout::compute(180, 128).unwrap(), 1_700_000_000)
    }

    #[test]
    fn encodes_packed_little_endian() {
        let mut sb = sample();
        let block = sb.seal(&Crc32::new()).unwrap();

        assert_eq!(&block[0..4], &MAGIC.to_le_bytes());
        assert_eq!(&block[8..12], &4096u32.to_le_bytes());
        assert_eq!(&block[12..20], &45u64.to_le_bytes());
        assert_eq!(&block[76..84], &7u64.to_le_bytes());
        assert_eq!(&block[84..92], &38u64.to_le_bytes());
        assert_eq!(&block[92..100], &1u64.to_le_bytes());
        assert_eq!(&block[100..108], &1_700_000_000u64.to_le_bytes());
        assert_eq!(&block[112..116], &sb.checksum.to_le_bytes());
        assert!(block[116..].iter().all(|&b| b == 0));
    }

    #[test]
    fn round_trip_keeps_fields_and_checksum() {
        let crc = Crc32::new();
        let mut sb = sample();
        let block = sb.seal(&crc).unwrap();

        let decoded = SuperBlock::from_block(&block).unwrap();
        assert_eq!(decoded, sb);
        assert!(crc.verify_superblock(&block));
        assert_eq!(decoded.to_block().unwrap(), block);
        decoded.validate().unwrap();
    }

    #[test]
    fn rejects_bad_magic() {
        let mut sb = sample();
        sb.magic = 0x1234_5678;
        assert!(matches!(sb.validate(), Err(FileSystemError::Format(_))));
    }

    #[test]
    fn huge_inode_table_is_a_format_error() {
        let mut sb = sample();
        sb.inode_table_blocks = u64::MAX / 2;
        assert!(matches!(sb.validate(), Err(FileSystemError::Format(_))));

        // 解码路径也一样：改写磁盘上的字段后不应 panic
        let mut block = sample().seal(&Crc32::new()).unwrap();
        block[68..76].copy_from_slice(&(u64::MAX / 2).to_le_bytes());
        let decoded = SuperBlock::from_block(&block).unwrap();
        assert!(matches!(decoded.validate(), Err(FileSystemError::Format(_))));
    }

    #[test]
    fn rejects_regions_past_the_end() {
        let mut sb = sample();
        sb.data_region_blocks = 39;
        assert!(matches!(sb.validate(), Err(FileSystemError::Format(_))));
    }
}
