use crate::{
    disk::BLOCK_SIZE,
    fs::{
        config::{
            BITMAP_BLOCKS, DATA_BLOCK_BITMAP_BLOCK_ID, INODE_BITMAP_BLOCK_ID,
            INODE_TABLE_START_BLOCK_ID, INODE_SIZE, MAX_INODES, MAX_SIZE_KIB, MIN_INODES,
            MIN_SIZE_KIB,
        },
        error::{FileSystemError, Result},
    },
};

/// 经过校验的格式化参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatParams {
    pub size_kib: u32,
    pub inode_count: u32,
}

impl FormatParams {
    pub fn new(size_kib: u32, inode_count: u32) -> Result<Self> {
        if !(MIN_SIZE_KIB..=MAX_SIZE_KIB).contains(&size_kib) || size_kib % 4 != 0 {
            return Err(FileSystemError::InvalidArguments(format!(
                "size must be a multiple of 4 between {} and {} KiB, got {}",
                MIN_SIZE_KIB, MAX_SIZE_KIB, size_kib
            )));
        }
        if !(MIN_INODES..=MAX_INODES).contains(&inode_count) {
            return Err(FileSystemError::InvalidArguments(format!(
                "inode count must be between {} and {}, got {}",
                MIN_INODES, MAX_INODES, inode_count
            )));
        }
        Ok(Self {
            size_kib,
            inode_count,
        })
    }
}

/// 镜像各区域的位置，单位都是块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub total_blocks: u64,
    pub inode_count: u64,
    pub inode_bitmap_start: u64,
    pub data_bitmap_start: u64,
    pub inode_table_start: u64,
    pub inode_table_blocks: u64,
    pub data_region_start: u64,
    pub data_region_blocks: u64,
}

impl Layout {
    /// 由总大小和 inode 数推出区域划分，数据区至少要有 1 块
    pub fn compute(size_kib: u32, inode_count: u32) -> Result<Self> {
        let block_size = BLOCK_SIZE as u64;
        let total_blocks = size_kib as u64 * 1024 / block_size;
        let inode_table_blocks = (inode_count as u64 * INODE_SIZE as u64).div_ceil(block_size);
        let data_region_start = INODE_TABLE_START_BLOCK_ID + inode_table_blocks;

        let data_region_blocks = match total_blocks.checked_sub(data_region_start) {
            Some(n) if n >= 1 => n,
            _ => {
                return Err(FileSystemError::Layout(format!(
                    "{} blocks cannot hold {} metadata blocks plus a data region",
                    total_blocks, data_region_start
                )))
            }
        };

        Ok(Self {
            total_blocks,
            inode_count: inode_count as u64,
            inode_bitmap_start: INODE_BITMAP_BLOCK_ID,
            data_bitmap_start: DATA_BLOCK_BITMAP_BLOCK_ID,
            inode_table_start: INODE_TABLE_START_BLOCK_ID,
            inode_table_blocks,
            data_region_start,
            data_region_blocks,
        })
    }

    pub fn from_params(params: &FormatParams) -> Result<Self> {
        Self::compute(params.size_kib, params.inode_count)
    }

    pub fn bitmap_blocks(&self) -> u64 {
        BITMAP_BLOCKS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_image() {
        let layout = Layout::compute(180, 128).unwrap();
        assert_eq!(layout.total_blocks, 45);
        assert_eq!(layout.inode_table_blocks, 4);
        assert_eq!(layout.data_region_start, 7);
        assert_eq!(layout.data_region_blocks, 38);
    }

    #[test]
    fn every_valid_pair_is_well_formed() {
        for size_kib in (MIN_SIZE_KIB..=MAX_SIZE_KIB).step_by(4) {
            for inode_count in MIN_INODES..=MAX_INODES {
                let params = FormatParams::new(size_kib, inode_count).unwrap();
                let l = Layout::from_params(&params).unwrap();

                assert!(l.data_region_blocks >= 1);
                assert_eq!(
                    l.inode_table_blocks,
                    (inode_count as u64 * 128 + 4095) / 4096
                );
                // 区域依次排列且互不重叠
                assert!(0 < l.inode_bitmap_start);
                assert!(l.inode_bitmap_start + l.bitmap_blocks() <= l.data_bitmap_start);
                assert!(l.data_bitmap_start + l.bitmap_blocks() <= l.inode_table_start);
                assert!(l.inode_table_start + l.inode_table_blocks <= l.data_region_start);
                assert_eq!(l.data_region_start + l.data_region_blocks, l.total_blocks);
            }
        }
    }

    #[test]
    fn rejects_out_of_range_params() {
        for (size, inodes) in [(176, 128), (4100, 128), (182, 128), (180, 127), (180, 513)] {
            assert!(matches!(
                FormatParams::new(size, inodes),
                Err(FileSystemError::InvalidArguments(_))
            ));
        }
    }

    #[test]
    fn too_small_for_metadata() {
        // 64 KiB = 16 块，而 512 个 inode 的表就要 16 块
        assert!(matches!(
            Layout::compute(64, 512),
            Err(FileSystemError::Layout(_))
        ));
        // 刚好放下元数据但没有数据区
        assert!(matches!(
            Layout::compute(28, 128),
            Err(FileSystemError::Layout(_))
        ));
    }
}
