use crate::disk::{Block, BlockDevice, BITS_PER_BLOCK, BLOCK_SIZE};

/// 单块位图，inode 位图和数据块位图共用
///
/// 第 i 位位于第 i / 8 个字节的 1 << (i % 8)。只分配不释放，
/// 分配策略永远是编号最小的空闲位。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub bits: Vec<u8>,    // 位图数据，固定 4096 字节
    pub start_block: u64, // 位图在磁盘中的块号
}

impl Bitmap {
    // 创建一个全空闲的位图
    pub fn new(start_block: u64) -> Self {
        Self {
            bits: vec![0; BLOCK_SIZE],
            start_block,
        }
    }

    pub fn is_set(&self, index: u64) -> bool {
        let byte_index = (index / 8) as usize;
        let bit_index = (index % 8) as u8;
        (self.bits[byte_index] & (1 << bit_index)) != 0
    }

    /// 从第 0 位开始找第一个空闲位，limit 之内都被占用时返回 None
    pub fn find_free(&self, limit: u64) -> Option<u64> {
        self.find_free_from(0, limit)
    }

    /// 从 start 开始向后找第一个空闲位
    pub fn find_free_from(&self, start: u64, limit: u64) -> Option<u64> {
        let limit = limit.min(BITS_PER_BLOCK as u64);
        (start..limit).find(|&i| !self.is_set(i))
    }

    /// 标记为已分配，重复设置没有副作用
    pub fn set(&mut self, index: u64) {
        let byte_index = (index / 8) as usize;
        let bit_index = (index % 8) as u8;
        self.bits[byte_index] |= 1 << bit_index;
    }

    /// 前 limit 位中已分配的数量
    pub fn count_set(&self, limit: u64) -> u64 {
        let limit = limit.min(BITS_PER_BLOCK as u64);
        (0..limit).filter(|&i| self.is_set(i)).count() as u64
    }

    // 从磁盘加载位图
    pub fn load(disk: &impl BlockDevice, start_block: u64) -> std::io::Result<Self> {
        let mut block_buf: Block = [0; BLOCK_SIZE];
        disk.read_block(start_block, &mut block_buf)?;

        Ok(Self {
            bits: block_buf.to_vec(),
            start_block,
        })
    }

    pub fn to_block(&self) -> Block {
        let mut block_buf: Block = [0; BLOCK_SIZE];
        block_buf.copy_from_slice(&self.bits);
        block_buf
    }

    // 将位图写回磁盘
    pub fn sync(&self, disk: &impl BlockDevice) -> std::io::Result<()> {
        disk.write_block(self.start_block, &self.to_block())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::RamDisk;

    #[test]
    fn first_fit_ascending() {
        let mut bitmap = Bitmap::new(1);
        assert_eq!(bitmap.find_free(16), Some(0));
        bitmap.set(0);
        bitmap.set(2);
        assert_eq!(bitmap.find_free(16), Some(1));
        assert_eq!(bitmap.find_free_from(2, 16), Some(3));
    }

    #[test]
    fn set_bits_are_never_returned() {
        let mut bitmap = Bitmap::new(1);
        for expected in 0..40 {
            let index = bitmap.find_free(40).unwrap();
            assert_eq!(index, expected);
            assert!(!bitmap.is_set(index));
            bitmap.set(index);
            assert!(bitmap.is_set(index));
        }
        assert_eq!(bitmap.find_free(40), None);
        // limit 之外的位不受影响
        assert_eq!(bitmap.find_free(41), Some(40));
    }

    #[test]
    fn set_is_idempotent() {
        let mut bitmap = Bitmap::new(2);
        bitmap.set(9);
        bitmap.set(9);
        assert_eq!(bitmap.count_set(64), 1);
        assert_eq!(bitmap.bits[1], 0b0000_0010);
    }

    #[test]
    fn limit_is_clamped_to_one_block() {
        let mut bitmap = Bitmap::new(1);
        bitmap.bits.fill(0xFF);
        assert_eq!(bitmap.find_free(u64::MAX), None);
        assert_eq!(bitmap.count_set(u64::MAX), BITS_PER_BLOCK as u64);
    }

    #[test]
    fn sync_and_load() {
        let disk = RamDisk::new(3);
        let mut bitmap = Bitmap::new(2);
        bitmap.set(0);
        bitmap.set(13);
        bitmap.sync(&disk).unwrap();

        let loaded = Bitmap::load(&disk, 2).unwrap();
        assert_eq!(loaded, bitmap);
        assert_eq!(loaded.find_free(32), Some(1));
    }
}
