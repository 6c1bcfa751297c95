use std::io::Result;

use crate::disk::types::Block;

pub trait BlockDevice: Send + Sync {
    /// 设备上的块总数
    fn num_blocks(&self) -> u64;
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()>;
}
