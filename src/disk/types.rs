/// 每个逻辑块（Block）的大小：4KB
/// 镜像以“块”为最小读写单位，整个格式只支持这一种块大小。
pub const BLOCK_SIZE: usize = 4096;

/// 一个块中的比特数，也就是单块位图能够跟踪的对象上限。
pub const BITS_PER_BLOCK: usize = BLOCK_SIZE * 8;

/// 定义一个逻辑块类型（每块 4KB 的字节数组）
/// 所有磁盘读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];

/// 块号换算成字节偏移
pub fn block_offset(block_id: u64) -> u64 {
    block_id * BLOCK_SIZE as u64
}
