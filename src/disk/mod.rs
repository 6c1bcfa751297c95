pub mod block_device;
pub mod file_disk;
pub mod ram_disk;
pub mod types;

pub use block_device::BlockDevice;
pub use file_disk::FileDisk;
pub use ram_disk::RamDisk;
pub use types::{block_offset, Block, BITS_PER_BLOCK, BLOCK_SIZE};
