use std::{
    io::{Error, ErrorKind, Result},
    sync::{Mutex, MutexGuard},
};

use crate::disk::{
    block_device::BlockDevice,
    types::{Block, BLOCK_SIZE},
};

/// 内存中的块设备，主要给测试和一次性的镜像组装使用
#[derive(Debug)]
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    num_blocks: u64,
}

impl RamDisk {
    pub fn new(num_blocks: u64) -> Self {
        Self {
            data: Mutex::new(vec![0u8; num_blocks as usize * BLOCK_SIZE]),
            num_blocks,
        }
    }

    /// 用现成的字节构造设备，不足一块的尾部会被丢弃
    pub fn from_bytes(mut bytes: Vec<u8>) -> Self {
        let num_blocks = (bytes.len() / BLOCK_SIZE) as u64;
        bytes.truncate(num_blocks as usize * BLOCK_SIZE);
        Self {
            data: Mutex::new(bytes),
            num_blocks,
        }
    }

    /// 整个设备内容的拷贝
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<u8>>> {
        self.data
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "ram disk lock poisoned"))
    }

    fn range(&self, block_id: u64) -> Result<std::ops::Range<usize>> {
        if block_id >= self.num_blocks {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                format!("block {} is beyond the end of the ram disk", block_id),
            ));
        }
        let start = block_id as usize * BLOCK_SIZE;
        Ok(start..start + BLOCK_SIZE)
    }
}

impl BlockDevice for RamDisk {
    fn num_blocks(&self) -> u64 {
        self.num_blocks
    }

    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        let range = self.range(block_id)?;
        buf.copy_from_slice(&self.lock()?[range]);
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        let range = self.range(block_id)?;
        self.lock()?[range].copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_back_written_block() {
        let disk = RamDisk::new(4);
        let mut block: Block = [0; BLOCK_SIZE];
        block[0] = 0xAB;
        block[BLOCK_SIZE - 1] = 0xCD;
        disk.write_block(2, &block).unwrap();

        let mut out: Block = [0; BLOCK_SIZE];
        disk.read_block(2, &mut out).unwrap();
        assert_eq!(out[0], 0xAB);
        assert_eq!(out[BLOCK_SIZE - 1], 0xCD);

        disk.read_block(1, &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn out_of_range_is_eof() {
        let disk = RamDisk::new(2);
        let mut out: Block = [0; BLOCK_SIZE];
        let err = disk.read_block(2, &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
