use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::{Mutex, MutexGuard},
};

use crate::disk::{
    block_device::BlockDevice,
    types::{block_offset, Block, BLOCK_SIZE},
};

/// 以普通文件作为后端的块设备
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    num_blocks: u64,
}

impl FileDisk {
    /// 只读打开一个已有镜像，块数按文件长度向下取整
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        let num_blocks = file.metadata()?.len() / BLOCK_SIZE as u64;

        Ok(Self {
            file: Mutex::new(file),
            num_blocks,
        })
    }

    /// 创建（或截断）一个镜像文件，并预分配 total_blocks 个块的空间
    pub fn create<P: AsRef<Path>>(path: P, total_blocks: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.set_len(block_offset(total_blocks))?;

        Ok(Self {
            file: Mutex::new(file),
            num_blocks: total_blocks,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "disk file lock poisoned"))
    }

    fn check_range(&self, block_id: u64) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                format!("block {} is beyond the end of the image", block_id),
            ));
        }
        Ok(())
    }
}

impl BlockDevice for FileDisk {
    fn num_blocks(&self) -> u64 {
        self.num_blocks
    }

    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        self.check_range(block_id)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_offset(block_id)))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        self.check_range(block_id)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_offset(block_id)))?;
        file.write_all(buf)?;
        Ok(())
    }
}
