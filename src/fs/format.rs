use std::path::Path;

use log::info;

use crate::{
    disk::{Block, BlockDevice, FileDisk, BLOCK_SIZE},
    fs::{
        bitmap::Bitmap,
        checksum::Crc32,
        config::{DIRENT_SIZE, ROOT_INODE},
        directory::Directory,
        error::{FileSystemError, Result},
        inode_table::{Inode, InodeTable},
        layout::{FormatParams, Layout},
        super_block::SuperBlock,
        FileSystem,
    },
    utils::current_timestamp,
};

impl FileSystem {
    /// 在内存中构造一个全新的文件系统，尚未写盘
    pub fn new_image(layout: &Layout, now: u64) -> Result<Self> {
        let crc = Crc32::new();
        let root_block = layout.data_region_start;
        let root_block_ptr = u32::try_from(root_block).map_err(|_| {
            FileSystemError::Layout(format!("block {} does not fit a block pointer", root_block))
        })?;

        // 根 inode 和根目录的数据块都预留第 0 位
        let mut inode_bitmap = Bitmap::new(layout.inode_bitmap_start);
        inode_bitmap.set(0);
        let mut data_bitmap = Bitmap::new(layout.data_bitmap_start);
        data_bitmap.set(0);

        let root_dir = Directory::new_root(root_block, ROOT_INODE);
        let root_size = (root_dir.live_entries().count() * DIRENT_SIZE) as u64;
        let mut root = Inode::new_directory(root_block_ptr, root_size, now);

        let mut inode_table = InodeTable::new(
            layout.inode_table_start,
            layout.inode_table_blocks,
            layout.inode_count,
        );
        inode_table.put_inode(ROOT_INODE as u64 - 1, &mut root, &crc)?;

        // 所有字段（包括区域划分）都设置完后才计算超级块校验和
        let mut super_block = SuperBlock::new(layout, now);
        super_block.seal(&crc)?;

        Ok(Self {
            crc,
            super_block,
            super_block_ok: true,
            inode_bitmap,
            data_bitmap,
            inode_table,
            root_dir,
        })
    }

    /// 格式化设备：写入全部元数据，并把根目录之外的数据区清零
    pub fn format(disk: &impl BlockDevice, layout: &Layout) -> Result<Self> {
        if disk.num_blocks() < layout.total_blocks {
            return Err(FileSystemError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "device has {} blocks, layout needs {}",
                    disk.num_blocks(),
                    layout.total_blocks
                ),
            )));
        }

        let fs = Self::new_image(layout, current_timestamp())?;
        fs.sync(disk)?;

        let zero: Block = [0; BLOCK_SIZE];
        for block_id in layout.data_region_start + 1..layout.total_blocks {
            disk.write_block(block_id, &zero)?;
        }

        info!(
            "formatted {} blocks: inode table {}+{}, data region {}+{}",
            layout.total_blocks,
            layout.inode_table_start,
            layout.inode_table_blocks,
            layout.data_region_start,
            layout.data_region_blocks
        );
        Ok(fs)
    }
}

/// 按参数创建镜像文件；布局不合法时不会创建任何文件
pub fn format_image<P: AsRef<Path>>(path: P, params: &FormatParams) -> Result<FileSystem> {
    let layout = Layout::from_params(params)?;
    let disk = FileDisk::create(path, layout.total_blocks)?;
    FileSystem::format(&disk, &layout)
}
