use std::{fs::File, io::Read, path::Path};

use log::{debug, info, warn};

use crate::{
    disk::{Block, BlockDevice, FileDisk, BLOCK_SIZE},
    fs::{
        config::DIRECT_PTRS,
        directory::DirEntryType,
        error::{FileSystemError, Result},
        inode_table::Inode,
        root_slot, FileSystem,
    },
    utils::{base_name, current_timestamp},
};

/// 一次成功分配的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingestion {
    pub inode_no: u32,    // 新文件的 inode 号（从 1 开始）
    pub slot: usize,      // 根目录中占用的槽位
    pub blocks: Vec<u32>, // 分配到的绝对块号，按文件顺序
    pub size: u64,
}

pub fn blocks_needed(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE as u64)
}

fn check_size(size: u64) -> Result<u64> {
    let blocks = blocks_needed(size);
    if blocks > DIRECT_PTRS as u64 {
        return Err(FileSystemError::FileTooLarge { size, blocks });
    }
    Ok(blocks)
}

impl FileSystem {
    /// 在内存中为新文件分配 inode、数据块和目录槽位。
    ///
    /// 所有资源检查都在修改任何结构之前完成，失败时元数据保持原样。
    pub fn stage_file(&mut self, name: &[u8], size: u64) -> Result<Ingestion> {
        let needed = check_size(size)?;
        let sb = &self.super_block;

        let inode_index = self
            .inode_bitmap
            .find_free(sb.inode_count)
            .ok_or(FileSystemError::NoFreeInodes)?;

        let mut data_indices = Vec::with_capacity(needed as usize);
        let mut next = 0;
        while (data_indices.len() as u64) < needed {
            match self.data_bitmap.find_free_from(next, sb.data_region_blocks) {
                Some(index) => {
                    data_indices.push(index);
                    next = index + 1;
                }
                None => {
                    return Err(FileSystemError::InsufficientSpace {
                        needed,
                        available: data_indices.len() as u64,
                    })
                }
            }
        }

        let slot = self
            .root_dir
            .find_free_slot()
            .ok_or(FileSystemError::DirectoryFull)?;

        let inode_no = u32::try_from(inode_index + 1)
            .map_err(|_| FileSystemError::Format("inode number overflow".to_string()))?;
        let blocks = data_indices
            .iter()
            .map(|&index| u32::try_from(sb.data_region_start + index))
            .collect::<std::result::Result<Vec<u32>, _>>()
            .map_err(|_| FileSystemError::Format("block pointer overflow".to_string()))?;

        debug!(
            "allocating inode {} (slot {}), data bits {:?}, directory slot {}",
            inode_no, inode_index, data_indices, slot
        );
        if self.root_dir.find(name).is_some() {
            warn!(
                "root directory already has an entry named {:?}",
                String::from_utf8_lossy(name)
            );
        }

        // 以下开始真正修改内存中的元数据
        let mut inode = Inode::new_file(size, &blocks, current_timestamp())?;
        self.inode_table.put_inode(inode_index, &mut inode, &self.crc)?;

        self.inode_bitmap.set(inode_index);
        for &index in &data_indices {
            self.data_bitmap.set(index);
        }

        self.root_dir.add(inode_no, name, DirEntryType::File)?;

        let root_index = root_slot(&self.super_block);
        let mut root = self.inode_table.get_inode(root_index)?;
        root.inc_link();
        self.inode_table.put_inode(root_index, &mut root, &self.crc)?;

        // 超级块校验和放在所有修改之后
        self.super_block.seal(&self.crc)?;
        self.super_block_ok = true;

        Ok(Ingestion {
            inode_no,
            slot,
            blocks,
            size,
        })
    }

    /// 写出新镜像：先整块拷贝原镜像，再覆盖元数据和新文件的数据块
    pub fn write_image(
        &self,
        input: &impl BlockDevice,
        output: &impl BlockDevice,
        ingestion: &Ingestion,
        payload: &[u8],
    ) -> Result<()> {
        let mut buffer: Block = [0; BLOCK_SIZE];
        for block_id in 0..self.super_block.total_blocks {
            input.read_block(block_id, &mut buffer)?;
            output.write_block(block_id, &buffer)?;
        }

        self.sync(output)?;

        for (&block_id, chunk) in ingestion.blocks.iter().zip(payload.chunks(BLOCK_SIZE)) {
            buffer.fill(0);
            buffer[..chunk.len()].copy_from_slice(chunk);
            output.write_block(block_id as u64, &buffer)?;
        }
        Ok(())
    }
}

/// 设备层面的完整导入流程
pub fn ingest(
    input: &impl BlockDevice,
    output: &impl BlockDevice,
    name: &[u8],
    payload: &[u8],
) -> Result<Ingestion> {
    let mut fs = FileSystem::load(input)?;
    let ingestion = fs.stage_file(name, payload.len() as u64)?;
    fs.write_image(input, output, &ingestion, payload)?;
    Ok(ingestion)
}

/// 把 source 导入 input 镜像并写到 output。
///
/// 所有会失败的检查都在创建输出文件之前完成；输入镜像只读打开，不会被修改。
pub fn ingest_file<P, Q, R>(input_path: P, output_path: Q, source_path: R) -> Result<Ingestion>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let (input_path, output_path, source_path) =
        (input_path.as_ref(), output_path.as_ref(), source_path.as_ref());

    if same_file(input_path, output_path) {
        return Err(FileSystemError::InvalidArguments(
            "output image must differ from the input image".to_string(),
        ));
    }
    let name = base_name(source_path)?;

    let input = FileDisk::open(input_path)?;
    let mut fs = FileSystem::load(&input)?;

    let source = File::open(source_path)?;
    let declared = source.metadata()?.len();
    check_size(declared)?;

    let mut payload = Vec::with_capacity(declared as usize);
    source.take(declared).read_to_end(&mut payload)?;

    let ingestion = fs.stage_file(&name, payload.len() as u64)?;

    let output = FileDisk::create(output_path, fs.super_block.total_blocks)?;
    fs.write_image(&input, &output, &ingestion, &payload)?;

    info!(
        "added {:?} as inode {} ({} bytes, {} blocks)",
        String::from_utf8_lossy(&name),
        ingestion.inode_no,
        ingestion.size,
        ingestion.blocks.len()
    );
    Ok(ingestion)
}

// 符号链接和硬链接都算同一个文件
#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::layout::Layout;

    fn fresh() -> FileSystem {
        FileSystem::new_image(&Layout::compute(180, 128).unwrap(), 0).unwrap()
    }

    #[test]
    fn block_counts() {
        assert_eq!(blocks_needed(0), 0);
        assert_eq!(blocks_needed(1), 1);
        assert_eq!(blocks_needed(4096), 1);
        assert_eq!(blocks_needed(4097), 2);
        assert!(check_size(12 * 4096).is_ok());
        assert!(matches!(
            check_size(12 * 4096 + 1),
            Err(FileSystemError::FileTooLarge { blocks: 13, .. })
        ));
    }

    #[test]
    fn stage_allocates_lowest_free() {
        let mut fs = fresh();
        let ing = fs.stage_file(b"a.txt", 5000).unwrap();
        assert_eq!(ing.inode_no, 2);
        assert_eq!(ing.slot, 2);
        assert_eq!(ing.blocks, vec![8, 9]);

        let inode = fs.inode_table.get_inode(1).unwrap();
        assert_eq!(inode.size_bytes, 5000);
        assert_eq!(inode.links, 1);
        assert_eq!(&inode.direct[..3], &[8, 9, 0]);
        assert_eq!(fs.root_inode().unwrap().links, 3);
        assert!(fs.inode_bitmap.is_set(1));
        assert!(fs.data_bitmap.is_set(1) && fs.data_bitmap.is_set(2));
    }

    #[test]
    fn failed_stage_leaves_metadata_untouched() {
        let mut fs = fresh();
        // 37 个空闲数据块，13 块的需求会在大小检查时失败，先用 36 块占满
        for _ in 0..3 {
            fs.stage_file(b"big", 12 * 4096).unwrap();
        }
        let before_bits = fs.data_bitmap.clone();
        let before_inodes = fs.inode_bitmap.clone();
        let before_dir = fs.root_dir.clone();

        assert!(matches!(
            fs.stage_file(b"two", 4097),
            Err(FileSystemError::InsufficientSpace { needed: 2, available: 1 })
        ));
        assert_eq!(fs.data_bitmap, before_bits);
        assert_eq!(fs.inode_bitmap, before_inodes);
        assert_eq!(fs.root_dir, before_dir);
    }

    #[test]
    fn empty_file_takes_no_blocks() {
        let mut fs = fresh();
        let ing = fs.stage_file(b"empty", 0).unwrap();
        assert!(ing.blocks.is_empty());
        assert_eq!(fs.inode_table.get_inode(1).unwrap().block_count(), 0);
    }
}
