use crate::fs::{
    directory::DirEntryType,
    error::Result,
    super_block::SuperBlock,
    FileSystem,
};

/// 根目录中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub name: String,
    pub inode_no: u32,
    pub kind: Option<DirEntryType>,
    pub size: u64,
    pub entry_ok: bool, // 目录项异或校验
    pub inode_ok: bool, // inode CRC 校验
}

#[derive(Debug, Clone)]
pub struct ImageReport {
    pub super_block: SuperBlock,
    pub super_block_ok: bool,
    pub inodes_used: u64,
    pub data_blocks_used: u64,
    pub free_dir_slots: usize, // 根目录剩余空槽
    pub bad_inodes: Vec<u32>, // 位图标记为已用但校验失败的 inode 号
    pub entries: Vec<EntryReport>,
}

impl ImageReport {
    pub fn is_consistent(&self) -> bool {
        self.super_block_ok
            && self.bad_inodes.is_empty()
            && self.entries.iter().all(|e| e.entry_ok && e.inode_ok)
    }
}

impl FileSystem {
    pub fn report(&self) -> Result<ImageReport> {
        let sb = &self.super_block;

        let mut bad_inodes = Vec::new();
        for slot in 0..sb.inode_count {
            if !self.inode_bitmap.is_set(slot) {
                continue;
            }
            if !self.crc.verify_inode(&self.inode_table.raw(slot)?) {
                bad_inodes.push(slot as u32 + 1);
            }
        }

        let mut entries = Vec::new();
        for entry in self.root_dir.live_entries() {
            let slot = entry.inode_no as u64 - 1;
            // 目录项指向表外时只报告，不中断
            let (size, inode_ok) = match self.inode_table.raw(slot) {
                Ok(raw) => (
                    self.inode_table.get_inode(slot)?.size_bytes,
                    self.crc.verify_inode(&raw),
                ),
                Err(_) => (0, false),
            };
            entries.push(EntryReport {
                name: entry.name_lossy(),
                inode_no: entry.inode_no,
                kind: entry.kind(),
                size,
                entry_ok: entry.verify(),
                inode_ok,
            });
        }

        Ok(ImageReport {
            super_block: sb.clone(),
            super_block_ok: self.super_block_ok,
            inodes_used: self.inode_bitmap.count_set(sb.inode_count),
            data_blocks_used: self.data_bitmap.count_set(sb.data_region_blocks),
            free_dir_slots: self.root_dir.free_slots(),
            bad_inodes,
            entries,
        })
    }
}
