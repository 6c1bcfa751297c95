use crate::{
    disk::{Block, BLOCK_SIZE},
    fs::{
        checksum::{finalize_dirent, verify_dirent},
        config::{DIRENTS_PER_BLOCK, DIRENT_NAME_LEN, DIRENT_SIZE},
        error::{FileSystemError, Result},
    },
};

// 目录项类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirEntryType {
    File,
    Directory,
}

impl DirEntryType {
    pub fn as_raw(self) -> u8 {
        match self {
            Self::File => 1,
            Self::Directory => 2,
        }
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::File),
            2 => Some(Self::Directory),
            _ => None,
        }
    }
}

// 一个 64 字节的目录项，inode_no 为 0 表示空槽
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_no: u32,
    pub entry_type: u8,
    pub name: [u8; DIRENT_NAME_LEN],
    pub checksum: u8,
}

impl DirEntry {
    pub fn empty() -> Self {
        Self {
            inode_no: 0,
            entry_type: 0,
            name: [0; DIRENT_NAME_LEN],
            checksum: 0,
        }
    }

    /// 名字超过 58 字节的部分被截掉，校验和已算好
    pub fn new(inode_no: u32, name: &[u8], entry_type: DirEntryType) -> Self {
        let mut entry = Self::empty();
        entry.inode_no = inode_no;
        entry.entry_type = entry_type.as_raw();
        let len = name.len().min(DIRENT_NAME_LEN);
        entry.name[..len].copy_from_slice(&name[..len]);
        entry.seal();
        entry
    }

    pub fn is_free(&self) -> bool {
        self.inode_no == 0
    }

    pub fn kind(&self) -> Option<DirEntryType> {
        DirEntryType::from_raw(self.entry_type)
    }

    /// 名字字段中第一个 0 之前的部分
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(DIRENT_NAME_LEN);
        &self.name[..end]
    }

    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    pub fn to_bytes(&self) -> [u8; DIRENT_SIZE] {
        let mut record = [0u8; DIRENT_SIZE];
        record[0..4].copy_from_slice(&self.inode_no.to_le_bytes());
        record[4] = self.entry_type;
        record[5..5 + DIRENT_NAME_LEN].copy_from_slice(&self.name);
        record[DIRENT_SIZE - 1] = self.checksum;
        record
    }

    pub fn from_bytes(record: &[u8; DIRENT_SIZE]) -> Self {
        let mut name = [0u8; DIRENT_NAME_LEN];
        name.copy_from_slice(&record[5..5 + DIRENT_NAME_LEN]);
        Self {
            inode_no: u32::from_le_bytes([record[0], record[1], record[2], record[3]]),
            entry_type: record[4],
            name,
            checksum: record[DIRENT_SIZE - 1],
        }
    }

    pub fn seal(&mut self) -> u8 {
        let mut record = self.to_bytes();
        self.checksum = finalize_dirent(&mut record);
        self.checksum
    }

    pub fn verify(&self) -> bool {
        verify_dirent(&self.to_bytes())
    }
}

/// 单块目录：固定 64 个槽位，永远不会扩展到第二个块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub block_id: u64,
    pub entries: Vec<DirEntry>,
}

impl Directory {
    /// 新的根目录，槽 0 是 "."，槽 1 是 ".."，都指向根 inode
    pub fn new_root(block_id: u64, root_inode: u32) -> Self {
        let mut entries = vec![DirEntry::empty(); DIRENTS_PER_BLOCK];
        entries[0] = DirEntry::new(root_inode, b".", DirEntryType::Directory);
        entries[1] = DirEntry::new(root_inode, b"..", DirEntryType::Directory);
        Self { block_id, entries }
    }

    // 从块内容加载目录
    pub fn from_block(block_id: u64, block: &Block) -> Self {
        let entries = block
            .chunks_exact(DIRENT_SIZE)
            .map(|chunk| {
                let mut record = [0u8; DIRENT_SIZE];
                record.copy_from_slice(chunk);
                DirEntry::from_bytes(&record)
            })
            .collect();
        Self { block_id, entries }
    }

    pub fn to_block(&self) -> Block {
        let mut block: Block = [0; BLOCK_SIZE];
        for (chunk, entry) in block.chunks_exact_mut(DIRENT_SIZE).zip(&self.entries) {
            chunk.copy_from_slice(&entry.to_bytes());
        }
        block
    }

    pub fn find_free_slot(&self) -> Option<usize> {
        self.entries.iter().position(DirEntry::is_free)
    }

    // 添加目录项，返回占用的槽位
    pub fn add(&mut self, inode_no: u32, name: &[u8], entry_type: DirEntryType) -> Result<usize> {
        let slot = self.find_free_slot().ok_or(FileSystemError::DirectoryFull)?;
        self.entries[slot] = DirEntry::new(inode_no, name, entry_type);
        Ok(slot)
    }

    // 查找目录项，返回 inode 号
    pub fn find(&self, name: &[u8]) -> Option<u32> {
        self.live_entries()
            .find(|e| e.name_bytes() == name)
            .map(|e| e.inode_no)
    }

    pub fn live_entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|e| !e.is_free())
    }

    pub fn free_slots(&self) -> usize {
        self.entries.iter().filter(|e| e.is_free()).count()
    }
}
