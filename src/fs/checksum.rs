//! 三类记录的完整性校验：超级块和 inode 用 CRC-32，目录项用单字节异或。

use std::fmt;

use crate::{
    disk::{Block, BLOCK_SIZE},
    fs::config::{DIRENT_SIZE, INODE_CRC_COVERED, INODE_SIZE, SUPER_BLOCK_SIZE},
};

const POLYNOMIAL: u32 = 0xEDB8_8320;

// 超级块校验和字段位于记录末尾 4 字节
const SUPER_BLOCK_CRC_OFFSET: usize = SUPER_BLOCK_SIZE - 4;
// 校验范围是整个块去掉最后 4 字节
const SUPER_BLOCK_CRC_COVERED: usize = BLOCK_SIZE - 4;

/// 反射 CRC-32 查表计算器。
///
/// 表在构造时生成一次，之后只读；每个文件系统句柄持有自己的一份。
#[derive(Clone)]
pub struct Crc32 {
    table: [u32; 256],
}

impl Crc32 {
    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut c = i as u32;
            for _ in 0..8 {
                c = if c & 1 != 0 {
                    POLYNOMIAL ^ (c >> 1)
                } else {
                    c >> 1
                };
            }
            *entry = c;
        }
        Self { table }
    }

    pub fn checksum(&self, bytes: &[u8]) -> u32 {
        let mut c = 0xFFFF_FFFFu32;
        for &b in bytes {
            c = self.table[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
        }
        c ^ 0xFFFF_FFFF
    }

    fn superblock_crc(&self, block: &Block) -> u32 {
        let mut scratch = *block;
        scratch[SUPER_BLOCK_CRC_OFFSET..SUPER_BLOCK_SIZE].fill(0);
        self.checksum(&scratch[..SUPER_BLOCK_CRC_COVERED])
    }

    /// 清零校验和字段后计算整块（除最后 4 字节）的 CRC，并写回字段
    pub fn finalize_superblock(&self, block: &mut Block) -> u32 {
        block[SUPER_BLOCK_CRC_OFFSET..SUPER_BLOCK_SIZE].fill(0);
        let crc = self.superblock_crc(block);
        block[SUPER_BLOCK_CRC_OFFSET..SUPER_BLOCK_SIZE].copy_from_slice(&crc.to_le_bytes());
        crc
    }

    pub fn verify_superblock(&self, block: &Block) -> bool {
        let stored = u32::from_le_bytes(
            block[SUPER_BLOCK_CRC_OFFSET..SUPER_BLOCK_SIZE]
                .try_into()
                .unwrap_or_default(),
        );
        stored == self.superblock_crc(block)
    }

    fn inode_crc(&self, record: &[u8; INODE_SIZE]) -> u64 {
        self.checksum(&record[..INODE_CRC_COVERED]) as u64
    }

    /// 32 位 CRC 扩展到记录末尾的 64 位字段
    pub fn finalize_inode(&self, record: &mut [u8; INODE_SIZE]) -> u64 {
        record[INODE_CRC_COVERED..].fill(0);
        let crc = self.inode_crc(record);
        record[INODE_CRC_COVERED..].copy_from_slice(&crc.to_le_bytes());
        crc
    }

    pub fn verify_inode(&self, record: &[u8; INODE_SIZE]) -> bool {
        let stored = u64::from_le_bytes(
            record[INODE_CRC_COVERED..]
                .try_into()
                .unwrap_or_default(),
        );
        stored == self.inode_crc(record)
    }
}

impl fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crc32").finish_non_exhaustive()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

fn dirent_xor(record: &[u8; DIRENT_SIZE]) -> u8 {
    record[..DIRENT_SIZE - 1].iter().fold(0, |acc, b| acc ^ b)
}

/// 前 63 字节异或折叠到最后一个字节
pub fn finalize_dirent(record: &mut [u8; DIRENT_SIZE]) -> u8 {
    let x = dirent_xor(record);
    record[DIRENT_SIZE - 1] = x;
    x
}

pub fn verify_dirent(record: &[u8; DIRENT_SIZE]) -> bool {
    record[DIRENT_SIZE - 1] == dirent_xor(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_standard_vector() {
        let crc = Crc32::new();
        assert_eq!(crc.checksum(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc.checksum(b""), 0);
    }

    #[test]
    fn independent_instances_agree() {
        let a = Crc32::new();
        let b = Crc32::default();
        assert_eq!(a.checksum(b"mini-vsfs"), b.checksum(b"mini-vsfs"));
    }

    #[test]
    fn superblock_checksum_ignores_stale_field() {
        let crc = Crc32::new();
        let mut block: Block = [0; BLOCK_SIZE];
        block[0..4].copy_from_slice(&0x4D56_5346u32.to_le_bytes());
        let first = crc.finalize_superblock(&mut block);
        assert!(crc.verify_superblock(&block));

        // 再算一次结果不变，说明旧的校验和字段不参与计算
        assert_eq!(crc.finalize_superblock(&mut block), first);

        block[50] ^= 1;
        assert!(!crc.verify_superblock(&block));
    }

    #[test]
    fn superblock_checksum_excludes_last_four_bytes() {
        let crc = Crc32::new();
        let mut block: Block = [0; BLOCK_SIZE];
        crc.finalize_superblock(&mut block);
        block[BLOCK_SIZE - 1] = 0xFF;
        assert!(crc.verify_superblock(&block));
    }

    #[test]
    fn inode_checksum_is_widened_crc() {
        let crc = Crc32::new();
        let mut record = [0u8; INODE_SIZE];
        record[0] = 0x00;
        record[1] = 0x80;
        record[120..].fill(0xEE);
        let value = crc.finalize_inode(&mut record);
        assert_eq!(value, crc.checksum(&record[..120]) as u64);
        assert_eq!(&record[124..], &[0, 0, 0, 0]);
        assert!(crc.verify_inode(&record));
    }

    #[test]
    fn dirent_checksum_is_xor_of_prefix() {
        let mut record = [0u8; DIRENT_SIZE];
        record[0] = 1;
        record[4] = 2;
        record[5] = b'.';
        let x = finalize_dirent(&mut record);
        assert_eq!(x, 1 ^ 2 ^ b'.');
        assert!(verify_dirent(&record));
        record[6] = b'x';
        assert!(!verify_dirent(&record));
    }
}
