//! # The Defination of Ext2 Inode Table Entry
//!
//! The inode table is a linear array of inode records, one table per block
//! group. Records are `sb.inode_size` bytes apart; only the first 128
//! bytes (the revision 0 layout) are decoded.
//!
//! The number of the block group containing an inode can be calculated as
//! `(inode_number - 1) / sb.inodes_per_group`, and the offset into the group's table is
//! `(inode_number - 1) % sb.inodes_per_group`. There is no inode 0.

use super::{BlockGroupDesc, FromBytes, SuperBlock};
use crate::constants::*;
use crate::prelude::*;
use crate::utils::*;

bitflags! {
    #[derive(PartialEq, Debug, Clone, Copy)]
    pub struct InodeMode: u16 {
        // Premission
        const PERM_MASK = 0xFFF;
        const SET_UID = 0x800;
        const SET_GID = 0x400;
        const STICKY = 0x200;
        const USER_READ = 0x100;
        const USER_WRITE = 0x80;
        const USER_EXEC = 0x40;
        const GROUP_READ = 0x20;
        const GROUP_WRITE = 0x10;
        const GROUP_EXEC = 0x8;
        const OTHER_READ = 0x4;
        const OTHER_WRITE = 0x2;
        const OTHER_EXEC = 0x1;
        // File type
        const TYPE_MASK = 0xF000;
        const FIFO = 0x1000;
        const CHARDEV = 0x2000;
        const DIRECTORY = 0x4000;
        const BLOCKDEV = 0x6000;
        const FILE = 0x8000;
        const SOFTLINK = 0xA000;
        const SOCKET = 0xC000;
    }
}

impl InodeMode {
    /// Get permission bits of an inode mode.
    pub fn perm_bits(&self) -> u16 {
        (*self & InodeMode::PERM_MASK).bits()
    }

    /// Get the file type of an inode mode.
    pub fn file_type(&self) -> FileType {
        match *self & InodeMode::TYPE_MASK {
            InodeMode::CHARDEV => FileType::CharacterDev,
            InodeMode::DIRECTORY => FileType::Directory,
            InodeMode::BLOCKDEV => FileType::BlockDev,
            InodeMode::FILE => FileType::RegularFile,
            InodeMode::FIFO => FileType::Fifo,
            InodeMode::SOCKET => FileType::Socket,
            InodeMode::SOFTLINK => FileType::SymLink,
            _ => FileType::Unknown,
        }
    }
}

/// Object types, with the values used by the directory entry type tag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    #[default]
    Unknown = 0,
    RegularFile = 1,
    Directory = 2,
    CharacterDev = 3,
    BlockDev = 4,
    Fifo = 5,
    Socket = 6,
    SymLink = 7,
}

impl From<u8> for FileType {
    fn from(tag: u8) -> Self {
        match tag {
            1 => FileType::RegularFile,
            2 => FileType::Directory,
            3 => FileType::CharacterDev,
            4 => FileType::BlockDev,
            5 => FileType::Fifo,
            6 => FileType::Socket,
            7 => FileType::SymLink,
            _ => FileType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Inode {
    pub mode: u16,
    pub uid: u16,
    pub size: u32,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub dtime: u32,
    pub gid: u16,
    pub links_count: u16,
    /// Count of 512-byte sectors, not filesystem blocks
    pub blocks: u32,
    pub flags: u32,
    pub osd1: u32,
    /// 12 direct pointers, then single, double and triple indirect
    pub block: [u32; EXT2_N_BLOCKS],
    pub generation: u32,
    pub file_acl: u32,
    pub dir_acl: u32,
    pub faddr: u32,
    pub osd2: [u8; 12],
}

impl FromBytes for Inode {
    const SIZE: usize = EXT2_GOOD_OLD_INODE_SIZE;

    fn decode(bytes: &[u8]) -> Self {
        let mut block = [0u32; EXT2_N_BLOCKS];
        for (i, ptr) in block.iter_mut().enumerate() {
            *ptr = read_u32(bytes, 40 + i * 4);
        }
        Self {
            mode: read_u16(bytes, 0),
            uid: read_u16(bytes, 2),
            size: read_u32(bytes, 4),
            atime: read_u32(bytes, 8),
            ctime: read_u32(bytes, 12),
            mtime: read_u32(bytes, 16),
            dtime: read_u32(bytes, 20),
            gid: read_u16(bytes, 24),
            links_count: read_u16(bytes, 26),
            blocks: read_u32(bytes, 28),
            flags: read_u32(bytes, 32),
            osd1: read_u32(bytes, 36),
            block,
            generation: read_u32(bytes, 100),
            file_acl: read_u32(bytes, 104),
            dir_acl: read_u32(bytes, 108),
            faddr: read_u32(bytes, 112),
            osd2: read_array(bytes, 116),
        }
    }
}

impl Inode {
    pub fn mode(&self) -> InodeMode {
        InodeMode::from_bits_truncate(self.mode)
    }

    pub fn file_type(&self) -> FileType {
        self.mode().file_type()
    }

    pub fn is_file(&self) -> bool {
        self.file_type() == FileType::RegularFile
    }

    pub fn is_dir(&self) -> bool {
        self.file_type() == FileType::Directory
    }

    pub fn is_softlink(&self) -> bool {
        self.file_type() == FileType::SymLink
    }

    pub fn links_cnt(&self) -> u16 {
        self.links_count
    }

    /// File size in bytes, the low 32 bits only
    pub fn size(&self) -> u64 {
        self.size as u64
    }

    /// The 12 direct block pointers
    pub fn direct_blocks(&self) -> &[u32] {
        &self.block[..EXT2_NDIR_BLOCKS]
    }
}

/// A combination of an `Inode` and its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeRef {
    pub id: InodeId,
    pub inode: Inode,
}

impl InodeRef {
    pub fn new(id: InodeId, inode: Inode) -> Self {
        Self { id, inode }
    }

    /// Find the position of an inode on disk. Return the block id and
    /// the byte offset within that block.
    ///
    /// Fails with `EBADINO` if `inode_id` is 0 or beyond `sb.inodes_count`,
    /// before any arithmetic is done on it.
    pub fn disk_pos(
        super_block: &SuperBlock,
        group_descs: &[BlockGroupDesc],
        inode_id: InodeId,
    ) -> Result<(PBlockId, usize)> {
        if inode_id == 0 || inode_id > super_block.inodes_count() {
            error!("Invalid inode number {}", inode_id);
            return_error!(
                ErrCode::EBADINO,
                "Inode {} outside 1..={}",
                inode_id,
                super_block.inodes_count()
            );
        }
        let inodes_per_group = super_block.inodes_per_group();
        let group = ((inode_id - 1) / inodes_per_group) as BlockGroupId;
        let index = ((inode_id - 1) % inodes_per_group) as u64;

        let desc = group_descs.get(group as usize).ok_or_else(|| {
            format_error!(
                ErrCode::EINVAL,
                "Inode {} lives in group {}, but only {} descriptors are loaded",
                inode_id,
                group,
                group_descs.len()
            )
        })?;
        let inode_size = super_block.inode_size() as u64;
        let block_size = super_block.block_size() as u64;
        let block_id = desc.inode_table_first_block() + index * inode_size / block_size;
        let offset = (index * inode_size % block_size) as usize;
        Ok((block_id, offset))
    }
}
