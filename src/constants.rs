#![allow(unused)]

use crate::prelude::*;

/// Magic signature stored in every ext2 superblock.
pub const EXT2_SIGNATURE: u16 = 0xEF53;

/// Byte offset of the primary superblock from the start of the volume.
pub const SUPERBLOCK_OFFSET: usize = 1024;
/// Size of the on-disk superblock record.
pub const SUPERBLOCK_SIZE: usize = 1024;

/// Sector size of the underlying block device.
pub const SECTOR_SIZE: usize = 512;

pub const EXT2_MIN_BLOCK_SIZE: usize = 1024;
pub const EXT2_MAX_LOG_BLOCK_SIZE: u32 = 3;

/// Inode size of revision 0 volumes, and the size of the decoded record.
pub const EXT2_GOOD_OLD_INODE_SIZE: usize = 128;
pub const EXT2_DYNAMIC_REV: u32 = 1;

/// Size of an on-disk block group descriptor.
pub const GROUP_DESC_SIZE: usize = 32;

/// The inode number of root inode
pub const EXT2_ROOT_INO: InodeId = 2;

/// Number of direct block pointers in an inode.
pub const EXT2_NDIR_BLOCKS: usize = 12;
/// Slot of the singly indirect block pointer.
pub const EXT2_IND_BLOCK: usize = 12;
/// Total number of block pointers in an inode.
pub const EXT2_N_BLOCKS: usize = 15;

/// Size of the fixed part of a directory entry.
pub const DIR_ENTRY_HEADER_SIZE: usize = 8;

/// Maximum bytes in a file name
pub const NAME_MAX: usize = 255;

/// Superblock `state` values.
pub const EXT2_VALID_FS: u16 = 1;
pub const EXT2_ERROR_FS: u16 = 2;

/// Superblock `errors` value: continue on errors.
pub const EXT2_ERRORS_CONTINUE: u16 = 1;
