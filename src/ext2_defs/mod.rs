//! # The Defination of Ext2 File System Data Structures
//!
//! The volume is split into block groups. Block group 0 starts with:
//!
//! - Boot record: 1024 bytes
//! - Superblock: 1024 bytes
//! - Group Descriptors: many blocks
//! - Block Bitmap: 1 block
//! - Inode Bitmap: 1 block
//! - Inode Table: many blocks
//! - Data Blocks: many more blocks
//!
//! With 1024-byte blocks the boot record fills block 0 and the superblock
//! fills block 1, so the descriptor table starts at block 2. With larger
//! blocks both share block 0 and the table starts at block 1.
//!
//! All multi-byte fields are little-endian. Records are decoded field by
//! field from byte slices; no in-memory layout is assumed to match the disk.

mod allocator;
mod block;
mod block_device;
mod block_group;
mod dir_entry;
mod inode;
mod super_block;

pub use allocator::*;
pub use block::*;
pub use block_device::*;
pub use block_group::*;
pub use dir_entry::*;
pub use inode::*;
pub use super_block::*;

use crate::prelude::*;

/// A fixed-size on-disk record.
pub trait FromBytes: Sized {
    /// Size of the record on disk.
    const SIZE: usize;

    /// Decode the record from `bytes`, which holds at least `Self::SIZE` bytes.
    fn decode(bytes: &[u8]) -> Self;

    /// Decode the record from the start of `bytes`.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return_error!(
                ErrCode::EINVAL,
                "Record needs {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            );
        }
        Ok(Self::decode(bytes))
    }
}
