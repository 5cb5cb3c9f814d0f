//! # The Defination of Ext2 Block Group Description
//!
//! The descriptor table follows the superblock's block and holds one
//! 32-byte record per block group. A descriptor tells where the group's
//! bitmaps and inode table live.

use super::{Block, BlockDevice, BufferAllocator, DriveId, FromBytes, SuperBlock};
use crate::constants::*;
use crate::prelude::*;
use crate::utils::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockGroupDesc {
    block_bitmap: u32,
    inode_bitmap: u32,
    inode_table: u32,
    free_blocks_count: u16,
    free_inodes_count: u16,
    used_dirs_count: u16,
}

impl FromBytes for BlockGroupDesc {
    const SIZE: usize = GROUP_DESC_SIZE;

    fn decode(bytes: &[u8]) -> Self {
        Self {
            block_bitmap: read_u32(bytes, 0),
            inode_bitmap: read_u32(bytes, 4),
            inode_table: read_u32(bytes, 8),
            free_blocks_count: read_u16(bytes, 12),
            free_inodes_count: read_u16(bytes, 14),
            used_dirs_count: read_u16(bytes, 16),
        }
    }
}

impl BlockGroupDesc {
    pub fn block_bitmap_block(&self) -> PBlockId {
        self.block_bitmap as PBlockId
    }

    pub fn inode_bitmap_block(&self) -> PBlockId {
        self.inode_bitmap as PBlockId
    }

    /// First block of the group's inode table
    pub fn inode_table_first_block(&self) -> PBlockId {
        self.inode_table as PBlockId
    }

    pub fn free_blocks_count(&self) -> u16 {
        self.free_blocks_count
    }

    pub fn free_inodes_count(&self) -> u16 {
        self.free_inodes_count
    }

    pub fn used_dirs_count(&self) -> u16 {
        self.used_dirs_count
    }

    /// Load the block group descriptor table.
    ///
    /// By default only the first block of the table is read, so volumes
    /// with more groups than fit in one block get a truncated table. The
    /// `full_gdt` feature reads every block the table spans.
    pub fn load_table(
        block_device: &dyn BlockDevice,
        drive: DriveId,
        allocator: &dyn BufferAllocator,
        super_block: &SuperBlock,
    ) -> Result<Vec<BlockGroupDesc>> {
        let groups_count = super_block.groups_count() as usize;
        let descs_per_block = super_block.descs_per_block() as usize;
        let block_size = super_block.block_size();
        let first_block = super_block.first_desc_block();

        let table_blocks = if cfg!(feature = "full_gdt") {
            super_block.desc_blocks_count() as usize
        } else {
            1
        };
        let loaded = min(groups_count, table_blocks * descs_per_block);
        if loaded < groups_count {
            warn!(
                "Group descriptor table spans more than one block, only {} of {} groups loaded",
                loaded, groups_count
            );
        }

        let mut table = Vec::new();
        table.try_reserve_exact(loaded).map_err(|_| {
            error!("Cannot allocate memory for group descriptors");
            format_error!(ErrCode::ENOMEM, "Cannot allocate {} group descriptors", loaded)
        })?;

        let mut block_id = first_block;
        while table.len() < loaded {
            let block = Block::load(block_device, drive, allocator, block_size, block_id)?;
            let in_block = min(loaded - table.len(), descs_per_block);
            for i in 0..in_block {
                table.push(block.read_offset_as::<BlockGroupDesc>(i * GROUP_DESC_SIZE)?);
            }
            block_id += 1;
        }
        debug!(
            "Loaded {} group descriptors from block {}",
            table.len(),
            first_block
        );
        Ok(table)
    }
}
