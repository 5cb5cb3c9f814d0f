use super::Ext2;
use crate::constants::*;
use crate::ext2_defs::*;
use crate::prelude::*;

impl Ext2 {
    /// Read a block from block device into a fresh staging buffer
    pub(super) fn read_block(&self, block_id: PBlockId) -> Result<Block<'_>> {
        Block::load(
            self.block_device.as_ref(),
            self.drive,
            self.allocator.as_ref(),
            self.block_size,
            block_id,
        )
    }

    /// Read a block from block device into `buf`, which holds at least
    /// one block
    pub fn read_block_into(&self, block_id: PBlockId, buf: &mut [u8]) -> Result<()> {
        read_block(
            self.block_device.as_ref(),
            self.drive,
            self.block_size,
            block_id,
            buf,
        )
    }

    /// Read an inode from block device, return an `InodeRef` that
    /// combines the inode and its id.
    ///
    /// Inode 0 and numbers beyond the superblock's inode count fail with
    /// `EBADINO` before anything is read.
    pub fn read_inode(&self, inode_id: InodeId) -> Result<InodeRef> {
        let (block_id, offset) =
            InodeRef::disk_pos(&self.super_block, &self.group_descs, inode_id)?;
        debug!(
            "Read inode {}: block {}, offset {}",
            inode_id, block_id, offset
        );
        let block = self.read_block(block_id)?;
        let inode = block.read_offset_as::<Inode>(offset)?;
        Ok(InodeRef::new(inode_id, inode))
    }

    /// Read the root inode from block device
    pub fn read_root_inode(&self) -> Result<InodeRef> {
        self.read_inode(EXT2_ROOT_INO)
    }
}
