use crate::constants::*;
use crate::ext2_defs::*;
use crate::prelude::*;

mod dir;
mod file;
mod rw;

/// A mounted, read-only Ext2 volume.
///
/// The superblock and group descriptor table are loaded once by `load`
/// and only read afterwards. Every operation stages its blocks in buffers
/// borrowed from the allocator for the duration of the call.
#[derive(Debug)]
pub struct Ext2 {
    block_device: Arc<dyn BlockDevice>,
    drive: DriveId,
    allocator: Arc<dyn BufferAllocator>,
    super_block: SuperBlock,
    group_descs: Vec<BlockGroupDesc>,
    block_size: usize,
    inode_size: usize,
    first_data_block: u32,
}

impl Ext2 {
    /// Opens and loads an Ext2 from `drive` of the `block_device`,
    /// staging reads in heap buffers.
    ///
    /// | Boot | Super Block | Group Descriptors |
    /// | Block Bitmap | Inode Bitmap | Inode Table | Data Blocks |
    pub fn load(block_device: Arc<dyn BlockDevice>, drive: DriveId) -> Result<Self> {
        Self::load_with_allocator(block_device, drive, Arc::new(HeapAllocator))
    }

    /// Opens and loads an Ext2, staging reads in buffers from `allocator`.
    pub fn load_with_allocator(
        block_device: Arc<dyn BlockDevice>,
        drive: DriveId,
        allocator: Arc<dyn BufferAllocator>,
    ) -> Result<Self> {
        info!("Initializing Ext2 filesystem on {:?} drive", drive);
        let super_block =
            SuperBlock::load_from_disk(block_device.as_ref(), drive, allocator.as_ref())?;
        info!(
            "Block size: {} bytes, total blocks: {}, total inodes: {}, groups: {}",
            super_block.block_size(),
            super_block.blocks_count(),
            super_block.inodes_count(),
            super_block.groups_count()
        );
        if !super_block.volume_name().is_empty() {
            info!(
                "Volume name: {}",
                String::from_utf8_lossy(super_block.volume_name())
            );
        }
        let group_descs = BlockGroupDesc::load_table(
            block_device.as_ref(),
            drive,
            allocator.as_ref(),
            &super_block,
        )?;
        info!("Filesystem initialized successfully");
        Ok(Self {
            block_device,
            drive,
            allocator,
            block_size: super_block.block_size(),
            inode_size: super_block.inode_size(),
            first_data_block: super_block.first_data_block(),
            super_block,
            group_descs,
        })
    }

    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    /// The loaded group descriptors. Without the `full_gdt` feature this
    /// may be shorter than `groups_count()`.
    pub fn group_descs(&self) -> &[BlockGroupDesc] {
        &self.group_descs
    }

    pub fn groups_count(&self) -> u32 {
        self.super_block.groups_count()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn inode_size(&self) -> usize {
        self.inode_size
    }

    pub fn first_data_block(&self) -> u32 {
        self.first_data_block
    }

    pub fn drive(&self) -> DriveId {
        self.drive
    }

    /// Largest number of bytes `read_file` can return:
    /// what the 12 direct pointers address.
    pub fn direct_capacity(&self) -> usize {
        EXT2_NDIR_BLOCKS * self.block_size
    }
}
