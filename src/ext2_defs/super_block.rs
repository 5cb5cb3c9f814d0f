//! # The Defination of Ext2 Super Block
//!
//! The superblock records global geometry of the volume. The primary copy
//! lives 1024 bytes from the start of the volume, i.e. sectors 2 and 3.

use super::{Buffer, BufferAllocator, BlockDevice, DriveId, FromBytes};
use crate::constants::*;
use crate::prelude::*;
use crate::utils::*;

bitflags! {
    /// Features a driver may ignore and still read and write the volume.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompatFeatures: u32 {
        const DIR_PREALLOC = 0x0001;
        const IMAGIC_INODES = 0x0002;
        const HAS_JOURNAL = 0x0004;
        const EXT_ATTR = 0x0008;
        const RESIZE_INODE = 0x0010;
        const DIR_INDEX = 0x0020;
    }
}

bitflags! {
    /// Features a driver must understand to read the volume at all.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IncompatFeatures: u32 {
        const COMPRESSION = 0x0001;
        const FILETYPE = 0x0002;
        const RECOVER = 0x0004;
        const JOURNAL_DEV = 0x0008;
        const META_BG = 0x0010;
    }
}

bitflags! {
    /// Features a driver must understand to write the volume.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RoCompatFeatures: u32 {
        const SPARSE_SUPER = 0x0001;
        const LARGE_FILE = 0x0002;
        const BTREE_DIR = 0x0004;
    }
}

impl IncompatFeatures {
    /// Incompatible features this driver can read through.
    pub const SUPPORTED: IncompatFeatures = IncompatFeatures::FILETYPE;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    inodes_count: u32,
    blocks_count: u32,
    reserved_blocks_count: u32,
    free_blocks_count: u32,
    free_inodes_count: u32,
    first_data_block: u32,
    log_block_size: u32,
    log_frag_size: u32,
    blocks_per_group: u32,
    frags_per_group: u32,
    inodes_per_group: u32,
    mtime: u32,
    wtime: u32,
    mnt_count: u16,
    max_mnt_count: u16,
    magic: u16,
    state: u16,
    errors: u16,
    minor_rev_level: u16,
    lastcheck: u32,
    checkinterval: u32,
    creator_os: u32,
    rev_level: u32,
    def_resuid: u16,
    def_resgid: u16,
    // Dynamic revision fields
    first_ino: u32,
    inode_size: u16,
    block_group_nr: u16,
    feature_compat: u32,
    feature_incompat: u32,
    feature_ro_compat: u32,
    uuid: [u8; 16],
    volume_name: [u8; 16],
}

impl FromBytes for SuperBlock {
    const SIZE: usize = SUPERBLOCK_SIZE;

    fn decode(bytes: &[u8]) -> Self {
        Self {
            inodes_count: read_u32(bytes, 0),
            blocks_count: read_u32(bytes, 4),
            reserved_blocks_count: read_u32(bytes, 8),
            free_blocks_count: read_u32(bytes, 12),
            free_inodes_count: read_u32(bytes, 16),
            first_data_block: read_u32(bytes, 20),
            log_block_size: read_u32(bytes, 24),
            log_frag_size: read_u32(bytes, 28),
            blocks_per_group: read_u32(bytes, 32),
            frags_per_group: read_u32(bytes, 36),
            inodes_per_group: read_u32(bytes, 40),
            mtime: read_u32(bytes, 44),
            wtime: read_u32(bytes, 48),
            mnt_count: read_u16(bytes, 52),
            max_mnt_count: read_u16(bytes, 54),
            magic: read_u16(bytes, 56),
            state: read_u16(bytes, 58),
            errors: read_u16(bytes, 60),
            minor_rev_level: read_u16(bytes, 62),
            lastcheck: read_u32(bytes, 64),
            checkinterval: read_u32(bytes, 68),
            creator_os: read_u32(bytes, 72),
            rev_level: read_u32(bytes, 76),
            def_resuid: read_u16(bytes, 80),
            def_resgid: read_u16(bytes, 82),
            first_ino: read_u32(bytes, 84),
            inode_size: read_u16(bytes, 88),
            block_group_nr: read_u16(bytes, 90),
            feature_compat: read_u32(bytes, 92),
            feature_incompat: read_u32(bytes, 96),
            feature_ro_compat: read_u32(bytes, 100),
            uuid: read_array(bytes, 104),
            volume_name: read_array(bytes, 120),
        }
    }
}

impl SuperBlock {
    /// Read the primary superblock and validate it.
    ///
    /// Exactly one device read is issued. A bad magic fails with
    /// `EBADMAGIC` before any other field is looked at.
    pub fn load_from_disk(
        block_device: &dyn BlockDevice,
        drive: DriveId,
        allocator: &dyn BufferAllocator,
    ) -> Result<Self> {
        let mut buf = Buffer::alloc(allocator, SUPERBLOCK_SIZE)?;
        let lba = (SUPERBLOCK_OFFSET / SECTOR_SIZE) as u64;
        block_device
            .read_sectors(drive, lba, SUPERBLOCK_SIZE / SECTOR_SIZE, &mut buf)
            .map_err(|e| {
                error!("Cannot read superblock from disk: {:?}", e);
                e
            })?;
        let sb = SuperBlock::from_bytes(&buf)?;
        sb.validate()?;
        Ok(sb)
    }

    /// Check the signature, then the geometry derived values depend on.
    pub fn validate(&self) -> Result<()> {
        if self.magic != EXT2_SIGNATURE {
            error!("Invalid Ext2 signature: {:#06x}", self.magic);
            return_error!(
                ErrCode::EBADMAGIC,
                "Invalid Ext2 signature {:#06x}",
                self.magic
            );
        }
        if self.log_block_size > EXT2_MAX_LOG_BLOCK_SIZE {
            return_error!(
                ErrCode::ENOTSUP,
                "Unsupported block size exponent {}",
                self.log_block_size
            );
        }
        if self.blocks_count == 0 || self.blocks_per_group == 0 || self.inodes_per_group == 0 {
            return_error!(
                ErrCode::EINVAL,
                "Corrupted group geometry: {} blocks, {} per group, {} inodes per group",
                self.blocks_count,
                self.blocks_per_group,
                self.inodes_per_group
            );
        }
        if self.rev_level >= EXT2_DYNAMIC_REV {
            let inode_size = self.inode_size as usize;
            if !inode_size.is_power_of_two()
                || inode_size < EXT2_GOOD_OLD_INODE_SIZE
                || inode_size > self.block_size()
            {
                return_error!(ErrCode::EINVAL, "Invalid inode size {}", inode_size);
            }
            let unsupported = self.features_incompat().difference(IncompatFeatures::SUPPORTED);
            if !unsupported.is_empty() {
                return_error!(
                    ErrCode::ENOTSUP,
                    "Unsupported incompatible features {:?}",
                    unsupported
                );
            }
        }
        if self.state == EXT2_ERROR_FS {
            warn!("Filesystem was not cleanly unmounted or has errors");
        }
        Ok(())
    }

    pub fn magic(&self) -> u16 {
        self.magic
    }

    pub fn inodes_count(&self) -> u32 {
        self.inodes_count
    }

    pub fn blocks_count(&self) -> u32 {
        self.blocks_count
    }

    pub fn reserved_blocks_count(&self) -> u32 {
        self.reserved_blocks_count
    }

    pub fn free_blocks_count(&self) -> u32 {
        self.free_blocks_count
    }

    pub fn free_inodes_count(&self) -> u32 {
        self.free_inodes_count
    }

    pub fn first_data_block(&self) -> u32 {
        self.first_data_block
    }

    pub fn log_block_size(&self) -> u32 {
        self.log_block_size
    }

    pub fn blocks_per_group(&self) -> u32 {
        self.blocks_per_group
    }

    pub fn inodes_per_group(&self) -> u32 {
        self.inodes_per_group
    }

    pub fn mount_count(&self) -> u16 {
        self.mnt_count
    }

    pub fn max_mount_count(&self) -> u16 {
        self.max_mnt_count
    }

    pub fn state(&self) -> u16 {
        self.state
    }

    pub fn errors(&self) -> u16 {
        self.errors
    }

    pub fn rev_level(&self) -> u32 {
        self.rev_level
    }

    pub fn first_ino(&self) -> u32 {
        if self.rev_level >= EXT2_DYNAMIC_REV {
            self.first_ino
        } else {
            11
        }
    }

    pub fn features_compat(&self) -> CompatFeatures {
        CompatFeatures::from_bits_retain(self.feature_compat)
    }

    pub fn features_incompat(&self) -> IncompatFeatures {
        IncompatFeatures::from_bits_retain(self.feature_incompat)
    }

    pub fn features_ro_compat(&self) -> RoCompatFeatures {
        RoCompatFeatures::from_bits_retain(self.feature_ro_compat)
    }

    pub fn uuid(&self) -> [u8; 16] {
        self.uuid
    }

    /// Volume label with its NUL padding removed
    pub fn volume_name(&self) -> &[u8] {
        trim_nul(&self.volume_name)
    }

    /// `1024 << log_block_size`
    pub fn block_size(&self) -> usize {
        EXT2_MIN_BLOCK_SIZE << self.log_block_size
    }

    /// Stride of the inode table. Revision 0 volumes always use 128 bytes.
    pub fn inode_size(&self) -> usize {
        if self.rev_level >= EXT2_DYNAMIC_REV {
            self.inode_size as usize
        } else {
            EXT2_GOOD_OLD_INODE_SIZE
        }
    }

    /// `ceil(blocks_count / blocks_per_group)`
    pub fn groups_count(&self) -> u32 {
        self.blocks_count.div_ceil(self.blocks_per_group)
    }

    /// The block right after the superblock's own block.
    pub fn first_desc_block(&self) -> PBlockId {
        if self.block_size() == EXT2_MIN_BLOCK_SIZE {
            2
        } else {
            1
        }
    }

    /// Number of descriptors that fit in one block
    pub fn descs_per_block(&self) -> u32 {
        (self.block_size() / GROUP_DESC_SIZE) as u32
    }

    /// Number of blocks the descriptor table spans.
    pub fn desc_blocks_count(&self) -> u32 {
        self.groups_count().div_ceil(self.descs_per_block())
    }
}
