//! In-memory block device, counting allocator and an ext2 image builder
//! for unit tests.

use crate::constants::*;
use crate::ext2_defs::*;
use crate::prelude::*;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A disk image held in memory. Records every read as `(lba, count)`.
#[derive(Debug)]
pub struct MemDevice {
    data: Vec<u8>,
    reads: Mutex<Vec<(u64, usize)>>,
    fail_lba: Mutex<Option<u64>>,
}

impl MemDevice {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            reads: Mutex::new(Vec::new()),
            fail_lba: Mutex::new(None),
        }
    }

    pub fn reads(&self) -> Vec<(u64, usize)> {
        self.reads.lock().unwrap().clone()
    }

    /// Make reads starting at `lba` fail from now on.
    pub fn fail_at(&self, lba: u64) {
        *self.fail_lba.lock().unwrap() = Some(lba);
    }
}

impl BlockDevice for MemDevice {
    fn read_sectors(&self, _drive: DriveId, lba: u64, count: usize, buf: &mut [u8]) -> Result<()> {
        self.reads.lock().unwrap().push((lba, count));
        if *self.fail_lba.lock().unwrap() == Some(lba) {
            return_error!(ErrCode::EIO, "Injected failure at lba {}", lba);
        }
        let len = count * SECTOR_SIZE;
        let src = (lba as usize)
            .checked_mul(SECTOR_SIZE)
            .and_then(|start| self.data.get(start..start.checked_add(len)?))
            .ok_or_else(|| format_error!(ErrCode::EIO, "lba {} is beyond the disk", lba))?;
        buf[..len].copy_from_slice(src);
        Ok(())
    }
}

/// Allocator with an optional budget of allocations that tracks buffers
/// not yet released.
#[derive(Debug)]
pub struct CountingAllocator {
    budget: AtomicUsize,
    allocations: AtomicUsize,
    outstanding: AtomicUsize,
}

impl CountingAllocator {
    pub fn unlimited() -> Self {
        Self::with_budget(usize::MAX)
    }

    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget: AtomicUsize::new(budget),
            allocations: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }
}

impl BufferAllocator for CountingAllocator {
    fn allocate(&self, size: usize) -> Option<Vec<u8>> {
        self.budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| b.checked_sub(1))
            .ok()?;
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Some(vec![0u8; size])
    }

    fn release(&self, _buf: Vec<u8>) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Deterministic file content.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
}

fn put16(buf: &mut [u8], offset: usize, v: u16) {
    buf[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
}

fn put32(buf: &mut [u8], offset: usize, v: u32) {
    buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}

/// Write a directory entry at `offset` and return the offset of the next one.
pub fn push_dir_entry(
    buf: &mut [u8],
    offset: usize,
    inode: InodeId,
    rec_len: u16,
    name: &[u8],
    file_type: u8,
) -> usize {
    put32(buf, offset, inode);
    put16(buf, offset + 4, rec_len);
    buf[offset + 6] = name.len() as u8;
    buf[offset + 7] = file_type;
    buf[offset + 8..offset + 8 + name.len()].copy_from_slice(name);
    offset + rec_len as usize
}

/// The fields of an on-disk inode the tests care about.
#[derive(Debug, Clone, Default)]
pub struct DiskInode {
    pub mode: u16,
    pub size: u32,
    pub links_count: u16,
    pub block: [u32; EXT2_N_BLOCKS],
}

impl DiskInode {
    pub fn file(size: u32) -> Self {
        Self {
            mode: 0x81A4,
            size,
            links_count: 1,
            ..Default::default()
        }
    }

    pub fn dir(size: u32) -> Self {
        Self {
            mode: 0x41ED,
            size,
            links_count: 2,
            ..Default::default()
        }
    }

    pub fn encode(&self) -> [u8; EXT2_GOOD_OLD_INODE_SIZE] {
        let mut raw = [0u8; EXT2_GOOD_OLD_INODE_SIZE];
        put16(&mut raw, 0, self.mode);
        put32(&mut raw, 4, self.size);
        put16(&mut raw, 26, self.links_count);
        let used = self.block.iter().filter(|&&b| b != 0).count() as u32;
        put32(&mut raw, 28, used * 2);
        for (i, ptr) in self.block.iter().enumerate() {
            put32(&mut raw, 40 + i * 4, *ptr);
        }
        raw
    }
}

enum Content {
    File(Vec<u8>),
    Dir,
    Raw(DiskInode),
}

struct Entry {
    name: Vec<u8>,
    ino: InodeId,
    file_type: FileType,
    /// `None` leaves the inode untouched on disk
    content: Option<Content>,
}

struct Layout {
    first_desc_block: u64,
    /// `(block bitmap, inode bitmap, inode table)` of each group
    groups: Vec<(u64, u64, u64)>,
    data_start: u64,
}

/// Lays out a small ext2 volume in memory: one root directory block,
/// then the data of each root entry in the order it was added.
pub struct ImageBuilder {
    block_size: usize,
    blocks: u32,
    blocks_per_group: u32,
    inodes_per_group: u32,
    magic: u16,
    dynamic_inode_size: Option<u16>,
    volume_name: Vec<u8>,
    root_mode: u16,
    root_dir_size: Option<u32>,
    next_ino: InodeId,
    entries: Vec<Entry>,
}

impl ImageBuilder {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            blocks: 128,
            blocks_per_group: 8192,
            inodes_per_group: 32,
            magic: EXT2_SIGNATURE,
            dynamic_inode_size: None,
            volume_name: Vec::new(),
            root_mode: 0x41ED,
            root_dir_size: None,
            next_ino: 12,
            entries: Vec::new(),
        }
    }

    pub fn blocks(mut self, blocks: u32) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn blocks_per_group(mut self, blocks_per_group: u32) -> Self {
        self.blocks_per_group = blocks_per_group;
        self
    }

    pub fn inodes_per_group(mut self, inodes_per_group: u32) -> Self {
        self.inodes_per_group = inodes_per_group;
        self
    }

    pub fn magic(mut self, magic: u16) -> Self {
        self.magic = magic;
        self
    }

    /// Use revision 1 with the given inode size.
    pub fn dynamic_rev(mut self, inode_size: u16) -> Self {
        self.dynamic_inode_size = Some(inode_size);
        self
    }

    pub fn volume_name(mut self, name: &str) -> Self {
        self.volume_name = name.as_bytes().to_vec();
        self
    }

    pub fn root_mode(mut self, mode: u16) -> Self {
        self.root_mode = mode;
        self
    }

    pub fn root_dir_size(mut self, size: u32) -> Self {
        self.root_dir_size = Some(size);
        self
    }

    fn alloc_ino(&mut self) -> InodeId {
        let ino = self.next_ino;
        self.next_ino += 1;
        ino
    }

    fn push(mut self, name: &str, ino: InodeId, file_type: FileType, content: Option<Content>) -> Self {
        self.entries.push(Entry {
            name: name.as_bytes().to_vec(),
            ino,
            file_type,
            content,
        });
        self
    }

    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        let ino = self.alloc_ino();
        self.file_at(ino, name, data)
    }

    pub fn file_at(self, ino: InodeId, name: &str, data: &[u8]) -> Self {
        self.push(name, ino, FileType::RegularFile, Some(Content::File(data.to_vec())))
    }

    /// An empty subdirectory holding only "." and "..".
    pub fn subdir(mut self, name: &str) -> Self {
        let ino = self.alloc_ino();
        self.push(name, ino, FileType::Directory, Some(Content::Dir))
    }

    pub fn raw_inode(self, ino: InodeId, name: &str, inode: DiskInode, file_type: FileType) -> Self {
        self.push(name, ino, file_type, Some(Content::Raw(inode)))
    }

    /// An unused slot: the name is present, the inode number is 0.
    pub fn deleted(self, name: &str) -> Self {
        self.push(name, 0, FileType::RegularFile, None)
    }

    /// An entry naming `ino` without writing that inode.
    pub fn dangling(self, name: &str, ino: InodeId) -> Self {
        self.push(name, ino, FileType::RegularFile, None)
    }

    fn inode_size(&self) -> usize {
        self.dynamic_inode_size
            .map_or(EXT2_GOOD_OLD_INODE_SIZE, |s| s as usize)
    }

    fn layout(&self) -> Layout {
        let bs = self.block_size as u64;
        let first_data_block = if self.block_size == 1024 { 1 } else { 0 };
        let groups = self.blocks.div_ceil(self.blocks_per_group) as u64;
        let first_desc_block = first_data_block + 1;
        let desc_blocks = (groups * GROUP_DESC_SIZE as u64).div_ceil(bs);
        let table_blocks = (self.inodes_per_group as u64 * self.inode_size() as u64).div_ceil(bs);
        let mut next = first_desc_block + desc_blocks;
        let mut tables = Vec::new();
        for _ in 0..groups {
            tables.push((next, next + 1, next + 2));
            next += 2 + table_blocks;
        }
        Layout {
            first_desc_block,
            groups: tables,
            data_start: next,
        }
    }

    /// First inode table block of each group
    pub fn inode_table_blocks(&self) -> Vec<PBlockId> {
        self.layout().groups.iter().map(|g| g.2).collect()
    }

    /// Block holding the root directory's entries
    pub fn root_dir_block(&self) -> PBlockId {
        self.layout().data_start
    }

    fn write_inode(&self, image: &mut [u8], layout: &Layout, ino: InodeId, inode: &DiskInode) {
        let group = ((ino - 1) / self.inodes_per_group) as usize;
        let index = ((ino - 1) % self.inodes_per_group) as usize;
        let pos = layout.groups[group].2 as usize * self.block_size + index * self.inode_size();
        image[pos..pos + EXT2_GOOD_OLD_INODE_SIZE].copy_from_slice(&inode.encode());
    }

    pub fn build(self) -> Vec<u8> {
        let bs = self.block_size;
        let layout = self.layout();
        let groups = layout.groups.len() as u32;
        let inodes_count = groups * self.inodes_per_group;
        let mut image = vec![0u8; self.blocks as usize * bs];

        // Superblock
        {
            let sb = &mut image[SUPERBLOCK_OFFSET..SUPERBLOCK_OFFSET + SUPERBLOCK_SIZE];
            let log = (bs / EXT2_MIN_BLOCK_SIZE).trailing_zeros();
            put32(sb, 0, inodes_count);
            put32(sb, 4, self.blocks);
            put32(sb, 20, if bs == 1024 { 1 } else { 0 });
            put32(sb, 24, log);
            put32(sb, 28, log);
            put32(sb, 32, self.blocks_per_group);
            put32(sb, 36, self.blocks_per_group);
            put32(sb, 40, self.inodes_per_group);
            put16(sb, 56, self.magic);
            put16(sb, 58, EXT2_VALID_FS);
            put16(sb, 60, EXT2_ERRORS_CONTINUE);
            if let Some(inode_size) = self.dynamic_inode_size {
                put32(sb, 76, EXT2_DYNAMIC_REV);
                put32(sb, 84, 11);
                put16(sb, 88, inode_size);
                put32(sb, 96, IncompatFeatures::FILETYPE.bits());
            }
            let name_len = min(self.volume_name.len(), 16);
            sb[120..120 + name_len].copy_from_slice(&self.volume_name[..name_len]);
        }

        // Group descriptors
        for (g, &(bb, ib, it)) in layout.groups.iter().enumerate() {
            let pos = layout.first_desc_block as usize * bs + g * GROUP_DESC_SIZE;
            let desc = &mut image[pos..pos + GROUP_DESC_SIZE];
            put32(desc, 0, bb as u32);
            put32(desc, 4, ib as u32);
            put32(desc, 8, it as u32);
            put16(desc, 14, self.inodes_per_group as u16);
        }

        let root_block = layout.data_start;
        let mut next_block = root_block + 1;
        let mut subdirs = 0;

        // Root directory entries
        let mut dir_block = vec![0u8; bs];
        let mut off = push_dir_entry(&mut dir_block, 0, EXT2_ROOT_INO, 12, b".", 2);
        off = push_dir_entry(&mut dir_block, off, EXT2_ROOT_INO, 12, b"..", 2);
        for (i, entry) in self.entries.iter().enumerate() {
            let needed = (DIR_ENTRY_HEADER_SIZE + entry.name.len()).next_multiple_of(4);
            let rec_len = if i + 1 == self.entries.len() { bs - off } else { needed };
            off = push_dir_entry(
                &mut dir_block,
                off,
                entry.ino,
                rec_len as u16,
                &entry.name,
                entry.file_type as u8,
            );
        }
        if self.entries.is_empty() {
            // Stretch ".." to the end of the block
            put16(&mut dir_block, 12 + 4, (bs - 12) as u16);
        }
        let pos = root_block as usize * bs;
        image[pos..pos + bs].copy_from_slice(&dir_block);

        // Entry inodes and data
        for entry in &self.entries {
            let inode = match &entry.content {
                None => continue,
                Some(Content::Raw(inode)) => inode.clone(),
                Some(Content::Dir) => {
                    subdirs += 1;
                    let mut block = vec![0u8; bs];
                    let off = push_dir_entry(&mut block, 0, entry.ino, 12, b".", 2);
                    push_dir_entry(&mut block, off, EXT2_ROOT_INO, (bs - 12) as u16, b"..", 2);
                    let pos = next_block as usize * bs;
                    image[pos..pos + bs].copy_from_slice(&block);
                    let mut inode = DiskInode::dir(bs as u32);
                    inode.block[0] = next_block as u32;
                    next_block += 1;
                    inode
                }
                Some(Content::File(data)) => {
                    let mut inode = DiskInode::file(data.len() as u32);
                    for (i, chunk) in data.chunks(bs).enumerate() {
                        if i == EXT2_NDIR_BLOCKS {
                            // Points past the end of the image
                            inode.block[EXT2_IND_BLOCK] = 0xFFFF_FF00;
                            break;
                        }
                        let pos = next_block as usize * bs;
                        image[pos..pos + chunk.len()].copy_from_slice(chunk);
                        inode.block[i] = next_block as u32;
                        next_block += 1;
                    }
                    inode
                }
            };
            self.write_inode(&mut image, &layout, entry.ino, &inode);
        }
        assert!(next_block <= self.blocks as u64, "image too small");

        let mut root = DiskInode::dir(self.root_dir_size.unwrap_or(bs as u32));
        root.mode = self.root_mode;
        root.links_count = 2 + subdirs;
        root.block[0] = root_block as u32;
        self.write_inode(&mut image, &layout, EXT2_ROOT_INO, &root);

        image
    }
}
