//! A directory is a series of data blocks and that each block contains a
//! linear array of directory entries.
//!
//! Each entry is an 8-byte header followed by the name:
//!
//! | inode: u32 | rec_len: u16 | name_len: u8 | file_type: u8 | name |
//!
//! `rec_len` is the distance to the next entry. Entries with inode 0 are
//! unused slots that still occupy their `rec_len`.

use super::FileType;
use crate::constants::*;
use crate::prelude::*;
use crate::utils::*;

/// Directory entry.
#[derive(Clone)]
pub struct DirEntry {
    /// Number of the inode this entry refers to
    inode: InodeId,
    /// Distance to the next directory entry
    rec_len: u16,
    name_len: u8,
    file_type: u8,
    name: [u8; NAME_MAX],
}

impl Debug for DirEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("DirEntry")
            .field("inode", &self.inode)
            .field("rec_len", &self.rec_len)
            .field("name", &String::from_utf8_lossy(self.name_bytes()))
            .field("file_type", &self.file_type())
            .finish()
    }
}

impl DirEntry {
    pub fn inode(&self) -> InodeId {
        self.inode
    }

    /// Distance to the next directory entry
    pub fn rec_len(&self) -> u16 {
        self.rec_len
    }

    pub fn name_len(&self) -> usize {
        self.name_len as usize
    }

    pub fn name_bytes(&self) -> &[u8] {
        &self.name[..self.name_len as usize]
    }

    pub fn name(&self) -> Result<String> {
        String::from_utf8(self.name_bytes().to_vec()).map_err(|_| {
            format_error!(
                ErrCode::EINVAL,
                "Invalid UTF-8 sequence in directory entry name"
            )
        })
    }

    /// Exact, case-sensitive match: same length, then same bytes.
    pub fn compare_name(&self, name: &[u8]) -> bool {
        self.name_len as usize == name.len() && self.name_bytes() == name
    }

    /// Type tag stored in the entry
    pub fn file_type(&self) -> FileType {
        FileType::from(self.file_type)
    }

    /// Unused directory entries are signified by inode = 0
    pub fn unused(&self) -> bool {
        self.inode == 0
    }
}

/// Iterator over the live entries of one directory data block.
///
/// The scan covers `buf[..min(dir_size, buf.len())]`. It ends when that
/// range is exhausted or at the first entry with `rec_len == 0`. An entry
/// whose header or name does not fit in the scanned range, or whose
/// `rec_len` cannot hold its own header and name, also ends the scan, so
/// no name ever takes bytes from outside its record.
#[derive(Debug, Clone)]
pub struct DirEntryIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> DirEntryIter<'a> {
    pub fn new(buf: &'a [u8], dir_size: usize) -> Self {
        Self {
            buf: &buf[..min(dir_size, buf.len())],
            offset: 0,
        }
    }

    /// Byte offset of the next entry to decode
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn stop(&mut self) -> Option<DirEntry> {
        self.offset = self.buf.len();
        None
    }
}

impl Iterator for DirEntryIter<'_> {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        while self.offset < self.buf.len() {
            let rest = &self.buf[self.offset..];
            if rest.len() < DIR_ENTRY_HEADER_SIZE {
                trace!("Truncated directory entry at offset {}", self.offset);
                return self.stop();
            }
            let inode = read_u32(rest, 0);
            let rec_len = read_u16(rest, 4);
            let name_len = read_u8(rest, 6);
            let file_type = read_u8(rest, 7);
            if rec_len == 0 {
                trace!("Directory scan ends at offset {}: rec_len 0", self.offset);
                return self.stop();
            }
            let name_end = DIR_ENTRY_HEADER_SIZE + name_len as usize;
            if (rec_len as usize) < DIR_ENTRY_HEADER_SIZE
                || name_end > rec_len as usize
                || name_end > rest.len()
            {
                warn!(
                    "Corrupted directory entry at offset {} (rec_len {}, name_len {})",
                    self.offset, rec_len, name_len
                );
                return self.stop();
            }
            self.offset += rec_len as usize;
            if inode == 0 {
                continue;
            }
            let mut name = [0u8; NAME_MAX];
            name[..name_len as usize].copy_from_slice(&rest[DIR_ENTRY_HEADER_SIZE..name_end]);
            return Some(DirEntry {
                inode,
                rec_len,
                name_len,
                file_type,
                name,
            });
        }
        None
    }
}
