use super::Ext2;
use crate::ext2_defs::*;
use crate::prelude::*;

impl Ext2 {
    /// Read a regular file from its start into `buf`.
    ///
    /// At most `min(buf.len(), file size)` bytes are copied. Only the 12
    /// direct block pointers are followed: reading stops at the first zero
    /// pointer, and anything past `direct_capacity()` bytes is silently
    /// left out. Indirect pointers are never dereferenced.
    ///
    /// # Return
    ///
    /// `Ok(usize)` - the number of bytes copied into `buf`
    pub fn read_file(&self, file: &InodeRef, buf: &mut [u8]) -> Result<usize> {
        debug!("Read file: inode {}, {} bytes requested", file.id, buf.len());
        if !file.inode.is_file() {
            error!("Inode {} is not a regular file", file.id);
            return_error!(
                ErrCode::ENOTREG,
                "Inode {} is {:?}, not a regular file",
                file.id,
                file.inode.file_type()
            );
        }
        let size_to_read = min(buf.len() as u64, file.inode.size()) as usize;
        if size_to_read == 0 {
            return Ok(0);
        }
        if size_to_read > self.direct_capacity() {
            warn!(
                "Inode {} has {} bytes, only the first {} are addressable by direct blocks",
                file.id,
                file.inode.size(),
                self.direct_capacity()
            );
        }

        let mut staging = Buffer::alloc(self.allocator.as_ref(), self.block_size)?;
        let mut cursor = 0;
        for &block_id in file.inode.direct_blocks() {
            if cursor >= size_to_read || block_id == 0 {
                break;
            }
            self.read_block_into(block_id as PBlockId, &mut staging)?;
            let read_len = min(self.block_size, size_to_read - cursor);
            buf[cursor..cursor + read_len].copy_from_slice(&staging[..read_len]);
            cursor += read_len;
        }
        trace!("Read {} bytes from inode {}", cursor, file.id);
        Ok(cursor)
    }

    /// Read a whole regular file, up to `direct_capacity()` bytes.
    pub fn read_to_vec(&self, file: &InodeRef) -> Result<Vec<u8>> {
        let len = min(file.inode.size(), self.direct_capacity() as u64) as usize;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| format_error!(ErrCode::ENOMEM, "Cannot allocate {} bytes", len))?;
        data.resize(len, 0);
        let read = self.read_file(file, &mut data)?;
        data.truncate(read);
        Ok(data)
    }
}
