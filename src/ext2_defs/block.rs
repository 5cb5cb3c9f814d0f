use super::{read_block, BlockDevice, Buffer, BufferAllocator, DriveId, FromBytes};
use crate::prelude::*;

/// A data block staged in memory
#[derive(Debug)]
pub struct Block<'a> {
    /// Physical block id
    pub id: PBlockId,
    /// Raw block data
    pub data: Buffer<'a>,
}

impl<'a> Block<'a> {
    /// Allocate a staging buffer and read block `id` into it.
    pub fn load(
        block_device: &dyn BlockDevice,
        drive: DriveId,
        allocator: &'a dyn BufferAllocator,
        block_size: usize,
        id: PBlockId,
    ) -> Result<Self> {
        let mut data = Buffer::alloc(allocator, block_size)?;
        read_block(block_device, drive, block_size, id, &mut data)?;
        Ok(Self { id, data })
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn read_offset(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                format_error!(
                    ErrCode::EINVAL,
                    "Range {}+{} is outside block {}",
                    offset,
                    len,
                    self.id
                )
            })
    }

    /// Decode a record of type `T` at `offset`.
    pub fn read_offset_as<T: FromBytes>(&self, offset: usize) -> Result<T> {
        self.read_offset(offset, T::SIZE).map(T::decode)
    }
}
