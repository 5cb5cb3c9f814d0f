use crate::constants::*;
use crate::prelude::*;

/// Selects a disk on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveId {
    #[default]
    Master,
    Slave,
}

/// Sector-granularity access to a disk.
///
/// Reads are synchronous. On error the content of `buf` is unspecified.
pub trait BlockDevice: Send + Sync + Any + Debug {
    /// Read `count` sectors starting at `lba` into `buf`, which holds at
    /// least `count * SECTOR_SIZE` bytes.
    fn read_sectors(&self, drive: DriveId, lba: u64, count: usize, buf: &mut [u8]) -> Result<()>;
}

/// Read block `block_id` of a volume with `block_size`-byte blocks into `buf`.
///
/// Block 0 is not rejected; it normally holds boot data.
pub fn read_block(
    block_device: &dyn BlockDevice,
    drive: DriveId,
    block_size: usize,
    block_id: PBlockId,
    buf: &mut [u8],
) -> Result<()> {
    if buf.len() < block_size {
        return_error!(
            ErrCode::EINVAL,
            "Buffer of {} bytes cannot hold a {} byte block",
            buf.len(),
            block_size
        );
    }
    let sectors_per_block = block_size / SECTOR_SIZE;
    let lba = block_id * sectors_per_block as u64;
    trace!("Read block {} (lba {}, {} sectors)", block_id, lba, sectors_per_block);
    block_device
        .read_sectors(drive, lba, sectors_per_block, &mut buf[..block_size])
        .map_err(|e| {
            error!("Cannot read block {} from disk: {:?}", block_id, e);
            e
        })
}
