//! A read-only Ext2 filesystem implementation in Rust.

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod constants;
mod error;
mod ext2;
mod ext2_defs;
mod prelude;
mod utils;

#[cfg(test)]
mod test_utils;

pub use constants::*;
pub use error::*;
pub use ext2::*;
pub use ext2_defs::*;
pub use prelude::{BlockGroupId, InodeId, PBlockId};
