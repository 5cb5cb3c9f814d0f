#![allow(unused)]

pub(crate) use alloc::boxed::Box;
pub(crate) use alloc::format;
pub(crate) use alloc::string::{String, ToString};
pub(crate) use alloc::sync::Arc;
pub(crate) use alloc::vec;
pub(crate) use alloc::vec::Vec;

pub(crate) use bitflags::bitflags;
pub(crate) use core::any::Any;
pub(crate) use core::cmp::min;
pub(crate) use core::fmt::Debug;
pub(crate) use log::{debug, error, info, trace, warn};

pub(crate) use crate::error::*;
pub(crate) use crate::{format_error, return_error};

/// Inode number, 1-based.
pub type InodeId = u32;
/// Physical block number on the volume.
pub type PBlockId = u64;
/// Index of a block group.
pub type BlockGroupId = u32;
