use crate::prelude::*;
use core::fmt;

/// Ext2Error number.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrCode {
    ENOENT = 2,     /* No such file or directory */
    EIO = 5,        /* I/O error */
    ENOMEM = 12,    /* Out of memory */
    ENOTDIR = 20,   /* Not a directory */
    EINVAL = 22,    /* Invalid argument */
    ENOTSUP = 95,   /* Not supported */
    EBADMAGIC = 96, /* Bad superblock signature */
    EBADINO = 97,   /* Inode number out of range */
    ENOTREG = 98,   /* Not a regular file */
}

/// Result type used across this crate
pub type Result<T> = core::result::Result<T, Ext2Error>;

/// error used in this crate
pub struct Ext2Error {
    code: ErrCode,
    message: Option<String>,
}

impl Debug for Ext2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            write!(
                f,
                "Ext2Error {{ code: {:?}, message: {:?} }}",
                self.code, message
            )
        } else {
            write!(f, "Ext2Error {{ code: {:?} }}", self.code)
        }
    }
}

impl fmt::Display for Ext2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{:?}: {}", self.code, message),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl core::error::Error for Ext2Error {}

impl Ext2Error {
    pub const fn new(code: ErrCode) -> Self {
        Ext2Error {
            code,
            message: None,
        }
    }

    pub const fn with_message(code: ErrCode, message: String) -> Self {
        Ext2Error {
            code,
            message: Some(message),
        }
    }

    pub const fn code(&self) -> ErrCode {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl From<ErrCode> for Ext2Error {
    fn from(code: ErrCode) -> Self {
        Ext2Error::new(code)
    }
}

#[macro_export]
macro_rules! format_error {
    ($code: expr, $message: expr) => {
        $crate::Ext2Error::with_message($code, alloc::format!($message))
    };
    ($code: expr, $fmt: expr,  $($args:tt)*) => {
        $crate::Ext2Error::with_message($code, alloc::format!($fmt, $($args)*))
    };
}

#[macro_export]
macro_rules! return_error {
    ($code: expr, $message: expr) => {
        return Err($crate::format_error!($code, $message))
    };
    ($code: expr, $fmt: expr,  $($args:tt)*) => {
        return Err($crate::format_error!($code, $fmt, $($args)*))
    }
}
