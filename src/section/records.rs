//! Fixed-layout trailer records of a ZIP archive.
//!
//! All integers are little-endian. Offsets stored in these records are
//! relative to the start of the archive, not the host file.

use super::cursor::ByteCursor;
use crate::error::{Error, Result};

/// End of Central Directory (EOCD) - 22 bytes plus comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEnd {
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl DirectoryEnd {
    pub const MAGIC: [u8; 4] = *b"PK\x05\x06";
    pub const SIGNATURE: u32 = 0x06054b50;
    pub const SIZE: usize = 22;
    /// Offset of the comment length field inside the record.
    pub const COMMENT_LEN_OFFSET: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut c = ByteCursor::new(data);
        if c.read_u32()? != Self::SIGNATURE {
            return Err(Error::Format("bad end of central directory signature"));
        }
        // disk number, disk with central directory, entries on this disk
        c.skip(6)?;
        Ok(Self {
            total_entries: c.read_u16()?,
            cd_size: c.read_u32()?,
            cd_offset: c.read_u32()?,
            comment_len: c.read_u16()?,
        })
    }

    /// Any field holding its overflow sentinel means the real value lives in
    /// the Zip64 end of central directory record.
    pub fn needs_zip64(&self) -> bool {
        self.total_entries == u16::MAX || self.cd_size == u32::MAX || self.cd_offset == u32::MAX
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64Locator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64Locator {
    pub const SIGNATURE: u32 = 0x07064b50;
    pub const SIZE: usize = 20;

    /// Parse a locator, or `None` if the bytes are not one.
    ///
    /// A missing locator is not an error: the EOCD sentinels may be genuine
    /// values in an archive that never used Zip64.
    pub fn from_bytes(data: &[u8]) -> Result<Option<Self>> {
        let mut c = ByteCursor::new(data);
        if c.read_u32()? != Self::SIGNATURE {
            return Ok(None);
        }
        Ok(Some(Self {
            disk_with_eocd64: c.read_u32()?,
            eocd64_offset: c.read_u64()?,
            total_disks: c.read_u32()?,
        }))
    }

    /// Only single-disk archives are trusted.
    pub fn is_single_disk(&self) -> bool {
        self.disk_with_eocd64 == 0 && self.total_disks == 1
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64DirectoryEnd {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64DirectoryEnd {
    pub const SIGNATURE: u32 = 0x06064b50;
    pub const SIZE: usize = 56;

    pub fn has_signature(data: &[u8]) -> bool {
        ByteCursor::new(data)
            .read_u32()
            .is_ok_and(|sig| sig == Self::SIGNATURE)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut c = ByteCursor::new(data);
        if c.read_u32()? != Self::SIGNATURE {
            return Err(Error::Format("bad zip64 end of central directory signature"));
        }
        // record size(8), version made by(2), version needed(2),
        // disk number(4), disk with central directory(4), entries on this disk(8)
        c.skip(8 + 2 + 2 + 4 + 4 + 8)?;
        Ok(Self {
            total_entries: c.read_u64()?,
            cd_size: c.read_u64()?,
            cd_offset: c.read_u64()?,
        })
    }
}
