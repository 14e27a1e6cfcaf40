//! Zip64 end of central directory resolution.

use tracing::debug;

use super::records::{Zip64DirectoryEnd, Zip64Locator};
use crate::error::{Error, Result};
use crate::io::ReadAt;

/// A Zip64 end of central directory record and where it physically sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedZip64End {
    /// Physical offset of the record in the host file.
    pub offset: u64,
    pub record: Zip64DirectoryEnd,
}

/// Read the Zip64 locator that precedes the EOCD at `directory_end_offset`.
///
/// Returns `Ok(None)` when there is no trustworthy locator; that is not an
/// error because the sentinel values may be genuine.
pub async fn find_zip64_locator<R: ReadAt + ?Sized>(
    reader: &R,
    directory_end_offset: u64,
) -> Result<Option<(u64, Zip64Locator)>> {
    let Some(loc_offset) = directory_end_offset.checked_sub(Zip64Locator::SIZE as u64) else {
        return Ok(None);
    };

    let mut buf = [0u8; Zip64Locator::SIZE];
    reader.read_exact_at(loc_offset, &mut buf).await?;

    match Zip64Locator::from_bytes(&buf)? {
        Some(locator) if locator.is_single_disk() => Ok(Some((loc_offset, locator))),
        Some(locator) => {
            debug!(?locator, "ignoring multi-disk zip64 locator");
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Resolve the Zip64 end of central directory record for the EOCD found at
/// `directory_end_offset`.
///
/// The locator stores an archive-relative offset. When the archive sits at
/// the start of the file that is also the physical offset; when it is
/// appended to other data, the record is looked up directly in front of the
/// locator instead. A locator that points at neither is a format error.
///
/// This is the only lookup in the locator that tries more than one place;
/// the recorded offset is always read first.
pub async fn resolve_zip64<R: ReadAt + ?Sized>(
    reader: &R,
    directory_end_offset: u64,
) -> Result<Option<LocatedZip64End>> {
    let Some((loc_offset, locator)) = find_zip64_locator(reader, directory_end_offset).await?
    else {
        debug!(directory_end_offset, "no zip64 locator, keeping 32-bit fields");
        return Ok(None);
    };

    let record_len = Zip64DirectoryEnd::SIZE as u64;
    let mut candidates = Vec::with_capacity(2);
    if locator
        .eocd64_offset
        .checked_add(record_len)
        .is_some_and(|end| end <= loc_offset)
    {
        candidates.push(locator.eocd64_offset);
    }
    if let Some(adjacent) = loc_offset.checked_sub(record_len) {
        if !candidates.contains(&adjacent) {
            candidates.push(adjacent);
        }
    }

    let mut buf = [0u8; Zip64DirectoryEnd::SIZE];
    for offset in candidates {
        reader.read_exact_at(offset, &mut buf).await?;
        if Zip64DirectoryEnd::has_signature(&buf) {
            let record = Zip64DirectoryEnd::from_bytes(&buf)?;
            debug!(offset, ?record, "resolved zip64 end of central directory");
            return Ok(Some(LocatedZip64End { offset, record }));
        }
    }

    Err(Error::Format("zip64 end of central directory not found"))
}
