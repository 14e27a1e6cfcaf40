//! Backward search for the End of Central Directory record.

use tracing::{debug, trace};

use super::records::DirectoryEnd;
use crate::error::{Error, Result};
use crate::io::ReadAt;

/// Trailing windows searched in order: the last 1 KiB, then the last 65 KiB.
pub const SEARCH_WINDOWS: [u64; 2] = [1024, 65 * 1024];

/// A located EOCD record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedDirectoryEnd {
    /// Physical offset of the signature in the host file.
    pub offset: u64,
    pub record: DirectoryEnd,
}

/// Find the highest index in `block` holding an EOCD signature whose
/// comment still fits inside the block.
///
/// The candidate nearest the end wins. A signature-like byte run inside a
/// comment can still be accepted if it is followed by a small enough
/// length; that limitation is inherent to the format.
pub fn find_signature_in_block(block: &[u8]) -> Option<usize> {
    let last = block.len().checked_sub(DirectoryEnd::SIZE)?;
    for i in (0..=last).rev() {
        if block[i..i + 4] != DirectoryEnd::MAGIC {
            continue;
        }
        let at = i + DirectoryEnd::COMMENT_LEN_OFFSET;
        let comment_len = u16::from_le_bytes([block[at], block[at + 1]]) as usize;
        if i + DirectoryEnd::SIZE + comment_len <= block.len() {
            return Some(i);
        }
        trace!(index = i, comment_len, "signature rejected, comment overruns window");
    }
    None
}

/// Locate and parse the EOCD record of the archive ending at `size`.
pub async fn find_directory_end<R: ReadAt + ?Sized>(
    reader: &R,
    size: u64,
) -> Result<LocatedDirectoryEnd> {
    for (i, window) in SEARCH_WINDOWS.into_iter().enumerate() {
        let window = window.min(size);
        let start = size - window;

        let mut buf = vec![0u8; window as usize];
        reader.read_exact_at(start, &mut buf).await?;
        debug!(start, window, "scanning for end of central directory");

        if let Some(p) = find_signature_in_block(&buf) {
            let offset = start + p as u64;
            let record = DirectoryEnd::from_bytes(&buf[p..p + DirectoryEnd::SIZE])?;
            debug!(offset, ?record, "found end of central directory");
            return Ok(LocatedDirectoryEnd { offset, record });
        }

        if i == SEARCH_WINDOWS.len() - 1 || window == size {
            break;
        }
    }
    Err(Error::Format("end of central directory not found"))
}
