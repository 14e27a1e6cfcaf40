//! Locating a ZIP archive appended to the end of a host file.
//!
//! Self-extracting executables and similar bundles carry a ZIP payload after
//! native content. Offsets stored inside such an archive are relative to the
//! archive's own start, so the archive cannot be read in place until its
//! start inside the host is known.
//!
//! ## Strategy
//!
//! 1. Scan the last 1 KiB, then the last 65 KiB, backwards for the End of
//!    Central Directory record ([`eocd`]).
//! 2. If the record holds overflow sentinels, resolve the Zip64 end of
//!    central directory record ([`zip64`]).
//! 3. The directory-end structures start at physical offset `D`; in an
//!    isolated archive they would start at `cd_offset + cd_size`. The section
//!    length is therefore `cd_offset + cd_size + (file_size - D)`.
//!
//! Only the section is computed here. Reading the entries is left to
//! [`ZipExtractor`], which [`open_section`] hands a bounded view.

pub mod cursor;
pub mod eocd;
pub mod records;
pub mod zip64;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt, SectionReader};
use crate::zip::ZipExtractor;

pub use eocd::{LocatedDirectoryEnd, find_directory_end};
pub use zip64::{LocatedZip64End, resolve_zip64};

/// Central directory extent after Zip64 resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryInfo {
    pub total_entries: u64,
    pub size: u64,
    /// Offset relative to the start of the archive.
    pub offset: u64,
}

/// Where the embedded archive sits inside its host file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLocation {
    /// Total size of the host file.
    pub file_size: u64,
    /// Length of the trailing ZIP section.
    pub section_size: u64,
    /// Physical offset of the EOCD signature.
    pub directory_end_offset: u64,
    /// Physical offset of the Zip64 end of central directory, if one was used.
    pub zip64_end_offset: Option<u64>,
    pub directory: DirectoryInfo,
}

impl SectionLocation {
    /// Physical offset of the first byte of the archive.
    pub fn start(&self) -> u64 {
        self.file_size - self.section_size
    }

    pub fn is_zip64(&self) -> bool {
        self.zip64_end_offset.is_some()
    }
}

/// Length of the trailing section given where the directory-end structures
/// begin (`tail_start`) and the archive-relative directory extent.
pub fn compute_section_size(
    file_size: u64,
    tail_start: u64,
    directory: &DirectoryInfo,
) -> Result<u64> {
    if directory.offset >= file_size {
        return Err(Error::Format("central directory offset outside file"));
    }
    let tail = file_size
        .checked_sub(tail_start)
        .ok_or(Error::Format("directory end past end of file"))?;
    directory
        .size
        .checked_add(directory.offset)
        .and_then(|n| n.checked_add(tail))
        .filter(|&n| n <= file_size)
        .ok_or(Error::Format("archive larger than host file"))
}

/// Locate the trailing ZIP section of a host source of `size` bytes.
pub async fn locate<R: ReadAt + ?Sized>(reader: &R, size: u64) -> Result<SectionLocation> {
    let end = find_directory_end(reader, size).await?;

    let mut directory = DirectoryInfo {
        total_entries: end.record.total_entries.into(),
        size: end.record.cd_size.into(),
        offset: end.record.cd_offset.into(),
    };
    let mut tail_start = end.offset;
    let mut zip64_end_offset = None;

    if end.record.needs_zip64() {
        if let Some(z) = resolve_zip64(reader, end.offset).await? {
            directory = DirectoryInfo {
                total_entries: z.record.total_entries,
                size: z.record.cd_size,
                offset: z.record.cd_offset,
            };
            tail_start = z.offset;
            zip64_end_offset = Some(z.offset);
        }
    }

    let section_size = compute_section_size(size, tail_start, &directory)?;
    debug!(size, section_size, zip64 = zip64_end_offset.is_some(), "located zip section");

    Ok(SectionLocation {
        file_size: size,
        section_size,
        directory_end_offset: end.offset,
        zip64_end_offset,
        directory,
    })
}

/// Length in bytes of the ZIP section at the end of `reader`.
pub async fn detect_section_size<R: ReadAt + ?Sized>(reader: &R, size: u64) -> Result<u64> {
    Ok(locate(reader, size).await?.section_size)
}

/// Length in bytes of the ZIP section at the end of the file at `path`.
///
/// The file is opened read-only and closed before returning.
pub async fn detect_section_size_path(path: impl AsRef<Path>) -> Result<u64> {
    let file = LocalFileReader::new(path.as_ref())?;
    detect_section_size(&file, file.size()).await
}

/// Open the trailing ZIP section of `reader` as an archive.
///
/// The returned extractor reads through a view spanning exactly the
/// section and keeps `reader` alive for as long as it exists.
pub async fn open_section<R: ReadAt + ?Sized + 'static>(
    reader: Arc<R>,
    size: u64,
) -> Result<ZipExtractor<SectionReader<R>>> {
    let section_size = detect_section_size(&*reader, size).await?;
    let view = SectionReader::new(reader, size - section_size, section_size);
    ZipExtractor::open(Arc::new(view)).await
}

/// Open the trailing ZIP section of the file at `path`.
///
/// The file handle is owned by the returned extractor and released when it
/// is dropped; on error it is released before returning.
pub async fn open_section_path(
    path: impl AsRef<Path>,
) -> Result<ZipExtractor<SectionReader<LocalFileReader>>> {
    let file = LocalFileReader::new(path.as_ref())?;
    let size = file.size();
    open_section(Arc::new(file), size).await
}
