//! Low-level ZIP archive parser.
//!
//! This module reads the central directory and local file headers of an
//! archive from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Locate the archive trailer (EOCD, and Zip64 records when needed)
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header and data
//!
//! Offsets inside the archive are shifted by the archive start, so a parser
//! works both on a bounded section and on a whole host file with a prefix.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::section::cursor::ByteCursor;
use crate::section::{self, SectionLocation};

use super::structures::*;

/// Low-level ZIP file parser.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor) rather
/// than directly.
#[derive(Debug)]
pub struct ZipParser<R: ReadAt + ?Sized> {
    /// The underlying data source
    reader: Arc<R>,
    /// Where the archive sits inside the source
    location: SectionLocation,
}

impl<R: ReadAt + ?Sized> ZipParser<R> {
    /// Create a parser by locating the archive trailer in `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if no archive can be found.
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let size = reader.size();
        let location = section::locate(&*reader, size).await?;
        Ok(Self { reader, location })
    }

    pub fn location(&self) -> &SectionLocation {
        &self.location
    }

    /// Convert an archive-relative offset into a source offset.
    fn physical(&self, offset: u64) -> Result<u64> {
        self.location
            .start()
            .checked_add(offset)
            .ok_or(Error::Format("offset overflow"))
    }

    /// List all files in the ZIP archive.
    ///
    /// Fetches the entire Central Directory in one read and parses every
    /// header in it.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let directory = &self.location.directory;

        let cd_start = self.physical(directory.offset)?;
        let cd_end = cd_start
            .checked_add(directory.size)
            .filter(|&end| end <= self.location.file_size)
            .ok_or(Error::Format("central directory extends past end of file"))?;
        let cd_len = usize::try_from(cd_end - cd_start)
            .map_err(|_| Error::Format("central directory too large"))?;

        let mut cd_data = vec![0u8; cd_len];
        self.reader.read_exact_at(cd_start, &mut cd_data).await?;

        // the entry count is untrusted, don't let it drive the allocation
        let capacity = directory
            .total_entries
            .min((cd_len / CDFH_MIN_SIZE) as u64) as usize;
        let mut entries = Vec::with_capacity(capacity);
        let mut cursor = ByteCursor::new(&cd_data);

        for _ in 0..directory.total_entries {
            entries.push(Self::parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(cursor: &mut ByteCursor<'_>) -> Result<ZipFileEntry> {
        if cursor.read_u32()? != CDFH_SIGNATURE {
            return Err(Error::Format("invalid central directory file header"));
        }

        let _version_made_by = cursor.read_u16()?;
        let _version_needed = cursor.read_u16()?;
        let _flags = cursor.read_u16()?;
        let compression_method = cursor.read_u16()?;
        let last_mod_time = cursor.read_u16()?;
        let last_mod_date = cursor.read_u16()?;
        let crc32 = cursor.read_u32()?;
        let mut compressed_size = cursor.read_u32()? as u64;
        let mut uncompressed_size = cursor.read_u32()? as u64;
        let file_name_length = cursor.read_u16()? as usize;
        let extra_field_length = cursor.read_u16()? as usize;
        let file_comment_length = cursor.read_u16()? as usize;
        let _disk_number_start = cursor.read_u16()?;
        let _internal_attrs = cursor.read_u16()?;
        let _external_attrs = cursor.read_u32()?;
        let mut lfh_offset = cursor.read_u32()? as u64;

        // Use lossy conversion to handle non-UTF8 filenames gracefully
        let file_name = String::from_utf8_lossy(cursor.take(file_name_length)?).to_string();
        let is_directory = file_name.ends_with('/');

        let mut extra = ByteCursor::new(cursor.take(extra_field_length)?);
        while extra.remaining() >= 4 {
            let header_id = extra.read_u16()?;
            let field_size = extra.read_u16()? as usize;
            let Ok(mut field) = extra.take(field_size).map(ByteCursor::new) else {
                break;
            };

            if header_id == ZIP64_EXTRA_ID {
                // values are present only where the header field is saturated
                if uncompressed_size == 0xFFFFFFFF {
                    uncompressed_size = field.read_u64()?;
                }
                if compressed_size == 0xFFFFFFFF {
                    compressed_size = field.read_u64()?;
                }
                if lfh_offset == 0xFFFFFFFF {
                    lfh_offset = field.read_u64()?;
                }
            }
        }

        cursor.skip(file_comment_length)?;

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            is_directory,
        })
    }

    /// Get the source offset where an entry's compressed data begins.
    ///
    /// The Local File Header has variable-length fields that may differ from
    /// the Central Directory entry, so it is read to find the data.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let lfh_start = self.physical(entry.lfh_offset)?;
        let mut lfh_buf = [0u8; LFH_SIZE];
        self.reader.read_exact_at(lfh_start, &mut lfh_buf).await?;

        let mut cursor = ByteCursor::new(&lfh_buf);
        if cursor.read_u32()? != LFH_SIGNATURE {
            return Err(Error::Format("invalid local file header"));
        }

        // skip to the file name length field at offset 26
        cursor.skip(22)?;
        let file_name_length = cursor.read_u16()? as u64;
        let extra_field_length = cursor.read_u16()? as u64;

        lfh_start
            .checked_add(LFH_SIZE as u64 + file_name_length + extra_field_length)
            .ok_or(Error::Format("offset overflow"))
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}
