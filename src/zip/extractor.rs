use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use flate2::Crc;
use flate2::read::DeflateDecoder;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::section::SectionLocation;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP archive reader with its central directory loaded.
#[derive(Debug)]
pub struct ZipExtractor<R: ReadAt + ?Sized> {
    parser: ZipParser<R>,
    entries: Vec<ZipFileEntry>,
}

impl<R: ReadAt + ?Sized> ZipExtractor<R> {
    /// Open the archive at the end of `reader` and read its central
    /// directory.
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::open(reader).await?;
        let entries = parser.list_files().await?;
        Ok(Self { parser, entries })
    }

    /// All entries, in central directory order
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    pub fn by_name(&self, name: &str) -> Option<&ZipFileEntry> {
        self.entries.iter().find(|e| e.file_name == name)
    }

    /// Where the archive sits inside the underlying source
    pub fn location(&self) -> &SectionLocation {
        self.parser.location()
    }

    pub fn reader(&self) -> &Arc<R> {
        self.parser.reader()
    }

    /// Extract file data to memory, checking its CRC-32.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(Error::UnsupportedAlgorithm(method));
        }

        let data_offset = self.parser.get_data_offset(entry).await?;

        // sizes come from the central directory; the data must fit in the source
        // before anything is allocated for it
        data_offset
            .checked_add(entry.compressed_size)
            .filter(|&end| end <= self.parser.location().file_size)
            .ok_or(Error::Format("entry data extends past end of file"))?;
        let compressed_len = usize::try_from(entry.compressed_size)
            .map_err(|_| Error::Format("entry too large"))?;

        let mut raw = vec![0u8; compressed_len];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size.min(1 << 26) as usize);
                // one byte past the declared size is enough to detect a mismatch
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .map_err(|_| Error::Format("corrupt deflate stream"))?;
                out
            }
            _ => raw,
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(Error::Format("entry size does not match central directory"));
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(Error::ChecksumMismatch {
                expected: entry.crc32,
                actual: crc.sum(),
            });
        }

        Ok(data)
    }

    /// Extract file to disk
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.extract_to_memory(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        Ok(())
    }

    /// Extract file to stdout
    pub async fn extract_to_stdout(&self, entry: &ZipFileEntry) -> Result<()> {
        let data = self.extract_to_memory(entry).await?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;
        stdout.flush().await?;

        Ok(())
    }
}
