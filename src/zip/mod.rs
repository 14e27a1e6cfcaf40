//! ZIP archive reading and extraction.
//!
//! This is the consumer of a located section: once the section is known,
//! the archive inside it is read like any standalone ZIP file.
//!
//! - [`structures`]: entry metadata and header constants
//! - [`parser`]: central directory and local header parsing
//! - [`extractor`]: listing and extraction API
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED and DEFLATE compression methods, CRC-32 verified
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
