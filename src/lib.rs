//! # zipsection
//!
//! Locate and read a ZIP archive appended to the end of another file.
//!
//! Self-extracting executables, installers and similar bundles carry a ZIP
//! payload after native content (PE, ELF, Mach-O or anything else). This
//! library finds the End of Central Directory record near the end of the
//! host file, resolves Zip64 records when needed, and computes how many
//! trailing bytes belong to the archive. The section can then be opened as
//! an ordinary archive.
//!
//! ## Features
//!
//! - Detect the size of the trailing ZIP section of a local file or any
//!   random-access source
//! - Zip64 archives, including ones shifted by a host prefix
//! - Remote host files through HTTP Range requests
//! - List and extract entries (STORED and DEFLATE, CRC-32 checked)
//!
//! ## Example
//!
//! ```no_run
//! use zipsection::section;
//!
//! #[tokio::main]
//! async fn main() -> zipsection::Result<()> {
//!     let size = section::detect_section_size_path("installer.exe").await?;
//!     println!("embedded archive: {size} bytes");
//!
//!     let archive = section::open_section_path("installer.exe").await?;
//!     for entry in archive.entries() {
//!         println!("{}", entry.file_name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod section;
pub mod zip;

pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt, SectionReader};
pub use section::{
    SectionLocation, detect_section_size, detect_section_size_path, locate, open_section,
    open_section_path,
};
pub use crate::zip::{ZipExtractor, ZipFileEntry};
