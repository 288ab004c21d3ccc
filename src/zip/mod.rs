//! ZIP container reading and writing.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Parsing of ZIP structures and entry data from a [`ReadAt`](crate::io::ReadAt) source
//! - [`writer`]: A small in-memory writer used to rebuild packages
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The reader starts from the EOCD, then reads the Central Directory, so
//! listing a package never touches entry data.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for reading archives larger than 4GB
//! - STORED (no compression) and DEFLATE methods
//! - CRC-32 verification of every decoded entry
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod parser;
mod structures;
mod writer;

pub use parser::ZipParser;
pub use structures::*;
pub use writer::{EntryOptions, ZipWriter};
