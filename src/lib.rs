//! # wgtfile
//!
//! Read and extract widget packages (`.wgt` files).
//!
//! A widget package is a zip archive holding a `config.xml` component
//! descriptor plus static assets (HTML, scripts, styles, images). This
//! crate opens such a package, validates every member name up front and
//! lets the caller read single files or replicate files and directories
//! onto disk without ever writing outside the chosen destination.
//!
//! ## Features
//!
//! - Packages rejected at load when any member name is absolute or climbs
//!   out of the archive root (zip-slip)
//! - Extraction of a single file, a recorded directory, or the whole package
//! - Pre-existing destination directories are reused, never cleared
//! - ZIP64 archives, STORED and DEFLATE entries, CRC-32 verification
//! - Unix permission bits carried over to extracted files
//!
//! ## Example
//!
//! ```no_run
//! use wgtfile::WgtFile;
//!
//! fn main() -> wgtfile::Result<()> {
//!     let wgt = WgtFile::open("widget.wgt")?;
//!
//!     for name in wgt.namelist() {
//!         println!("{name}");
//!     }
//!
//!     let descriptor = wgt.template()?;
//!     println!("{}", String::from_utf8_lossy(&descriptor));
//!
//!     wgt.extract_dir("images", "/srv/widgets/acme")?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod fs;
pub mod io;
pub mod wgt;
pub mod zip;

pub use cli::Cli;
pub use error::{Error, Result};
pub use fs::{Filesystem, OsFs};
pub use io::{LocalFileReader, ReadAt};
pub use wgt::{CONFIG_FILE, Extractor, Member, WgtFile};
