//! Widget packages.
//!
//! A widget package (`.wgt`) is a zip archive holding a `config.xml`
//! component descriptor next to the widget's static assets. [`WgtFile`]
//! indexes the archive once, validating every member name, and
//! [`Extractor`] materializes files and directories from it.

mod extract;
mod path;

pub use extract::Extractor;

use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fs::OsFs;
use crate::io::{LocalFileReader, ReadAt};
use crate::zip::{CompressionMethod, EntryOptions, ZipFileEntry, ZipParser, ZipWriter};

/// Name of the component descriptor inside a package.
pub const CONFIG_FILE: &str = "config.xml";

/// One validated archive member.
#[derive(Debug, Clone)]
pub struct Member {
    name: String,
    is_directory: bool,
    entry: ZipFileEntry,
}

impl Member {
    /// Normalized name, without the trailing `/` of directory markers.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// The central directory record this member was built from.
    pub fn entry(&self) -> &ZipFileEntry {
        &self.entry
    }

    fn key(&self) -> String {
        member_key(&self.name, self.is_directory)
    }
}

fn member_key(name: &str, is_directory: bool) -> String {
    if is_directory {
        format!("{name}/")
    } else {
        name.to_string()
    }
}

/// An opened widget package.
///
/// Construction reads the central directory and rejects the whole archive
/// if any member name is absolute or climbs out of the archive root. The
/// index is never modified afterwards, so a `WgtFile` can be shared
/// between readers freely.
pub struct WgtFile<R: ReadAt = Vec<u8>> {
    parser: ZipParser<R>,
    /// Keyed by normalized name; directory markers keep a trailing `/`.
    members: BTreeMap<String, Member>,
    /// Directories recorded by a marker, plus the ancestors of every marker.
    dirs: BTreeSet<String>,
}

impl WgtFile<Vec<u8>> {
    /// Load a package held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Arc::new(bytes))
    }
}

impl WgtFile<LocalFileReader> {
    /// Open a package file from disk. Entry data is read on demand.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let reader = LocalFileReader::new(path.as_ref())?;
        Self::new(Arc::new(reader))
    }
}

impl<R: ReadAt> WgtFile<R> {
    pub fn new(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let mut members = BTreeMap::new();
        let mut dirs = BTreeSet::new();

        for entry in parser.list_files()? {
            let (name, is_directory) = path::normalize_member(&entry.file_name)?;

            if is_directory {
                if entry.uncompressed_size != 0 {
                    warn!(
                        "directory marker '{}' carries {} bytes of data, ignoring them",
                        entry.file_name, entry.uncompressed_size
                    );
                }
                let mut dir = name.as_str();
                while !dir.is_empty() {
                    dirs.insert(dir.to_string());
                    dir = path::parent(dir);
                }
            }

            let member = Member {
                name,
                is_directory,
                entry,
            };
            let key = member.key();
            if let Some(previous) = members.insert(key.clone(), member) {
                warn!(
                    "duplicate member '{}' (first stored as '{}'), keeping the later one",
                    key, previous.entry.file_name
                );
            }
        }

        debug!(
            "indexed {} members ({} directories)",
            members.len(),
            dirs.len()
        );
        Ok(Self {
            parser,
            members,
            dirs,
        })
    }

    /// Normalized member names in sorted order; markers end with `/`.
    pub fn namelist(&self) -> Vec<&str> {
        self.members.keys().map(String::as_str).collect()
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Whether `name` is a file member or a recorded directory.
    pub fn contains(&self, name: &str) -> bool {
        match path::normalize(name) {
            Ok(key) => self.members.contains_key(&key) || self.has_dir(&key),
            Err(_) => false,
        }
    }

    /// Whether `name` is a recorded directory. The archive root always is.
    pub fn is_dir(&self, name: &str) -> bool {
        path::normalize(name).is_ok_and(|key| self.has_dir(&key))
    }

    /// Read the contents of a file member.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let member = self.lookup_file(name)?;
        self.read_member(member)
    }

    /// Read the component descriptor.
    pub fn template(&self) -> Result<Vec<u8>> {
        self.read_file(CONFIG_FILE)
    }

    /// Build a copy of this package with `config.xml` replaced by
    /// `contents` (or added, if the package had none).
    pub fn with_config(&self, contents: &[u8]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new();
        writer.add_file(
            CONFIG_FILE,
            contents,
            EntryOptions::default().method(CompressionMethod::Deflate),
        )?;

        for (key, member) in &self.members {
            if member.is_directory {
                writer.add_directory(key)?;
                continue;
            }
            if key == CONFIG_FILE {
                continue;
            }
            let data = self.read_member(member)?;
            let mut options = EntryOptions::default().method(member.entry.compression_method);
            if let Some(mode) = member.entry.unix_mode() {
                options = options.unix_mode(mode);
            }
            writer.add_file(key, &data, options)?;
        }

        writer.finish()
    }

    /// Extract one file under `root` using the real filesystem.
    pub fn extract_file(&self, name: &str, root: impl AsRef<Path>) -> Result<PathBuf> {
        Extractor::new(OsFs).extract_file(self, name, root.as_ref())
    }

    /// Extract a recorded directory and everything below it under `root`.
    pub fn extract_dir(&self, name: &str, root: impl AsRef<Path>) -> Result<()> {
        Extractor::new(OsFs).extract_dir(self, name, root.as_ref())
    }

    /// Extract the whole package under `root`.
    pub fn extract(&self, root: impl AsRef<Path>) -> Result<()> {
        Extractor::new(OsFs).extract(self, root.as_ref())
    }

    fn has_dir(&self, key: &str) -> bool {
        key.is_empty() || self.dirs.contains(key)
    }

    /// Resolve a file lookup. A name ending in a separator names a
    /// directory and never matches a file member.
    fn lookup_file(&self, name: &str) -> Result<&Member> {
        let key = path::normalize(name)?;
        if name.ends_with(['/', '\\']) {
            return Err(Error::NotFound(name.to_string()));
        }
        self.members
            .get(&key)
            .filter(|m| !m.is_directory)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    fn read_member(&self, member: &Member) -> Result<Vec<u8>> {
        self.parser.read_data(&member.entry)
    }
}
