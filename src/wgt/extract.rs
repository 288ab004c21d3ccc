use log::{debug, info};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::{Filesystem, OsFs};
use crate::io::ReadAt;

use super::{Member, WgtFile, path};

const OWNER_WRITE: u32 = 0o200;

/// Materializes package members on a [`Filesystem`].
///
/// Existing directories are reused and never cleared. Files are created or
/// truncated. A failure stops the current call and leaves whatever was
/// already written in place.
pub struct Extractor<F: Filesystem = OsFs> {
    fs: F,
}

impl<F: Filesystem> Extractor<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Extract the file `name` to `root/<normalized name>`.
    ///
    /// Only the immediate parent directory is created when missing; deeper
    /// gaps surface as an I/O error from the filesystem.
    pub fn extract_file<R: ReadAt>(
        &self,
        wgt: &WgtFile<R>,
        name: &str,
        root: &Path,
    ) -> Result<PathBuf> {
        let member = wgt.lookup_file(name)?;
        self.place_file(wgt, member, root)
    }

    /// Extract the directory `dir_name` and everything below it to
    /// `root/<normalized dir_name>`.
    ///
    /// The directory must have been recorded by a marker (its own or a
    /// descendant's). The target directory is created with all its
    /// ancestors; below it, directories are created one level at a time in
    /// order of depth, skipping those that already exist, before any file is
    /// written.
    pub fn extract_dir<R: ReadAt>(
        &self,
        wgt: &WgtFile<R>,
        dir_name: &str,
        root: &Path,
    ) -> Result<()> {
        let key = path::normalize(dir_name)?;
        if !wgt.has_dir(&key) {
            return Err(Error::NotFound(dir_name.to_string()));
        }

        let target = path::destination(root, &key)?;
        if self.fs.exists(&target) {
            debug!("{} already exists", target.display());
        } else {
            self.fs
                .make_directory_all(&target)
                .map_err(|e| at(&target, e))?;
            debug!("created {}", target.display());
        }

        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };

        // (depth, name) orders parents before their children
        let mut dirs: BTreeSet<(usize, &str)> = BTreeSet::new();
        let mut files: Vec<&Member> = Vec::new();
        for member in wgt.members().filter(|m| m.name.starts_with(&prefix)) {
            let mut dir = if member.is_directory {
                member.name.as_str()
            } else {
                files.push(member);
                path::parent(&member.name)
            };
            while dir.len() > key.len() {
                dirs.insert((path::depth(dir), dir));
                dir = path::parent(dir);
            }
        }

        let mut created = 0usize;
        for (_, dir) in &dirs {
            let dest = path::destination(root, dir)?;
            if self.fs.exists(&dest) {
                continue;
            }
            self.fs.make_directory(&dest).map_err(|e| at(&dest, e))?;
            debug!("created {}", dest.display());
            created += 1;
        }

        for member in &files {
            self.place_file(wgt, member, root)?;
        }

        info!(
            "extracted '{}' to {}: {} directories created, {} files written",
            dir_name,
            target.display(),
            created,
            files.len()
        );
        Ok(())
    }

    /// Extract every member of the package under `root`.
    pub fn extract<R: ReadAt>(&self, wgt: &WgtFile<R>, root: &Path) -> Result<()> {
        self.extract_dir(wgt, "", root)
    }

    fn place_file<R: ReadAt>(
        &self,
        wgt: &WgtFile<R>,
        member: &Member,
        root: &Path,
    ) -> Result<PathBuf> {
        let dest = path::destination(root, &member.name)?;
        let contents = wgt.read_member(member)?;

        if let Some(parent) = dest.parent() {
            if !self.fs.exists(parent) {
                self.fs.make_directory(parent).map_err(|e| at(parent, e))?;
                debug!("created {}", parent.display());
            }
        }

        {
            let mut out = self.fs.open_for_write(&dest).map_err(|e| at(&dest, e))?;
            out.write_all(&contents).map_err(|e| at(&dest, e))?;
            out.flush().map_err(|e| at(&dest, e))?;
        }

        // Read-only entries stay writable by the owner for re-extraction
        if let Some(mode) = member.entry.unix_mode() {
            let mode = mode | OWNER_WRITE;
            self.fs.set_mode(&dest, mode).map_err(|e| at(&dest, e))?;
        }

        debug!("wrote {} ({} bytes)", dest.display(), contents.len());
        Ok(dest)
    }
}

/// Attach the offending path to a filesystem error, keeping its kind.
fn at(path: &Path, e: io::Error) -> Error {
    Error::Io(io::Error::new(e.kind(), format!("{}: {e}", path.display())))
}
