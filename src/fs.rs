//! Filesystem access used by extraction.
//!
//! Extraction only ever needs four primitives plus permission setting, so
//! they are gathered behind [`Filesystem`]. [`OsFs`] forwards to `std::fs`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub trait Filesystem {
    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Create a single directory; the parent must already exist.
    fn make_directory(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and every missing ancestor.
    fn make_directory_all(&self, path: &Path) -> io::Result<()>;

    /// Create or truncate a file for writing.
    fn open_for_write(&self, path: &Path) -> io::Result<Box<dyn Write + '_>>;

    /// Apply Unix permission bits to an extracted file.
    fn set_mode(&self, _path: &Path, _mode: u32) -> io::Result<()> {
        Ok(())
    }
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl Filesystem for OsFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn make_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn make_directory_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn open_for_write(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(fs::File::create(path)?))
    }

    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::Filesystem;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Exists(PathBuf),
        MakeDirectory(PathBuf),
        MakeDirectoryAll(PathBuf),
        OpenForWrite(PathBuf),
        SetMode(PathBuf, u32),
    }

    #[derive(Default)]
    struct State {
        dirs: BTreeSet<PathBuf>,
        files: BTreeMap<PathBuf, Vec<u8>>,
        calls: Vec<Call>,
        read_only: BTreeSet<PathBuf>,
    }

    /// In-memory filesystem that records every call made through it.
    ///
    /// Directory creation behaves like the real thing: `make_directory`
    /// fails when the parent is missing or the path already exists.
    #[derive(Default, Clone)]
    pub struct RecordingFs {
        state: Rc<RefCell<State>>,
    }

    impl RecordingFs {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pretend `path` and all its ancestors already exist.
        pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
            {
                let mut state = self.state.borrow_mut();
                for ancestor in path.as_ref().ancestors() {
                    if !ancestor.as_os_str().is_empty() {
                        state.dirs.insert(ancestor.to_path_buf());
                    }
                }
            }
            self
        }

        /// Make writes into `dir` fail with `PermissionDenied`.
        pub fn deny_writes_in(self, dir: impl AsRef<Path>) -> Self {
            self.state
                .borrow_mut()
                .read_only
                .insert(dir.as_ref().to_path_buf());
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.state.borrow().calls.clone()
        }

        pub fn clear_calls(&self) {
            self.state.borrow_mut().calls.clear();
        }

        pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.state.borrow().calls.iter().filter(|c| pred(c)).count()
        }

        pub fn mkdir_count(&self) -> usize {
            self.count(|c| matches!(c, Call::MakeDirectory(_)))
        }

        pub fn mkdir_all_count(&self) -> usize {
            self.count(|c| matches!(c, Call::MakeDirectoryAll(_)))
        }

        pub fn open_count(&self) -> usize {
            self.count(|c| matches!(c, Call::OpenForWrite(_)))
        }

        pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
            self.state.borrow().dirs.contains(path.as_ref())
        }

        pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
            self.state.borrow().files.get(path.as_ref()).cloned()
        }

        fn record(&self, call: Call) {
            self.state.borrow_mut().calls.push(call);
        }

        fn has_parent(&self, path: &Path) -> bool {
            match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    self.state.borrow().dirs.contains(parent)
                }
                _ => true,
            }
        }
    }

    struct MemFile {
        path: PathBuf,
        state: Rc<RefCell<State>>,
    }

    impl Write for MemFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.state
                .borrow_mut()
                .files
                .entry(self.path.clone())
                .or_default()
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Filesystem for RecordingFs {
        fn exists(&self, path: &Path) -> bool {
            self.record(Call::Exists(path.to_path_buf()));
            let state = self.state.borrow();
            state.dirs.contains(path) || state.files.contains_key(path)
        }

        fn make_directory(&self, path: &Path) -> io::Result<()> {
            self.record(Call::MakeDirectory(path.to_path_buf()));
            if !self.has_parent(path) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "parent missing"));
            }
            if !self.state.borrow_mut().dirs.insert(path.to_path_buf()) {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "exists"));
            }
            Ok(())
        }

        fn make_directory_all(&self, path: &Path) -> io::Result<()> {
            self.record(Call::MakeDirectoryAll(path.to_path_buf()));
            let mut state = self.state.borrow_mut();
            for ancestor in path.ancestors() {
                if !ancestor.as_os_str().is_empty() {
                    state.dirs.insert(ancestor.to_path_buf());
                }
            }
            Ok(())
        }

        fn open_for_write(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
            self.record(Call::OpenForWrite(path.to_path_buf()));
            if !self.has_parent(path) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "parent missing"));
            }
            if let Some(parent) = path.parent() {
                if self.state.borrow().read_only.contains(parent) {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "read-only directory",
                    ));
                }
            }
            self.state
                .borrow_mut()
                .files
                .insert(path.to_path_buf(), Vec::new());
            Ok(Box::new(MemFile {
                path: path.to_path_buf(),
                state: Rc::clone(&self.state),
            }))
        }

        fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
            self.record(Call::SetMode(path.to_path_buf(), mode));
            Ok(())
        }
    }
}
