//! File Helpers
//!
//! Reading, writing, listing and copying files, with every I/O failure
//! reported as [`Error::Io`](crate::Error::Io) carrying the offending path.

pub mod sys;

pub use sys::{exists, is_dir, is_file, modified, path_exists, search, sha1, sha256, size};

use crate::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Read a whole file as UTF-8 text
pub fn read(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write bytes to `path`, creating parent directories as needed
pub fn write_bytes(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, data).map_err(|e| Error::io(path, e))
}

/// Write text to `path`, replacing any previous content
pub fn write(path: impl AsRef<Path>, content: &str) -> Result<()> {
    write_bytes(path, content.as_bytes())
}

/// Append text to an existing file
pub fn append(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.write_all(content.as_bytes()).map_err(|e| Error::io(path, e))
}

/// Truncate a file to `size` bytes (zero when `None`)
pub fn empty(path: impl AsRef<Path>, size: Option<u64>) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.set_len(size.unwrap_or(0)).map_err(|e| Error::io(path, e))
}

/// Move a file or directory
pub fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let from = from.as_ref();
    fs::rename(from, to.as_ref()).map_err(|e| Error::io(from, e))
}

/// Remove a file or a whole directory tree; a missing path is not an error
pub fn remove(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(path, e)),
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| Error::io(path, e))
}

/// Which entries `list` and `walk` return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Files,
    Dirs,
}

fn entry_matches(path: &Path, is_dir: bool, suffix: &str, kind: EntryKind) -> bool {
    let wanted = match kind {
        EntryKind::Files => !is_dir,
        EntryKind::Dirs => is_dir,
    };
    wanted
        && path
            .file_name()
            .map(|name| name.to_string_lossy().to_uppercase().ends_with(suffix))
            .unwrap_or(false)
}

/// Entries directly inside `dir` whose names end with `suffix` (case-insensitive)
pub fn list(dir: impl AsRef<Path>, suffix: &str, kind: EntryKind) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let suffix = suffix.to_uppercase();
    let mut found = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let is_dir = entry.file_type().map_err(|e| Error::io(entry.path(), e))?.is_dir();
        let path = entry.path();
        if entry_matches(&path, is_dir, &suffix, kind) {
            found.push(path);
        }
    }

    found.sort();
    Ok(found)
}

/// Like [`list`], but descends into subdirectories
pub fn walk(dir: impl AsRef<Path>, suffix: &str, kind: EntryKind) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let suffix = suffix.to_uppercase();
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            Error::io(path, e.into())
        })?;
        if entry_matches(entry.path(), entry.file_type().is_dir(), &suffix, kind) {
            found.push(entry.into_path());
        }
    }

    Ok(found)
}

/// Copy a file, keeping its permissions and modification time.
///
/// A symlink is recreated as a symlink on unix.
pub fn copy(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<u64> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    let meta = fs::symlink_metadata(src).map_err(|e| Error::io(src, e))?;

    #[cfg(unix)]
    {
        if meta.file_type().is_symlink() {
            let target = fs::read_link(src).map_err(|e| Error::io(src, e))?;
            std::os::unix::fs::symlink(target, dst).map_err(|e| Error::io(dst, e))?;
            debug!("Recreated symlink {} -> {}", src.display(), dst.display());
            return Ok(0);
        }
    }

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // fs::copy carries permissions over
    let copied = fs::copy(src, dst).map_err(|e| Error::io(dst, e))?;

    if let Ok(mtime) = meta.modified() {
        let file = OpenOptions::new()
            .write(true)
            .open(dst)
            .map_err(|e| Error::io(dst, e))?;
        file.set_modified(mtime).map_err(|e| Error::io(dst, e))?;
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_then_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file_test.txt");
        write(&path, "").unwrap();

        for _ in 0..10 {
            append(&path, "test").unwrap();
        }
        assert_eq!(read(&path).unwrap().len(), 40);

        empty(&path, None).unwrap();
        assert_eq!(read(&path).unwrap(), "");

        write(&path, "test").unwrap();
        assert_eq!(read(&path).unwrap(), "test");

        empty(&path, Some(2)).unwrap();
        assert_eq!(read(&path).unwrap(), "te");
    }

    #[test]
    fn test_write_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a/b/c.txt");
        write(&path, "nested").unwrap();
        assert_eq!(read(&path).unwrap(), "nested");
    }

    #[test]
    fn test_append_to_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(append(temp_dir.path().join("nope.txt"), "x").unwrap_err().is_io());
    }

    #[test]
    fn test_rename_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("from.txt");
        let to = temp_dir.path().join("to.txt");
        write(&from, "x").unwrap();

        rename(&from, &to).unwrap();
        assert!(!exists(&from));
        assert!(exists(&to));

        write(temp_dir.path().join("dir/inner.txt"), "y").unwrap();
        remove(temp_dir.path().join("dir")).unwrap();
        assert!(!exists(temp_dir.path().join("dir")));

        remove(temp_dir.path().join("never-existed")).unwrap();
    }

    #[test]
    fn test_list_and_walk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root.join("a.toml"), "").unwrap();
        write(root.join("B.TOML"), "").unwrap();
        write(root.join("c.json"), "").unwrap();
        write(root.join("sub/d.toml"), "").unwrap();
        fs::create_dir_all(root.join("conf.toml")).unwrap();

        let files = list(root, ".toml", EntryKind::Files).unwrap();
        assert_eq!(files, vec![root.join("B.TOML"), root.join("a.toml")]);

        let dirs = list(root, ".toml", EntryKind::Dirs).unwrap();
        assert_eq!(dirs, vec![root.join("conf.toml")]);

        let mut walked = walk(root, ".toml", EntryKind::Files).unwrap();
        walked.sort();
        assert_eq!(
            walked,
            vec![root.join("B.TOML"), root.join("a.toml"), root.join("sub/d.toml")]
        );
    }

    #[test]
    fn test_list_missing_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list(temp_dir.path().join("absent"), "", EntryKind::Files).is_err());
    }

    #[test]
    fn test_copy_preserves_content_and_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src.txt");
        let dst = temp_dir.path().join("out/dst.txt");
        write(&src, "payload").unwrap();

        let copied = copy(&src, &dst).unwrap();
        assert_eq!(copied, 7);
        assert_eq!(read(&dst).unwrap(), "payload");
        assert_eq!(modified(&src).unwrap(), modified(&dst).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.txt");
        let link = temp_dir.path().join("link.txt");
        let copy_of_link = temp_dir.path().join("link-copy.txt");
        write(&target, "t").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        copy(&link, &copy_of_link).unwrap();
        assert_eq!(fs::read_link(&copy_of_link).unwrap(), target);
    }
}
