//! File Metadata and Lookup

use crate::{Error, Result};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// True if a file or directory exists at `path`
pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Like [`exists`], but reports errors other than "not found"
pub fn path_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// True if `path` is an existing regular file
pub fn is_file(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

/// True if `path` is an existing directory
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

/// Size in bytes
pub fn size(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    Ok(fs::metadata(path).map_err(|e| Error::io(path, e))?.len())
}

/// Modification time in seconds since the unix epoch
pub fn modified(path: impl AsRef<Path>) -> Result<i64> {
    let path = path.as_ref();
    let mtime = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| Error::io(path, e))?;

    let secs = match mtime.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    };
    Ok(secs)
}

fn digest_file<D>(path: &Path) -> Result<String>
where
    D: Digest + io::Write,
{
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = D::new();
    io::copy(&mut file, &mut hasher).map_err(|e| Error::io(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Lowercase hex SHA-1 digest of the file's content
pub fn sha1(path: impl AsRef<Path>) -> Result<String> {
    digest_file::<Sha1>(path.as_ref())
}

/// Lowercase hex SHA-256 digest of the file's content
pub fn sha256(path: impl AsRef<Path>) -> Result<String> {
    digest_file::<Sha256>(path.as_ref())
}

/// Find `name` in the first of `dirs` that contains it
pub fn search<I, P>(name: &str, dirs: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut searched = Vec::new();

    for dir in dirs {
        let candidate = dir.as_ref().join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    Err(Error::NotFound {
        name: name.to_string(),
        searched,
    })
}
