//! Filesystem primitives used by the engine.

use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Primitive filesystem operations the engine needs.
///
/// Listings return entries in a stable order so event order is repeatable.
pub trait FileSystem {
    /// Whether `path` is an existing directory.
    fn exists(&self, path: &Path) -> impl Future<Output = bool> + Send;

    /// Immediate files of `dir`.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Immediate sub-directories of `dir`.
    fn list_directories(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Names of all files anywhere below `dir`, `dir` itself included.
    fn list_file_names_recursive(&self, dir: &Path) -> io::Result<HashSet<String>>;

    /// Create `path` and any missing ancestors.
    fn create_directory(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Returns whether the file was copied.
    fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
    ) -> impl Future<Output = io::Result<bool>> + Send;

    fn delete_file(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;
}

/// Local disk, listing in file-name order.
///
/// One-level listings follow symlinks, so a linked photo counts as a file
/// and a linked folder as a sub-directory. Broken links are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }

    fn list_immediate(&self, dir: &Path, want_dirs: bool) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                // The directory itself is unreadable.
                Err(err) if err.depth() == 0 => return Err(io::Error::from(err)),
                Err(_) => continue,
            };
            let file_type = entry.file_type();
            if (want_dirs && file_type.is_dir()) || (!want_dirs && file_type.is_file()) {
                entries.push(entry.into_path());
            }
        }
        Ok(entries)
    }
}

impl FileSystem for LocalFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.list_immediate(dir, false)
    }

    fn list_directories(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.list_immediate(dir, true)
    }

    fn list_file_names_recursive(&self, dir: &Path) -> io::Result<HashSet<String>> {
        let mut names = HashSet::new();
        for entry in WalkDir::new(dir).min_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    async fn create_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path).await
    }

    async fn copy_file(&self, source: &Path, destination: &Path) -> io::Result<bool> {
        fs::copy(source, destination).await?;
        Ok(true)
    }

    async fn delete_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }
}
