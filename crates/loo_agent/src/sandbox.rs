//! Filesystem operations confined to the working directory.
//!
//! Every path is resolved component by component against the canonical root. Existing prefixes
//! are canonicalized as they are reached, so `..` pops against the real parent and a symlink
//! that leaves the root is caught before anything is written.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use loo_tui::DirEntry;

use crate::config::DEFAULT_READ_MAX_BYTES;
use crate::error::TaskError;

#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    read_max_bytes: usize,
}

impl Sandbox {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, TaskError> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .map_err(|source| TaskError::io(root, source))?;
        if !canonical.is_dir() {
            return Err(TaskError::io(
                canonical,
                std::io::Error::new(ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        Ok(Self {
            root: canonical,
            read_max_bytes: DEFAULT_READ_MAX_BYTES,
        })
    }

    pub fn with_read_max_bytes(mut self, read_max_bytes: usize) -> Self {
        self.read_max_bytes = read_max_bytes;
        self
    }

    /// Canonical absolute root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` to an absolute path inside the root.
    ///
    /// Absolute paths are accepted only when they already lie under the root. Components that
    /// do not exist yet are appended lexically.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, TaskError> {
        match self.resolve_quietly(path) {
            Err(err @ TaskError::SandboxViolation { .. }) => {
                tracing::warn!(path, "rejected path outside the working directory");
                Err(err)
            }
            result => result,
        }
    }

    /// Directory listing for autocomplete.
    ///
    /// Runs on every keystroke while the prompt owns the terminal, so rejections are only
    /// logged at debug.
    pub fn completion_listing(&self, path: &str) -> Option<Vec<DirEntry>> {
        let listing = self
            .resolve_quietly(path)
            .and_then(|resolved| read_dir_sorted(&resolved));
        match listing {
            Ok(entries) => Some(entries),
            Err(err) => {
                tracing::debug!(path, error = %err, "no completions for path");
                None
            }
        }
    }

    fn resolve_quietly(&self, path: &str) -> Result<PathBuf, TaskError> {
        if path.trim().is_empty() {
            return Err(TaskError::invalid("path", "field `path` must not be empty"));
        }

        let requested = Path::new(path);
        let relative = if requested.is_absolute() {
            requested
                .strip_prefix(&self.root)
                .map_err(|_| violation(path))?
        } else {
            requested
        };

        let mut resolved = self.root.clone();
        let mut lexical = false;
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() || !resolved.starts_with(&self.root) {
                        return Err(violation(path));
                    }
                    lexical = fs::symlink_metadata(&resolved).is_err();
                }
                Component::Normal(part) => {
                    resolved.push(part);
                    if lexical {
                        continue;
                    }
                    match fs::symlink_metadata(&resolved) {
                        Ok(_) => {
                            // Dangling links cannot be canonicalized and could point anywhere.
                            let canonical =
                                resolved.canonicalize().map_err(|_| violation(path))?;
                            if !canonical.starts_with(&self.root) {
                                return Err(violation(path));
                            }
                            resolved = canonical;
                        }
                        Err(err) if err.kind() == ErrorKind::NotFound => lexical = true,
                        Err(err) => return Err(TaskError::io(resolved, err)),
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(violation(path)),
            }
        }

        Ok(resolved)
    }

    /// Path relative to the root, for messages and listings.
    pub fn relative_display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
            Ok(relative) => relative.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }

    /// Writes `content`, creating parent directories and replacing any existing file.
    pub fn create_file(&self, path: &str, content: &str) -> Result<PathBuf, TaskError> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|source| TaskError::io(parent, source))?;
        }
        fs::write(&resolved, content).map_err(|source| TaskError::io(&resolved, source))?;
        tracing::debug!(path = %self.relative_display(&resolved), bytes = content.len(), "wrote file");
        Ok(resolved)
    }

    /// Creates a directory and its parents. Succeeds if it already exists.
    pub fn create_directory(&self, path: &str) -> Result<PathBuf, TaskError> {
        let resolved = self.resolve(path)?;
        fs::create_dir_all(&resolved).map_err(|source| TaskError::io(&resolved, source))?;
        Ok(resolved)
    }

    /// Reads a UTF-8 text file no larger than the configured limit.
    pub fn read_file(&self, path: &str) -> Result<String, TaskError> {
        let resolved = self.resolve(path)?;
        let metadata = fs::metadata(&resolved).map_err(|source| TaskError::io(&resolved, source))?;
        if metadata.is_dir() {
            return Err(TaskError::io(
                resolved,
                std::io::Error::new(ErrorKind::InvalidInput, "is a directory"),
            ));
        }
        if metadata.len() > self.read_max_bytes as u64 {
            return Err(TaskError::io(
                resolved,
                std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "file exceeds max read size ({} bytes > {} bytes)",
                        metadata.len(),
                        self.read_max_bytes
                    ),
                ),
            ));
        }

        let bytes = fs::read(&resolved).map_err(|source| TaskError::io(&resolved, source))?;
        String::from_utf8(bytes).map_err(|_| {
            TaskError::io(
                resolved,
                std::io::Error::new(ErrorKind::InvalidData, "file is not valid UTF-8 text"),
            )
        })
    }

    /// Lists a directory non-recursively, sorted by name.
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, TaskError> {
        let resolved = self.resolve(path)?;
        read_dir_sorted(&resolved)
    }
}

fn violation(path: &str) -> TaskError {
    TaskError::SandboxViolation {
        path: path.to_string(),
    }
}

/// Sorted listing of `dir`. Symlinks are tagged by what they point at.
pub(crate) fn read_dir_sorted(dir: &Path) -> Result<Vec<DirEntry>, TaskError> {
    if dir.exists() && !dir.is_dir() {
        return Err(TaskError::io(
            dir,
            std::io::Error::new(ErrorKind::NotFound, "not a directory"),
        ));
    }
    let reader = fs::read_dir(dir).map_err(|source| TaskError::io(dir, source))?;

    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|source| TaskError::io(dir, source))?;
        let is_dir = fs::metadata(entry.path())
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }
    entries.sort();
    Ok(entries)
}
