//! Directory summaries for `query_context`.

use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

use loo_tui::DirEntry;

use crate::error::TaskError;
use crate::sandbox::{read_dir_sorted, Sandbox};

const SKIPPED_DIRS: &[&str] = &[".git"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// Every file under the root, recursively.
    Full,
    /// Immediate children of one directory.
    Directory,
}

impl SnapshotKind {
    pub fn parse(kind: &str) -> Result<Self, TaskError> {
        match kind {
            "full" => Ok(Self::Full),
            "directory" => Ok(Self::Directory),
            other => Err(TaskError::invalid(
                "kind",
                format!("field `kind` must be one of `full`, `directory` (got `{other}`)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub directory_listing: Vec<String>,
    pub truncated: bool,
}

pub struct SnapshotBuilder<'a> {
    sandbox: &'a Sandbox,
    cap: usize,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(sandbox: &'a Sandbox, cap: usize) -> Self {
        Self { sandbox, cap }
    }

    pub fn build(&self, kind: SnapshotKind, path: &str) -> Result<Snapshot, TaskError> {
        match kind {
            SnapshotKind::Full => self.full(),
            SnapshotKind::Directory => self.directory(path),
        }
    }

    /// Relative paths of all files under the root, sorted per directory.
    ///
    /// Symlinked directories are not followed and `.git` is skipped. Subdirectories that
    /// cannot be read are left out; only an unreadable root is an error.
    pub fn full(&self) -> Result<Snapshot, TaskError> {
        self.full_with(read_dir_sorted)
    }

    fn full_with(
        &self,
        list: impl Fn(&Path) -> Result<Vec<DirEntry>, TaskError>,
    ) -> Result<Snapshot, TaskError> {
        let root = self.sandbox.root();
        let entries = list(root)?;
        let mut snapshot = Snapshot::default();
        let _ = self.walk(root, entries, "", &mut snapshot, &list);
        Ok(snapshot)
    }

    /// Names directly under `path`, with directories suffixed by `/`.
    pub fn directory(&self, path: &str) -> Result<Snapshot, TaskError> {
        let entries = self.sandbox.list_directory(path)?;
        let truncated = entries.len() > self.cap;
        let directory_listing = entries
            .into_iter()
            .take(self.cap)
            .map(|entry| {
                if entry.is_dir {
                    format!("{}/", entry.name)
                } else {
                    entry.name
                }
            })
            .collect();
        Ok(Snapshot {
            directory_listing,
            truncated,
        })
    }

    fn walk(
        &self,
        dir: &Path,
        entries: Vec<DirEntry>,
        prefix: &str,
        snapshot: &mut Snapshot,
        list: &impl Fn(&Path) -> Result<Vec<DirEntry>, TaskError>,
    ) -> ControlFlow<()> {
        for entry in entries {
            let path = dir.join(&entry.name);
            let relative = format!("{prefix}{}", entry.name);
            let is_symlink = fs::symlink_metadata(&path)
                .map(|metadata| metadata.file_type().is_symlink())
                .unwrap_or(false);

            if entry.is_dir {
                if is_symlink || SKIPPED_DIRS.contains(&entry.name.as_str()) {
                    continue;
                }
                let children = match list(&path) {
                    Ok(children) => children,
                    Err(err) => {
                        tracing::debug!(
                            path = %relative,
                            error = %err,
                            "skipping unreadable directory"
                        );
                        continue;
                    }
                };
                let nested = format!("{relative}/");
                if self.walk(&path, children, &nested, snapshot, list).is_break() {
                    return ControlFlow::Break(());
                }
                continue;
            }

            if snapshot.directory_listing.len() == self.cap {
                snapshot.truncated = true;
                return ControlFlow::Break(());
            }
            snapshot.directory_listing.push(relative);
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SnapshotBuilder, SnapshotKind};
    use crate::error::TaskError;
    use crate::sandbox::{read_dir_sorted, Sandbox};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn fixture() -> (tempfile::TempDir, Sandbox) {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("src/bin")).expect("mkdir");
        fs::create_dir_all(dir.path().join(".git")).expect("mkdir");
        fs::create_dir_all(dir.path().join("empty")).expect("mkdir");
        fs::write(dir.path().join(".git/HEAD"), "ref").expect("write");
        fs::write(dir.path().join("Cargo.toml"), "").expect("write");
        fs::write(dir.path().join("src/lib.rs"), "").expect("write");
        fs::write(dir.path().join("src/bin/main.rs"), "").expect("write");
        let sandbox = Sandbox::new(dir.path()).expect("sandbox");
        (dir, sandbox)
    }

    #[test]
    fn full_lists_files_only_and_skips_git() {
        let (_dir, sandbox) = fixture();
        let snapshot = SnapshotBuilder::new(&sandbox, 100).full().expect("snapshot");
        assert_eq!(
            snapshot.directory_listing,
            vec!["Cargo.toml", "src/bin/main.rs", "src/lib.rs"]
        );
        assert!(!snapshot.truncated);
    }

    #[test]
    fn full_signals_truncation_at_cap() {
        let (_dir, sandbox) = fixture();
        let snapshot = SnapshotBuilder::new(&sandbox, 2).full().expect("snapshot");
        assert_eq!(snapshot.directory_listing, vec!["Cargo.toml", "src/bin/main.rs"]);
        assert!(snapshot.truncated);
    }

    #[test]
    fn exactly_cap_files_is_not_truncated() {
        let (_dir, sandbox) = fixture();
        let snapshot = SnapshotBuilder::new(&sandbox, 3).full().expect("snapshot");
        assert_eq!(snapshot.directory_listing.len(), 3);
        assert!(!snapshot.truncated);
    }

    #[test]
    fn directory_kind_marks_subdirectories() {
        let (_dir, sandbox) = fixture();
        let snapshot = SnapshotBuilder::new(&sandbox, 100)
            .build(SnapshotKind::Directory, "src")
            .expect("snapshot");
        assert_eq!(snapshot.directory_listing, vec!["bin/", "lib.rs"]);
    }

    #[test]
    fn unreadable_subdirectory_is_skipped() {
        let (_dir, sandbox) = fixture();
        let locked = sandbox.root().join("src/bin");
        let snapshot = SnapshotBuilder::new(&sandbox, 100)
            .full_with(|path| {
                if path == locked {
                    Err(TaskError::io(
                        path,
                        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                    ))
                } else {
                    read_dir_sorted(path)
                }
            })
            .expect("snapshot");
        assert_eq!(snapshot.directory_listing, vec!["Cargo.toml", "src/lib.rs"]);
        assert!(!snapshot.truncated);
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let (_dir, sandbox) = fixture();
        let err = SnapshotBuilder::new(&sandbox, 100)
            .full_with(|path| {
                Err(TaskError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                ))
            })
            .expect_err("root must be readable");
        assert!(matches!(err, TaskError::Io { .. }));
    }

    #[test]
    fn unknown_kind_names_the_field() {
        let err = SnapshotKind::parse("everything").expect_err("invalid kind");
        assert!(matches!(err, TaskError::Validation { field: "kind", .. }));
    }
}
