//! The set of files SQLite keeps for the index database.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::preferences::RecoveryPolicy;

/// Suffixes of the companion files SQLite creates next to the database.
const COMPANION_SUFFIXES: &[&str] = &["-wal", "-shm", "-journal"];

/// The main database file plus its journal companions.
#[derive(Debug, Clone)]
pub struct DatabaseFiles {
    db_path: PathBuf,
}

impl DatabaseFiles {
    /// Describes the files belonging to the database at `db_path`.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Path of the main database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// All paths that may belong to this database, main file first.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.db_path.clone()];
        for suffix in COMPANION_SUFFIXES {
            let mut name = self.db_path.as_os_str().to_os_string();
            name.push(suffix);
            paths.push(PathBuf::from(name));
        }
        paths
    }

    /// Whether the main database file exists.
    pub fn exists(&self) -> bool {
        self.db_path.exists()
    }

    /// Deletes every file of the database. Missing files are skipped.
    pub fn delete(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.paths() {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
        tracing::info!(path = %self.db_path.display(), removed, "deleted index database files");
        Ok(removed)
    }

    /// Renames every file of the database with a `.<stamp>.bak` suffix.
    ///
    /// If a backup with that stamp already exists, a `-<n>` counter is
    /// appended to the stamp. Returns the backup path of the main file, or
    /// `None` if there was nothing to back up.
    pub fn preserve(&self, stamp: &str) -> Result<Option<PathBuf>> {
        let stamp = self.unused_stamp(stamp);
        let mut main_backup = None;
        for path in self.paths() {
            let backup = backup_path(&path, &stamp);

            match std::fs::rename(&path, &backup) {
                Ok(()) => {
                    if path == self.db_path {
                        main_backup = Some(backup);
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }

        if let Some(backup) = &main_backup {
            tracing::warn!(backup = %backup.display(), "moved unusable index database aside");
        }
        Ok(main_backup)
    }

    fn unused_stamp(&self, stamp: &str) -> String {
        let taken = |candidate: &str| {
            self.paths()
                .iter()
                .any(|path| backup_path(path, candidate).exists())
        };
        if !taken(stamp) {
            return stamp.to_string();
        }
        (1..)
            .map(|n| format!("{stamp}-{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| stamp.to_string())
    }

    /// Gets rid of the current database according to `policy`.
    ///
    /// Returns `false` under [`RecoveryPolicy::Fail`], where nothing is touched.
    pub fn discard(&self, policy: RecoveryPolicy) -> Result<bool> {
        match policy {
            RecoveryPolicy::Rebuild => {
                self.delete()?;
                Ok(true)
            }
            RecoveryPolicy::Preserve => {
                let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
                self.preserve(&stamp)?;
                Ok(true)
            }
            RecoveryPolicy::Fail => Ok(false),
        }
    }
}

fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut backup = path.as_os_str().to_os_string();
    backup.push(format!(".{stamp}.bak"));
    PathBuf::from(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_include_companions() {
        let files = DatabaseFiles::new("/state/symfonymodel.db");
        let paths = files.paths();
        assert_eq!(paths.len(), 4);
        assert_eq!(paths[0], PathBuf::from("/state/symfonymodel.db"));
        assert_eq!(paths[1], PathBuf::from("/state/symfonymodel.db-wal"));
        assert_eq!(paths[3], PathBuf::from("/state/symfonymodel.db-journal"));
    }

    #[test]
    fn delete_removes_existing_files_and_skips_missing() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let files = DatabaseFiles::new(dir.path().join("symfonymodel.db"));
        std::fs::write(files.db_path(), b"db").unwrap();
        std::fs::write(dir.path().join("symfonymodel.db-wal"), b"wal").unwrap();

        assert_eq!(files.delete().unwrap(), 2);
        assert!(!files.exists());
        assert_eq!(files.delete().unwrap(), 0, "second delete finds nothing");
    }

    #[test]
    fn preserve_renames_main_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let files = DatabaseFiles::new(dir.path().join("symfonymodel.db"));
        std::fs::write(files.db_path(), b"db").unwrap();

        let backup = files
            .preserve("20260101T000000Z")
            .unwrap()
            .expect("main file should be backed up");

        assert_eq!(
            backup,
            dir.path().join("symfonymodel.db.20260101T000000Z.bak")
        );
        assert_eq!(std::fs::read(&backup).unwrap(), b"db");
        assert!(!files.exists());
    }

    #[test]
    fn preserve_never_overwrites_an_earlier_backup() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let files = DatabaseFiles::new(dir.path().join("symfonymodel.db"));

        std::fs::write(files.db_path(), b"first").unwrap();
        let first = files.preserve("20260101T000000Z").unwrap().unwrap();
        std::fs::write(files.db_path(), b"second").unwrap();
        let second = files.preserve("20260101T000000Z").unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(
            second,
            dir.path().join("symfonymodel.db.20260101T000000Z-1.bak")
        );
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn repeated_discard_keeps_every_backup() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let files = DatabaseFiles::new(dir.path().join("symfonymodel.db"));

        for contents in [b"one", b"two"] {
            std::fs::write(files.db_path(), contents).unwrap();
            assert!(files.discard(RecoveryPolicy::Preserve).unwrap());
        }

        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".bak"))
            .count();
        assert_eq!(backups, 2);
    }

    #[test]
    fn fail_policy_leaves_files_alone() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let files = DatabaseFiles::new(dir.path().join("symfonymodel.db"));
        std::fs::write(files.db_path(), b"db").unwrap();

        assert!(!files.discard(RecoveryPolicy::Fail).unwrap());
        assert!(files.exists());
    }
}
