//! A file catalog and a program catalog kept together on disk.
//!
//! The workspace is written as one JSON document holding a flat
//! [`WorkspaceSnapshot`]. Indexes are rebuilt on load, so the document never
//! contains derived state beyond each id scope's high-water mark.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{
    FileCatalog, FileCatalogSnapshot, KeyFileView, ProgramCatalog, ProgramCatalogSnapshot,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::model::ProgramId;

/// The snapshot format written by this version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a [`Workspace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// Format version; documents newer than [`SNAPSHOT_VERSION`] are refused.
    pub version: u32,
    /// The file catalog.
    #[serde(default)]
    pub files: FileCatalogSnapshot,
    /// The program catalog.
    #[serde(default)]
    pub programs: ProgramCatalogSnapshot,
}

impl Default for WorkspaceSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            files: FileCatalogSnapshot::default(),
            programs: ProgramCatalogSnapshot::default(),
        }
    }
}

/// Both catalogs of one record book.
#[derive(Debug, Clone, Default)]
pub struct Workspace<C = SystemClock> {
    /// Files, fields, and field documentation.
    pub files: FileCatalog,
    /// Programs, key-file references, and notes.
    pub programs: ProgramCatalog<C>,
}

impl Workspace<SystemClock> {
    /// Create an empty workspace stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a workspace from `path`, or an empty one if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its
    /// contents violate a catalog invariant.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_clock(path, SystemClock)
    }
}

impl<C: Clock> Workspace<C> {
    /// Create an empty workspace stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            files: FileCatalog::new(),
            programs: ProgramCatalog::with_clock(clock),
        }
    }

    /// Load a workspace from `path` using `clock` for later timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its
    /// contents violate a catalog invariant.
    pub fn load_with_clock(path: impl AsRef<Path>, clock: C) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No workspace at {}, starting empty", path.display());
            return Ok(Self::with_clock(clock));
        }

        let bytes = std::fs::read(path)?;
        let snapshot: WorkspaceSnapshot = serde_json::from_slice(&bytes)?;
        let workspace = Self::from_snapshot(snapshot, clock)?;

        debug!(
            "Loaded workspace from {} ({} files, {} programs)",
            path.display(),
            workspace.files.file_count(),
            workspace.programs.program_count()
        );
        Ok(workspace)
    }

    /// Rebuild a workspace from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unsupported version,
    /// [`Error::Conflict`] for duplicate keys, and [`Error::NotFound`] for
    /// rows whose parent is missing.
    pub fn from_snapshot(snapshot: WorkspaceSnapshot, clock: C) -> Result<Self> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(Error::validation(format!(
                "workspace version {} is newer than supported version {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        Ok(Self {
            files: FileCatalog::from_snapshot(snapshot.files)?,
            programs: ProgramCatalog::from_snapshot(snapshot.programs, clock)?,
        })
    }

    /// Export both catalogs.
    #[must_use]
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            version: SNAPSHOT_VERSION,
            files: self.files.snapshot(),
            programs: self.programs.snapshot(),
        }
    }

    /// Write the workspace to `path`, creating parent directories.
    ///
    /// The document is written beside `path` and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or the file cannot
    /// be written.
    pub fn save(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let snapshot = self.snapshot();
        let bytes = if pretty {
            serde_json::to_vec_pretty(&snapshot)?
        } else {
            serde_json::to_vec(&snapshot)?
        };

        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, bytes)?;
        std::fs::rename(&staging, path)?;

        debug!("Saved workspace to {}", path.display());
        Ok(())
    }

    /// Key-file references of a program with names resolved against this
    /// workspace's file catalog.
    #[must_use]
    pub fn key_file_views(&self, program_id: ProgramId) -> Vec<KeyFileView> {
        self.programs.key_file_views(program_id, &self.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::{FieldSpec, FileSpec, ProgramSpec, ValidDataSpec};
    use chrono::{DateTime, Utc};
    use tempfile::TempDir;

    fn sample() -> Workspace {
        let mut workspace = Workspace::new();
        let cust = workspace.files.create_file(FileSpec::new("CUST")).unwrap();
        let field = workspace
            .files
            .add_field(cust.id, FieldSpec::new("CUST-ID", 8))
            .unwrap();
        workspace
            .files
            .add_valid_data(field.id, ValidDataSpec::new("A", "active"))
            .unwrap();
        let program = workspace
            .programs
            .create_program(ProgramSpec::new("CUSTUPD"))
            .unwrap();
        workspace
            .programs
            .add_key_file(program.id, cust.id, "master")
            .unwrap();
        workspace
            .programs
            .add_note(program.id, "reads CUST", "jdoe")
            .unwrap();
        workspace
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(workspace.files.file_count(), 0);
        assert_eq!(workspace.programs.program_count(), 0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("workspace.json");
        let workspace = sample();

        workspace.save(&path, true).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = Workspace::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), workspace.snapshot());

        let views = loaded.key_file_views(1);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].file_name.as_deref(), Some("CUST"));
    }

    #[test]
    fn test_compact_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        sample().save(&path, false).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_deleted_ids_stay_retired_across_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        let mut workspace = sample();
        let extra = workspace.files.create_file(FileSpec::new("ORDERS")).unwrap();
        workspace.files.delete_file(extra.id);
        workspace.save(&path, true).unwrap();

        let mut loaded = Workspace::load(&path).unwrap();
        let next = loaded.files.create_file(FileSpec::new("ITEMS")).unwrap();
        assert_eq!(next.id, extra.id + 1);
    }

    #[test]
    fn test_rejects_newer_version() {
        let snapshot = WorkspaceSnapshot {
            version: SNAPSHOT_VERSION + 1,
            ..WorkspaceSnapshot::default()
        };
        let err = Workspace::from_snapshot(snapshot, SystemClock).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejects_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = Workspace::load(&path).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_load_with_clock_stamps_new_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        sample().save(&path, true).unwrap();

        let at = DateTime::<Utc>::UNIX_EPOCH;
        let mut loaded = Workspace::load_with_clock(&path, FixedClock::new(at)).unwrap();
        let note = loaded.programs.add_note(1, "writes ORDERS", "jdoe").unwrap();
        assert_eq!(note.seq_id, 2);
        assert_eq!(note.created_at, at);
    }
}
