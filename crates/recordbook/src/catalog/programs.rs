//! The program catalog: programs, the files they touch, and notes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::FileReferenceResolver;
use crate::cascade::{cascade, ChildTable};
use crate::clock::{Clock, SystemClock};
use crate::error::{EntityKind, Error, Result};
use crate::model::{
    required_text, FileId, KeyFilePatch, KeyFileReference, Note, NotePatch, PersonRole, Program,
    ProgramId, ProgramPatch, ProgramSpec, SeqId,
};
use crate::sequence::{ScopedSequences, SequenceScope};

/// Allocation state for every id scope of a [`ProgramCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSequences {
    /// Program ids.
    pub programs: SequenceScope,
    /// Key-file sequence numbers per program.
    pub key_files: ScopedSequences<ProgramId>,
    /// Note sequence numbers per program.
    pub notes: ScopedSequences<ProgramId>,
}

/// What a program deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgramCascade {
    /// The deleted program, if it existed.
    pub program: Option<ProgramId>,
    /// Number of key-file references removed.
    pub key_files: usize,
    /// Number of notes removed.
    pub notes: usize,
}

impl ProgramCascade {
    /// Whether the deletion found nothing to remove.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.program.is_none()
    }
}

/// A key-file reference with its lazily resolved file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFileView {
    /// The stored reference.
    #[serde(flatten)]
    pub reference: KeyFileReference,
    /// Display name of the referenced file; `None` if it does not resolve.
    pub file_name: Option<String>,
}

/// Flat, ordered export of a [`ProgramCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramCatalogSnapshot {
    /// Programs in insertion order.
    pub programs: Vec<Program>,
    /// Key-file references grouped by program.
    pub key_files: Vec<KeyFileReference>,
    /// Notes grouped by program.
    pub notes: Vec<Note>,
    /// High-water marks so deleted ids stay retired.
    pub sequences: ProgramSequences,
}

/// Owns every [`Program`] and its key-file references and notes.
///
/// Timestamps come from the clock `C`.
#[derive(Debug, Clone, Default)]
pub struct ProgramCatalog<C = SystemClock> {
    clock: C,
    programs: IndexMap<ProgramId, Program>,
    key_files: ChildTable<ProgramId, SeqId, KeyFileReference>,
    notes: ChildTable<ProgramId, SeqId, Note>,
    sequences: ProgramSequences,
}

impl ProgramCatalog<SystemClock> {
    /// Create an empty catalog stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> ProgramCatalog<C> {
    /// Create an empty catalog stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            programs: IndexMap::new(),
            key_files: ChildTable::new(),
            notes: ChildTable::new(),
            sequences: ProgramSequences::default(),
        }
    }

    /// The clock used for timestamps.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    // === Programs ===

    /// Create a program with the next unused id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank name.
    pub fn create_program(&mut self, spec: ProgramSpec) -> Result<Program> {
        let id = self.sequences.programs.peek(self.programs.keys().copied())?;
        let program = spec.build(id)?;
        self.sequences.programs.observe(id);

        debug!("Created program {} ({})", id, program.name);
        self.programs.insert(id, program.clone());
        Ok(program)
    }

    /// Apply a partial update to a program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown program or
    /// [`Error::Validation`] if the patch blanks the name.
    pub fn update_program(&mut self, program_id: ProgramId, patch: ProgramPatch) -> Result<Program> {
        let program = self.program_mut(program_id)?;
        patch.apply(program)?;
        debug!("Updated program {}", program_id);
        Ok(program.clone())
    }

    /// Delete a program with its key-file references and notes.
    ///
    /// Unknown ids are a no-op.
    pub fn delete_program(&mut self, program_id: ProgramId) -> ProgramCascade {
        if self.programs.shift_remove(&program_id).is_none() {
            trace!("Delete of unknown program {} ignored", program_id);
            return ProgramCascade::default();
        }

        let removed = cascade(&[program_id], &mut [&mut self.key_files, &mut self.notes]);
        let removal = ProgramCascade {
            program: Some(program_id),
            key_files: removed[0],
            notes: removed[1],
        };

        info!(
            "Deleted program {} with {} key files, {} notes",
            program_id, removal.key_files, removal.notes
        );
        removal
    }

    /// Look up a program.
    #[must_use]
    pub fn program(&self, program_id: ProgramId) -> Option<&Program> {
        self.programs.get(&program_id)
    }

    /// All programs in insertion order.
    pub fn programs(&self) -> impl Iterator<Item = &Program> + '_ {
        self.programs.values()
    }

    /// Number of programs.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    // === People ===

    /// Add a name to a program's key programmers or key users.
    ///
    /// The name is trimmed; blank names and names already present leave the
    /// program unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown program.
    pub fn add_person(
        &mut self,
        program_id: ProgramId,
        role: PersonRole,
        name: &str,
    ) -> Result<Program> {
        let program = self.program_mut(program_id)?;
        if program.people_mut(role).insert(name) {
            debug!("Added {} '{}' to program {}", role, name.trim(), program_id);
        }
        Ok(program.clone())
    }

    /// Remove a name from a program's key programmers or key users.
    ///
    /// Removing a name that is not listed leaves the program unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown program.
    pub fn remove_person(
        &mut self,
        program_id: ProgramId,
        role: PersonRole,
        name: &str,
    ) -> Result<Program> {
        let program = self.program_mut(program_id)?;
        if program.people_mut(role).remove(name) {
            debug!("Removed {} '{}' from program {}", role, name.trim(), program_id);
        }
        Ok(program.clone())
    }

    // === Key files ===

    /// Record that a program uses a file.
    ///
    /// `file_id` is stored as given and not checked against any file catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown program.
    pub fn add_key_file(
        &mut self,
        program_id: ProgramId,
        file_id: FileId,
        notes: impl Into<String>,
    ) -> Result<KeyFileReference> {
        self.program_mut(program_id)?;
        let seq_id = self
            .sequences
            .key_files
            .allocate(program_id, self.key_files.keys(program_id))?;
        let now = self.clock.now();
        let reference = KeyFileReference {
            program_id,
            seq_id,
            file_id,
            notes: notes.into(),
            created_at: now,
            updated_at: now,
            archived: false,
        };

        debug!(
            "Added key file {}/{} -> file {}",
            program_id, seq_id, file_id
        );
        self.key_files.insert(program_id, seq_id, reference.clone());
        Ok(reference)
    }

    /// Apply a partial update to a key-file reference and stamp `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the reference does not exist.
    pub fn update_key_file(
        &mut self,
        program_id: ProgramId,
        seq_id: SeqId,
        patch: KeyFilePatch,
    ) -> Result<KeyFileReference> {
        let now = self.clock.now();
        let reference = self
            .key_files
            .get_mut(program_id, seq_id)
            .ok_or_else(|| Error::not_found(EntityKind::KeyFile, format!("{program_id}/{seq_id}")))?;
        patch.apply(reference, now);
        debug!("Updated key file {}/{}", program_id, seq_id);
        Ok(reference.clone())
    }

    /// Remove one key-file reference; unknown keys are a no-op.
    pub fn delete_key_file(
        &mut self,
        program_id: ProgramId,
        seq_id: SeqId,
    ) -> Option<KeyFileReference> {
        let removed = self.key_files.remove(program_id, seq_id);
        if removed.is_none() {
            trace!("Delete of unknown key file {}/{} ignored", program_id, seq_id);
        }
        removed
    }

    /// Key-file references of a program in insertion order.
    pub fn key_files_of(
        &self,
        program_id: ProgramId,
    ) -> impl Iterator<Item = &KeyFileReference> + '_ {
        self.key_files.children(program_id)
    }

    /// Number of key-file references on a program.
    #[must_use]
    pub fn key_file_count(&self, program_id: ProgramId) -> usize {
        self.key_files.count(program_id)
    }

    /// Key-file references of a program with file names resolved.
    pub fn key_file_views<R>(&self, program_id: ProgramId, resolver: &R) -> Vec<KeyFileView>
    where
        R: FileReferenceResolver + ?Sized,
    {
        self.key_files_of(program_id)
            .map(|reference| KeyFileView {
                file_name: resolver.display_name(reference.file_id),
                reference: reference.clone(),
            })
            .collect()
    }

    // === Notes ===

    /// Attach a note to a program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown program and
    /// [`Error::Validation`] if `text` or `author_id` is blank.
    pub fn add_note(&mut self, program_id: ProgramId, text: &str, author_id: &str) -> Result<Note> {
        self.program_mut(program_id)?;
        let text = required_text("note text", text)?;
        let author_id = required_text("note author", author_id)?;

        let seq_id = self
            .sequences
            .notes
            .allocate(program_id, self.notes.keys(program_id))?;
        let now = self.clock.now();
        let note = Note {
            program_id,
            seq_id,
            text,
            author_id,
            created_at: now,
            updated_at: now,
            archived: false,
        };

        debug!("Added note {}/{} by {}", program_id, seq_id, note.author_id);
        self.notes.insert(program_id, seq_id, note.clone());
        Ok(note)
    }

    /// Apply a partial update to a note and stamp `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the note does not exist or
    /// [`Error::Validation`] if the patch blanks the text.
    pub fn update_note(
        &mut self,
        program_id: ProgramId,
        seq_id: SeqId,
        patch: NotePatch,
    ) -> Result<Note> {
        let now = self.clock.now();
        let note = self
            .notes
            .get_mut(program_id, seq_id)
            .ok_or_else(|| Error::not_found(EntityKind::Note, format!("{program_id}/{seq_id}")))?;
        patch.apply(note, now)?;
        debug!("Updated note {}/{}", program_id, seq_id);
        Ok(note.clone())
    }

    /// Remove one note; unknown keys are a no-op.
    pub fn delete_note(&mut self, program_id: ProgramId, seq_id: SeqId) -> Option<Note> {
        let removed = self.notes.remove(program_id, seq_id);
        if removed.is_none() {
            trace!("Delete of unknown note {}/{} ignored", program_id, seq_id);
        }
        removed
    }

    /// Notes of a program in insertion order.
    pub fn notes_of(&self, program_id: ProgramId) -> impl Iterator<Item = &Note> + '_ {
        self.notes.children(program_id)
    }

    /// Number of notes on a program.
    #[must_use]
    pub fn note_count(&self, program_id: ProgramId) -> usize {
        self.notes.count(program_id)
    }

    // === Snapshots ===

    /// Export every row in order, with sequence state.
    #[must_use]
    pub fn snapshot(&self) -> ProgramCatalogSnapshot {
        ProgramCatalogSnapshot {
            programs: self.programs.values().cloned().collect(),
            key_files: self.key_files.iter().cloned().collect(),
            notes: self.notes.iter().cloned().collect(),
            sequences: self.sequences.clone(),
        }
    }

    /// Rebuild a catalog from a snapshot, stamping future changes with `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] for duplicate keys and
    /// [`Error::NotFound`] for rows whose program is missing.
    pub fn from_snapshot(snapshot: ProgramCatalogSnapshot, clock: C) -> Result<Self> {
        let mut catalog = Self::with_clock(clock);
        catalog.sequences = snapshot.sequences;

        for program in snapshot.programs {
            let id = program.id;
            if catalog.programs.insert(id, program).is_some() {
                return Err(Error::conflict(format!("duplicate program id {id}")));
            }
            catalog.sequences.programs.observe(id);
        }

        for reference in snapshot.key_files {
            let (program_id, seq_id) = (reference.program_id, reference.seq_id);
            catalog.program_mut(program_id)?;
            if catalog.key_files.insert(program_id, seq_id, reference).is_some() {
                return Err(Error::conflict(format!(
                    "duplicate key file {program_id}/{seq_id}"
                )));
            }
            catalog.sequences.key_files.observe(program_id, seq_id);
        }

        for note in snapshot.notes {
            let (program_id, seq_id) = (note.program_id, note.seq_id);
            catalog.program_mut(program_id)?;
            if catalog.notes.insert(program_id, seq_id, note).is_some() {
                return Err(Error::conflict(format!("duplicate note {program_id}/{seq_id}")));
            }
            catalog.sequences.notes.observe(program_id, seq_id);
        }

        Ok(catalog)
    }

    fn program_mut(&mut self, program_id: ProgramId) -> Result<&mut Program> {
        self.programs
            .get_mut(&program_id)
            .ok_or_else(|| Error::not_found(EntityKind::Program, program_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FileCatalog;
    use crate::clock::FixedClock;
    use crate::model::FileSpec;
    use chrono::{DateTime, Duration, Utc};

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn catalog() -> (ProgramCatalog<FixedClock>, ProgramId) {
        let mut catalog =
            ProgramCatalog::with_clock(FixedClock::stepping(epoch(), Duration::seconds(1)));
        let program = catalog.create_program(ProgramSpec::new("CUSTUPD")).unwrap();
        (catalog, program.id)
    }

    #[test]
    fn test_create_and_update_program() {
        let (mut catalog, id) = catalog();
        assert_eq!(id, 1);
        let second = catalog.create_program(ProgramSpec::new("ORDRPT")).unwrap();
        assert_eq!(second.id, 2);

        let patch = ProgramPatch {
            run_location: Some("LPAR1".to_string()),
            ..ProgramPatch::default()
        };
        let updated = catalog.update_program(id, patch).unwrap();
        assert_eq!(updated.run_location, "LPAR1");

        let err = catalog.update_program(9, ProgramPatch::default()).unwrap_err();
        assert!(err.is_not_found());
        assert!(catalog
            .create_program(ProgramSpec::new(""))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_note_scenario() {
        let (mut catalog, id) = catalog();

        let err = catalog.add_note(id, "reads CUST", "").unwrap_err();
        assert!(err.is_validation());
        let err = catalog.add_note(id, "   ", "jdoe").unwrap_err();
        assert!(err.is_validation());

        let first = catalog.add_note(id, "reads CUST", "jdoe").unwrap();
        assert_eq!(first.seq_id, 1);
        let second = catalog.add_note(id, "writes ORDERS", "jdoe").unwrap();
        assert_eq!(second.seq_id, 2);
        assert_eq!(catalog.note_count(id), 2);
    }

    #[test]
    fn test_add_note_to_missing_program() {
        let (mut catalog, _) = catalog();
        assert!(catalog.add_note(7, "x", "y").unwrap_err().is_not_found());
    }

    #[test]
    fn test_note_timestamps() {
        let (mut catalog, id) = catalog();
        let note = catalog.add_note(id, "reads CUST", "jdoe").unwrap();
        assert_eq!(note.created_at, note.updated_at);

        let updated = catalog
            .update_note(
                id,
                note.seq_id,
                NotePatch {
                    text: Some("reads CUST and ORDERS".to_string()),
                    archived: None,
                },
            )
            .unwrap();
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at > note.updated_at);
        assert_eq!(updated.text, "reads CUST and ORDERS");

        let err = catalog
            .update_note(id, 99, NotePatch::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_key_files_are_loose_references() {
        let (mut catalog, id) = catalog();
        let reference = catalog.add_key_file(id, 404, "input").unwrap();
        assert_eq!(reference.seq_id, 1);
        assert_eq!(reference.file_id, 404);

        let mut files = FileCatalog::new();
        let cust = files.create_file(FileSpec::new("CUST")).unwrap();
        catalog.add_key_file(id, cust.id, "master").unwrap();

        let views = catalog.key_file_views(id, &files);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].file_name, None);
        assert_eq!(views[1].file_name.as_deref(), Some("CUST"));

        assert!(catalog.add_key_file(8, 1, "").unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_key_file() {
        let (mut catalog, id) = catalog();
        let reference = catalog.add_key_file(id, 1, "input").unwrap();
        let updated = catalog
            .update_key_file(
                id,
                reference.seq_id,
                KeyFilePatch {
                    notes: Some("input, read sequentially".to_string()),
                    ..KeyFilePatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.file_id, 1);
        assert_eq!(updated.notes, "input, read sequentially");
        assert!(updated.updated_at > reference.updated_at);
    }

    #[test]
    fn test_key_file_and_note_deletes_are_idempotent() {
        let (mut catalog, id) = catalog();
        catalog.add_key_file(id, 1, "").unwrap();
        catalog.add_key_file(id, 2, "").unwrap();
        catalog.add_note(id, "n", "a").unwrap();

        assert!(catalog.delete_key_file(id, 1).is_some());
        assert!(catalog.delete_key_file(id, 1).is_none());
        assert!(catalog.delete_note(id, 1).is_some());
        assert!(catalog.delete_note(id, 1).is_none());
        assert!(catalog.delete_note(99, 1).is_none());

        // sequence numbers are not recycled
        assert_eq!(catalog.add_key_file(id, 3, "").unwrap().seq_id, 3);
        assert_eq!(catalog.add_note(id, "m", "a").unwrap().seq_id, 2);
    }

    #[test]
    fn test_delete_program_cascades() {
        let (mut catalog, id) = catalog();
        let other = catalog.create_program(ProgramSpec::new("ORDRPT")).unwrap().id;
        catalog.add_key_file(id, 1, "").unwrap();
        catalog.add_key_file(id, 2, "").unwrap();
        catalog.add_note(id, "n", "a").unwrap();
        catalog.add_note(other, "keep", "a").unwrap();

        let removal = catalog.delete_program(id);
        assert_eq!(
            removal,
            ProgramCascade {
                program: Some(id),
                key_files: 2,
                notes: 1,
            }
        );
        assert!(catalog.program(id).is_none());
        assert_eq!(catalog.key_files_of(id).count(), 0);
        assert_eq!(catalog.notes_of(id).count(), 0);
        assert_eq!(catalog.notes_of(other).count(), 1);

        assert!(catalog.delete_program(id).is_noop());
    }

    #[test]
    fn test_people() {
        let (mut catalog, id) = catalog();
        catalog.add_person(id, PersonRole::Programmer, "Jane Doe").unwrap();
        let program = catalog
            .add_person(id, PersonRole::Programmer, " Jane Doe ")
            .unwrap();
        assert_eq!(program.key_programmers.len(), 1);
        assert!(program.key_users.is_empty());

        let program = catalog.remove_person(id, PersonRole::Programmer, "Nobody").unwrap();
        assert_eq!(program.key_programmers.len(), 1);

        catalog.add_person(id, PersonRole::User, "Ops").unwrap();
        let program = catalog.remove_person(id, PersonRole::Programmer, "Jane Doe").unwrap();
        assert!(program.key_programmers.is_empty());
        assert_eq!(program.key_users.to_string(), "Ops");

        assert!(catalog
            .add_person(5, PersonRole::User, "x")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (mut catalog, id) = catalog();
        catalog.add_key_file(id, 1, "master").unwrap();
        catalog.add_note(id, "n", "a").unwrap();
        catalog.delete_note(id, 1);

        let snapshot = catalog.snapshot();
        let mut restored =
            ProgramCatalog::from_snapshot(snapshot.clone(), FixedClock::new(epoch())).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.add_note(id, "again", "a").unwrap().seq_id, 2);

        let mut dup = snapshot.clone();
        dup.programs.push(dup.programs[0].clone());
        assert!(ProgramCatalog::from_snapshot(dup, SystemClock)
            .unwrap_err()
            .is_conflict());

        let mut orphan = snapshot;
        orphan.programs.clear();
        assert!(ProgramCatalog::from_snapshot(orphan, SystemClock)
            .unwrap_err()
            .is_not_found());
    }
}
