//! Programs, the files they touch, and the notes kept about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{required_text, FileId, PersonRole, PersonSet, ProgramId, SeqId};
use crate::error::Result;

/// A documented legacy program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Catalog-assigned identifier.
    pub id: ProgramId,
    /// Program name, never blank.
    pub name: String,
    /// Where the program runs.
    pub run_location: String,
    /// Where its source lives.
    pub source_location: String,
    /// Free-form program type (batch, online, ...).
    pub program_type: String,
    /// Free-text description.
    pub description: String,
    /// Key programmers.
    pub key_programmers: PersonSet,
    /// Key users.
    pub key_users: PersonSet,
    /// Archived flag.
    pub archived: bool,
}

impl Program {
    /// The people listed under `role`.
    #[must_use]
    pub const fn people(&self, role: PersonRole) -> &PersonSet {
        match role {
            PersonRole::Programmer => &self.key_programmers,
            PersonRole::User => &self.key_users,
        }
    }

    pub(crate) fn people_mut(&mut self, role: PersonRole) -> &mut PersonSet {
        match role {
            PersonRole::Programmer => &mut self.key_programmers,
            PersonRole::User => &mut self.key_users,
        }
    }
}

/// Input for creating a [`Program`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSpec {
    /// Program name (required).
    pub name: String,
    /// Where the program runs.
    pub run_location: String,
    /// Where its source lives.
    pub source_location: String,
    /// Program type.
    pub program_type: String,
    /// Description.
    pub description: String,
    /// Initial key programmers.
    pub key_programmers: PersonSet,
    /// Initial key users.
    pub key_users: PersonSet,
    /// Initial archived flag.
    pub archived: bool,
}

impl ProgramSpec {
    /// Start a spec with the required name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn build(self, id: ProgramId) -> Result<Program> {
        Ok(Program {
            id,
            name: required_text("program name", &self.name)?,
            run_location: self.run_location,
            source_location: self.source_location,
            program_type: self.program_type,
            description: self.description,
            key_programmers: self.key_programmers,
            key_users: self.key_users,
            archived: self.archived,
        })
    }
}

/// Partial update of a [`Program`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramPatch {
    /// New name; must not be blank.
    pub name: Option<String>,
    /// New run location.
    pub run_location: Option<String>,
    /// New source location.
    pub source_location: Option<String>,
    /// New program type.
    pub program_type: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement key-programmer set.
    pub key_programmers: Option<PersonSet>,
    /// Replacement key-user set.
    pub key_users: Option<PersonSet>,
    /// New archived flag.
    pub archived: Option<bool>,
}

impl ProgramPatch {
    pub(crate) fn apply(self, program: &mut Program) -> Result<()> {
        let name = self
            .name
            .map(|name| required_text("program name", &name))
            .transpose()?;

        if let Some(name) = name {
            program.name = name;
        }
        if let Some(run_location) = self.run_location {
            program.run_location = run_location;
        }
        if let Some(source_location) = self.source_location {
            program.source_location = source_location;
        }
        if let Some(program_type) = self.program_type {
            program.program_type = program_type;
        }
        if let Some(description) = self.description {
            program.description = description;
        }
        if let Some(people) = self.key_programmers {
            program.key_programmers = people;
        }
        if let Some(people) = self.key_users {
            program.key_users = people;
        }
        if let Some(archived) = self.archived {
            program.archived = archived;
        }
        Ok(())
    }
}

/// A documented association between a program and a file it reads or writes.
///
/// `file_id` is a loose reference: it is never validated against the file
/// catalog and does not own the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFileReference {
    /// Owning program.
    pub program_id: ProgramId,
    /// Sequence number under the program, starting at 1.
    pub seq_id: SeqId,
    /// Referenced file; may not resolve.
    pub file_id: FileId,
    /// How the program uses the file.
    pub notes: String,
    /// When the reference was added.
    pub created_at: DateTime<Utc>,
    /// When the reference was last changed.
    pub updated_at: DateTime<Utc>,
    /// Archived flag.
    pub archived: bool,
}

/// Partial update of a [`KeyFileReference`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyFilePatch {
    /// Point the reference at another file.
    pub file_id: Option<FileId>,
    /// New notes.
    pub notes: Option<String>,
    /// New archived flag.
    pub archived: Option<bool>,
}

impl KeyFilePatch {
    pub(crate) fn apply(self, reference: &mut KeyFileReference, now: DateTime<Utc>) {
        if let Some(file_id) = self.file_id {
            reference.file_id = file_id;
        }
        if let Some(notes) = self.notes {
            reference.notes = notes;
        }
        if let Some(archived) = self.archived {
            reference.archived = archived;
        }
        reference.updated_at = now;
    }
}

/// A free-text note about a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Owning program.
    pub program_id: ProgramId,
    /// Sequence number under the program, starting at 1.
    pub seq_id: SeqId,
    /// Note body, never blank.
    pub text: String,
    /// Who wrote the note, never blank.
    pub author_id: String,
    /// When the note was added.
    pub created_at: DateTime<Utc>,
    /// When the note was last changed.
    pub updated_at: DateTime<Utc>,
    /// Archived flag.
    pub archived: bool,
}

/// Partial update of a [`Note`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotePatch {
    /// New body; must not be blank.
    pub text: Option<String>,
    /// New archived flag.
    pub archived: Option<bool>,
}

impl NotePatch {
    pub(crate) fn apply(self, note: &mut Note, now: DateTime<Utc>) -> Result<()> {
        let text = self
            .text
            .map(|text| required_text("note text", &text))
            .transpose()?;

        if let Some(text) = text {
            note.text = text;
        }
        if let Some(archived) = self.archived {
            note.archived = archived;
        }
        note.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_spec_requires_name() {
        assert!(ProgramSpec::new("").build(1).unwrap_err().is_validation());
        let program = ProgramSpec::new("CUSTUPD").build(3).unwrap();
        assert_eq!(program.id, 3);
        assert!(program.key_programmers.is_empty());
    }

    #[test]
    fn test_people_by_role() {
        let mut program = ProgramSpec::new("CUSTUPD").build(1).unwrap();
        program.people_mut(PersonRole::User).insert("Ops");
        assert!(program.people(PersonRole::User).contains("Ops"));
        assert!(program.people(PersonRole::Programmer).is_empty());
    }

    #[test]
    fn test_program_patch_replaces_people() {
        let mut program = ProgramSpec::new("CUSTUPD").build(1).unwrap();
        ProgramPatch {
            key_programmers: Some("Jane Doe, John Roe".parse().unwrap()),
            program_type: Some("batch".to_string()),
            ..ProgramPatch::default()
        }
        .apply(&mut program)
        .unwrap();
        assert_eq!(program.key_programmers.len(), 2);
        assert_eq!(program.program_type, "batch");
        assert_eq!(program.name, "CUSTUPD");
    }

    #[test]
    fn test_note_patch_rejects_blank_text() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        let mut note = Note {
            program_id: 1,
            seq_id: 1,
            text: "reads CUST nightly".to_string(),
            author_id: "jdoe".to_string(),
            created_at: at,
            updated_at: at,
            archived: false,
        };
        let patch = NotePatch {
            text: Some("  ".to_string()),
            archived: None,
        };
        assert!(patch.apply(&mut note, at).unwrap_err().is_validation());
        assert_eq!(note.text, "reads CUST nightly");
    }
}
