//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and how their
//! arguments map onto catalog inputs.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::{
    FieldId, FieldPatch, FieldSpec, FileId, FilePatch, FileSpec, KeyFilePatch, NotePatch,
    PersonRole, PersonSet, ProgramId, ProgramPatch, ProgramSpec, SeqId, Span,
};

/// File commands.
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Create a file
    Create(FileCreateArgs),

    /// List all files
    List,

    /// Show a file with its fields
    Show {
        /// File id
        file_id: FileId,
    },

    /// Update file attributes
    Update(FileUpdateArgs),

    /// Delete a file with its fields and their documentation
    Delete {
        /// File id
        file_id: FileId,
    },

    /// Repack the file's fields contiguously from position 1
    Relayout {
        /// File id
        file_id: FileId,
    },
}

/// Arguments for `file create`.
#[derive(Debug, Args)]
pub struct FileCreateArgs {
    /// Short name of the file
    pub short_name: String,

    /// Descriptive name
    #[arg(long, default_value = "")]
    pub long_name: String,

    /// Location on the legacy system
    #[arg(long, default_value = "")]
    pub location: String,

    /// Record size in bytes
    #[arg(long, default_value_t = 0)]
    pub size: u64,

    /// Documentation link
    #[arg(long, default_value = "")]
    pub doc_link: String,
}

impl From<FileCreateArgs> for FileSpec {
    fn from(args: FileCreateArgs) -> Self {
        Self {
            short_name: args.short_name,
            long_name: args.long_name,
            location: args.location,
            size_bytes: args.size,
            doc_link: args.doc_link,
            archived: false,
        }
    }
}

/// Arguments for `file update`.
#[derive(Debug, Args)]
pub struct FileUpdateArgs {
    /// File id
    pub file_id: FileId,

    /// New short name
    #[arg(long)]
    pub short_name: Option<String>,

    /// New descriptive name
    #[arg(long)]
    pub long_name: Option<String>,

    /// New location
    #[arg(long)]
    pub location: Option<String>,

    /// New record size in bytes
    #[arg(long)]
    pub size: Option<u64>,

    /// New documentation link
    #[arg(long)]
    pub doc_link: Option<String>,

    /// Archive or restore the file
    #[arg(long)]
    pub archived: Option<bool>,
}

impl FileUpdateArgs {
    /// Split into the target id and the patch to apply.
    #[must_use]
    pub fn into_patch(self) -> (FileId, FilePatch) {
        let patch = FilePatch {
            short_name: self.short_name,
            long_name: self.long_name,
            location: self.location,
            size_bytes: self.size,
            doc_link: self.doc_link,
            archived: self.archived,
        };
        (self.file_id, patch)
    }
}

/// Field commands.
#[derive(Debug, Subcommand)]
pub enum FieldCommand {
    /// Add a field to a file
    Add(FieldAddArgs),

    /// Update field attributes; positions only move when given explicitly
    Update(FieldUpdateArgs),

    /// Delete a field with its valid data and data structures
    Delete {
        /// Field id
        field_id: FieldId,
    },

    /// List the fields of a file
    List {
        /// File id
        file_id: FileId,
    },
}

/// Explicit `--beg` / `--end` placement.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct PositionArgs {
    /// First position (requires --end)
    #[arg(long, requires = "end")]
    pub beg: Option<u32>,

    /// Last position (requires --beg)
    #[arg(long, requires = "beg")]
    pub end: Option<u32>,
}

impl PositionArgs {
    /// The requested range, unvalidated.
    #[must_use]
    pub fn span(self) -> Option<Span> {
        match (self.beg, self.end) {
            (Some(beg_pos), Some(end_pos)) => Some(Span { beg_pos, end_pos }),
            _ => None,
        }
    }
}

/// Arguments for `field add`.
#[derive(Debug, Args)]
pub struct FieldAddArgs {
    /// Owning file id
    pub file_id: FileId,

    /// Field name
    pub name: String,

    /// Size in bytes; zero or negative occupies one position
    #[arg(allow_negative_numbers = true)]
    pub size: i32,

    /// Description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Mark the field as packed
    #[arg(long)]
    pub packed: bool,

    /// Notes about valid data
    #[arg(long, default_value = "")]
    pub notes: String,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub positions: PositionArgs,
}

impl From<FieldAddArgs> for FieldSpec {
    fn from(args: FieldAddArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            size_bytes: args.size,
            packed: args.packed,
            positions: args.positions.span(),
            valid_data_notes: args.notes,
            archived: false,
        }
    }
}

/// Arguments for `field update`.
#[derive(Debug, Args)]
pub struct FieldUpdateArgs {
    /// Field id
    pub field_id: FieldId,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    /// New size in bytes
    #[arg(long, allow_negative_numbers = true)]
    pub size: Option<i32>,

    /// Set or clear the packed flag
    #[arg(long)]
    pub packed: Option<bool>,

    /// New notes about valid data
    #[arg(long)]
    pub notes: Option<String>,

    /// Archive or restore the field
    #[arg(long)]
    pub archived: Option<bool>,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub positions: PositionArgs,
}

impl FieldUpdateArgs {
    /// Split into the target id and the patch to apply.
    #[must_use]
    pub fn into_patch(self) -> (FieldId, FieldPatch) {
        let patch = FieldPatch {
            name: self.name,
            description: self.description,
            size_bytes: self.size,
            packed: self.packed,
            positions: self.positions.span(),
            valid_data_notes: self.notes,
            archived: self.archived,
        };
        (self.field_id, patch)
    }
}

/// Valid-data commands.
#[derive(Debug, Subcommand)]
pub enum ValidCommand {
    /// Document a permissible value of a field
    Add {
        /// Field id
        field_id: FieldId,
        /// The value
        value: String,
        /// What the value means
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Remove a valid-data entry
    Delete {
        /// Field id
        field_id: FieldId,
        /// Sequence number
        seq_id: SeqId,
    },

    /// List the valid data of a field
    List {
        /// Field id
        field_id: FieldId,
    },
}

/// Data-structure commands.
#[derive(Debug, Subcommand)]
pub enum StructCommand {
    /// Overlay a named structure on part of a field
    Add {
        /// Field id
        field_id: FieldId,
        /// Structure name
        name: String,
        /// First position, inside the field
        beg: u32,
        /// Last position, inside the field
        end: u32,
        /// Description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Remove a data-structure entry
    Delete {
        /// Field id
        field_id: FieldId,
        /// Data-structure number
        ds_id: SeqId,
    },

    /// List the data structures of a field
    List {
        /// Field id
        field_id: FieldId,
    },
}

/// Program commands.
#[derive(Debug, Subcommand)]
pub enum ProgramCommand {
    /// Create a program
    Create(ProgramCreateArgs),

    /// List all programs
    List,

    /// Show a program with its key files and notes
    Show {
        /// Program id
        program_id: ProgramId,
    },

    /// Update program attributes
    Update(ProgramUpdateArgs),

    /// Delete a program with its key files and notes
    Delete {
        /// Program id
        program_id: ProgramId,
    },
}

/// Arguments for `program create`.
#[derive(Debug, Args)]
pub struct ProgramCreateArgs {
    /// Program name
    pub name: String,

    /// Where the program runs
    #[arg(long, default_value = "")]
    pub run_location: String,

    /// Where its source lives
    #[arg(long, default_value = "")]
    pub source_location: String,

    /// Program type
    #[arg(long = "type", default_value = "")]
    pub program_type: String,

    /// Description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Key programmers, comma separated
    #[arg(long, default_value = "")]
    pub programmers: PersonSet,

    /// Key users, comma separated
    #[arg(long, default_value = "")]
    pub users: PersonSet,
}

impl From<ProgramCreateArgs> for ProgramSpec {
    fn from(args: ProgramCreateArgs) -> Self {
        Self {
            name: args.name,
            run_location: args.run_location,
            source_location: args.source_location,
            program_type: args.program_type,
            description: args.description,
            key_programmers: args.programmers,
            key_users: args.users,
            archived: false,
        }
    }
}

/// Arguments for `program update`.
#[derive(Debug, Args)]
pub struct ProgramUpdateArgs {
    /// Program id
    pub program_id: ProgramId,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New run location
    #[arg(long)]
    pub run_location: Option<String>,

    /// New source location
    #[arg(long)]
    pub source_location: Option<String>,

    /// New program type
    #[arg(long = "type")]
    pub program_type: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    /// Replace the key programmers, comma separated
    #[arg(long)]
    pub programmers: Option<PersonSet>,

    /// Replace the key users, comma separated
    #[arg(long)]
    pub users: Option<PersonSet>,

    /// Archive or restore the program
    #[arg(long)]
    pub archived: Option<bool>,
}

impl ProgramUpdateArgs {
    /// Split into the target id and the patch to apply.
    #[must_use]
    pub fn into_patch(self) -> (ProgramId, ProgramPatch) {
        let patch = ProgramPatch {
            name: self.name,
            run_location: self.run_location,
            source_location: self.source_location,
            program_type: self.program_type,
            description: self.description,
            key_programmers: self.programmers,
            key_users: self.users,
            archived: self.archived,
        };
        (self.program_id, patch)
    }
}

/// Key-programmer and key-user commands.
#[derive(Debug, Subcommand)]
pub enum PersonCommand {
    /// Add a person to a program
    Add(PersonArgs),

    /// Remove a person from a program
    Remove(PersonArgs),
}

/// Arguments shared by `person add` and `person remove`.
#[derive(Debug, Args)]
pub struct PersonArgs {
    /// Program id
    pub program_id: ProgramId,

    /// Which list to change
    #[arg(value_enum)]
    pub role: RoleArg,

    /// Person name
    pub name: String,
}

/// Key-file commands.
#[derive(Debug, Subcommand)]
pub enum KeyFileCommand {
    /// Record that a program uses a file
    Add {
        /// Program id
        program_id: ProgramId,
        /// File id; not checked against the file catalog
        file_id: FileId,
        /// How the program uses the file
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Update a key-file reference
    Update {
        /// Program id
        program_id: ProgramId,
        /// Sequence number
        seq_id: SeqId,
        /// Point at another file
        #[arg(long = "file")]
        file_id: Option<FileId>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// Archive or restore the reference
        #[arg(long)]
        archived: Option<bool>,
    },

    /// Remove a key-file reference
    Delete {
        /// Program id
        program_id: ProgramId,
        /// Sequence number
        seq_id: SeqId,
    },

    /// List a program's key files with resolved file names
    List {
        /// Program id
        program_id: ProgramId,
    },
}

impl KeyFileCommand {
    /// Build the patch for `keyfile update`, if this is one.
    #[must_use]
    pub fn patch(&self) -> Option<KeyFilePatch> {
        match self {
            Self::Update {
                file_id,
                notes,
                archived,
                ..
            } => Some(KeyFilePatch {
                file_id: *file_id,
                notes: notes.clone(),
                archived: *archived,
            }),
            _ => None,
        }
    }
}

/// Note commands.
#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Attach a note to a program
    Add {
        /// Program id
        program_id: ProgramId,
        /// Note text
        text: String,
        /// Author id
        #[arg(long)]
        author: String,
    },

    /// Update a note
    Update {
        /// Program id
        program_id: ProgramId,
        /// Sequence number
        seq_id: SeqId,
        /// New text
        #[arg(long)]
        text: Option<String>,
        /// Archive or restore the note
        #[arg(long)]
        archived: Option<bool>,
    },

    /// Remove a note
    Delete {
        /// Program id
        program_id: ProgramId,
        /// Sequence number
        seq_id: SeqId,
    },

    /// List a program's notes
    List {
        /// Program id
        program_id: ProgramId,
    },
}

impl NoteCommand {
    /// Build the patch for `note update`, if this is one.
    #[must_use]
    pub fn patch(&self) -> Option<NotePatch> {
        match self {
            Self::Update { text, archived, .. } => Some(NotePatch {
                text: text.clone(),
                archived: *archived,
            }),
            _ => None,
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Person role argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Key programmers
    Programmer,
    /// Key users
    User,
}

impl From<RoleArg> for PersonRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Programmer => Self::Programmer,
            RoleArg::User => Self::User,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_arg_conversion() {
        assert_eq!(PersonRole::from(RoleArg::Programmer), PersonRole::Programmer);
        assert_eq!(PersonRole::from(RoleArg::User), PersonRole::User);
    }

    #[test]
    fn test_position_args_span() {
        let args = PositionArgs {
            beg: Some(3),
            end: Some(9),
        };
        assert_eq!(
            args.span(),
            Some(Span {
                beg_pos: 3,
                end_pos: 9
            })
        );
        assert_eq!(PositionArgs::default().span(), None);
    }

    #[test]
    fn test_file_update_into_patch() {
        let args = FileUpdateArgs {
            file_id: 4,
            short_name: None,
            long_name: Some("Customer master".to_string()),
            location: None,
            size: None,
            doc_link: None,
            archived: Some(true),
        };
        let (id, patch) = args.into_patch();
        assert_eq!(id, 4);
        assert_eq!(patch.long_name.as_deref(), Some("Customer master"));
        assert_eq!(patch.archived, Some(true));
        assert!(patch.short_name.is_none());
    }

    #[test]
    fn test_program_create_into_spec() {
        let args = ProgramCreateArgs {
            name: "CUSTUPD".to_string(),
            run_location: String::new(),
            source_location: String::new(),
            program_type: "batch".to_string(),
            description: String::new(),
            programmers: "Jane Doe, Sam".parse().unwrap(),
            users: PersonSet::default(),
        };
        let spec = ProgramSpec::from(args);
        assert_eq!(spec.program_type, "batch");
        assert_eq!(spec.key_programmers.len(), 2);
        assert!(spec.key_users.is_empty());
    }

    #[test]
    fn test_key_file_patch_only_for_update() {
        let update = KeyFileCommand::Update {
            program_id: 1,
            seq_id: 2,
            file_id: Some(5),
            notes: None,
            archived: None,
        };
        assert_eq!(update.patch().and_then(|p| p.file_id), Some(5));

        let list = KeyFileCommand::List { program_id: 1 };
        assert!(list.patch().is_none());
    }

    #[test]
    fn test_note_patch_only_for_update() {
        let update = NoteCommand::Update {
            program_id: 1,
            seq_id: 1,
            text: Some("edited".to_string()),
            archived: None,
        };
        assert_eq!(
            update.patch().and_then(|p| p.text).as_deref(),
            Some("edited")
        );
        assert!(NoteCommand::List { program_id: 1 }.patch().is_none());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show;
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
