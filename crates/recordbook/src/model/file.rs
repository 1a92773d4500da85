//! Files, their fields, and the documentation attached to each field.

use serde::{Deserialize, Serialize};

use super::{required_text, FieldId, FileId, SeqId, Span};
use crate::error::Result;

/// A documented legacy flat file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Catalog-assigned identifier.
    pub id: FileId,
    /// Short (dataset) name, never blank.
    pub short_name: String,
    /// Descriptive name.
    pub long_name: String,
    /// Where the file lives on the legacy system.
    pub location: String,
    /// Record size in bytes as documented.
    pub size_bytes: u64,
    /// Link to external documentation.
    pub doc_link: String,
    /// Archived flag; archiving is not deletion.
    pub archived: bool,
}

/// Input for creating a [`File`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSpec {
    /// Short name (required).
    pub short_name: String,
    /// Descriptive name.
    pub long_name: String,
    /// Location on the legacy system.
    pub location: String,
    /// Record size in bytes.
    pub size_bytes: u64,
    /// Documentation link.
    pub doc_link: String,
    /// Initial archived flag.
    pub archived: bool,
}

impl FileSpec {
    /// Start a spec with the required short name.
    #[must_use]
    pub fn new(short_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn build(self, id: FileId) -> Result<File> {
        Ok(File {
            id,
            short_name: required_text("file short name", &self.short_name)?,
            long_name: self.long_name,
            location: self.location,
            size_bytes: self.size_bytes,
            doc_link: self.doc_link,
            archived: self.archived,
        })
    }
}

/// Partial update of a [`File`]; `None` leaves the attribute alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePatch {
    /// New short name; must not be blank.
    pub short_name: Option<String>,
    /// New descriptive name.
    pub long_name: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New record size.
    pub size_bytes: Option<u64>,
    /// New documentation link.
    pub doc_link: Option<String>,
    /// New archived flag.
    pub archived: Option<bool>,
}

impl FilePatch {
    /// Apply the patch, validating before anything is written.
    pub(crate) fn apply(self, file: &mut File) -> Result<()> {
        let short_name = self
            .short_name
            .map(|name| required_text("file short name", &name))
            .transpose()?;

        if let Some(short_name) = short_name {
            file.short_name = short_name;
        }
        if let Some(long_name) = self.long_name {
            file.long_name = long_name;
        }
        if let Some(location) = self.location {
            file.location = location;
        }
        if let Some(size_bytes) = self.size_bytes {
            file.size_bytes = size_bytes;
        }
        if let Some(doc_link) = self.doc_link {
            file.doc_link = doc_link;
        }
        if let Some(archived) = self.archived {
            file.archived = archived;
        }
        Ok(())
    }
}

/// A named byte range within a file's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Catalog-global identifier.
    pub id: FieldId,
    /// Owning file.
    pub file_id: FileId,
    /// Field name, never blank.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Documented size; zero or negative occupies one position.
    pub size_bytes: i32,
    /// Packed (dense binary) encoding; metadata only.
    pub packed: bool,
    /// First occupied position, 1-based.
    pub beg_pos: u32,
    /// Last occupied position.
    pub end_pos: u32,
    /// Notes about the field's valid data.
    pub valid_data_notes: String,
    /// Archived flag.
    pub archived: bool,
}

impl Field {
    /// The field's current byte range.
    #[must_use]
    pub const fn span(&self) -> Span {
        Span {
            beg_pos: self.beg_pos,
            end_pos: self.end_pos,
        }
    }

    pub(crate) fn set_span(&mut self, span: Span) {
        self.beg_pos = span.beg_pos;
        self.end_pos = span.end_pos;
    }
}

/// Input for adding a [`Field`] to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// Field name (required).
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Documented size in bytes.
    pub size_bytes: i32,
    /// Packed encoding flag.
    pub packed: bool,
    /// Explicit placement; `None` appends after the file's last field.
    pub positions: Option<Span>,
    /// Notes about valid data.
    pub valid_data_notes: String,
    /// Initial archived flag.
    pub archived: bool,
}

impl FieldSpec {
    /// Start a spec with a name and size.
    #[must_use]
    pub fn new(name: impl Into<String>, size_bytes: i32) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            ..Self::default()
        }
    }

    /// Place the field at an explicit range instead of appending it.
    #[must_use]
    pub fn at(mut self, beg_pos: u32, end_pos: u32) -> Self {
        self.positions = Some(Span { beg_pos, end_pos });
        self
    }

    pub(crate) fn build(self, id: FieldId, file_id: FileId, span: Span) -> Result<Field> {
        Ok(Field {
            id,
            file_id,
            name: required_text("field name", &self.name)?,
            description: self.description,
            size_bytes: self.size_bytes,
            packed: self.packed,
            beg_pos: span.beg_pos,
            end_pos: span.end_pos,
            valid_data_notes: self.valid_data_notes,
            archived: self.archived,
        })
    }
}

/// Partial update of a [`Field`].
///
/// Changing `size_bytes` does not move any field; positions are repaired only
/// by an explicit relayout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPatch {
    /// New name; must not be blank.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New documented size.
    pub size_bytes: Option<i32>,
    /// New packed flag.
    pub packed: Option<bool>,
    /// Explicit new placement.
    pub positions: Option<Span>,
    /// New valid-data notes.
    pub valid_data_notes: Option<String>,
    /// New archived flag.
    pub archived: Option<bool>,
}

impl FieldPatch {
    pub(crate) fn apply(self, field: &mut Field) -> Result<()> {
        let name = self
            .name
            .map(|name| required_text("field name", &name))
            .transpose()?;
        let span = self
            .positions
            .map(|span| Span::new(span.beg_pos, span.end_pos))
            .transpose()?;

        if let Some(name) = name {
            field.name = name;
        }
        if let Some(description) = self.description {
            field.description = description;
        }
        if let Some(size_bytes) = self.size_bytes {
            field.size_bytes = size_bytes;
        }
        if let Some(packed) = self.packed {
            field.packed = packed;
        }
        if let Some(span) = span {
            field.set_span(span);
        }
        if let Some(notes) = self.valid_data_notes {
            field.valid_data_notes = notes;
        }
        if let Some(archived) = self.archived {
            field.archived = archived;
        }
        Ok(())
    }
}

/// A documented permissible value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidDataEntry {
    /// Owning field.
    pub field_id: FieldId,
    /// Sequence number under the field, starting at 1.
    pub seq_id: SeqId,
    /// The value itself.
    pub value: String,
    /// What the value means.
    pub description: String,
    /// Archived flag.
    pub archived: bool,
}

/// Input for adding a [`ValidDataEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidDataSpec {
    /// The permissible value.
    pub value: String,
    /// What the value means.
    pub description: String,
    /// Initial archived flag.
    pub archived: bool,
}

impl ValidDataSpec {
    /// Start a spec with a value and its description.
    #[must_use]
    pub fn new(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
            archived: false,
        }
    }

    pub(crate) fn build(self, field_id: FieldId, seq_id: SeqId) -> ValidDataEntry {
        ValidDataEntry {
            field_id,
            seq_id,
            value: self.value,
            description: self.description,
            archived: self.archived,
        }
    }
}

/// A nested data-structure definition overlaid on part of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStructureEntry {
    /// Owning field.
    pub field_id: FieldId,
    /// Sequence number under the field, starting at 1.
    pub ds_id: SeqId,
    /// First position, inside the parent field.
    pub beg_pos: u32,
    /// Last position, inside the parent field.
    pub end_pos: u32,
    /// Structure name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Archived flag.
    pub archived: bool,
}

impl DataStructureEntry {
    /// The entry's byte range.
    #[must_use]
    pub const fn span(&self) -> Span {
        Span {
            beg_pos: self.beg_pos,
            end_pos: self.end_pos,
        }
    }

    pub(crate) fn set_span(&mut self, span: Span) {
        self.beg_pos = span.beg_pos;
        self.end_pos = span.end_pos;
    }
}

/// Input for adding a [`DataStructureEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataStructureSpec {
    /// First position.
    pub beg_pos: u32,
    /// Last position.
    pub end_pos: u32,
    /// Structure name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Initial archived flag.
    pub archived: bool,
}

impl DataStructureSpec {
    /// Start a spec covering `beg_pos..=end_pos`.
    #[must_use]
    pub fn new(name: impl Into<String>, beg_pos: u32, end_pos: u32) -> Self {
        Self {
            beg_pos,
            end_pos,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validate the range against the parent field and build the entry.
    pub(crate) fn build(self, parent: &Field, ds_id: SeqId) -> Result<DataStructureEntry> {
        let span = Span::new(self.beg_pos, self.end_pos)?;
        if !parent.span().contains(&span) {
            return Err(crate::error::Error::validation(format!(
                "data structure {span} lies outside field {} ({})",
                parent.id,
                parent.span()
            )));
        }
        Ok(DataStructureEntry {
            field_id: parent.id,
            ds_id,
            beg_pos: span.beg_pos,
            end_pos: span.end_pos,
            name: self.name,
            description: self.description,
            archived: self.archived,
        })
    }
}
