//! Entity types for the file and program catalogs.
//!
//! Entities are plain serializable records. They are created through the
//! `*Spec` structs and changed through the `*Patch` structs; only the
//! catalogs assign ids, sequence numbers, positions, and timestamps.

pub mod file;
pub mod person;
pub mod program;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use file::{
    DataStructureEntry, DataStructureSpec, Field, FieldPatch, FieldSpec, File, FilePatch,
    FileSpec, ValidDataEntry, ValidDataSpec,
};
pub use person::{PersonRole, PersonSet};
pub use program::{
    KeyFilePatch, KeyFileReference, Note, NotePatch, Program, ProgramPatch, ProgramSpec,
};

/// Identifier of a [`File`], unique within a file catalog.
pub type FileId = u32;

/// Identifier of a [`Field`], unique across a whole file catalog.
pub type FieldId = u32;

/// Identifier of a [`Program`], unique within a program catalog.
pub type ProgramId = u32;

/// Sequence number of a child row, unique under its parent.
pub type SeqId = u32;

/// An inclusive byte range within a record, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First occupied position.
    pub beg_pos: u32,
    /// Last occupied position.
    pub end_pos: u32,
}

impl Span {
    /// Build a span, rejecting `beg_pos > end_pos` and position 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the range is empty or starts before 1.
    pub fn new(beg_pos: u32, end_pos: u32) -> Result<Self> {
        if beg_pos == 0 {
            return Err(Error::validation("positions start at 1"));
        }
        if beg_pos > end_pos {
            return Err(Error::validation(format!(
                "begin position {beg_pos} is after end position {end_pos}"
            )));
        }
        Ok(Self { beg_pos, end_pos })
    }

    /// Number of positions covered.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end_pos - self.beg_pos + 1
    }

    /// A span always covers at least one position.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether `other` lies entirely inside this span.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.beg_pos <= other.beg_pos && other.end_pos <= self.end_pos
    }

    /// Whether the two spans share at least one position.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.beg_pos <= other.end_pos && other.beg_pos <= self.end_pos
    }

    /// This span moved along with its enclosing span going from `from` to
    /// `to`, keeping its offset from the enclosing begin.
    ///
    /// Returns `None` when this span does not start inside `from` or the
    /// moved span would not lie inside `to`.
    #[must_use]
    pub fn carried(&self, from: &Self, to: &Self) -> Option<Self> {
        let offset = self.beg_pos.checked_sub(from.beg_pos)?;
        let beg_pos = to.beg_pos.checked_add(offset)?;
        let end_pos = beg_pos.checked_add(self.end_pos.checked_sub(self.beg_pos)?)?;
        let moved = Self { beg_pos, end_pos };
        to.contains(&moved).then_some(moved)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.beg_pos, self.end_pos)
    }
}

/// Trim `value` and reject it if nothing is left.
pub(crate) fn required_text(label: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{label} must not be blank")));
    }
    Ok(trimmed.to_string())
}
