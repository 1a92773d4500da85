//! Byte-position assignment for the fields of a record.
//!
//! Two entry points share one formula: [`append_position`] places a single
//! new field right after the current last field, and [`relayout`] re-packs
//! every field of a file into a contiguous run starting at position 1.
//! Neither runs implicitly; callers decide when positions are repaired.
//!
//! Positions are `u32`. A placement that would run past `u32::MAX` fails with
//! [`Error::Conflict`] instead of wrapping or clamping onto an existing field.

use crate::error::{Error, Result};
use crate::model::{Field, FieldId, Span};

/// First position of every record.
pub const FIRST_POSITION: u32 = 1;

/// Number of positions a field of `size_bytes` occupies.
///
/// Zero and negative sizes are clamped to a single position so that no field
/// is ever zero-width.
#[must_use]
pub fn span_len(size_bytes: i32) -> u32 {
    u32::try_from(size_bytes)
        .ok()
        .filter(|len| *len > 0)
        .unwrap_or(1)
}

fn exhausted(begin: u32, size_bytes: i32) -> Error {
    Error::conflict(format!(
        "no room for {} positions starting at {begin}",
        span_len(size_bytes)
    ))
}

/// The span of a field of `size_bytes` that starts at `begin`.
///
/// # Errors
///
/// Returns [`Error::Conflict`] when the span would end past `u32::MAX`.
pub fn place(begin: u32, size_bytes: i32) -> Result<Span> {
    let end_pos = begin
        .checked_add(span_len(size_bytes) - 1)
        .ok_or_else(|| exhausted(begin, size_bytes))?;
    Span::new(begin, end_pos)
}

/// The span for a new field appended after `existing`.
///
/// The new field starts one past the largest `end_pos` present, or at
/// [`FIRST_POSITION`] when the file has no fields yet.
///
/// # Errors
///
/// Returns [`Error::Conflict`] when the last field already ends at
/// `u32::MAX` or the new field would run past it.
pub fn append_position<'a, I>(existing: I, size_bytes: i32) -> Result<Span>
where
    I: IntoIterator<Item = &'a Field>,
{
    let begin = match existing.into_iter().map(|field| field.end_pos).max() {
        None => FIRST_POSITION,
        Some(end) => end
            .checked_add(1)
            .ok_or_else(|| exhausted(end, size_bytes))?,
    };
    place(begin, size_bytes)
}

/// Recompute contiguous spans for one file's fields.
///
/// Fields are ordered by current `beg_pos` (ties keep their input order) and
/// packed from [`FIRST_POSITION`] with no gaps. The result is in layout order;
/// the caller writes it back.
///
/// # Errors
///
/// Returns [`Error::Conflict`] when the packed sizes run past `u32::MAX`.
pub fn relayout(fields: &[&Field]) -> Result<Vec<(FieldId, Span)>> {
    let mut ordered: Vec<&Field> = fields.to_vec();
    // sort_by_key is stable
    ordered.sort_by_key(|field| field.beg_pos);

    let mut placements = Vec::with_capacity(ordered.len());
    let mut cursor = Some(FIRST_POSITION);
    for field in ordered {
        let begin = cursor.ok_or_else(|| exhausted(u32::MAX, field.size_bytes))?;
        let span = place(begin, field.size_bytes)?;
        cursor = span.end_pos.checked_add(1);
        placements.push((field.id, span));
    }
    Ok(placements)
}
