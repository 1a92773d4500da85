//! The file catalog: files, their fields, and per-field documentation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::FileReferenceResolver;
use crate::cascade::{cascade, ChildTable};
use crate::error::{EntityKind, Error, Result};
use crate::layout;
use crate::model::{
    DataStructureEntry, DataStructureSpec, Field, FieldId, FieldPatch, FieldSpec, File, FileId,
    FilePatch, FileSpec, SeqId, Span, ValidDataEntry, ValidDataSpec,
};
use crate::sequence::{ScopedSequences, SequenceScope};

/// Allocation state for every id scope of a [`FileCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSequences {
    /// File ids.
    pub files: SequenceScope,
    /// Field ids, shared by all files.
    pub fields: SequenceScope,
    /// Valid-data sequence numbers per field.
    pub valid_data: ScopedSequences<FieldId>,
    /// Data-structure sequence numbers per field.
    pub data_structures: ScopedSequences<FieldId>,
}

/// What a file or field deletion removed.
///
/// Callers holding a selection can check it against [`removed_field`] and
/// clear it.
///
/// [`removed_field`]: FileCascade::removed_field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileCascade {
    /// The deleted file, when a file was deleted.
    pub file: Option<FileId>,
    /// Deleted fields in their original order.
    pub fields: Vec<FieldId>,
    /// Number of valid-data entries removed.
    pub valid_data: usize,
    /// Number of data-structure entries removed.
    pub data_structures: usize,
}

impl FileCascade {
    /// Whether the deletion found nothing to remove.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.file.is_none() && self.fields.is_empty()
    }

    /// Whether `field_id` was among the removed fields.
    #[must_use]
    pub fn removed_field(&self, field_id: FieldId) -> bool {
        self.fields.contains(&field_id)
    }
}

/// Flat, ordered export of a [`FileCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCatalogSnapshot {
    /// Files in insertion order.
    pub files: Vec<File>,
    /// Fields in insertion order.
    pub fields: Vec<Field>,
    /// Valid-data entries grouped by field.
    pub valid_data: Vec<ValidDataEntry>,
    /// Data-structure entries grouped by field.
    pub data_structures: Vec<DataStructureEntry>,
    /// High-water marks so deleted ids stay retired.
    pub sequences: FileSequences,
}

/// Owns every [`File`] and, transitively, its fields and field documentation.
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    files: IndexMap<FileId, File>,
    fields: IndexMap<FieldId, Field>,
    fields_by_file: IndexMap<FileId, Vec<FieldId>>,
    valid_data: ChildTable<FieldId, SeqId, ValidDataEntry>,
    data_structures: ChildTable<FieldId, SeqId, DataStructureEntry>,
    sequences: FileSequences,
}

impl FileCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Files ===

    /// Create a file with the next unused id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank short name.
    pub fn create_file(&mut self, spec: FileSpec) -> Result<File> {
        let id = self.sequences.files.peek(self.files.keys().copied())?;
        let file = spec.build(id)?;
        self.sequences.files.observe(id);

        debug!("Created file {} ({})", id, file.short_name);
        self.files.insert(id, file.clone());
        Ok(file)
    }

    /// Apply a partial update to a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown file or
    /// [`Error::Validation`] if the patch blanks the short name.
    pub fn update_file(&mut self, file_id: FileId, patch: FilePatch) -> Result<File> {
        let file = self
            .files
            .get_mut(&file_id)
            .ok_or_else(|| Error::not_found(EntityKind::File, file_id))?;
        patch.apply(file)?;
        debug!("Updated file {}", file_id);
        Ok(file.clone())
    }

    /// Delete a file with all of its fields and their documentation.
    ///
    /// Unknown ids are a no-op.
    pub fn delete_file(&mut self, file_id: FileId) -> FileCascade {
        if self.files.shift_remove(&file_id).is_none() {
            trace!("Delete of unknown file {} ignored", file_id);
            return FileCascade::default();
        }

        let field_ids = self.fields_by_file.shift_remove(&file_id).unwrap_or_default();
        for field_id in &field_ids {
            self.fields.shift_remove(field_id);
        }
        let mut removal = self.release_fields(&field_ids);
        removal.file = Some(file_id);

        info!(
            "Deleted file {} with {} fields, {} valid data, {} data structures",
            file_id,
            removal.fields.len(),
            removal.valid_data,
            removal.data_structures
        );
        removal
    }

    /// Look up a file.
    #[must_use]
    pub fn file(&self, file_id: FileId) -> Option<&File> {
        self.files.get(&file_id)
    }

    /// All files in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &File> + '_ {
        self.files.values()
    }

    /// Number of files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    // === Fields ===

    /// Add a field to a file.
    ///
    /// Without explicit positions the field is appended right after the
    /// file's current last field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown file,
    /// [`Error::Validation`] for a blank name or an inverted explicit range,
    /// and [`Error::Conflict`] when an appended field would run past the
    /// last addressable position.
    pub fn add_field(&mut self, file_id: FileId, spec: FieldSpec) -> Result<Field> {
        if !self.files.contains_key(&file_id) {
            return Err(Error::not_found(EntityKind::File, file_id));
        }

        let span = match spec.positions {
            Some(explicit) => Span::new(explicit.beg_pos, explicit.end_pos)?,
            None => layout::append_position(self.fields_of(file_id), spec.size_bytes)?,
        };
        let id = self.sequences.fields.peek(self.fields.keys().copied())?;
        let field = spec.build(id, file_id, span)?;
        self.sequences.fields.observe(id);

        debug!(
            "Added field {} ({}) to file {} at {}",
            id, field.name, file_id, span
        );
        self.fields.insert(id, field.clone());
        self.fields_by_file.entry(file_id).or_default().push(id);
        Ok(field)
    }

    /// Apply a partial update to a field.
    ///
    /// Positions of other fields are left alone; call
    /// [`recompute_positions`](Self::recompute_positions) to repair the layout.
    /// New positions carry the field's data structures along at the same
    /// offset from the field's begin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown field, or
    /// [`Error::Validation`] for a blank name, an inverted range, or new
    /// positions too narrow for the field's data structures.
    pub fn update_field(&mut self, field_id: FieldId, patch: FieldPatch) -> Result<Field> {
        let current = self
            .fields
            .get(&field_id)
            .ok_or_else(|| Error::not_found(EntityKind::Field, field_id))?;
        let mut updated = current.clone();
        patch.apply(&mut updated)?;
        let moves = self.carry_data_structures(current, updated.span())?;

        self.fields.insert(field_id, updated.clone());
        self.move_data_structures(moves);
        debug!("Updated field {}", field_id);
        Ok(updated)
    }

    /// Delete a field with its valid data and data structures.
    ///
    /// Unknown ids are a no-op.
    pub fn delete_field(&mut self, field_id: FieldId) -> FileCascade {
        let Some(field) = self.fields.shift_remove(&field_id) else {
            trace!("Delete of unknown field {} ignored", field_id);
            return FileCascade::default();
        };

        if let Some(siblings) = self.fields_by_file.get_mut(&field.file_id) {
            siblings.retain(|id| *id != field_id);
        }
        let removal = self.release_fields(&[field_id]);

        debug!(
            "Deleted field {} from file {} ({} valid data, {} data structures)",
            field_id, field.file_id, removal.valid_data, removal.data_structures
        );
        removal
    }

    /// Look up a field.
    #[must_use]
    pub fn field(&self, field_id: FieldId) -> Option<&Field> {
        self.fields.get(&field_id)
    }

    /// Fields of a file in insertion order; empty for an unknown file.
    pub fn fields_of(&self, file_id: FileId) -> impl Iterator<Item = &Field> + '_ {
        self.fields_by_file
            .get(&file_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.fields.get(id))
    }

    /// Re-pack every field of a file into a contiguous layout from position 1.
    ///
    /// Returns the file's fields in their new layout order. Data structures
    /// move with their field. Nothing is written unless every field and data
    /// structure can be placed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown file,
    /// [`Error::Validation`] when a field's new span is too narrow for one of
    /// its data structures, and [`Error::Conflict`] when the packed layout
    /// would run past the last addressable position.
    pub fn recompute_positions(&mut self, file_id: FileId) -> Result<Vec<Field>> {
        if !self.files.contains_key(&file_id) {
            return Err(Error::not_found(EntityKind::File, file_id));
        }

        let current: Vec<&Field> = self.fields_of(file_id).collect();
        let placements = layout::relayout(&current)?;

        let mut moves = Vec::new();
        for (field_id, span) in &placements {
            if let Some(field) = self.fields.get(field_id) {
                moves.extend(self.carry_data_structures(field, *span)?);
            }
        }
        self.move_data_structures(moves);

        let mut laid_out = Vec::with_capacity(placements.len());
        for (field_id, span) in placements {
            if let Some(field) = self.fields.get_mut(&field_id) {
                field.set_span(span);
                laid_out.push(field.clone());
            }
        }

        debug!(
            "Recomputed positions of {} fields in file {}",
            laid_out.len(),
            file_id
        );
        Ok(laid_out)
    }

    // === Valid data ===

    /// Attach a valid-data entry to a field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown field.
    pub fn add_valid_data(
        &mut self,
        field_id: FieldId,
        spec: ValidDataSpec,
    ) -> Result<ValidDataEntry> {
        if !self.fields.contains_key(&field_id) {
            return Err(Error::not_found(EntityKind::Field, field_id));
        }
        let seq_id = self
            .sequences
            .valid_data
            .allocate(field_id, self.valid_data.keys(field_id))?;
        let entry = spec.build(field_id, seq_id);

        debug!("Added valid data {}/{}", field_id, seq_id);
        self.valid_data.insert(field_id, seq_id, entry.clone());
        Ok(entry)
    }

    /// Remove one valid-data entry; unknown keys are a no-op.
    pub fn delete_valid_data(
        &mut self,
        field_id: FieldId,
        seq_id: SeqId,
    ) -> Option<ValidDataEntry> {
        let removed = self.valid_data.remove(field_id, seq_id);
        if removed.is_none() {
            trace!("Delete of unknown valid data {}/{} ignored", field_id, seq_id);
        }
        removed
    }

    /// Valid data of a field in insertion order; empty for an unknown field.
    pub fn valid_data_of(
        &self,
        field_id: FieldId,
    ) -> impl Iterator<Item = &ValidDataEntry> + '_ {
        self.valid_data.children(field_id)
    }

    // === Data structures ===

    /// Attach a data-structure entry to a field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown field and
    /// [`Error::Validation`] when the range is inverted or leaves the field.
    pub fn add_data_structure(
        &mut self,
        field_id: FieldId,
        spec: DataStructureSpec,
    ) -> Result<DataStructureEntry> {
        let parent = self
            .fields
            .get(&field_id)
            .ok_or_else(|| Error::not_found(EntityKind::Field, field_id))?;
        let ds_id = self
            .sequences
            .data_structures
            .peek(field_id, self.data_structures.keys(field_id))?;
        let entry = spec.build(parent, ds_id)?;
        self.sequences.data_structures.observe(field_id, ds_id);

        debug!(
            "Added data structure {}/{} at {}",
            field_id,
            ds_id,
            entry.span()
        );
        self.data_structures.insert(field_id, ds_id, entry.clone());
        Ok(entry)
    }

    /// Remove one data-structure entry; unknown keys are a no-op.
    pub fn delete_data_structure(
        &mut self,
        field_id: FieldId,
        ds_id: SeqId,
    ) -> Option<DataStructureEntry> {
        let removed = self.data_structures.remove(field_id, ds_id);
        if removed.is_none() {
            trace!("Delete of unknown data structure {}/{} ignored", field_id, ds_id);
        }
        removed
    }

    /// Data structures of a field in insertion order.
    pub fn data_structures_of(
        &self,
        field_id: FieldId,
    ) -> impl Iterator<Item = &DataStructureEntry> + '_ {
        self.data_structures.children(field_id)
    }

    // === Snapshots ===

    /// Export every row in order, with sequence state.
    #[must_use]
    pub fn snapshot(&self) -> FileCatalogSnapshot {
        FileCatalogSnapshot {
            files: self.files.values().cloned().collect(),
            fields: self.fields.values().cloned().collect(),
            valid_data: self.valid_data.iter().cloned().collect(),
            data_structures: self.data_structures.iter().cloned().collect(),
            sequences: self.sequences.clone(),
        }
    }

    /// Rebuild a catalog and its indexes from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] for duplicate keys,
    /// [`Error::NotFound`] for rows whose owner is missing, and
    /// [`Error::Validation`] for an inverted or zero-based range or a data
    /// structure outside its field.
    pub fn from_snapshot(snapshot: FileCatalogSnapshot) -> Result<Self> {
        let mut catalog = Self {
            sequences: snapshot.sequences,
            ..Self::default()
        };

        for file in snapshot.files {
            let id = file.id;
            if catalog.files.insert(id, file).is_some() {
                return Err(Error::conflict(format!("duplicate file id {id}")));
            }
            catalog.sequences.files.observe(id);
        }

        for field in snapshot.fields {
            let (id, file_id) = (field.id, field.file_id);
            Span::new(field.beg_pos, field.end_pos)?;
            if !catalog.files.contains_key(&file_id) {
                return Err(Error::not_found(EntityKind::File, file_id));
            }
            if catalog.fields.insert(id, field).is_some() {
                return Err(Error::conflict(format!("duplicate field id {id}")));
            }
            catalog.fields_by_file.entry(file_id).or_default().push(id);
            catalog.sequences.fields.observe(id);
        }

        for entry in snapshot.valid_data {
            let (field_id, seq_id) = (entry.field_id, entry.seq_id);
            if !catalog.fields.contains_key(&field_id) {
                return Err(Error::not_found(EntityKind::Field, field_id));
            }
            if catalog.valid_data.insert(field_id, seq_id, entry).is_some() {
                return Err(Error::conflict(format!(
                    "duplicate valid data {field_id}/{seq_id}"
                )));
            }
            catalog.sequences.valid_data.observe(field_id, seq_id);
        }

        for entry in snapshot.data_structures {
            let (field_id, ds_id) = (entry.field_id, entry.ds_id);
            let span = Span::new(entry.beg_pos, entry.end_pos)?;
            let parent = catalog
                .fields
                .get(&field_id)
                .ok_or_else(|| Error::not_found(EntityKind::Field, field_id))?;
            if !parent.span().contains(&span) {
                return Err(Error::validation(format!(
                    "data structure {field_id}/{ds_id} ({span}) lies outside field {} ({})",
                    field_id,
                    parent.span()
                )));
            }
            if catalog.data_structures.insert(field_id, ds_id, entry).is_some() {
                return Err(Error::conflict(format!(
                    "duplicate data structure {field_id}/{ds_id}"
                )));
            }
            catalog.sequences.data_structures.observe(field_id, ds_id);
        }

        Ok(catalog)
    }

    /// New spans for the data structures of `field` if it moved to `to`.
    fn carry_data_structures(
        &self,
        field: &Field,
        to: Span,
    ) -> Result<Vec<(FieldId, SeqId, Span)>> {
        let from = field.span();
        if from == to {
            return Ok(Vec::new());
        }
        self.data_structures
            .children(field.id)
            .map(|entry| {
                entry
                    .span()
                    .carried(&from, &to)
                    .map(|span| (field.id, entry.ds_id, span))
                    .ok_or_else(|| {
                        Error::validation(format!(
                            "data structure {}/{} ({}) does not fit field {} moved to {}",
                            field.id,
                            entry.ds_id,
                            entry.span(),
                            field.id,
                            to
                        ))
                    })
            })
            .collect()
    }

    fn move_data_structures(&mut self, moves: Vec<(FieldId, SeqId, Span)>) {
        for (field_id, ds_id, span) in moves {
            if let Some(entry) = self.data_structures.get_mut(field_id, ds_id) {
                trace!("Moved data structure {}/{} to {}", field_id, ds_id, span);
                entry.set_span(span);
            }
        }
    }

    /// Drop the documentation rows of already-removed fields.
    fn release_fields(&mut self, field_ids: &[FieldId]) -> FileCascade {
        let removed = cascade(
            field_ids,
            &mut [&mut self.valid_data, &mut self.data_structures],
        );
        FileCascade {
            file: None,
            fields: field_ids.to_vec(),
            valid_data: removed[0],
            data_structures: removed[1],
        }
    }
}

impl FileReferenceResolver for FileCatalog {
    fn display_name(&self, file_id: FileId) -> Option<String> {
        self.files.get(&file_id).map(|file| file.short_name.clone())
    }
}
