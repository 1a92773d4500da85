//! The two catalogs and the collaborator seam between them.
//!
//! [`FileCatalog`] owns files and everything hanging off them;
//! [`ProgramCatalog`] owns programs, their key-file references, and notes.
//! A key-file reference points into the file catalog by id only, and the
//! display name is resolved on read through [`FileReferenceResolver`].

mod files;
mod programs;

pub use files::{FileCascade, FileCatalog, FileCatalogSnapshot, FileSequences};
pub use programs::{
    KeyFileView, ProgramCascade, ProgramCatalog, ProgramCatalogSnapshot, ProgramSequences,
};

use crate::model::FileId;

/// Maps a file id to the name shown next to a key-file reference.
pub trait FileReferenceResolver {
    /// The display name of `file_id`, or `None` if it does not resolve.
    fn display_name(&self, file_id: FileId) -> Option<String>;
}

impl<R: FileReferenceResolver + ?Sized> FileReferenceResolver for &R {
    fn display_name(&self, file_id: FileId) -> Option<String> {
        (**self).display_name(file_id)
    }
}
