//! `recordbook` - A metadata catalog for legacy record layouts
//!
//! This library documents files, the byte positions of their fields, the
//! permissible values and nested structures of each field, and the programs
//! that read or write those files. It keeps ids monotonic, lays fields out
//! contiguously, and cascades deletes from owners to their dependents.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cascade;
pub mod catalog;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod layout;
pub mod logging;
pub mod model;
pub mod sequence;
pub mod workspace;

pub use catalog::{FileCatalog, FileReferenceResolver, ProgramCatalog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{EntityKind, Error, Result};
pub use logging::init_logging;
pub use workspace::{Workspace, WorkspaceSnapshot};
