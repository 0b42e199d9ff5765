//! SWR yearly pivot: normalization, filters, charts, annotations and note
//! editing.

pub mod annotations;
pub mod notes;
pub mod pivot;

pub use annotations::AnnotationCache;
pub use notes::{NoteEditor, NoteOutcome, NoteSaveError};
pub use pivot::{build_rows, PivotFilter, PivotRow, PivotTable, SiteTypeFilter, Status, StatusCounts};
