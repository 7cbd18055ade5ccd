pub mod diff_types;
pub mod row;

pub use diff_types::{DiffHunk, DiffLine, FilePatch, FileStatus, LineOrigin};
pub use row::{DiffLinePair, RowKind, RowSide, Side};
