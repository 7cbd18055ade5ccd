//! Character-level diff of two short strings, cleaned up for humans.
//!
//! The raw Myers edit script is minimal but noisy: a one-character match in
//! the middle of a rewritten word splits the change in two. `dissimilar`
//! runs diff-match-patch's semantic cleanup over it, folding such flickers
//! into coherent edit runs aligned to word boundaries.

use dissimilar::Chunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Equal,
    Delete,
    Insert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub kind: EditKind,
    pub text: String,
}

impl Edit {
    pub fn new(kind: EditKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl From<Chunk<'_>> for Edit {
    fn from(chunk: Chunk<'_>) -> Self {
        match chunk {
            Chunk::Equal(text) => Edit::new(EditKind::Equal, text),
            Chunk::Delete(text) => Edit::new(EditKind::Delete, text),
            Chunk::Insert(text) => Edit::new(EditKind::Insert, text),
        }
    }
}

/// Diff `a` against `b` character by character and apply semantic cleanup.
///
/// Every character of `a` ends up in exactly one `Equal` or `Delete` edit and
/// every character of `b` in exactly one `Equal` or `Insert` edit.
pub fn diff(a: &str, b: &str) -> Vec<Edit> {
    dissimilar::diff(a, b)
        .into_iter()
        .map(Edit::from)
        .filter(|edit| !edit.text.is_empty())
        .collect()
}
