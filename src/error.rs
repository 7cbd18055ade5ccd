use thiserror::Error;

use crate::attributed::Range;
use crate::model::Side;

/// Markup handed to `AttributedString::from_html` was not well nested.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("closing </{found}> at offset {offset} does not match open <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("closing </{tag}> at offset {offset} has no open tag")]
    UnexpectedClose { tag: String, offset: usize },

    #[error("<{tag}> is never closed")]
    Unclosed { tag: String },

    #[error("HTML tokenizer failed")]
    Tokenizer,
}

/// An attribute range reached past the end of the text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("range {range} is outside text of length {len}")]
pub struct RangeError {
    pub range: Range,
    pub len: usize,
}

/// Highlighter output closed a span that was never opened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unbalanced </span> on highlighted line {line}")]
pub struct MalformedMarkupError {
    pub line: usize,
}

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Syntax highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),

    #[error("Malformed highlighter output: {0}")]
    Markup(#[from] MalformedMarkupError),

    #[error("Highlight worker is gone")]
    WorkerDisconnected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("Row has neither a left nor a right line")]
    EmptyPair,

    #[error("Highlighted fragment could not be parsed: {0}")]
    Parse(#[from] ParseError),

    #[error("Change decoration out of bounds: {0}")]
    Range(#[from] RangeError),

    #[error("{side:?} fragment reads {found:?} but the line is {expected:?}")]
    FragmentMismatch {
        side: Side,
        expected: String,
        found: String,
    },
}

#[derive(Error, Debug)]
pub enum SplitDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Highlighting error: {0}")]
    Highlight(#[from] HighlightError),

    #[error("Row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: RowError,
    },

    #[error("No changes to show")]
    NoChanges,

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),
}

pub type Result<T> = std::result::Result<T, SplitDiffError>;
