/// One line pair of a split diff, as handed to the row renderer.
///
/// `left_line` is absent for inserted lines and `right_line` for deleted
/// ones; both are present for changed pairs (`changed == true`) and for
/// unmodified context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffLinePair {
    pub left_line: Option<String>,
    pub right_line: Option<String>,
    pub left_line_number: Option<u32>,
    pub right_line_number: Option<u32>,
    pub left_diff_idx: Option<u32>,
    pub right_diff_idx: Option<u32>,
    pub changed: bool,
}

/// One side of a row that has a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSide {
    pub text: String,
    pub line_number: Option<u32>,
    pub diff_idx: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// `left_diff_idx` is whatever index the pair carried for the absent side.
    Insert {
        right: RowSide,
        left_diff_idx: Option<u32>,
    },
    Delete {
        left: RowSide,
        right_diff_idx: Option<u32>,
    },
    Changed { left: RowSide, right: RowSide },
    Context { left: RowSide, right: RowSide },
}

/// Which side of the split a gutter or cell sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Presentation of a single code cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Spacer,
    Inserted,
    Deleted,
    ChangedOriginal,
    ChangedNew,
    Context,
}

impl CellKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            CellKind::Spacer => "spacer",
            CellKind::Inserted => "inserted-new",
            CellKind::Deleted => "deleted-original",
            CellKind::ChangedOriginal => "changed-original",
            CellKind::ChangedNew => "changed-new",
            CellKind::Context => "context",
        }
    }
}

impl RowKind {
    /// Classify a pair; `None` when it has neither line.
    pub fn classify(pair: DiffLinePair) -> Option<Self> {
        let DiffLinePair {
            left_line,
            right_line,
            left_line_number,
            right_line_number,
            left_diff_idx,
            right_diff_idx,
            changed,
        } = pair;

        let left = left_line.map(|text| RowSide {
            text,
            line_number: left_line_number,
            diff_idx: left_diff_idx,
        });
        let right = right_line.map(|text| RowSide {
            text,
            line_number: right_line_number,
            diff_idx: right_diff_idx,
        });

        match (left, right) {
            (None, None) => None,
            (None, Some(right)) => Some(RowKind::Insert {
                right,
                left_diff_idx,
            }),
            (Some(left), None) => Some(RowKind::Delete {
                left,
                right_diff_idx,
            }),
            (Some(left), Some(right)) if changed => Some(RowKind::Changed { left, right }),
            (Some(left), Some(right)) => Some(RowKind::Context { left, right }),
        }
    }

    pub fn left(&self) -> Option<&RowSide> {
        match self {
            RowKind::Insert { .. } => None,
            RowKind::Delete { left, .. }
            | RowKind::Changed { left, .. }
            | RowKind::Context { left, .. } => Some(left),
        }
    }

    pub fn right(&self) -> Option<&RowSide> {
        match self {
            RowKind::Delete { .. } => None,
            RowKind::Insert { right, .. }
            | RowKind::Changed { right, .. }
            | RowKind::Context { right, .. } => Some(right),
        }
    }

    pub fn side(&self, side: Side) -> Option<&RowSide> {
        match side {
            Side::Left => self.left(),
            Side::Right => self.right(),
        }
    }

    pub fn cell_kinds(&self) -> (CellKind, CellKind) {
        match self {
            RowKind::Insert { .. } => (CellKind::Spacer, CellKind::Inserted),
            RowKind::Delete { .. } => (CellKind::Deleted, CellKind::Spacer),
            RowKind::Changed { .. } => (CellKind::ChangedOriginal, CellKind::ChangedNew),
            RowKind::Context { .. } => (CellKind::Context, CellKind::Context),
        }
    }

    /// Diff index recorded for `side`, even when that side has no line.
    fn diff_idx(&self, side: Side) -> Option<u32> {
        match (self, side) {
            (RowKind::Insert { left_diff_idx, .. }, Side::Left) => *left_diff_idx,
            (RowKind::Delete { right_diff_idx, .. }, Side::Right) => *right_diff_idx,
            _ => self.side(side).and_then(|s| s.diff_idx),
        }
    }

    /// Diff index to anchor a comment from `side`'s gutter, falling back to
    /// the other side when this one has none.
    pub fn anchor(&self, side: Side) -> Option<u32> {
        let other = match side {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        self.diff_idx(side).or_else(|| self.diff_idx(other))
    }
}
