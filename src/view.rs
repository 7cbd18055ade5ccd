//! The split diff of one file pair.

use crate::error::{HighlightError, Result, SplitDiffError};
use crate::host::HostEmbedding;
use crate::model::{FilePatch, RowSide, Side};
use crate::patch::{pair_rows, parse_patch, unified_patch};
use crate::render::minimap::{ColorTag, MiniMap, Region, RegionOwner, RegionRegistry};
use crate::render::page;
use crate::render::split_row::SplitRow;
use crate::theme::Theme;
use crate::worker::{HighlightClient, HighlightResponse, RequestId};

/// Rows under one `@@` header.
#[derive(Debug, Clone)]
pub struct HunkRows {
    pub header: String,
    pub header_diff_idx: u32,
    pub rows: Vec<SplitRow>,
}

#[derive(Debug)]
pub struct DiffView {
    filename: String,
    left_text: String,
    right_text: String,
    patch: FilePatch,
    hunks: Vec<HunkRows>,
    minimap: MiniMap,
    host: HostEmbedding,
}

impl DiffView {
    /// Diff `left_text` against `right_text` and build unhighlighted rows.
    pub fn new(
        filename: impl Into<String>,
        left_text: impl Into<String>,
        right_text: impl Into<String>,
        context: usize,
        host: HostEmbedding,
    ) -> Result<Self> {
        let filename = filename.into();
        let left_text = left_text.into();
        let right_text = right_text.into();

        let patch = parse_patch(&unified_patch(&left_text, &right_text, &filename, context))?;

        let mut minimap = MiniMap::new();
        let mut hunks = Vec::with_capacity(patch.hunks.len());
        let mut index = 0;
        for hunk in &patch.hunks {
            let mut rows = Vec::new();
            for pair in pair_rows(hunk) {
                let row = SplitRow::new(index, pair, &mut minimap)
                    .map_err(|source| SplitDiffError::Row { row: index, source })?;
                rows.push(row);
                index += 1;
            }
            hunks.push(HunkRows {
                header: hunk.header.clone(),
                header_diff_idx: hunk.header_diff_idx,
                rows,
            });
        }

        tracing::debug!(
            filename = %filename,
            hunks = hunks.len(),
            rows = index,
            "built split diff"
        );

        Ok(Self {
            filename,
            left_text,
            right_text,
            patch,
            hunks,
            minimap,
            host,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn patch(&self) -> &FilePatch {
        &self.patch
    }

    pub fn hunks(&self) -> &[HunkRows] {
        &self.hunks
    }

    pub fn minimap(&self) -> &MiniMap {
        &self.minimap
    }

    pub fn rows(&self) -> impl Iterator<Item = &SplitRow> {
        self.hunks.iter().flat_map(|h| h.rows.iter())
    }

    pub fn row_count(&self) -> usize {
        self.hunks.iter().map(|h| h.rows.len()).sum()
    }

    /// Ask the worker to highlight both whole texts.
    pub fn submit_highlight(
        &self,
        client: &mut HighlightClient,
    ) -> std::result::Result<RequestId, HighlightError> {
        client.submit(
            self.left_text.as_str(),
            self.right_text.as_str(),
            self.filename.as_str(),
        )
    }

    /// Paint highlighted fragments into every row, returning how many rows
    /// changed. A row that fails keeps its content; the rest still update.
    pub fn apply_highlight(&mut self, response: &HighlightResponse) -> usize {
        let mut updated = 0;
        for row in self.hunks.iter_mut().flat_map(|h| h.rows.iter_mut()) {
            let left = fragment_for(&response.left_highlighted, row.kind().left());
            let right = fragment_for(&response.right_highlighted, row.kind().right());
            let (Some(left), Some(right)) = (left, right) else {
                tracing::debug!(row = row.index(), "no highlighted fragment for row");
                continue;
            };

            match row.update_highlight(left, right) {
                Ok(()) => updated += 1,
                Err(source) => {
                    let error = SplitDiffError::Row {
                        row: row.index(),
                        source,
                    };
                    tracing::warn!(%error, "keeping unhighlighted row");
                    self.host.report_error(&error);
                }
            }
        }
        updated
    }

    /// Rows keep their plain content; the failure goes to the log and the host.
    pub fn report_highlight_failure(&mut self, error: HighlightError) {
        let error = SplitDiffError::Highlight(error);
        tracing::warn!(%error, filename = %self.filename, "showing diff without highlighting");
        self.host.report_error(&error);
    }

    /// Route a gutter click on row `row` to the host and mark the row in the
    /// overview strip.
    pub fn click_gutter(&mut self, row: usize, side: Side) -> Option<u32> {
        let target = self
            .hunks
            .iter()
            .flat_map(|h| h.rows.iter())
            .find(|r| r.index() == row)?;
        let anchor = target.click_gutter(side, &mut self.host)?;
        self.minimap
            .register(Region::new(RegionOwner::Row(row), ColorTag::Purple));
        Some(anchor)
    }

    pub fn to_html(&self, theme: &Theme) -> Result<String> {
        page::render_page(self, theme)
    }
}

/// `Some("")` for a missing side, `None` when the line has no fragment.
fn fragment_for<'a>(lines: &'a [String], side: Option<&RowSide>) -> Option<&'a str> {
    let Some(side) = side else {
        return Some("");
    };
    let line_number = side.line_number?;
    let index = usize::try_from(line_number.checked_sub(1)?).ok()?;
    lines.get(index).map(String::as_str)
}
