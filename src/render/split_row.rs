//! One row of the split table.
//!
//! A row starts out showing its escaped plain text. Once highlighted
//! fragments arrive, [`SplitRow::update_highlight`] overlays the
//! character-level change decoration onto the syntax spans and replaces
//! the cell contents.

use crate::attributed::{AttributedString, Range, escape_html};
use crate::chardiff::{self, EditKind};
use crate::error::{RangeError, RowError};
use crate::host::HostEmbedding;
use crate::model::{DiffLinePair, RowKind, RowSide, Side};
use crate::render::minimap::{ColorTag, Region, RegionOwner, RegionRegistry};

/// Class added to characters that differ between a changed pair.
pub const CHAR_CHANGED: &str = "char-changed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Unhighlighted,
    Highlighted,
}

#[derive(Debug, Clone)]
pub struct SplitRow {
    index: usize,
    kind: RowKind,
    left_html: String,
    right_html: String,
    state: RowState,
}

impl SplitRow {
    /// Build the row and publish its overview region into `registry`.
    pub fn new(
        index: usize,
        pair: DiffLinePair,
        registry: &mut impl RegionRegistry,
    ) -> Result<Self, RowError> {
        let kind = RowKind::classify(pair).ok_or(RowError::EmptyPair)?;
        let left_html = kind.left().map(|s| escape_html(&s.text)).unwrap_or_default();
        let right_html = kind.right().map(|s| escape_html(&s.text)).unwrap_or_default();

        if let Some(region) = region_for(index, &kind) {
            registry.register(region);
        }

        Ok(Self {
            index,
            kind,
            left_html,
            right_html,
            state: RowState::Unhighlighted,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> &RowKind {
        &self.kind
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn left_html(&self) -> &str {
        &self.left_html
    }

    pub fn right_html(&self) -> &str {
        &self.right_html
    }

    pub fn left_anchor(&self) -> Option<u32> {
        self.kind.anchor(Side::Left)
    }

    pub fn right_anchor(&self) -> Option<u32> {
        self.kind.anchor(Side::Right)
    }

    /// Replace both cells with highlighted fragments.
    ///
    /// Both fragments are parsed before anything changes, so a bad fragment
    /// leaves the row exactly as it was. The fragment for a missing side is
    /// ignored, and a fragment whose text is not the row's line is rejected.
    pub fn update_highlight(
        &mut self,
        left_fragment: &str,
        right_fragment: &str,
    ) -> Result<(), RowError> {
        let mut left = parse_fragment(self.kind.left(), Side::Left, left_fragment)?;
        let mut right = parse_fragment(self.kind.right(), Side::Right, right_fragment)?;

        if let (RowKind::Changed { .. }, Some(left), Some(right)) =
            (&self.kind, left.as_mut(), right.as_mut())
        {
            decorate_changes(left, right)?;
        }

        if let Some(left) = left {
            self.left_html = left.to_html();
        }
        if let Some(right) = right {
            self.right_html = right.to_html();
        }
        self.state = RowState::Highlighted;
        Ok(())
    }

    /// Ask the host to open a comment at this row, returning the anchor used.
    pub fn click_gutter(&self, side: Side, host: &mut HostEmbedding) -> Option<u32> {
        let anchor = self.kind.anchor(side);
        if let Some(diff_idx) = anchor {
            host.add_comment(diff_idx);
        }
        anchor
    }

    pub fn to_html(&self) -> String {
        let (left_kind, right_kind) = self.kind.cell_kinds();
        format!(
            "<tr class=\"row\" data-row=\"{}\">{}{}{}{}</tr>",
            self.index,
            self.gutter_html(Side::Left),
            code_cell(left_kind.css_class(), &self.left_html),
            self.gutter_html(Side::Right),
            code_cell(right_kind.css_class(), &self.right_html),
        )
    }

    fn gutter_html(&self, side: Side) -> String {
        let side_class = match side {
            Side::Left => "gutter-left",
            Side::Right => "gutter-right",
        };
        let number = self
            .kind
            .side(side)
            .and_then(|s| s.line_number)
            .map(|n| n.to_string())
            .unwrap_or_default();
        match self.kind.anchor(side) {
            Some(diff_idx) => format!(
                "<td class=\"gutter {side_class}\" data-diff-idx=\"{diff_idx}\">{number}</td>"
            ),
            None => format!("<td class=\"gutter {side_class}\">{number}</td>"),
        }
    }
}

fn code_cell(class: &str, html: &str) -> String {
    format!("<td class=\"code {class}\">{html}</td>")
}

/// Parse the fragment for a side the row has; `None` for a missing side.
fn parse_fragment(
    row_side: Option<&RowSide>,
    side: Side,
    fragment: &str,
) -> Result<Option<AttributedString>, RowError> {
    let Some(row_side) = row_side else {
        return Ok(None);
    };
    let parsed = AttributedString::from_html(fragment)?;
    if parsed.as_str() != row_side.text {
        return Err(RowError::FragmentMismatch {
            side,
            expected: row_side.text.clone(),
            found: parsed.as_str().to_string(),
        });
    }
    Ok(Some(parsed))
}

fn region_for(index: usize, kind: &RowKind) -> Option<Region> {
    match kind {
        RowKind::Insert { .. } => Some(Region::new(RegionOwner::RightCell(index), ColorTag::Green)),
        RowKind::Delete { .. } => Some(Region::new(RegionOwner::LeftCell(index), ColorTag::Red)),
        RowKind::Changed { .. } => Some(Region::new(RegionOwner::Row(index), ColorTag::Blue)),
        RowKind::Context { .. } => None,
    }
}

/// Mark deleted characters on the left and inserted characters on the right.
///
/// A diff of a single edit has nothing to contrast and is left undecorated.
fn decorate_changes(
    left: &mut AttributedString,
    right: &mut AttributedString,
) -> Result<(), RangeError> {
    let edits = chardiff::diff(left.as_str(), right.as_str());
    if edits.len() <= 1 {
        return Ok(());
    }

    let mut left_offset = 0;
    let mut right_offset = 0;
    for edit in &edits {
        let len = edit.char_len();
        match edit.kind {
            EditKind::Equal => {
                left_offset += len;
                right_offset += len;
            }
            EditKind::Delete => {
                left.add_attributes(Range::new(left_offset, len), [CHAR_CHANGED])?;
                left_offset += len;
            }
            EditKind::Insert => {
                right.add_attributes(Range::new(right_offset, len), [CHAR_CHANGED])?;
                right_offset += len;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn changed(left: &str, right: &str) -> DiffLinePair {
        DiffLinePair {
            left_line: Some(left.to_string()),
            right_line: Some(right.to_string()),
            left_line_number: Some(1),
            right_line_number: Some(1),
            left_diff_idx: Some(1),
            right_diff_idx: Some(2),
            changed: true,
        }
    }

    fn changed_row(left: &str, right: &str) -> SplitRow {
        SplitRow::new(0, changed(left, right), &mut Vec::<Region>::new()).unwrap()
    }

    fn insert_at(diff_idx: u32) -> DiffLinePair {
        DiffLinePair {
            right_line: Some("let x = 1;".to_string()),
            right_line_number: Some(7),
            right_diff_idx: Some(diff_idx),
            ..Default::default()
        }
    }

    #[test]
    fn should_reject_pair_without_lines() {
        let mut regions: Vec<Region> = Vec::new();
        let err = SplitRow::new(0, DiffLinePair::default(), &mut regions).unwrap_err();
        assert_eq!(err, RowError::EmptyPair);
        assert!(regions.is_empty());
    }

    #[test]
    fn should_publish_one_region_per_changed_row() {
        let mut regions: Vec<Region> = Vec::new();
        SplitRow::new(0, insert_at(1), &mut regions).unwrap();
        SplitRow::new(
            1,
            DiffLinePair {
                left_line: Some("gone".to_string()),
                left_diff_idx: Some(2),
                ..Default::default()
            },
            &mut regions,
        )
        .unwrap();
        SplitRow::new(2, changed("a", "b"), &mut regions).unwrap();
        SplitRow::new(
            3,
            DiffLinePair {
                changed: false,
                ..changed("same", "same")
            },
            &mut regions,
        )
        .unwrap();

        assert_eq!(
            regions,
            vec![
                Region::new(RegionOwner::RightCell(0), ColorTag::Green),
                Region::new(RegionOwner::LeftCell(1), ColorTag::Red),
                Region::new(RegionOwner::Row(2), ColorTag::Blue),
            ]
        );
    }

    #[test]
    fn should_escape_plain_text_before_highlighting() {
        let row = changed_row("a < b", "a > b");
        assert_eq!(row.state(), RowState::Unhighlighted);
        assert_eq!(row.left_html(), "a &lt; b");
        assert_eq!(row.right_html(), "a &gt; b");
    }

    #[test]
    fn should_route_both_gutters_of_insert_row_to_its_index() {
        let row = SplitRow::new(0, insert_at(5), &mut Vec::<Region>::new()).unwrap();
        assert_eq!(row.left_anchor(), Some(5));
        assert_eq!(row.right_anchor(), Some(5));

        let clicks = Rc::new(RefCell::new(Vec::new()));
        let mut host = HostEmbedding::new().with_add_comment({
            let clicks = Rc::clone(&clicks);
            move |idx| clicks.borrow_mut().push(idx)
        });
        row.click_gutter(Side::Left, &mut host);
        row.click_gutter(Side::Right, &mut host);
        assert_eq!(*clicks.borrow(), vec![5, 5]);
    }

    #[test]
    fn should_mark_changed_characters() {
        let mut row = changed_row("foo", "fog");
        row.update_highlight("foo", "fog").unwrap();
        assert_eq!(row.state(), RowState::Highlighted);
        assert_eq!(row.left_html(), "fo<span class=\"char-changed\">o</span>");
        assert_eq!(row.right_html(), "fo<span class=\"char-changed\">g</span>");
    }

    #[test]
    fn should_keep_syntax_spans_under_change_marks() {
        let mut row = changed_row("x = 1", "x = 2");
        row.update_highlight(
            "x = <span class=\"constant numeric\">1</span>",
            "x = <span class=\"constant numeric\">2</span>",
        )
        .unwrap();
        assert_eq!(
            row.left_html(),
            "x = <span class=\"char-changed\"><span class=\"constant numeric\">1</span></span>"
        );
        assert_eq!(
            row.right_html(),
            "x = <span class=\"char-changed\"><span class=\"constant numeric\">2</span></span>"
        );
    }

    #[test]
    fn should_mark_whole_lines_when_they_share_nothing() {
        let mut row = changed_row("abc", "xyz");
        row.update_highlight("abc", "xyz").unwrap();
        assert_eq!(row.left_html(), "<span class=\"char-changed\">abc</span>");
        assert_eq!(row.right_html(), "<span class=\"char-changed\">xyz</span>");
    }

    #[test]
    fn should_not_decorate_single_edit_diffs() {
        let mut row = changed_row("", "abc");
        row.update_highlight("", "abc").unwrap();
        assert_eq!(row.left_html(), "");
        assert_eq!(row.right_html(), "abc");
        assert_eq!(row.state(), RowState::Highlighted);
    }

    #[test]
    fn should_not_diff_context_rows() {
        let pair = DiffLinePair {
            changed: false,
            ..changed("same", "same")
        };
        let mut row = SplitRow::new(0, pair, &mut Vec::<Region>::new()).unwrap();
        row.update_highlight("<span class=\"k\">same</span>", "<span class=\"k\">same</span>")
            .unwrap();
        assert_eq!(row.left_html(), "<span class=\"k\">same</span>");
        assert_eq!(row.right_html(), "<span class=\"k\">same</span>");
    }

    #[test]
    fn should_produce_identical_output_when_fed_its_own_output() {
        let mut row = changed_row("foo(bar)", "foo(baz)");
        row.update_highlight(
            "<span class=\"f\">foo</span>(bar)",
            "<span class=\"f\">foo</span>(baz)",
        )
        .unwrap();
        let left = row.left_html().to_string();
        let right = row.right_html().to_string();

        row.update_highlight(&left, &right).unwrap();
        assert_eq!(row.left_html(), left);
        assert_eq!(row.right_html(), right);
    }

    #[test]
    fn should_keep_content_when_fragment_fails_to_parse() {
        let mut row = changed_row("foo", "fog");
        let err = row.update_highlight("foo", "<span>fog").unwrap_err();
        assert!(matches!(err, RowError::Parse(ParseError::Unclosed { .. })));
        assert_eq!(row.state(), RowState::Unhighlighted);
        assert_eq!(row.left_html(), "foo");
        assert_eq!(row.right_html(), "fog");
    }

    #[test]
    fn should_leave_missing_side_empty_after_highlighting() {
        let mut row = SplitRow::new(0, insert_at(3), &mut Vec::<Region>::new()).unwrap();
        row.update_highlight("", "<span class=\"kw\">let</span> x = 1;")
            .unwrap();
        assert_eq!(row.left_html(), "");
        assert_eq!(row.right_html(), "<span class=\"kw\">let</span> x = 1;");
    }

    #[test]
    fn should_render_gutters_with_diff_indices() {
        let row = SplitRow::new(4, insert_at(9), &mut Vec::<Region>::new()).unwrap();
        let html = row.to_html();
        assert!(html.starts_with("<tr class=\"row\" data-row=\"4\">"));
        assert!(html.contains("<td class=\"gutter gutter-left\" data-diff-idx=\"9\"></td>"));
        assert!(html.contains("<td class=\"gutter gutter-right\" data-diff-idx=\"9\">7</td>"));
        assert!(html.contains("<td class=\"code spacer\"></td>"));
        assert!(html.contains("<td class=\"code inserted-new\">let x = 1;</td>"));
    }

    #[test]
    fn should_reject_fragment_for_a_different_line() {
        let mut row = changed_row("foo", "fog");
        let err = row.update_highlight("bar", "fog").unwrap_err();
        assert_eq!(
            err,
            RowError::FragmentMismatch {
                side: Side::Left,
                expected: "foo".to_string(),
                found: "bar".to_string(),
            }
        );
        assert_eq!(row.state(), RowState::Unhighlighted);
        assert_eq!(row.right_html(), "fog");
    }

    #[test]
    fn should_not_parse_fragment_for_missing_side() {
        let mut row = SplitRow::new(0, insert_at(3), &mut Vec::<Region>::new()).unwrap();
        row.update_highlight("<span>broken", "let x = 1;").unwrap();
        assert_eq!(row.left_html(), "");
        assert_eq!(row.right_html(), "let x = 1;");
        assert_eq!(row.state(), RowState::Highlighted);
    }

    fn marked(s: &AttributedString) -> Vec<bool> {
        (0..s.char_len())
            .map(|pos| s.attributes_at(pos).contains(CHAR_CHANGED))
            .collect()
    }

    fn expected_marks(left: &str, right: &str) -> (Vec<bool>, Vec<bool>) {
        let edits = chardiff::diff(left, right);
        let decorate = edits.len() > 1;
        let mut left_marks = Vec::new();
        let mut right_marks = Vec::new();
        for edit in &edits {
            let len = edit.char_len();
            match edit.kind {
                EditKind::Equal => {
                    left_marks.extend(std::iter::repeat_n(false, len));
                    right_marks.extend(std::iter::repeat_n(false, len));
                }
                EditKind::Delete => left_marks.extend(std::iter::repeat_n(decorate, len)),
                EditKind::Insert => right_marks.extend(std::iter::repeat_n(decorate, len)),
            }
        }
        (left_marks, right_marks)
    }

    #[test]
    fn should_decorate_multibyte_and_escaped_text_within_bounds() {
        let fragments = [
            r#"<span class="s">"café"</span>"#,
            r#"<span class="s">"cafe"</span>"#,
            r#"<span class="a"><span class="b">x &lt; 🦀</span> &amp;&amp; y</span>"#,
            r#"<span class="a"><span class="b">x &lt;= 🦞</span> || y</span>"#,
            "é&amp;è",
            "e&amp;e",
            r#"<span class="k">let</span> 名前 = 1;"#,
            r#"<span class="k">let</span> 名 = <span class="n">12</span>;"#,
            "🦀🦀🦀",
            "🦀x🦀",
            "&lt;&gt;&amp;",
            r#"<span class="p">&gt;</span>&lt;"#,
            "&#39;a&#39;",
            "&quot;a&quot; ",
            "",
        ];

        for left_html in fragments {
            for right_html in fragments {
                let left_plain = AttributedString::from_html(left_html).unwrap();
                let right_plain = AttributedString::from_html(right_html).unwrap();
                let mut row = changed_row(left_plain.as_str(), right_plain.as_str());
                row.update_highlight(left_html, right_html)
                    .unwrap_or_else(|err| panic!("{left_html:?} -> {right_html:?}: {err}"));

                let left = AttributedString::from_html(row.left_html()).unwrap();
                let right = AttributedString::from_html(row.right_html()).unwrap();
                assert_eq!(left.as_str(), left_plain.as_str());
                assert_eq!(right.as_str(), right_plain.as_str());

                let (left_marks, right_marks) =
                    expected_marks(left_plain.as_str(), right_plain.as_str());
                assert_eq!(marked(&left), left_marks, "{left_html:?} -> {right_html:?}");
                assert_eq!(marked(&right), right_marks, "{left_html:?} -> {right_html:?}");
            }
        }
    }
}
