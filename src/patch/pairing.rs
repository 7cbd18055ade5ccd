use crate::model::{DiffHunk, DiffLine, DiffLinePair, LineOrigin};

/// Pair the lines of a hunk into split-view rows.
///
/// A deletion run followed by an addition run is paired index-wise as
/// changed rows; whatever is left over on either side stands alone.
pub fn pair_rows(hunk: &DiffHunk) -> Vec<DiffLinePair> {
    let mut rows = Vec::with_capacity(hunk.lines.len());
    let mut deletions: Vec<&DiffLine> = Vec::new();
    let mut additions: Vec<&DiffLine> = Vec::new();

    for line in &hunk.lines {
        match line.origin {
            LineOrigin::Deletion => {
                // A deletion after additions starts a new change block
                if !additions.is_empty() {
                    flush_block(&mut rows, &mut deletions, &mut additions);
                }
                deletions.push(line);
            }
            LineOrigin::Addition => additions.push(line),
            LineOrigin::Context => {
                flush_block(&mut rows, &mut deletions, &mut additions);
                rows.push(DiffLinePair {
                    left_line: Some(line.content.clone()),
                    right_line: Some(line.content.clone()),
                    left_line_number: line.old_lineno,
                    right_line_number: line.new_lineno,
                    left_diff_idx: Some(line.diff_idx),
                    right_diff_idx: Some(line.diff_idx),
                    changed: false,
                });
            }
        }
    }
    flush_block(&mut rows, &mut deletions, &mut additions);

    rows
}

fn flush_block<'a>(
    rows: &mut Vec<DiffLinePair>,
    deletions: &mut Vec<&'a DiffLine>,
    additions: &mut Vec<&'a DiffLine>,
) {
    let paired = deletions.len().min(additions.len());

    for (old, new) in deletions.iter().zip(additions.iter()) {
        rows.push(DiffLinePair {
            left_line: Some(old.content.clone()),
            right_line: Some(new.content.clone()),
            left_line_number: old.old_lineno,
            right_line_number: new.new_lineno,
            left_diff_idx: Some(old.diff_idx),
            right_diff_idx: Some(new.diff_idx),
            changed: true,
        });
    }
    for old in &deletions[paired..] {
        rows.push(DiffLinePair {
            left_line: Some(old.content.clone()),
            left_line_number: old.old_lineno,
            left_diff_idx: Some(old.diff_idx),
            ..Default::default()
        });
    }
    for new in &additions[paired..] {
        rows.push(DiffLinePair {
            right_line: Some(new.content.clone()),
            right_line_number: new.new_lineno,
            right_diff_idx: Some(new.diff_idx),
            ..Default::default()
        });
    }

    deletions.clear();
    additions.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::parse_patch;

    fn hunk(body: &str) -> DiffHunk {
        let patch = format!("--- a/f\n+++ b/f\n{body}");
        parse_patch(&patch).unwrap().hunks.remove(0)
    }

    #[test]
    fn should_pair_context_with_same_index_on_both_sides() {
        let rows = pair_rows(&hunk("@@ -3,1 +4,1 @@\n same\n"));
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!(!row.changed);
        assert_eq!(row.left_line.as_deref(), Some("same"));
        assert_eq!(row.left_line_number, Some(3));
        assert_eq!(row.right_line_number, Some(4));
        assert_eq!(row.left_diff_idx, Some(1));
        assert_eq!(row.right_diff_idx, Some(1));
    }

    #[test]
    fn should_pair_deletions_with_following_additions() {
        let rows = pair_rows(&hunk("@@ -1,2 +1,3 @@\n-a\n-b\n+A\n+B\n+C\n"));
        assert_eq!(rows.len(), 3);

        assert!(rows[0].changed);
        assert_eq!(rows[0].left_line.as_deref(), Some("a"));
        assert_eq!(rows[0].right_line.as_deref(), Some("A"));
        assert_eq!(rows[0].left_diff_idx, Some(1));
        assert_eq!(rows[0].right_diff_idx, Some(3));

        assert!(rows[1].changed);
        assert_eq!(rows[1].right_line.as_deref(), Some("B"));

        assert!(!rows[2].changed);
        assert_eq!(rows[2].left_line, None);
        assert_eq!(rows[2].right_line.as_deref(), Some("C"));
        assert_eq!(rows[2].right_line_number, Some(3));
        assert_eq!(rows[2].right_diff_idx, Some(5));
    }

    #[test]
    fn should_leave_extra_deletions_unpaired() {
        let rows = pair_rows(&hunk("@@ -1,3 +1,2 @@\n-x\n-y\n+X\n ctx\n"));
        assert_eq!(rows.len(), 3);
        assert!(rows[0].changed);
        assert_eq!(rows[1].left_line.as_deref(), Some("y"));
        assert_eq!(rows[1].right_line, None);
        assert_eq!(rows[1].left_line_number, Some(2));
        assert_eq!(rows[2].left_line.as_deref(), Some("ctx"));
    }

    #[test]
    fn should_not_pair_additions_with_later_deletions() {
        let rows = pair_rows(&hunk("@@ -1,1 +1,1 @@\n+new\n-old\n"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].left_line, None);
        assert_eq!(rows[0].right_line.as_deref(), Some("new"));
        assert_eq!(rows[1].left_line.as_deref(), Some("old"));
        assert_eq!(rows[1].right_line, None);
    }

    #[test]
    fn should_give_every_row_a_diff_index() {
        let rows = pair_rows(&hunk("@@ -1,4 +1,4 @@\n a\n-b\n+B\n-c\n d\n+e\n"));
        assert!(
            rows.iter()
                .all(|r| r.left_diff_idx.is_some() || r.right_diff_idx.is_some())
        );
    }
}
