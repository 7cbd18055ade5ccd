//! Unified diff of a single file, with review positions.
//!
//! Positions follow the pull-request review convention: the first `@@`
//! header is position 0, the line below it is position 1, and the count
//! keeps increasing through every following line, later hunk headers
//! included. Comments are anchored to these positions.

pub mod pairing;

use std::path::PathBuf;

use similar::TextDiff;

use crate::error::{Result, SplitDiffError};
use crate::model::{DiffHunk, DiffLine, FilePatch, FileStatus, LineOrigin};
use crate::syntax::normalize_line_breaks;

pub use pairing::pair_rows;

/// Produce a unified diff of two texts with `context` lines around each change.
///
/// Lines break on `\r\n`, `\r` and `\n` alike, matching how highlighted
/// output is split, so line numbers index highlighted fragments directly.
pub fn unified_patch(old: &str, new: &str, path: &str, context: usize) -> String {
    let old = normalize_line_breaks(old);
    let new = normalize_line_breaks(new);
    let diff = TextDiff::from_lines(old.as_ref(), new.as_ref());
    diff.unified_diff()
        .context_radius(context)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

/// Parse a single-file unified diff.
pub fn parse_patch(patch_text: &str) -> Result<FilePatch> {
    let mut lines = patch_text.lines().peekable();

    if lines.peek().is_some_and(|l| l.starts_with("diff ")) {
        lines.next();
    }
    let (old_path, new_path, status) = parse_file_header(&mut lines)?;

    let mut hunks = Vec::new();
    // The first hunk header is position 0.
    let mut position: Option<u32> = None;

    while let Some(peek_line) = lines.peek() {
        if peek_line.starts_with("diff ") {
            return Err(SplitDiffError::InvalidPatch(
                "patch touches more than one file".to_string(),
            ));
        } else if peek_line.starts_with("@@") {
            let header_idx = position.map_or(0, |p| p + 1);
            let hunk = parse_hunk(&mut lines, header_idx)?;
            position = Some(hunk.lines.last().map_or(header_idx, |l| l.diff_idx));
            hunks.push(hunk);
        } else {
            lines.next(); // skip non-hunk lines
        }
    }

    if hunks.is_empty() {
        return Err(SplitDiffError::NoChanges);
    }

    Ok(FilePatch {
        old_path,
        new_path,
        status,
        hunks,
    })
}

fn strip_path_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    // Timestamps may follow the path after a tab
    let path = path.split('\t').next().unwrap_or(path);
    path.strip_prefix(prefix).unwrap_or(path)
}

fn parse_file_header<'a, I>(
    lines: &mut std::iter::Peekable<I>,
) -> Result<(Option<PathBuf>, Option<PathBuf>, FileStatus)>
where
    I: Iterator<Item = &'a str>,
{
    let mut old_path: Option<PathBuf> = None;
    let mut new_path: Option<PathBuf> = None;
    let mut status = FileStatus::Modified;

    while let Some(line) = lines.peek() {
        if let Some(path) = line.strip_prefix("--- ") {
            let path = strip_path_prefix(path, "a/");
            if path != "/dev/null" {
                old_path = Some(PathBuf::from(path));
            }
            lines.next();
        } else if let Some(path) = line.strip_prefix("+++ ") {
            let path = strip_path_prefix(path, "b/");
            if path != "/dev/null" {
                new_path = Some(PathBuf::from(path));
            }
            lines.next();
            break; // Done with file header
        } else if line.starts_with("new file") {
            status = FileStatus::Added;
            lines.next();
        } else if line.starts_with("deleted file") {
            status = FileStatus::Deleted;
            lines.next();
        } else if let Some(path) = line.strip_prefix("rename from ") {
            status = FileStatus::Renamed;
            old_path = Some(PathBuf::from(path));
            lines.next();
        } else if let Some(path) = line.strip_prefix("rename to ") {
            new_path = Some(PathBuf::from(path));
            lines.next();
        } else if line.starts_with("Binary file") {
            return Err(SplitDiffError::InvalidPatch(
                "binary files have no line diff".to_string(),
            ));
        } else if line.starts_with("@@") {
            break;
        } else {
            lines.next(); // Skip other metadata lines (index, mode, etc.)
        }
    }

    // Determine status from paths if not already set by metadata
    if status == FileStatus::Modified {
        if old_path.is_none() && new_path.is_some() {
            status = FileStatus::Added;
        } else if old_path.is_some() && new_path.is_none() {
            status = FileStatus::Deleted;
        }
    }

    Ok((old_path, new_path, status))
}

fn parse_hunk<'a, I>(lines: &mut std::iter::Peekable<I>, header_diff_idx: u32) -> Result<DiffHunk>
where
    I: Iterator<Item = &'a str>,
{
    let header_line = lines
        .next()
        .ok_or_else(|| SplitDiffError::InvalidPatch("missing hunk header".to_string()))?;

    // Parse @@ -old_start,old_count +new_start,new_count @@
    let (old_start, old_count, new_start, new_count) = parse_hunk_header(header_line)
        .ok_or_else(|| SplitDiffError::InvalidPatch(format!("bad hunk header: {header_line}")))?;

    let mut old_lineno = old_start;
    let mut new_lineno = new_start;
    let mut position = header_diff_idx;
    let mut diff_lines = Vec::new();

    // Collect lines until next hunk or file
    while let Some(line) = lines.next_if(|l| !l.starts_with("@@") && !l.starts_with("diff ")) {
        if line.starts_with('\\') {
            // "\ No newline at end of file" - skip
            continue;
        }

        let (origin, content, old_ln, new_ln) = if let Some(stripped) = line.strip_prefix('+') {
            let ln = new_lineno;
            new_lineno += 1;
            (LineOrigin::Addition, stripped, None, Some(ln))
        } else if let Some(stripped) = line.strip_prefix('-') {
            let ln = old_lineno;
            old_lineno += 1;
            (LineOrigin::Deletion, stripped, Some(ln), None)
        } else if let Some(stripped) = line.strip_prefix(' ') {
            let (old_ln, new_ln) = (old_lineno, new_lineno);
            old_lineno += 1;
            new_lineno += 1;
            (LineOrigin::Context, stripped, Some(old_ln), Some(new_ln))
        } else if line.is_empty() {
            // Empty line in diff (context line with no content after space)
            let (old_ln, new_ln) = (old_lineno, new_lineno);
            old_lineno += 1;
            new_lineno += 1;
            (LineOrigin::Context, "", Some(old_ln), Some(new_ln))
        } else {
            // Unknown format, skip
            continue;
        };

        position += 1;
        diff_lines.push(DiffLine {
            origin,
            content: content.to_string(),
            old_lineno: old_ln,
            new_lineno: new_ln,
            diff_idx: position,
        });
    }

    Ok(DiffHunk {
        header: header_line.to_string(),
        header_diff_idx,
        lines: diff_lines,
        old_start,
        old_count,
        new_start,
        new_count,
    })
}

fn parse_hunk_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    // Format: @@ -old_start,old_count +new_start,new_count @@
    // or: @@ -old_start +new_start @@ (count defaults to 1)

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 || parts[0] != "@@" {
        return None;
    }

    let old_part = parts[1].strip_prefix('-')?;
    let new_part = parts[2].strip_prefix('+')?;

    let (old_start, old_count) = parse_range(old_part);
    let (new_start, new_count) = parse_range(new_part);

    Some((old_start, old_count, new_start, new_count))
}

fn parse_range(s: &str) -> (u32, u32) {
    if let Some((start, count)) = s.split_once(',') {
        (start.parse().unwrap_or(1), count.parse().unwrap_or(1))
    } else {
        (s.parse().unwrap_or(1), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_no_changes_for_empty_patch() {
        assert!(matches!(parse_patch(""), Err(SplitDiffError::NoChanges)));
    }

    #[test]
    fn should_return_no_changes_for_identical_texts() {
        let patch = unified_patch("same\n", "same\n", "a.txt", 3);
        assert!(matches!(parse_patch(&patch), Err(SplitDiffError::NoChanges)));
    }

    #[test]
    fn should_parse_hunk_header() {
        assert_eq!(parse_hunk_header("@@ -1,3 +1,4 @@"), Some((1, 3, 1, 4)));
        assert_eq!(
            parse_hunk_header("@@ -10,5 +20,8 @@ fn context()"),
            Some((10, 5, 20, 8))
        );
    }

    #[test]
    fn should_parse_hunk_header_without_count() {
        assert_eq!(parse_hunk_header("@@ -5 +10 @@"), Some((5, 1, 10, 1)));
    }

    #[test]
    fn should_reject_invalid_hunk_header() {
        assert!(parse_hunk_header("not a hunk header").is_none());
        assert!(parse_hunk_header("@@ invalid").is_none());
        assert!(parse_hunk_header("@@ 1,2 3,4 @@").is_none());
    }

    #[test]
    fn should_parse_range() {
        assert_eq!(parse_range("10,5"), (10, 5));
        assert_eq!(parse_range("42"), (42, 1));
        assert_eq!(parse_range("abc,def"), (1, 1));
    }

    #[test]
    fn should_number_lines_and_positions() {
        let patch = r#"diff --git a/test.rs b/test.rs
index 123..456 100644
--- a/test.rs
+++ b/test.rs
@@ -1,3 +1,4 @@
 fn main() {
+    println!("hello");
     println!("world");
 }
"#;
        let file = parse_patch(patch).unwrap();
        assert_eq!(file.status, FileStatus::Modified);
        assert_eq!(file.display_path(), Some(&PathBuf::from("test.rs")));
        let hunk = &file.hunks[0];
        assert_eq!(hunk.header_diff_idx, 0);
        let positions: Vec<u32> = hunk.lines.iter().map(|l| l.diff_idx).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        assert_eq!(hunk.lines[1].origin, LineOrigin::Addition);
        assert_eq!(hunk.lines[1].new_lineno, Some(2));
        assert_eq!(hunk.lines[1].old_lineno, None);
        assert_eq!(hunk.lines[2].old_lineno, Some(2));
        assert_eq!(hunk.lines[2].new_lineno, Some(3));
    }

    #[test]
    fn should_count_later_hunk_headers_as_positions() {
        let patch = r#"--- a/multi.rs
+++ b/multi.rs
@@ -1,2 +1,3 @@
 fn first() {
+    // added
@@ -10,2 +11,3 @@
 fn second() {
+    // also added
"#;
        let file = parse_patch(patch).unwrap();
        assert_eq!(file.hunks.len(), 2);
        assert_eq!(file.hunks[0].lines.last().unwrap().diff_idx, 2);
        assert_eq!(file.hunks[1].header_diff_idx, 3);
        assert_eq!(file.hunks[1].lines[0].diff_idx, 4);
        assert_eq!(file.hunks[1].lines[0].old_lineno, Some(10));
        assert_eq!(file.hunks[1].lines[1].new_lineno, Some(12));
    }

    #[test]
    fn should_skip_no_newline_markers() {
        let patch = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-old\n\\ No newline at end of file\n+new\n";
        let file = parse_patch(patch).unwrap();
        let lines = &file.hunks[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].diff_idx, 2);
    }

    #[test]
    fn should_detect_added_and_deleted_files() {
        let added = "--- /dev/null\n+++ b/new.rs\n@@ -0,0 +1,1 @@\n+fn new() {}\n";
        let file = parse_patch(added).unwrap();
        assert_eq!(file.status, FileStatus::Added);
        assert!(file.old_path.is_none());

        let deleted = "--- a/old.rs\n+++ /dev/null\n@@ -1,1 +0,0 @@\n-fn old() {}\n";
        let file = parse_patch(deleted).unwrap();
        assert_eq!(file.status, FileStatus::Deleted);
        assert!(file.new_path.is_none());
    }

    #[test]
    fn should_parse_renamed_file() {
        let patch = r#"diff --git a/old_name.rs b/new_name.rs
rename from old_name.rs
rename to new_name.rs
--- a/old_name.rs
+++ b/new_name.rs
@@ -1,1 +1,1 @@
-old content
+new content
"#;
        let file = parse_patch(patch).unwrap();
        assert_eq!(file.status, FileStatus::Renamed);
        assert_eq!(file.old_path, Some(PathBuf::from("old_name.rs")));
        assert_eq!(file.new_path, Some(PathBuf::from("new_name.rs")));
    }

    #[test]
    fn should_reject_multi_file_patches() {
        let patch = "--- a/a\n+++ b/a\n@@ -1 +1 @@\n-a\n+b\ndiff --git a/b b/b\n";
        assert!(matches!(
            parse_patch(patch),
            Err(SplitDiffError::InvalidPatch(_))
        ));
    }

    #[test]
    fn should_reject_binary_patches() {
        let patch = "diff --git a/img.png b/img.png\nBinary files a/img.png and b/img.png differ\n";
        assert!(matches!(
            parse_patch(patch),
            Err(SplitDiffError::InvalidPatch(_))
        ));
    }

    #[test]
    fn should_round_trip_generated_patch() {
        let old = "one\ntwo\nthree\n";
        let new = "one\n2\nthree\nfour\n";
        let file = parse_patch(&unified_patch(old, new, "n.txt", 3)).unwrap();
        assert_eq!(file.new_path, Some(PathBuf::from("n.txt")));
        let hunk = &file.hunks[0];
        let deleted: Vec<&str> = hunk
            .lines
            .iter()
            .filter(|l| l.origin == LineOrigin::Deletion)
            .map(|l| l.content.as_str())
            .collect();
        let added: Vec<&str> = hunk
            .lines
            .iter()
            .filter(|l| l.origin == LineOrigin::Addition)
            .map(|l| l.content.as_str())
            .collect();
        assert_eq!(deleted, vec!["two"]);
        assert_eq!(added, vec!["2", "four"]);
    }

    #[test]
    fn should_count_bare_carriage_returns_as_line_breaks() {
        let patch = unified_patch("a\rb\nc\n", "a\rb\nC\n", "cr.txt", 3);
        let file = parse_patch(&patch).unwrap();
        let hunk = &file.hunks[0];
        let deleted = hunk
            .lines
            .iter()
            .find(|l| l.origin == LineOrigin::Deletion)
            .unwrap();
        assert_eq!(deleted.content, "c");
        assert_eq!(deleted.old_lineno, Some(3));
        let added = hunk
            .lines
            .iter()
            .find(|l| l.origin == LineOrigin::Addition)
            .unwrap();
        assert_eq!(added.content, "C");
        assert_eq!(added.new_lineno, Some(3));
    }
}
