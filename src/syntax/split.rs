//! Slicing whole-file highlighted HTML into standalone per-line fragments.
//!
//! The highlighter sees the whole file, so a span opened on one line (a
//! block comment, a multi-line string) may only close several lines later.
//! Each fragment therefore replays the spans still open from previous lines
//! and closes whatever it leaves open.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::MalformedMarkupError;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("valid line break regex"));

static SPAN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<span(?:\s[^>]*)?>|</span>").expect("valid span regex"));

const CLOSE_SPAN: &str = "</span>";

/// Open-tag tokens carried from one line to the next, innermost last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagStack {
    open: Vec<String>,
}

impl TagStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.open.push(token.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.open.pop()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// The open tokens, outermost first, exactly as they appeared.
    pub fn replay_prefix(&self) -> String {
        self.open.concat()
    }

    /// One close tag per open token.
    pub fn closing_suffix(&self) -> String {
        CLOSE_SPAN.repeat(self.open.len())
    }

    /// Scan one line of markup, pushing opens and popping closes in order.
    fn consume_line(&mut self, line: &str, line_index: usize) -> Result<(), MalformedMarkupError> {
        for token in SPAN_TOKEN.find_iter(line) {
            let token = token.as_str();
            if token == CLOSE_SPAN {
                self.pop()
                    .ok_or(MalformedMarkupError { line: line_index })?;
            } else if !token.ends_with("/>") {
                self.push(token);
            }
        }
        Ok(())
    }
}

/// Split highlighted HTML on line terminators into fragments that are each
/// well-formed on their own.
///
/// Fragment `i` renders exactly like line `i` of the unsplit document.
pub fn split_highlighted_html(html: &str) -> Result<Vec<String>, MalformedMarkupError> {
    let mut stack = TagStack::new();
    let mut fragments = Vec::new();

    for (index, line) in LINE_BREAK.split(html).enumerate() {
        let mut fragment = stack.replay_prefix();
        fragment.push_str(line);
        stack.consume_line(line, index)?;
        fragment.push_str(&stack.closing_suffix());
        fragments.push(fragment);
    }

    Ok(fragments)
}

/// Rewrite every line terminator the splitter recognizes as `\n`, so line
/// `i` of the result is fragment `i` of the highlighted source.
pub fn normalize_line_breaks(text: &str) -> Cow<'_, str> {
    LINE_BREAK.replace_all(text, "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributed::AttributedString;

    fn split_lines(text: &str) -> Vec<&str> {
        LINE_BREAK.split(text).collect()
    }

    #[test]
    fn should_normalize_every_terminator_to_newline() {
        assert_eq!(normalize_line_breaks("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert!(matches!(normalize_line_breaks("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn should_keep_single_line_untouched() {
        let html = r#"<span class="kw">let</span> x"#;
        assert_eq!(split_highlighted_html(html).unwrap(), vec![html.to_string()]);
    }

    #[test]
    fn should_replay_open_spans_on_following_lines() {
        let html = "<span class=\"c\">/* a\nb\nc */</span> x";
        let fragments = split_highlighted_html(html).unwrap();
        assert_eq!(
            fragments,
            vec![
                "<span class=\"c\">/* a</span>".to_string(),
                "<span class=\"c\">b</span>".to_string(),
                "<span class=\"c\">c */</span> x".to_string(),
            ]
        );
    }

    #[test]
    fn should_replay_nested_spans_in_stack_order() {
        let html = "<span class=\"a\"><span class=\"b\">x\ny</span>z\nw</span>";
        let fragments = split_highlighted_html(html).unwrap();
        assert_eq!(
            fragments[1],
            "<span class=\"a\"><span class=\"b\">y</span>z</span>"
        );
        assert_eq!(fragments[2], "<span class=\"a\">w</span>");
    }

    #[test]
    fn should_split_on_every_line_terminator_style() {
        let html = "a\r\nb\rc\nd";
        assert_eq!(
            split_highlighted_html(html).unwrap(),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn should_keep_trailing_empty_line() {
        let html = "<span class=\"t\">a\n</span>";
        let fragments = split_highlighted_html(html).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1], "<span class=\"t\"></span>");
    }

    #[test]
    fn should_fail_on_close_without_open() {
        let html = "a\nb</span>";
        assert_eq!(
            split_highlighted_html(html),
            Err(MalformedMarkupError { line: 1 })
        );
    }

    #[test]
    fn should_skip_self_closing_span_tokens() {
        let html = "<span class=\"x\"/>a\nb";
        let fragments = split_highlighted_html(html).unwrap();
        assert_eq!(fragments[1], "b");
    }

    #[test]
    fn should_not_mistake_other_tags_for_spans() {
        let html = "<spanner>a\nb";
        let fragments = split_highlighted_html(html).unwrap();
        assert_eq!(fragments[1], "b");
    }

    #[test]
    fn should_produce_standalone_fragments_that_reproduce_lines() {
        let text = "first <line>\n  second & more\n\nfourth";
        let html = concat!(
            "<span class=\"source\"><span class=\"comment\">first &lt;line&gt;\n",
            "  second</span> &amp; <span class=\"kw\">more</span>\n",
            "\n",
            "fourth</span>",
        );
        let fragments = split_highlighted_html(html).unwrap();
        let lines = split_lines(text);
        assert_eq!(fragments.len(), lines.len());
        for (fragment, line) in fragments.iter().zip(lines) {
            let parsed = AttributedString::from_html(fragment)
                .unwrap_or_else(|err| panic!("{fragment:?} is not standalone: {err}"));
            assert_eq!(parsed.as_str(), line);
        }
    }

    #[test]
    fn should_track_stack_depth() {
        let mut stack = TagStack::new();
        assert!(stack.is_empty());
        stack.push("<span class=\"a\">");
        stack.push("<span>");
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.replay_prefix(), "<span class=\"a\"><span>");
        assert_eq!(stack.closing_suffix(), "</span></span>");
        assert_eq!(stack.pop().as_deref(), Some("<span>"));
        assert_eq!(stack.len(), 1);
    }
}
