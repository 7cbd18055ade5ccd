//! Text paired with possibly-overlapping named attribute ranges.
//!
//! An [`AttributedString`] is built from nested `<span>` markup, decorated
//! with extra attributes, and serialized back to markup. Every offset is a
//! character index into the plain text, never a byte index into the HTML.

use std::collections::BTreeSet;
use std::fmt;

use html5gum::{Token, Tokenizer};

use crate::error::{ParseError, RangeError};

/// Half-open character range `start..start + length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: usize,
    pub length: usize,
}

impl Range {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRange {
    pub range: Range,
    pub names: BTreeSet<String>,
}

/// A maximal stretch of text whose effective attribute set is constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run<'a> {
    pub range: Range,
    pub names: BTreeSet<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributedString {
    text: String,
    len: usize,
    ranges: Vec<AttributeRange>,
}

impl AttributedString {
    /// Plain text without any attributes.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            text,
            len,
            ranges: Vec::new(),
        }
    }

    /// Strip markup from `html`, recording one attribute range per matched
    /// open/close pair.
    ///
    /// The attribute name of a pair is its `class` value; tags without a
    /// class use their serialized attribute list instead. Character
    /// references are decoded, so offsets count rendered characters.
    pub fn from_html(html: &str) -> Result<Self, ParseError> {
        let mut text = String::with_capacity(html.len());
        let mut len = 0;
        // (tag name, attribute name, start offset)
        let mut open: Vec<(String, String, usize)> = Vec::new();
        let mut ranges = Vec::new();

        for token_result in Tokenizer::new(html) {
            let token = token_result.map_err(|_| ParseError::Tokenizer)?;

            match token {
                Token::StartTag(tag) => {
                    let name = String::from_utf8_lossy(&tag.name).to_ascii_lowercase();
                    if tag.self_closing || is_void_element(&name) {
                        continue;
                    }
                    let attributes: Vec<(String, String)> = tag
                        .attributes
                        .iter()
                        .map(|(k, v)| {
                            (
                                String::from_utf8_lossy(k).into_owned(),
                                String::from_utf8_lossy(v).into_owned(),
                            )
                        })
                        .collect();
                    open.push((name, tag_signature(&attributes), len));
                }
                Token::EndTag(tag) => {
                    let found = String::from_utf8_lossy(&tag.name).to_ascii_lowercase();
                    match open.pop() {
                        Some((expected, attribute, start)) if expected == found => {
                            if len > start {
                                ranges.push(AttributeRange {
                                    range: Range::new(start, len - start),
                                    names: BTreeSet::from([attribute]),
                                });
                            }
                        }
                        Some((expected, _, _)) => {
                            return Err(ParseError::MismatchedClose {
                                expected,
                                found,
                                offset: len,
                            });
                        }
                        None => {
                            return Err(ParseError::UnexpectedClose {
                                tag: found,
                                offset: len,
                            });
                        }
                    }
                }
                Token::String(chunk) => {
                    let chunk = String::from_utf8_lossy(&chunk);
                    len += chunk.chars().count();
                    text.push_str(&chunk);
                }
                // The tokenizer recovers from sloppy input on its own; nesting is what we check.
                Token::Doctype(_) | Token::Comment(_) | Token::Error(_) => {}
            }
        }

        if let Some((tag, _, _)) = open.pop() {
            return Err(ParseError::Unclosed { tag });
        }

        Ok(Self { text, len, ranges })
    }

    /// The plain text with all markup stripped.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.len
    }

    pub fn ranges(&self) -> &[AttributeRange] {
        &self.ranges
    }

    /// Add `names` to every position inside `range`.
    ///
    /// Purely additive: positions keep whatever they already carried.
    pub fn add_attributes<I, S>(&mut self, range: Range, names: I) -> Result<(), RangeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if range.end() > self.len {
            return Err(RangeError {
                range,
                len: self.len,
            });
        }
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if range.is_empty() || names.is_empty() {
            return Ok(());
        }
        self.ranges.push(AttributeRange { range, names });
        Ok(())
    }

    /// Effective attribute set at `pos`: the union over every covering range.
    pub fn attributes_at(&self, pos: usize) -> BTreeSet<&str> {
        self.ranges
            .iter()
            .filter(|r| r.range.contains(pos))
            .flat_map(|r| r.names.iter().map(String::as_str))
            .collect()
    }

    /// Split the text into maximal runs of identical effective attribute sets.
    pub fn runs(&self) -> Vec<Run<'_>> {
        let mut cuts = BTreeSet::from([0, self.len]);
        for r in &self.ranges {
            cuts.insert(r.range.start);
            cuts.insert(r.range.end());
        }

        let mut runs: Vec<Run<'_>> = Vec::new();
        for (&start, &end) in cuts.iter().zip(cuts.iter().skip(1)) {
            let names = self.attributes_at(start);
            match runs.last_mut() {
                Some(last) if last.names == names => last.range.length += end - start,
                _ => runs.push(Run {
                    range: Range::new(start, end - start),
                    names,
                }),
            }
        }
        runs
    }

    /// Serialize as nested `<span>` markup, one group of spans per run.
    ///
    /// Class names become `class="…"`; attribute-list names are written back
    /// as the attributes they came from.
    pub fn to_html(&self) -> String {
        let mut offsets: Vec<usize> = self.text.char_indices().map(|(i, _)| i).collect();
        offsets.push(self.text.len());

        let mut html = String::with_capacity(self.text.len() * 2);
        for run in self.runs() {
            for name in &run.names {
                push_open_span(&mut html, name);
            }
            push_escaped(
                &mut html,
                &self.text[offsets[run.range.start]..offsets[run.range.end()]],
            );
            for _ in &run.names {
                html.push_str("</span>");
            }
        }
        html
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Attribute name of an open tag. Attribute-list signatures keep their values
/// escaped so they can be written back verbatim.
fn tag_signature(attributes: &[(String, String)]) -> String {
    if let Some((_, class)) = attributes.iter().find(|(key, _)| key == "class") {
        return class.clone();
    }
    attributes
        .iter()
        .map(|(key, value)| format!("{key}=\"{}\"", escape_html(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_attribute_list(name: &str) -> bool {
    name.contains("=\"")
}

fn push_open_span(out: &mut String, name: &str) {
    if name.is_empty() {
        out.push_str("<span>");
    } else if is_attribute_list(name) {
        out.push_str("<span ");
        out.push_str(name);
        out.push('>');
    } else {
        out.push_str("<span class=\"");
        push_escaped(out, name);
        out.push_str("\">");
    }
}

/// Escape text for use in HTML content or a quoted attribute value.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    push_escaped(&mut escaped, text);
    escaped
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
