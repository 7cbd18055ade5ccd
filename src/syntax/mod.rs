pub mod split;

use std::collections::BTreeMap;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::error::HighlightError;

pub use split::{TagStack, normalize_line_breaks, split_highlighted_html};

/// Extension overrides applied before grammar lookup.
pub const DEFAULT_LANGUAGE_OVERRIDES: &[(&str, &str)] = &[("m", "objc")];

/// Language tags that do not match a grammar's extension or name directly.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("objc", "Objective-C"),
    ("objcpp", "Objective-C++"),
    ("cpp", "C++"),
    ("csharp", "C#"),
    ("shell", "Bourne Again Shell (bash)"),
    ("bash", "Bourne Again Shell (bash)"),
    ("golang", "Go"),
];

/// Per-line HTML fragments for both sides of a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightedLines {
    pub left_lines: Vec<String>,
    pub right_lines: Vec<String>,
}

/// Whole-file highlighter producing classed `<span>` markup
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    language_overrides: BTreeMap<String, String>,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl SyntaxHighlighter {
    /// Create a highlighter; `overrides` map extensions to language tags and
    /// take precedence over the built-in table.
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        let mut language_overrides: BTreeMap<String, String> = DEFAULT_LANGUAGE_OVERRIDES
            .iter()
            .map(|(ext, lang)| (ext.to_string(), lang.to_string()))
            .collect();
        language_overrides.extend(overrides);

        Self {
            syntax_set: two_face::syntax::extra_newlines(),
            language_overrides,
        }
    }

    /// Derive a language tag from the file extension.
    ///
    /// Returns `None` when the tag has no grammar; callers then fall back to
    /// automatic detection.
    pub fn language_for_filename(&self, filename: &str) -> Option<String> {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => "",
        };
        let language = self
            .language_overrides
            .get(ext)
            .map(String::as_str)
            .unwrap_or(ext);

        let resolved = self.syntax_for_language(language).map(|_| language.to_string());
        tracing::debug!(filename, language, resolved = resolved.is_some(), "language lookup");
        resolved
    }

    /// Map extensions not in two-face's syntax set to a known equivalent.
    fn fallback_extension(ext: &str) -> Option<&'static str> {
        match ext {
            "jsx" | "mjs" | "cjs" => Some("js"),
            "hbs" | "handlebars" | "mustache" | "ejs" | "pug" | "jade" | "njk" => Some("html"),
            "mdx" => Some("md"),
            "jsonc" | "json5" | "prisma" => Some("json"),
            "heex" => Some("rb"),
            _ => None,
        }
    }

    /// Resolve a grammar for a language tag using this lookup order:
    /// token (extension or name) -> lowercase token -> alias -> fallback extension.
    fn syntax_for_language(&self, language: &str) -> Option<&SyntaxReference> {
        if language.is_empty() {
            return None;
        }

        if let Some(syntax) = self.syntax_set.find_syntax_by_token(language) {
            return Some(syntax);
        }

        let normalized = language.to_ascii_lowercase();
        if normalized != language
            && let Some(syntax) = self.syntax_set.find_syntax_by_token(&normalized)
        {
            return Some(syntax);
        }

        if let Some((_, name)) = LANGUAGE_ALIASES.iter().find(|(tag, _)| *tag == normalized)
            && let Some(syntax) = self.syntax_set.find_syntax_by_name(name)
        {
            return Some(syntax);
        }

        Self::fallback_extension(&normalized)
            .and_then(|fallback| self.syntax_set.find_syntax_by_extension(fallback))
    }

    /// Guess a grammar from the text itself (shebang, modeline), else plain text.
    fn detect_syntax(&self, text: &str) -> &SyntaxReference {
        text.lines()
            .next()
            .and_then(|line| self.syntax_set.find_syntax_by_first_line(line))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlight a whole text in one pass, so multi-line constructs get
    /// correct context. Spans may cross line breaks.
    pub fn highlight_html(
        &self,
        text: &str,
        language: Option<&str>,
    ) -> Result<String, HighlightError> {
        let syntax = language
            .and_then(|lang| self.syntax_for_language(lang))
            .unwrap_or_else(|| self.detect_syntax(text));

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::Spaced,
        );
        for line in LinesWithEndings::from(text) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }

    /// Highlight both sides of a diff and split each into per-line fragments.
    ///
    /// Both sides use the grammar resolved from `filename`; when there is
    /// none each side is detected on its own.
    pub fn highlight(
        &self,
        left_text: &str,
        right_text: &str,
        filename: &str,
    ) -> Result<HighlightedLines, HighlightError> {
        let language = self.language_for_filename(filename);
        let left_html = self.highlight_html(left_text, language.as_deref())?;
        let right_html = self.highlight_html(right_text, language.as_deref())?;

        Ok(HighlightedLines {
            left_lines: split_highlighted_html(&left_html)?,
            right_lines: split_highlighted_html(&right_html)?,
        })
    }
}
