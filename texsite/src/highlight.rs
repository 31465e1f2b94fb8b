//! Utility for highlighting code samples in generated pages as styled HTML.

use anyhow::{anyhow, Result};
use syntect::{
    highlighting::{Theme, ThemeSet},
    html::highlighted_html_for_string,
    parsing::SyntaxSet,
};
use thiserror::Error;

/// Failure modes of the highlighting step.
///
/// Pages are generated from a controlled template/converter pipeline, so any
/// of these indicates a broken source file or template rather than bad user
/// input. Callers abort generation of the current page instead of emitting
/// partially-highlighted output.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("no syntax could be found for the language {0:?}")]
    UnsupportedLanguage(Box<str>),
    #[error("code block class {0:?} does not carry a language token")]
    MalformedClass(Box<str>),
    #[error("failed to render highlighted HTML")]
    Render(#[from] syntect::Error),
}

/// A source of highlighted markup for raw code text.
///
/// [`highlight_document`](crate::rewrite::highlight_document) is written
/// against this trait so the scanning logic can be exercised without pulling
/// in a real syntax library.
pub trait HighlightBackend {
    /// Renders `code` as an HTML fragment highlighted for `language`,
    /// optionally decorated with a line-number gutter.
    ///
    /// # Errors
    /// Returns an error if `language` names no known syntax. There is no
    /// plain-text fallback: an unknown language must fail loudly.
    fn render(&self, code: &str, language: &str, line_numbers: bool)
        -> Result<String, HighlightError>;
}

pub struct SyntaxHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl SyntaxHighlighter {
    /// Initializes a utility to add syntax highlighting to code.
    /// The current implementation uses the `syntect` crate.
    ///
    /// # Errors
    /// This function returns an error if the default theme set of `syntect`
    /// does not contain a theme with the provided name.
    pub fn new(theme: &str) -> Result<Self> {
        let syntaxes = SyntaxSet::load_defaults_newlines();

        // To obtain an owned `Theme`, we call `BTreeMap::remove()` instead of `BTreeMap::get()`.
        // This is fine because we don't care about the entire `ThemeSet`.
        let theme = ThemeSet::load_defaults()
            .themes
            .remove(theme)
            .ok_or_else(|| anyhow!("default theme set does not include {theme:?}"))?;

        Ok(Self { syntaxes, theme })
    }
}

impl HighlightBackend for SyntaxHighlighter {
    fn render(
        &self,
        code: &str,
        language: &str,
        line_numbers: bool,
    ) -> Result<String, HighlightError> {
        let syntax = self
            .syntaxes
            .find_syntax_by_token(language)
            .ok_or_else(|| HighlightError::UnsupportedLanguage(language.into()))?;

        let body = highlighted_html_for_string(code, &self.syntaxes, syntax, &self.theme)?;

        if line_numbers {
            Ok(number_lines(code, &body))
        } else {
            Ok(body)
        }
    }
}

/// Wraps a highlighted code cell in a two-cell table with a line-number
/// gutter. Every emitted `pre` start tag carries an attribute, so the result
/// never contains a bare `<pre>`.
fn number_lines(code: &str, body: &str) -> String {
    let count = code.lines().count().max(1);

    let mut gutter = String::new();
    for n in 1..=count {
        if n > 1 {
            gutter.push('\n');
        }
        gutter.push_str(&n.to_string());
    }

    format!(
        "<table class=\"highlighttable\"><tr>\
         <td class=\"linenos\"><pre class=\"linenodiv\">{gutter}</pre></td>\
         <td class=\"code\">{body}</td>\
         </tr></table>"
    )
}

#[cfg(test)]
mod test {
    use super::{HighlightBackend, HighlightError, SyntaxHighlighter};

    #[test]
    fn unknown_theme() {
        assert!(
            SyntaxHighlighter::new("no-such-theme").is_err(),
            "initialization should fail for a theme missing from the default set"
        );
    }

    #[test]
    fn syntax_highlighting() {
        let highlighter =
            SyntaxHighlighter::new("InspiredGitHub").expect("default theme should exist");

        assert!(
            highlighter
                .render("const FOO: usize = 42;", "rust", true)
                .is_ok(),
            "name-based syntax detection and highlighting should succeed"
        );
        assert!(
            highlighter
                .render("const FOO: usize = 42;", "rs", true)
                .is_ok(),
            "extension-based syntax detection and highlighting should succeed"
        );
        assert!(
            matches!(
                highlighter.render("", "klingon", true),
                Err(HighlightError::UnsupportedLanguage(_))
            ),
            "syntax detection for non-existent language should fail"
        );
        assert!(
            matches!(
                highlighter.render("x = 1", "", true),
                Err(HighlightError::UnsupportedLanguage(_))
            ),
            "the empty language should fail like any other unknown language"
        );
    }

    #[test]
    fn line_number_gutter() {
        let highlighter =
            SyntaxHighlighter::new("InspiredGitHub").expect("default theme should exist");

        let html = highlighter
            .render("x = 1\ny = 2\nz = 3", "python", true)
            .expect("highlighting should succeed");

        assert!(
            html.contains(">1\n2\n3</pre>"),
            "gutter should number each source line: {html}"
        );
        assert!(
            !html.contains("<pre>"),
            "rendering should never contain a bare <pre>: {html}"
        );

        let plain = highlighter
            .render("x = 1", "python", false)
            .expect("highlighting should succeed");
        assert!(
            !plain.contains("highlighttable"),
            "gutter table should only be emitted when line numbers are requested"
        );
    }

    #[test]
    fn single_line_gutter() {
        let highlighter =
            SyntaxHighlighter::new("InspiredGitHub").expect("default theme should exist");

        let html = highlighter
            .render("", "python", true)
            .expect("highlighting empty code should succeed");
        assert!(
            html.contains(">1</pre>"),
            "empty code should still render one gutter line: {html}"
        );
    }
}
