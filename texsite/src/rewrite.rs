//! Selective rewriting of rendered pages to highlight their code samples.
//!
//! Pandoc leaves code samples as escaped text inside
//! `<pre><code class="…">` blocks. This module scans the finished page as a
//! flat stream of tags and text, copies everything outside those blocks
//! through unchanged, and replaces each block with the backend's rendering
//! of its raw text. The scan deliberately builds no document tree: pages
//! come from a trusted converter, and a single forward pass keeps the
//! rewrite linear in the document size.

use crate::highlight::{HighlightBackend, HighlightError};

/// Rewrites one HTML document, replacing every `<pre>…</pre>` region with
/// the backend's rendering of its raw inner text.
///
/// The language for a region is taken from the second whitespace-separated
/// token of the `class` attribute on its `<code>` tag; this matches the
/// `class="highlight LANG"` convention the templates emit. All scan state is
/// local to the call, so a document with unbalanced tags cannot affect later
/// documents.
///
/// # Errors
/// This function returns an error if:
/// - a `class` attribute on a `<code>` tag has fewer than two tokens
/// - the backend does not recognize a region's language
pub fn highlight_document(
    html: &str,
    backend: &impl HighlightBackend,
) -> Result<String, HighlightError> {
    let mut output = String::with_capacity(html.len());
    let mut code = String::new();
    let mut language = String::new();
    let mut inside_code = false;

    for event in Scanner::new(html) {
        match event {
            Event::Text(text) | Event::Raw(text) => {
                if inside_code {
                    code.push_str(text);
                } else {
                    output.push_str(text);
                }
            }
            Event::Start(tag) => {
                if tag.name == "pre" && !tag.self_closing {
                    if inside_code {
                        // A nested region is not re-entered: its markup is
                        // opaque text until the first matching close.
                        code.push_str(tag.raw);
                    } else {
                        inside_code = true;
                    }
                    continue;
                }

                if tag.name == "code" {
                    if let Some(class) = tag.attr("class") {
                        language = language_token(class)?.to_owned();
                    }
                    if inside_code && !tag.self_closing {
                        // The region's own <code> markup is dropped; only
                        // its class matters.
                        continue;
                    }
                }

                if inside_code {
                    code.push_str(tag.raw);
                } else {
                    emit_start(&mut output, &tag);
                }
            }
            Event::End(tag) => {
                if inside_code {
                    match tag.name.as_str() {
                        "pre" => {
                            inside_code = false;
                            output.push_str(&backend.render(&code, &language, true)?);
                            code.clear();
                            language.clear();
                        }
                        "code" => {}
                        _ => code.push_str(tag.raw),
                    }
                } else {
                    output.push_str("</");
                    output.push_str(&tag.name);
                    output.push('>');
                }
            }
        }
    }

    Ok(output)
}

/// Extracts the language identifier from a `<code>` class attribute: always
/// the second whitespace-separated token, per the template convention.
fn language_token(class: &str) -> Result<&str, HighlightError> {
    class
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| HighlightError::MalformedClass(class.into()))
}

/// Re-serializes a start tag with double-quoted attribute values. Attribute
/// order is preserved; names were lowercased by the scanner.
fn emit_start(output: &mut String, tag: &StartTag<'_>) {
    output.push('<');
    output.push_str(&tag.name);
    for (name, value) in &tag.attrs {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        output.push_str(value);
        output.push('"');
    }
    if tag.self_closing {
        output.push('/');
    }
    output.push('>');
}

enum Event<'a> {
    /// Character data between tags, as written (entities are not decoded).
    Text(&'a str),
    /// A comment, doctype, or processing instruction, as written.
    Raw(&'a str),
    Start(StartTag<'a>),
    End(EndTag<'a>),
}

struct StartTag<'a> {
    /// Lowercased tag name.
    name: String,
    /// Lowercased attribute names with values as written, in source order.
    /// Valueless attributes carry an empty value.
    attrs: Vec<(String, &'a str)>,
    self_closing: bool,
    /// The tag's source text, `<` through `>`.
    raw: &'a str,
}

impl<'a> StartTag<'a> {
    fn attr(&self, name: &str) -> Option<&'a str> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|&(_, value)| value)
    }
}

struct EndTag<'a> {
    /// Lowercased tag name.
    name: String,
    /// The tag's source text, `<` through `>`.
    raw: &'a str,
}

/// A forward-only tag/text tokenizer over one document.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn scan_start_tag(&mut self, rest: &'a str) -> Event<'a> {
        let bytes = rest.as_bytes();
        let mut i = 1;

        while i < bytes.len()
            && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b':')
        {
            i += 1;
        }
        if i == 1 {
            // `<` followed by no tag name is character data.
            let end = rest[1..].find('<').map_or(rest.len(), |j| j + 1);
            self.pos += end;
            return Event::Text(&rest[..end]);
        }
        let name = rest[1..i].to_ascii_lowercase();

        let mut attrs = Vec::new();
        let mut self_closing = false;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    if bytes.get(i + 1) == Some(&b'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                _ => {
                    let name_start = i;
                    while i < bytes.len()
                        && !bytes[i].is_ascii_whitespace()
                        && !matches!(bytes[i], b'=' | b'>' | b'/')
                    {
                        i += 1;
                    }
                    let attr_name = rest[name_start..i].to_ascii_lowercase();

                    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    let value = if bytes.get(i) == Some(&b'=') {
                        i += 1;
                        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                            i += 1;
                        }
                        if matches!(bytes.get(i), Some(&b'"') | Some(&b'\'')) {
                            let quote = bytes[i];
                            i += 1;
                            let value_start = i;
                            while i < bytes.len() && bytes[i] != quote {
                                i += 1;
                            }
                            let value = &rest[value_start..i];
                            if i < bytes.len() {
                                i += 1;
                            }
                            value
                        } else {
                            let value_start = i;
                            while i < bytes.len()
                                && !bytes[i].is_ascii_whitespace()
                                && bytes[i] != b'>'
                            {
                                i += 1;
                            }
                            &rest[value_start..i]
                        }
                    } else {
                        ""
                    };
                    attrs.push((attr_name, value));
                }
            }
        }

        let raw = &rest[..i];
        self.pos += i;
        Event::Start(StartTag {
            name,
            attrs,
            self_closing,
            raw,
        })
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            return None;
        }

        if !rest.starts_with('<') {
            let end = rest.find('<').unwrap_or(rest.len());
            self.pos += end;
            return Some(Event::Text(&rest[..end]));
        }

        if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |i| i + 3);
            self.pos += end;
            return Some(Event::Raw(&rest[..end]));
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            self.pos += end;
            return Some(Event::Raw(&rest[..end]));
        }

        if let Some(after) = rest.strip_prefix("</") {
            let Some(close) = after.find('>') else {
                // Unterminated close tag at end of input is character data.
                self.pos += rest.len();
                return Some(Event::Text(rest));
            };
            let end = close + 3;
            let name = rest[2..end - 1].trim().to_ascii_lowercase();
            self.pos += end;
            return Some(Event::End(EndTag {
                name,
                raw: &rest[..end],
            }));
        }

        Some(self.scan_start_tag(rest))
    }
}

#[cfg(test)]
mod test {
    use super::highlight_document;
    use crate::highlight::{HighlightBackend, HighlightError, SyntaxHighlighter};
    use std::cell::RefCell;

    /// Records every render call and returns a recognizable marker.
    #[derive(Default)]
    struct StubBackend {
        calls: RefCell<Vec<(String, String, bool)>>,
    }

    impl HighlightBackend for StubBackend {
        fn render(
            &self,
            code: &str,
            language: &str,
            line_numbers: bool,
        ) -> Result<String, HighlightError> {
            self.calls
                .borrow_mut()
                .push((code.to_owned(), language.to_owned(), line_numbers));
            Ok(format!("[{language}|{code}]"))
        }
    }

    #[test]
    fn identity_without_code_blocks() {
        let backend = StubBackend::default();
        let html = "<!DOCTYPE html><p>hi <a href=\"x\" class=\"y\">there</a> &amp; more</p>\
                    <!-- note --><br/><p></p>";

        assert_eq!(
            highlight_document(html, &backend).expect("rewrite should succeed"),
            html,
            "a document without code blocks should pass through unchanged"
        );
        assert!(
            backend.calls.borrow().is_empty(),
            "the backend should not run on a document without code blocks"
        );
    }

    #[test]
    fn attribute_quoting_is_normalized() {
        let backend = StubBackend::default();

        assert_eq!(
            highlight_document("<a href='x' rel=next disabled>y</a>", &backend)
                .expect("rewrite should succeed"),
            "<a href=\"x\" rel=\"next\" disabled=\"\">y</a>",
            "attribute order should be kept and values double-quoted"
        );
    }

    #[test]
    fn single_code_block() {
        let highlighter =
            SyntaxHighlighter::new("InspiredGitHub").expect("default theme should exist");

        let html = "<p>hi</p><pre><code class=\"highlight python\">x=1</code></pre><p>bye</p>";
        let output = highlight_document(html, &highlighter).expect("rewrite should succeed");

        assert!(output.starts_with("<p>hi</p>"), "prefix should survive: {output}");
        assert!(output.ends_with("<p>bye</p>"), "suffix should survive: {output}");
        assert!(
            output.contains("highlighttable"),
            "block should be replaced by a highlighted rendering: {output}"
        );
        assert!(
            !output.contains("<pre>"),
            "the original <pre> markup should be consumed: {output}"
        );
    }

    #[test]
    fn language_is_second_class_token() {
        let backend = StubBackend::default();
        highlight_document("<pre><code class=\"foo bar\">a</code></pre>", &backend)
            .expect("rewrite should succeed");
        highlight_document("<pre><code class=\"x y z\">b</code></pre>", &backend)
            .expect("rewrite should succeed");

        let calls = backend.calls.borrow();
        assert_eq!(calls[0].1, "bar");
        assert_eq!(calls[1].1, "y", "the language is the second token, never the last");
    }

    #[test]
    fn multiple_blocks_are_independent() {
        let backend = StubBackend::default();
        let html = "<pre><code class=\"a lang1\">one</code></pre>\
                    <p>mid</p>\
                    <pre><code class=\"b lang2\">two</code></pre>";

        let output = highlight_document(html, &backend).expect("rewrite should succeed");

        assert_eq!(output, "[lang1|one]<p>mid</p>[lang2|two]");
        let calls = backend.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            (calls[0].0.as_str(), calls[0].1.as_str()),
            ("one", "lang1"),
            "the first block's code and language should not leak into the second"
        );
        assert_eq!((calls[1].0.as_str(), calls[1].1.as_str()), ("two", "lang2"));
    }

    #[test]
    fn line_numbers_are_requested() {
        let backend = StubBackend::default();
        highlight_document("<pre><code class=\"h rust\">x</code></pre>", &backend)
            .expect("rewrite should succeed");

        assert!(
            backend.calls.borrow()[0].2,
            "every block should be rendered with line numbers"
        );
    }

    #[test]
    fn malformed_class_fails_closed() {
        let backend = StubBackend::default();

        assert!(
            matches!(
                highlight_document("<pre><code class=\"onlyone\">x</code></pre>", &backend),
                Err(HighlightError::MalformedClass(_))
            ),
            "a single-token class should be rejected, not defaulted"
        );
        assert!(
            backend.calls.borrow().is_empty(),
            "the backend should not run for a malformed block"
        );
    }

    #[test]
    fn markup_inside_block_is_opaque() {
        let backend = StubBackend::default();
        let html = "<pre><code class=\"h rust\">let x = 1; <span>y</span> &lt;z&gt;</code></pre>";

        highlight_document(html, &backend).expect("rewrite should succeed");

        assert_eq!(
            backend.calls.borrow()[0].0, "let x = 1; <span>y</span> &lt;z&gt;",
            "tags and entities inside a block are literal text, while the \
             block's own <code> markup is dropped"
        );
    }

    #[test]
    fn nested_pre_is_opaque_until_first_close() {
        let backend = StubBackend::default();
        let html = "<pre><code class=\"h rust\">a <pre>b</pre><p>after</p>";

        let output = highlight_document(html, &backend).expect("rewrite should succeed");

        assert_eq!(
            backend.calls.borrow()[0].0, "a <pre>b",
            "a nested <pre> start tag should be captured as text and the \
             first close should end the region"
        );
        assert!(output.ends_with("<p>after</p>"));
    }

    #[test]
    fn code_class_outside_pre_still_selects_language() {
        let backend = StubBackend::default();
        // The class of a bare <code> is inspected even though it never opens
        // a region; the language then applies to the next <pre> block.
        let html = "<code class=\"a b\">x</code><pre>y</pre>";

        let output = highlight_document(html, &backend).expect("rewrite should succeed");

        assert!(
            output.starts_with("<code class=\"a b\">x</code>"),
            "a bare <code> passes through unchanged: {output}"
        );
        assert_eq!(backend.calls.borrow()[0].1, "b");
    }

    #[test]
    fn unsupported_language_aborts() {
        let highlighter =
            SyntaxHighlighter::new("InspiredGitHub").expect("default theme should exist");

        assert!(
            matches!(
                highlight_document(
                    "<pre><code class=\"h klingon\">x</code></pre>",
                    &highlighter
                ),
                Err(HighlightError::UnsupportedLanguage(_))
            ),
            "an unknown language should abort the document, not degrade to plain text"
        );
    }
}
