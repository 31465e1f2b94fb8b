//! Code for building complete HTML pages from TeX sources.

use crate::convert::tex_to_html;
use crate::highlight::SyntaxHighlighter;
use crate::rewrite::highlight_document;
use crate::template::{render_template, Templates};
use crate::tex::TexFile;
use anyhow::{Context, Result};
use camino::Utf8Path;

pub struct PageBuilder<'a> {
    templates: &'a Templates,
    highlighter: &'a SyntaxHighlighter,
}

impl<'a> PageBuilder<'a> {
    #[must_use]
    pub fn new(templates: &'a Templates, highlighter: &'a SyntaxHighlighter) -> Self {
        Self {
            templates,
            highlighter,
        }
    }

    /// Builds the finished page for one source file: converts the source to
    /// an HTML body, fills the template named by the document class, and
    /// highlights the code samples of the assembled page.
    ///
    /// # Errors
    /// This function returns an error if:
    /// - the conversion to HTML fails
    /// - no template matches the source's document class
    /// - a code sample cannot be highlighted
    pub fn build_page(&self, tex: &TexFile) -> Result<String> {
        let body = tex_to_html(&tex.content).context("failed to convert source to HTML")?;

        let template = self.templates.get(&tex.meta.document_class)?;

        let (lang_title, lang_author, lang_date) = labels(&tex.meta.lang);
        let pdf = format!(
            "{}.pdf",
            tex.breadcrumbs
                .file_name()
                .expect("breadcrumbs carry a file name")
        );
        let root = root_prefix(&tex.breadcrumbs);

        let page = render_template(
            template,
            &[
                ("lang_title", lang_title),
                ("lang_author", lang_author),
                ("lang_date", lang_date),
                ("title", &tex.meta.title),
                ("date", &tex.meta.date),
                ("author", &tex.meta.author),
                ("breadcrumbs", &tex.pretty_breadcrumbs),
                ("pdf", &pdf),
                ("root", &root),
                ("body", &body),
            ],
        );

        highlight_document(&page, self.highlighter).context("failed to highlight code samples")
    }
}

/// Metadata labels for the page, localized by the source's babel language.
fn labels(lang: &str) -> (&'static str, &'static str, &'static str) {
    if lang == "portuguese" {
        ("Título", "Autor", "Data da Ficha")
    } else {
        ("Title", "Author", "Report Date")
    }
}

/// Relative path from a generated page back to the site root: one `..` per
/// directory level below `files/`.
fn root_prefix(breadcrumbs: &Utf8Path) -> String {
    let depth = breadcrumbs.components().count();
    vec![".."; depth].join("/")
}

#[cfg(test)]
mod test {
    use super::{labels, root_prefix};
    use camino::Utf8Path;

    #[test]
    fn label_localization() {
        assert_eq!(labels("portuguese"), ("Título", "Autor", "Data da Ficha"));
        assert_eq!(labels("english"), ("Title", "Author", "Report Date"));
        assert_eq!(
            labels("german"),
            ("Title", "Author", "Report Date"),
            "any language other than portuguese falls back to English labels"
        );
    }

    #[test]
    fn root_climbs_one_level_per_directory() {
        assert_eq!(root_prefix(Utf8Path::new("note")), "..");
        assert_eq!(root_prefix(Utf8Path::new("math/calculus")), "../..");
        assert_eq!(root_prefix(Utf8Path::new("a/b/c")), "../../..");
    }
}
