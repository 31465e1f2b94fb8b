//! The index page's table of contents.

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt::Write as _;

/// Accumulates the breadcrumbs of generated pages and renders them as the
/// nested table of contents for the index page.
pub struct TocBuilder {
    entries: Vec<Utf8PathBuf>,
}

impl TocBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, breadcrumbs: &Utf8Path) {
        self.entries.push(breadcrumbs.to_owned());
    }

    /// Renders the collected entries. Directories become
    /// `<details open>` groups with their name as the summary, files become
    /// links into the generated `files/` tree; `_` reads as a space in both.
    /// Entries are sorted so the markup does not depend on filesystem
    /// iteration order.
    #[must_use]
    pub fn into_html(self) -> String {
        let mut entries: Vec<Vec<String>> = self
            .entries
            .iter()
            .map(|path| {
                path.components()
                    .map(|component| component.as_str().to_owned())
                    .collect()
            })
            .collect();
        entries.sort();

        format!("<ul id=\"toc\">{}</ul>", render_level(&entries, 0))
    }
}

fn render_level(entries: &[Vec<String>], depth: usize) -> String {
    let mut html = String::from("<ul>");

    let mut i = 0;
    while i < entries.len() {
        let entry = &entries[i];
        if entry.len() == depth + 1 {
            // A page at this level.
            write!(
                html,
                "<li><a href=\"files/{}.html\">{}</a></li>",
                entry.join("/"),
                entry[depth].replace('_', " ")
            )
            .expect("writing to a String cannot fail");
            i += 1;
        } else {
            // A directory: group the entries below it.
            let name = &entry[depth];
            let mut j = i;
            while j < entries.len() && entries[j].len() > depth + 1 && entries[j][depth] == *name {
                j += 1;
            }
            write!(
                html,
                "<details open><summary>{}</summary>{}</details>",
                name.replace('_', " "),
                render_level(&entries[i..j], depth + 1)
            )
            .expect("writing to a String cannot fail");
            i = j;
        }
    }

    html.push_str("</ul>");
    html
}
