//! Page templates: loading and `${variable}` substitution.

use aho_corasick::{AhoCorasick, MatchKind};
use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use foldhash::{HashMap, HashMapExt};
use glob::glob;
use std::fs::read_to_string;

/// The site's page templates, keyed by file stem. A page's template is
/// selected by its document class, so a source declaring
/// `\documentclass{report}` renders through `report.html`.
pub struct Templates {
    templates: HashMap<String, String>,
}

impl Templates {
    /// Loads every `*.html` file in `dir`.
    ///
    /// # Errors
    /// This function returns an error if the directory cannot be traversed
    /// or a template cannot be read.
    pub fn load(dir: &Utf8Path) -> Result<Self> {
        let mut templates = HashMap::new();

        let pattern = dir.join("*.html");
        for entry in glob(pattern.as_str()).expect("template glob pattern is valid") {
            let path = entry.context("failed to access entry in templates directory")?;
            let path = Utf8PathBuf::from_path_buf(path)
                .map_err(|path| anyhow!("template path {path:?} is not valid UTF-8"))?;

            let stem = path
                .file_stem()
                .ok_or_else(|| anyhow!("template {path} has no file name"))?;
            let text = read_to_string(&path)
                .with_context(|| format!("failed to read template {path}"))?;

            templates.insert(stem.to_owned(), text);
        }

        Ok(Self { templates })
    }

    /// # Errors
    /// This function returns an error naming the expected file if no loaded
    /// template has the given name.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("no template named \"{name}.html\""))
    }
}

/// Replaces every `${name}` placeholder with its bound value in one pass
/// over the template. Placeholders without a binding are left intact, and
/// substituted values are never re-scanned.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let patterns: Vec<String> = vars
        .iter()
        .map(|(name, _)| format!("${{{name}}}"))
        .collect();
    let replacements: Vec<&str> = vars.iter().map(|&(_, value)| value).collect();

    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(&patterns)
        .expect("placeholder patterns are valid")
        .replace_all(template, &replacements)
}

#[cfg(test)]
mod test {
    use super::render_template;

    #[test]
    fn substitution() {
        assert_eq!(
            render_template(
                "<h1>${title}</h1><p>${title} by ${author}</p>",
                &[("title", "Notes"), ("author", "Me")]
            ),
            "<h1>Notes</h1><p>Notes by Me</p>",
            "every occurrence of a placeholder should be replaced"
        );
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        assert_eq!(
            render_template("${title} ${mystery}", &[("title", "x")]),
            "x ${mystery}"
        );
    }

    #[test]
    fn values_are_not_rescanned() {
        assert_eq!(
            render_template("${a}${b}", &[("a", "${b}"), ("b", "2")]),
            "${b}2",
            "a substituted value containing a placeholder should be left alone"
        );
    }

    #[test]
    fn no_vars() {
        assert_eq!(render_template("as-is", &[]), "as-is");
    }
}
