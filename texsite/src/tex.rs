//! TeX source files: metadata extraction and site macro expansion.

use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use jiff::Zoned;
use lazy_static::lazy_static;
use regex::Regex;
use std::{fs, time::SystemTime};

lazy_static! {
    static ref BABEL: Regex =
        Regex::new(r"\\usepackage\[(.*)\]\{babel\}").expect("hard-coded pattern should compile");
    static ref TITLE: Regex =
        Regex::new(r"\\title\{(.*)\}").expect("hard-coded pattern should compile");
    static ref AUTHOR: Regex =
        Regex::new(r"\\author\{(.*)\}").expect("hard-coded pattern should compile");
    static ref DATE: Regex =
        Regex::new(r"\\date\{(.*)\}").expect("hard-coded pattern should compile");
    static ref DOCUMENT_CLASS: Regex =
        Regex::new(r"\\documentclass\{(.*)\}").expect("hard-coded pattern should compile");
    static ref BIBLATEX: Regex = Regex::new(r"\\usepackage(\[.*\])?\{biblatex\}")
        .expect("hard-coded pattern should compile");
}

/// Document metadata recovered from the TeX preamble. Every field falls back
/// to a sensible default when the source does not declare it.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct TexMetadata {
    /// Babel language, `english` if undeclared. Drives the labels on the
    /// generated page.
    pub lang: String,
    pub title: String,
    pub author: String,
    pub date: String,
    /// Selects the HTML template for the page.
    pub document_class: String,
    /// Whether the source pulls in biblatex, which requires a biber pass
    /// when typesetting the companion PDF.
    pub biblatex: bool,
}

impl TexMetadata {
    fn extract(source: &str, fallback_title: &str, default_author: &str) -> Self {
        let capture = |re: &Regex| {
            re.captures(source)
                .and_then(|captures| captures.get(1))
                .map(|group| group.as_str().to_owned())
        };

        Self {
            lang: capture(&BABEL).unwrap_or_else(|| "english".to_owned()),
            title: capture(&TITLE).unwrap_or_else(|| fallback_title.replace('_', " ")),
            author: capture(&AUTHOR).unwrap_or_else(|| default_author.to_owned()),
            date: capture(&DATE)
                .unwrap_or_else(|| Zoned::now().strftime("%d/%m/%Y").to_string()),
            document_class: capture(&DOCUMENT_CLASS).unwrap_or_else(|| "article".to_owned()),
            biblatex: BIBLATEX.is_match(source),
        }
    }
}

/// One TeX source file, read and prepared for conversion.
pub struct TexFile {
    /// Input-relative path with the extension stripped; names the output
    /// file locations and the entry in the table of contents.
    pub breadcrumbs: Utf8PathBuf,
    /// `breadcrumbs` with `_` spelled as a space and `/` as ` > `.
    pub pretty_breadcrumbs: String,
    /// Source text with the site macros expanded.
    pub content: String,
    pub mtime: SystemTime,
    pub meta: TexMetadata,
}

impl TexFile {
    /// Reads and prepares one source file.
    ///
    /// # Errors
    /// This function returns an error if:
    /// - the file cannot be read or its modification time queried
    /// - the file path does not live under `input_root`
    pub fn load(
        input_file: &Utf8Path,
        input_root: &Utf8Path,
        output_files_dir: &Utf8Path,
        default_author: &str,
    ) -> Result<Self> {
        let raw = fs::read_to_string(input_file)
            .with_context(|| format!("failed to read {input_file}"))?;

        let mtime = fs::metadata(input_file)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("failed to read modification time of {input_file}"))?;

        let breadcrumbs = input_file
            .strip_prefix(input_root)
            .with_context(|| format!("{input_file} is not under the input root {input_root}"))?
            .with_extension("");

        let pretty_breadcrumbs = breadcrumbs.as_str().replace('_', " ").replace('/', " > ");

        let fallback_title = breadcrumbs
            .file_name()
            .ok_or_else(|| anyhow!("{input_file} has no file name"))?;
        let meta = TexMetadata::extract(&raw, fallback_title, default_author);

        let outdir = output_files_dir
            .join(&breadcrumbs)
            .parent()
            .map(Utf8Path::to_owned)
            .unwrap_or_default();
        let content = expand_macros(&raw, &pretty_breadcrumbs, outdir.as_str());

        Ok(Self {
            breadcrumbs,
            pretty_breadcrumbs,
            content,
            mtime,
            meta,
        })
    }
}

/// Expands the site macros a source may reference: `\breadcrumbs` becomes
/// the pretty breadcrumbs (with `>` spelled so TeX can typeset it) and
/// `\outdir` the directory the file's outputs land in, for sources that
/// reference generated assets.
fn expand_macros(raw: &str, pretty_breadcrumbs: &str, outdir: &str) -> String {
    let breadcrumbs = pretty_breadcrumbs.replace('>', r"\textgreater\hspace{1pt}");
    raw.replace(r"\breadcrumbs", &breadcrumbs)
        .replace(r"\outdir", outdir)
}

#[cfg(test)]
mod test {
    use super::{expand_macros, TexMetadata};

    #[test]
    fn full_preamble() {
        let source = "\\documentclass{report}\n\
                      \\usepackage[portuguese]{babel}\n\
                      \\usepackage[backend=biber]{biblatex}\n\
                      \\title{Minha Ficha}\n\
                      \\author{Fulano}\n\
                      \\date{01/02/2020}\n\
                      \\begin{document}\\end{document}";

        assert_eq!(
            TexMetadata::extract(source, "some_file", "Base Author"),
            TexMetadata {
                lang: "portuguese".to_owned(),
                title: "Minha Ficha".to_owned(),
                author: "Fulano".to_owned(),
                date: "01/02/2020".to_owned(),
                document_class: "report".to_owned(),
                biblatex: true,
            }
        );
    }

    #[test]
    fn defaults() {
        let meta = TexMetadata::extract("\\begin{document}\\end{document}", "my_note", "Base");

        assert_eq!(meta.lang, "english");
        assert_eq!(meta.title, "my note", "fallback title comes from the file name");
        assert_eq!(meta.author, "Base");
        assert_eq!(meta.document_class, "article");
        assert!(!meta.biblatex);
        assert!(!meta.date.is_empty(), "missing \\date falls back to today");
    }

    #[test]
    fn biblatex_without_options() {
        let meta = TexMetadata::extract("\\usepackage{biblatex}", "x", "y");
        assert!(meta.biblatex);
    }

    #[test]
    fn first_match_wins() {
        let source = "\\title{First}\n\\title{Second}";
        assert_eq!(TexMetadata::extract(source, "x", "y").title, "First");
    }

    #[test]
    fn macro_expansion() {
        let expanded = expand_macros(
            "see \\breadcrumbs in \\outdir",
            "math > calculus",
            "output/files/math",
        );

        assert_eq!(
            expanded,
            "see math \\textgreater\\hspace{1pt} calculus in output/files/math"
        );
    }

    #[test]
    fn sources_without_macros_are_unchanged() {
        assert_eq!(expand_macros("plain text", "a > b", "out"), "plain text");
    }
}
