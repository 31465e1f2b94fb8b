mod builder;
mod config;
mod convert;
mod highlight;
mod pdf;
mod rewrite;
mod template;
mod tex;
mod toc;

pub use builder::PageBuilder;
pub use config::Config;
pub use convert::tex_to_html;
pub use highlight::{HighlightBackend, HighlightError, SyntaxHighlighter};
pub use pdf::render_pdf;
pub use rewrite::highlight_document;
pub use template::{render_template, Templates};
pub use tex::{TexFile, TexMetadata};
pub use toc::TocBuilder;

/// Subdirectory of the output root holding the generated pages and PDFs.
pub const OUTPUT_FILES_DIR: &str = "files";

/// URL handed to pandoc for rendering math markup; points at the vendored
/// MathJax distribution under the static assets (see the `mathjax-dl` crate).
pub const MATHJAX_JS: &str = "static/mathjax/es5/tex-mml-chtml.js";

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use log::info;
use std::{fs, time::SystemTime};
use walkdir::WalkDir;

/// Whether `output` is missing or older than the source it is generated
/// from.
#[must_use]
pub fn is_outdated(output: &Utf8Path, source_mtime: SystemTime) -> bool {
    match fs::metadata(output).and_then(|meta| meta.modified()) {
        Ok(mtime) => mtime < source_mtime,
        Err(_) => true,
    }
}

/// Copies the static assets into the output root, creating it if needed.
/// Files whose destination already exists are left alone, so hand-tuned or
/// vendored assets survive rebuilds.
///
/// # Errors
/// This function returns an error if the static directory cannot be
/// traversed or a file cannot be copied to its destination.
pub fn copy_static_files(static_dir: &Utf8Path, output_dir: &Utf8Path) -> Result<()> {
    for entry in WalkDir::new(static_dir) {
        let entry = entry.context("failed to access entry in static directory")?;
        let path = Utf8Path::from_path(entry.path())
            .ok_or_else(|| anyhow!("static path {:?} is not valid UTF-8", entry.path()))?;

        let dest = output_dir.join(
            path.strip_prefix(static_dir)
                .expect("walked paths stay under the walk root"),
        );

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).with_context(|| format!("failed to create {dest}"))?;
        } else if !dest.exists() {
            info!("copying \"{path}\" to \"{dest}\"");
            fs::copy(path, &dest)
                .with_context(|| format!("failed to copy {path} to {dest}"))?;
        }
    }

    Ok(())
}
