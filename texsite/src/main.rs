use anyhow::{anyhow, Context, Result};
use camino::Utf8PathBuf;
use env_logger::Env;
use glob::glob;
use log::info;
use std::fs::{create_dir_all, remove_dir_all, write};
use texsite::{
    copy_static_files, is_outdated, render_pdf, render_template, Config, PageBuilder,
    SyntaxHighlighter, Templates, TexFile, TocBuilder, OUTPUT_FILES_DIR,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Read configuration
    let config = Config::from_env().context("failed to read configuration file")?;

    if config.clean {
        info!("cleaning output root");
        // A missing output root is not an error.
        remove_dir_all(&config.output_dir).ok();
    }

    // Copy static assets (also creates the output root)
    copy_static_files(&config.static_dir, &config.output_dir)
        .context("failed to copy static files")?;

    // Load page templates
    let templates = Templates::load(&config.templates_dir).context("failed to load templates")?;

    // Initialize syntax highlighter for code samples
    let highlighter = SyntaxHighlighter::new(&config.code_theme)
        .context("failed to initialize syntax highlighter")?;

    let page_builder = PageBuilder::new(&templates, &highlighter);

    let output_files_dir = config.output_dir.join(OUTPUT_FILES_DIR);

    // Build the index's table of contents while processing sources
    let mut toc = TocBuilder::new();
    let mut changed = false;

    // Process all TeX sources
    let source_match_pattern: Utf8PathBuf = [config.input_dir.as_str(), "**", "*.tex"]
        .into_iter()
        .collect();

    for entry in glob(source_match_pattern.as_str()).expect("source glob pattern is valid") {
        let entry_path = entry.context("failed to access entry in input directory")?;
        let input_path = Utf8PathBuf::from_path_buf(entry_path)
            .map_err(|path| anyhow!("input path {path:?} is not valid UTF-8"))?;

        (|| -> Result<()> {
            let tex = TexFile::load(
                &input_path,
                &config.input_dir,
                &output_files_dir,
                &config.author,
            )?;

            let html_path = output_files_dir.join(&tex.breadcrumbs).with_extension("html");
            if is_outdated(&html_path, tex.mtime) {
                info!("generating \"{html_path}\"");

                let page = page_builder.build_page(&tex)?;

                let parent = html_path
                    .parent()
                    .expect("generated pages live below the output root");
                create_dir_all(parent)
                    .with_context(|| format!("failed to create {parent}"))?;
                write(&html_path, page)
                    .with_context(|| format!("failed to write {html_path}"))?;

                changed = true;
            }

            let pdf_path = html_path.with_extension("pdf");
            if is_outdated(&pdf_path, tex.mtime) {
                info!("generating \"{pdf_path}\"");
                render_pdf(&tex, &pdf_path)?;
                changed = true;
            }

            toc.add(&tex.breadcrumbs);
            Ok(())
        })()
        .with_context(|| format!("failed to process {input_path}"))?;
    }

    // Regenerate the index only when some page or PDF was (re)built
    if changed {
        info!("generating index");

        let index = render_template(templates.get("index")?, &[("toc", &toc.into_html())]);
        let index_path = config.output_dir.join("index.html");
        write(&index_path, index).with_context(|| format!("failed to write {index_path}"))?;
    }

    Ok(())
}
