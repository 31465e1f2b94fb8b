//! Companion PDF typesetting via pdflatex and biber.

use crate::tex::TexFile;
use anyhow::{anyhow, bail, Context, Result};
use camino::Utf8Path;
use std::fs::create_dir_all;
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Typesets the companion PDF for one source file. Sources that pull in
/// biblatex get a biber pass followed by a second pdflatex run to resolve
/// their citations.
///
/// # Errors
/// This function returns an error if the output directory cannot be created
/// or any of the invoked tools cannot be spawned or exits with a nonzero
/// status; the error carries the tool's output.
pub fn render_pdf(tex: &TexFile, output_file: &Utf8Path) -> Result<()> {
    let output_dir = output_file
        .parent()
        .ok_or_else(|| anyhow!("{output_file} has no parent directory"))?;
    create_dir_all(output_dir).with_context(|| format!("failed to create {output_dir}"))?;

    run_pdflatex(tex, output_file)?;

    if tex.meta.biblatex {
        run_biber(output_file)?;
        run_pdflatex(tex, output_file)?;
    }

    Ok(())
}

fn run_pdflatex(tex: &TexFile, output_file: &Utf8Path) -> Result<()> {
    let jobname = output_file
        .file_stem()
        .ok_or_else(|| anyhow!("{output_file} has no file name"))?;
    let output_dir = output_file
        .parent()
        .ok_or_else(|| anyhow!("{output_file} has no parent directory"))?;

    let mut child = Command::new("pdflatex")
        .args(["-jobname", jobname])
        .args(["-output-directory", output_dir.as_str()])
        .arg("-shell-escape")
        // Sources may \input from their checkout's include directory.
        .env("TEXINPUTS", "./include:")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to run pdflatex (is it installed?)")?;

    child
        .stdin
        .take()
        .expect("stdin was requested")
        .write_all(tex.content.as_bytes())
        .context("failed to write source to pdflatex")?;

    let output = child
        .wait_with_output()
        .context("failed to wait for pdflatex")?;
    check("pdflatex", &output)
}

fn run_biber(output_file: &Utf8Path) -> Result<()> {
    let output = Command::new("biber")
        .arg(output_file.with_extension("").as_str())
        .output()
        .context("failed to run biber (is it installed?)")?;
    check("biber", &output)
}

fn check(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    // pdflatex reports errors on stdout, so both streams matter.
    bail!(
        "{program} exited with {}:\n{}\n{}",
        output.status,
        String::from_utf8_lossy(&output.stdout).trim(),
        String::from_utf8_lossy(&output.stderr).trim()
    )
}
