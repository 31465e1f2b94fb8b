//! TeX to HTML conversion by shelling out to pandoc.

use crate::MATHJAX_JS;
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Converts one expanded TeX source to an HTML body fragment.
///
/// # Errors
/// This function returns an error if pandoc cannot be spawned or exits with
/// a nonzero status; the error carries pandoc's stderr.
pub fn tex_to_html(content: &str) -> Result<String> {
    let mut child = Command::new("pandoc")
        .arg(format!("--mathjax={MATHJAX_JS}"))
        .args(["-f", "latex", "-t", "html", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to run pandoc (is it installed?)")?;

    child
        .stdin
        .take()
        .expect("stdin was requested")
        .write_all(content.as_bytes())
        .context("failed to write source to pandoc")?;

    let output = child
        .wait_with_output()
        .context("failed to wait for pandoc")?;

    if !output.status.success() {
        bail!(
            "pandoc exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    String::from_utf8(output.stdout).context("pandoc emitted invalid UTF-8")
}
