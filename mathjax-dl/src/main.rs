use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use reqwest::Client;
use std::env::args;
use std::fs::{create_dir_all, write};
use std::time::Duration;

const VERSION: &str = "3.2.2";
const BASE_URL: &str = "https://cdn.jsdelivr.net/npm/mathjax@";

/// The combined TeX + MathML input, CommonHTML output bundle the generated
/// pages load.
const BUNDLE: &str = "es5/tex-mml-chtml.js";

/// Web fonts the CommonHTML output requests at runtime.
const FONTS_DIR: &str = "es5/output/chtml/fonts/woff-v2";
const FONTS: [&str; 23] = [
    "MathJax_AMS-Regular.woff",
    "MathJax_Calligraphic-Bold.woff",
    "MathJax_Calligraphic-Regular.woff",
    "MathJax_Fraktur-Bold.woff",
    "MathJax_Fraktur-Regular.woff",
    "MathJax_Main-Bold.woff",
    "MathJax_Main-Italic.woff",
    "MathJax_Main-Regular.woff",
    "MathJax_Math-BoldItalic.woff",
    "MathJax_Math-Italic.woff",
    "MathJax_Math-Regular.woff",
    "MathJax_SansSerif-Bold.woff",
    "MathJax_SansSerif-Italic.woff",
    "MathJax_SansSerif-Regular.woff",
    "MathJax_Script-Regular.woff",
    "MathJax_Size1-Regular.woff",
    "MathJax_Size2-Regular.woff",
    "MathJax_Size3-Regular.woff",
    "MathJax_Size4-Regular.woff",
    "MathJax_Typewriter-Regular.woff",
    "MathJax_Vector-Bold.woff",
    "MathJax_Vector-Regular.woff",
    "MathJax_Zero.woff",
];

#[tokio::main]
async fn main() -> Result<()> {
    let target = args()
        .nth(1)
        .map(Utf8PathBuf::from)
        .ok_or_else(|| anyhow!("target directory was not provided"))?;

    let client = Client::builder()
        .https_only(true)
        .timeout(Duration::from_secs(15))
        .use_rustls_tls()
        .build()
        .context("failed to build HTTP client")?;

    let base = format!("{BASE_URL}{VERSION}/");

    let bundle_url = format!("{base}{BUNDLE}");
    let bundle = fetch(&client, &bundle_url).await?;
    let bundle = String::from_utf8(bundle).context("bundle is not valid UTF-8")?;

    // The bundle embeds its own version; check that the CDN pinned the one
    // we asked for instead of silently serving another.
    let served = Regex::new(r#"version[:=]\s*"([0-9.]+)""#)
        .expect("hard-coded pattern should compile")
        .captures(&bundle)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().to_owned())
        .ok_or_else(|| anyhow!("no version marker found in {bundle_url}"))?;
    if served != VERSION {
        return Err(anyhow!("CDN served MathJax {served}, expected {VERSION}"));
    }

    save(&target.join(BUNDLE), bundle.as_bytes())?;

    for font in FONTS {
        let url = format!("{base}{FONTS_DIR}/{font}");
        let bytes = fetch(&client, &url).await?;
        save(&target.join(FONTS_DIR).join(font), &bytes)?;
    }

    println!("vendored MathJax {VERSION} into {target}");
    Ok(())
}

async fn fetch(client: &Client, url: &str) -> Result<Vec<u8>> {
    println!("fetching {url}");

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("{url} was not served"))?;

    Ok(response
        .bytes()
        .await
        .with_context(|| format!("failed to read body of {url}"))?
        .to_vec())
}

fn save(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("{path} has no parent directory"))?;
    create_dir_all(parent).with_context(|| format!("failed to create {parent}"))?;
    write(path, bytes).with_context(|| format!("failed to write {path}"))
}
