//! Code for reading app configuration from a TOML file. The configuration file path is supplied via the command line.

use anyhow::{anyhow, Context, Result};
use camino::Utf8PathBuf;
use same_file::is_same_file;
use serde::Deserialize;
use std::{env::args, fs::read_to_string};
use toml_edit::de::from_str as toml_from_str;

#[derive(Deserialize)]
pub struct Config {
    // Default author for sources without an \author declaration
    pub author: Box<str>,
    // Name of the highlighting theme for code samples
    pub code_theme: Box<str>,
    // Path to directory of TeX sources
    pub input_dir: Utf8PathBuf,
    // Path to directory for generated site output
    pub output_dir: Utf8PathBuf,
    // Path to directory of page templates
    pub templates_dir: Utf8PathBuf,
    // Path to directory of static assets copied into the output root
    pub static_dir: Utf8PathBuf,
    // Set by the `clean` command-line argument, not the file
    #[serde(skip)]
    pub clean: bool,
}

impl Config {
    /// Reads a config file from a path provided by command-line arguments.
    /// A trailing `clean` argument requests that the output root be removed
    /// before generating.
    ///
    /// # Errors
    /// This function returns an error if:
    /// - not enough command-line arguments are provided
    /// - too many or unrecognized command-line arguments are provided
    /// - a config parameter interpreted as a directory path does not point to a directory
    /// - the output directory path and the input directory path point to the same location
    pub fn from_env() -> Result<Self> {
        let mut args = args().skip(1);

        let config_path = args
            .next()
            .ok_or_else(|| anyhow!("configuration file path was not provided"))?;

        let clean = match args.next() {
            None => false,
            Some(arg) if arg == "clean" => true,
            Some(arg) => {
                return Err(anyhow!("unrecognized argument {arg:?} (expected \"clean\")"))
            }
        };

        if args.next().is_some() {
            return Err(anyhow!("too many input arguments were provided"));
        }

        let mut config: Self = toml_from_str(
            &read_to_string(&config_path)
                .with_context(|| format!("failed to read configuration from {config_path}"))?,
        )
        .context("failed to parse configuration file")?;
        config.clean = clean;

        config
            .check_paths()
            .context("configuration file is invalid")?;

        Ok(config)
    }

    fn check_paths(&self) -> Result<()> {
        if !self.input_dir.is_dir() {
            Err(anyhow!(
                "`input_dir`: {:?} does not point to a directory",
                self.input_dir
            ))
        } else if !self.templates_dir.is_dir() {
            Err(anyhow!(
                "`templates_dir`: {:?} does not point to a directory",
                self.templates_dir
            ))
        } else if !self.static_dir.is_dir() {
            Err(anyhow!(
                "`static_dir`: {:?} does not point to a directory",
                self.static_dir
            ))
        } else if self.output_dir.exists()
            && is_same_file(&self.output_dir, &self.input_dir).unwrap_or(false)
        {
            Err(anyhow!(
                "`output_dir` and `input_dir` point to the same location"
            ))
        } else {
            Ok(())
        }
    }
}
