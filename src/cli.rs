/// CLI glue for rstgen: argument parsing, settings loading and the `run`
/// entrypoint shared by `main()` and the integration tests.
///
/// All page-generation logic lives in the `rstgen-core` crate.
use crate::load_config::{build_config, load_settings, Settings};
use anyhow::Result;
use clap::{Parser, Subcommand};
use rstgen_core::generate::generate;
use std::path::PathBuf;

/// CLI for rstgen: generate a Sphinx page tree from a source tree.
#[derive(Parser)]
#[clap(
    name = "rstgen",
    version,
    about = "Generate reStructuredText documentation pages for every module, function and class of a source tree"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Regenerate the output page tree for a source directory
    Generate {
        /// Root directory of the package to document
        #[clap(long)]
        root_dir: PathBuf,
        /// Caption grouping the root's own modules; without it the root
        /// index gets one group per top-level directory
        #[clap(long)]
        submodules_title: Option<String>,
        /// Directory holding partial_source/ and the list files
        #[clap(long, env = "RSTGEN_DOCS_DIR", default_value = ".")]
        docs_dir: PathBuf,
        /// Optional YAML settings file
        #[clap(long, env = "RSTGEN_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Extracted CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate {
            root_dir,
            submodules_title,
            docs_dir,
            config,
        } => {
            let settings = match config {
                Some(path) => load_settings(path)?,
                None => Settings::default(),
            };
            let config = build_config(root_dir, docs_dir, submodules_title, settings)?;
            tracing::info!(command = "generate", "Starting page generation");
            match generate(&config) {
                Ok(report) => {
                    println!("Generation complete.\nReport:");
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{json}"),
                        Err(_) => println!("{:#?}", report),
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "generate", error = %e, "Generation failed");
                    Err(anyhow::Error::new(e).context("Generation failed"))
                }
            }
        }
    }
}
