//! Coordinating module for the stage -> walk -> compose pipeline.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::GeneratorConfig;
use crate::contract::{read_fragment, FsSink, GenerateError, PageSink};
use crate::index::IndexComposer;
use crate::stage::stage_output;
use crate::walk::DirectoryWalker;

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub symbol_pages: usize,
    pub module_pages: usize,
    pub directory_pages: usize,
    pub stub_pages: usize,
    /// Root-relative paths left out through the skip-list.
    pub skipped: Vec<String>,
    /// Root-relative paths left out because their names are not valid UTF-8.
    pub invalid_names: Vec<String>,
}

impl GenerationReport {
    pub fn total_pages(&self) -> usize {
        // +1 for the root index
        self.symbol_pages + self.module_pages + self.directory_pages + self.stub_pages + 1
    }
}

/// Full run against the filesystem: stages the output directory, then builds
/// every page.
pub fn generate(config: &GeneratorConfig) -> Result<GenerationReport, GenerateError> {
    config.trace_loaded();
    config.rules.validate()?;

    // Fail on missing fragments before the previous output is cleared.
    let supported_frameworks = read_fragment(&config.layout.supported_frameworks())?;
    let aux_pages = read_manifest(config)?;

    stage_output(config)?;
    build_pages(config, &FsSink, &supported_frameworks, &aux_pages)
}

/// Walks the source tree and composes the root index through `sink`. Does
/// not touch the output directory otherwise.
pub fn build_pages<S: PageSink + ?Sized>(
    config: &GeneratorConfig,
    sink: &S,
    supported_frameworks: &str,
    aux_pages: &[String],
) -> Result<GenerationReport, GenerateError> {
    let mut walker = DirectoryWalker::new(config, sink, supported_frameworks);
    let root = match walker.walk_root() {
        Ok(root) => root,
        Err(e) => {
            error!(error = %e, "Walk failed");
            return Err(e);
        }
    };
    let mut report = walker.into_report();

    report.stub_pages = IndexComposer::new(config, sink).compose_root(&root, aux_pages)?;

    info!(
        pages = report.total_pages(),
        symbols = report.symbol_pages,
        modules = report.module_pages,
        directories = report.directory_pages,
        skipped = report.skipped.len(),
        invalid_names = report.invalid_names.len(),
        "Generation complete"
    );
    match serde_json::to_string_pretty(&report) {
        Ok(json) => debug!(json = %json, "Generation report"),
        Err(e) => error!(error = ?e, "Failed to serialize generation report"),
    }
    Ok(report)
}

/// Auxiliary page names, one per line. Unlike the rule lists there is no
/// header line.
pub fn read_manifest(config: &GeneratorConfig) -> Result<Vec<String>, GenerateError> {
    let contents = read_fragment(&config.layout.manifest)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
