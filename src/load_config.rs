/// `load_config` module: loads the optional YAML settings file and merges it
/// with command-line arguments into the core `GeneratorConfig`.
///
/// # Responsibilities
/// - Parse the user-supplied YAML settings into [`Settings`]
/// - Resolve relative paths against the docs directory
/// - Load the skip/step/order list files and validate them
///
/// All errors here are `anyhow::Error` and surface at the CLI boundary.
use anyhow::{Context, Result};
use rstgen_core::config::{DocsLayout, GeneratorConfig};
use rstgen_core::rules::{ExclusionRules, DEFAULT_EXCLUDED_DIRS, DEFAULT_EXCLUDED_MODULES};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Optional overrides read from a YAML file. Every field falls back to the
/// stock layout when absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub output_dir: Option<PathBuf>,
    pub readme: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub readme_name: Option<String>,
    pub module_extension: Option<String>,
    pub excluded_dirs: Option<Vec<String>>,
    pub excluded_modules: Option<Vec<String>>,
}

/// Loads a YAML settings file.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading settings from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read settings file");
            return Err(anyhow::anyhow!(
                "Failed to read settings file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<Option<Settings>>(&content) {
        Ok(settings) => {
            info!(config_path = ?path_ref, "Parsed settings YAML successfully");
            Ok(settings.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse settings YAML");
            Err(anyhow::anyhow!("Failed to parse settings YAML: {e}"))
        }
    }
}

/// Builds the run configuration from the docs directory, the root directory,
/// the optional grouping title and any settings overrides.
pub fn build_config(
    root_dir: PathBuf,
    docs_dir: PathBuf,
    submodules_title: Option<String>,
    settings: Settings,
) -> Result<GeneratorConfig> {
    let mut layout = DocsLayout::new(&docs_dir);
    if let Some(output_dir) = settings.output_dir {
        layout.output_dir = docs_dir.join(output_dir);
    }
    if let Some(readme) = settings.readme {
        layout.readme = docs_dir.join(readme);
    }
    if let Some(manifest) = settings.manifest {
        layout.manifest = docs_dir.join(manifest);
    }
    if let Some(readme_name) = settings.readme_name {
        layout.readme_name = readme_name;
    }
    if let Some(extension) = settings.module_extension {
        layout.module_extension = extension.trim_start_matches('.').to_string();
    }

    let excluded_dirs = settings
        .excluded_dirs
        .unwrap_or_else(|| DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect());
    let excluded_modules = settings
        .excluded_modules
        .unwrap_or_else(|| DEFAULT_EXCLUDED_MODULES.iter().map(|s| s.to_string()).collect());
    let rules = ExclusionRules::new(excluded_dirs, excluded_modules)
        .load_lists(&docs_dir)
        .with_context(|| format!("Failed to load list files from {}", docs_dir.display()))?;

    let config = GeneratorConfig::new(root_dir, layout, rules, submodules_title)
        .context("Invalid generator configuration")?;
    info!(
        root_dir = %config.root_dir.display(),
        output_dir = %config.layout.output_dir.display(),
        "Configuration assembled"
    );
    Ok(config)
}
