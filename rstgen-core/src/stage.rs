//! Output staging: stamp the project title into `conf.py`, clear the previous
//! output tree and copy the static sources into place.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::config::GeneratorConfig;
use crate::contract::GenerateError;

static PROJECT_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^project[ \t]*=[ \t]*['"].*['"][ \t]*$"#).expect("valid project pattern")
});

/// `my_pkg` -> `My Pkg`
pub fn project_title(package_name: &str) -> String {
    package_name
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replaces the `project = '...'` assignment of a Sphinx `conf.py`.
pub fn set_project_title(conf: &str, title: &str) -> String {
    let escaped = title.replace('\'', "\\'");
    let assignment = format!("project = '{escaped}'");
    PROJECT_ASSIGNMENT
        .replace_all(conf, NoExpand(&assignment))
        .into_owned()
}

/// Prepares the output location. Destructive: the previous output directory
/// is removed.
pub fn stage_output(config: &GeneratorConfig) -> Result<(), GenerateError> {
    let layout = &config.layout;

    let conf_path = layout.conf_py();
    if conf_path.is_file() {
        let title = project_title(&config.package_name);
        let conf = fs::read_to_string(&conf_path)?;
        fs::write(&conf_path, set_project_title(&conf, &title))?;
        info!(path = %conf_path.display(), title = %title, "Updated project title");
    } else {
        debug!(path = %conf_path.display(), "No conf.py to update");
    }

    if layout.output_dir.exists() {
        info!(path = %layout.output_dir.display(), "Removing previous output");
        fs::remove_dir_all(&layout.output_dir).map_err(|e| {
            error!(path = %layout.output_dir.display(), error = ?e, "Failed to clear output directory");
            GenerateError::file(&layout.output_dir, e)
        })?;
    }

    let images = layout.images_dir();
    if images.is_dir() {
        copy_tree(&images, &layout.build_images_dir())?;
    }

    let partial = layout.partial_source();
    if partial.is_dir() {
        copy_tree(&partial, &layout.output_dir)?;
    } else {
        fs::create_dir_all(&layout.output_dir)?;
    }
    Ok(())
}

/// Recursively copies `from` into `to`, overwriting files that already exist.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, GenerateError> {
    let mut copied = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            error!(path = %from.display(), error = %e, "Failed to walk static sources");
            GenerateError::Io(e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| GenerateError::InvalidConfig(e.to_string()))?;
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    debug!(from = %from.display(), to = %to.display(), files = copied, "Copied static tree");
    Ok(copied)
}
