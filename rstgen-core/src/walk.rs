//! Post-order traversal of the source tree.
//!
//! Children are fully processed before their parent: a directory's own page
//! and toctree are written only after every sub-directory and module below it
//! has its pages, so the toctree never points at a page that does not exist
//! yet.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::GeneratorConfig;
use crate::contract::{GenerateError, PageSink};
use crate::emit::PageEmitter;
use crate::extract::{decode_module, extract_symbols};
use crate::generate::GenerationReport;
use crate::toctree::order_children;

/// A listed directory with its exclusions applied and entries sorted.
#[derive(Debug, Clone)]
pub struct SourceDir {
    pub name: String,
    /// Root-relative path with `/` separators; empty for the root itself.
    pub rel: String,
    pub path: PathBuf,
    pub namespace: String,
    /// Sub-directory names not excluded by name. The skip-list is applied by
    /// the walker.
    pub subdirs: Vec<String>,
    /// Module file names (with extension) not excluded.
    pub modules: Vec<String>,
    /// Root-relative paths of directories and modules whose names are not
    /// valid UTF-8.
    pub invalid_names: Vec<String>,
    pub has_readme: bool,
}

impl SourceDir {
    pub fn read(path: &Path, rel: &str, config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let listing = fs::read_dir(path).map_err(|source| {
            error!(path = %path.display(), error = ?source, "Failed to read source directory");
            GenerateError::ReadDir {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut entries = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|source| GenerateError::ReadDir {
                path: path.to_path_buf(),
                source,
            })?;
            entries.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
        entries.sort();

        let rules = &config.rules;
        let extension = format!(".{}", config.layout.module_extension);
        let mut subdirs = Vec::new();
        let mut modules = Vec::new();
        let mut invalid_names = Vec::new();
        let mut has_readme = false;
        for (name, entry_path) in entries {
            let is_dir = entry_path.is_dir();
            if entry_path.file_name().and_then(|n| n.to_str()).is_none() {
                // Not valid UTF-8: cannot be mapped to a page or a dotted name.
                if is_dir || name.ends_with(&extension) {
                    warn!(path = %entry_path.display(), "Entry name is not valid UTF-8; not documented");
                    invalid_names.push(join_rel(rel, &name));
                }
                continue;
            }
            if is_dir {
                if rules.is_dir_excluded(&name) {
                    debug!(path = %entry_path.display(), "Excluded directory");
                } else {
                    subdirs.push(name);
                }
            } else if name == config.layout.readme_name {
                has_readme = true;
            } else if let Some(stem) = name.strip_suffix(&extension) {
                if rules.is_module_excluded(stem) {
                    debug!(path = %entry_path.display(), "Excluded module");
                } else {
                    modules.push(name);
                }
            }
        }

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| config.package_name.clone()),
            rel: rel.to_string(),
            path: path.to_path_buf(),
            namespace: dotted(&config.package_name, rel),
            subdirs,
            modules,
            invalid_names,
            has_readme,
        })
    }
}

/// A module file with its text decoded.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub stem: String,
    /// Root-relative path without extension, e.g. `geometry/shapes/shapes`.
    pub rel: String,
    pub path: PathBuf,
    pub namespace: String,
    pub text: String,
}

impl SourceModule {
    pub fn load(dir: &SourceDir, file_name: &str, config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let path = dir.path.join(file_name);
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        let bytes = fs::read(&path).map_err(|e| {
            error!(path = %path.display(), error = ?e, "Failed to read module");
            GenerateError::file(&path, e)
        })?;
        let rel = join_rel(&dir.rel, &stem);
        Ok(Self {
            namespace: dotted(&config.package_name, &rel),
            text: decode_module(&bytes).into_owned(),
            stem,
            rel,
            path,
        })
    }

    /// Directory levels between the module's symbol pages and the output root.
    pub fn depth(&self) -> usize {
        self.rel.split('/').count()
    }
}

/// What a directory contributes to its parent's navigation.
#[derive(Debug, Clone, Default)]
pub struct DirOutcome {
    pub name: String,
    pub rel: String,
    /// Included sub-directories (exclusions and skip-list applied).
    pub subdirs: Vec<String>,
    /// Included module stems.
    pub modules: Vec<String>,
    pub stepped: bool,
    /// Resolved toctree entries relative to this directory, with stepped
    /// children already spliced in.
    pub navigation: Vec<String>,
    pub children: Vec<DirOutcome>,
}

pub struct DirectoryWalker<'a, S: PageSink + ?Sized> {
    config: &'a GeneratorConfig,
    emitter: PageEmitter<'a, S>,
    report: GenerationReport,
}

impl<'a, S: PageSink + ?Sized> DirectoryWalker<'a, S> {
    pub fn new(config: &'a GeneratorConfig, sink: &'a S, supported_frameworks: &'a str) -> Self {
        Self {
            config,
            emitter: PageEmitter::new(config, sink, supported_frameworks),
            report: GenerationReport::default(),
        }
    }

    /// Walks from the configured root.
    pub fn walk_root(&mut self) -> Result<DirOutcome, GenerateError> {
        let root = self.config.root_dir.clone();
        info!(root = %root.display(), "Walking source tree");
        self.walk(&root, "")
    }

    pub fn walk(&mut self, path: &Path, rel: &str) -> Result<DirOutcome, GenerateError> {
        let config = self.config;
        let rules = &config.rules;
        let dir = SourceDir::read(path, rel, config)?;
        self.report.invalid_names.extend(dir.invalid_names.iter().cloned());

        let mut children = Vec::new();
        for name in &dir.subdirs {
            let child_rel = join_rel(rel, name);
            if rules.is_skipped(&child_rel) {
                info!(dir = %child_rel, "Skipping subtree");
                self.report.skipped.push(child_rel);
                continue;
            }
            children.push(self.walk(&path.join(name), &child_rel)?);
        }

        let mut modules = Vec::new();
        for file_name in &dir.modules {
            let module = SourceModule::load(&dir, file_name, config)?;
            let symbols = extract_symbols(&module.text, &module.namespace);
            for name in symbols.duplicate_names() {
                warn!(module = %module.namespace, symbol = name, "Symbol declared more than once; later page overwrites earlier");
            }
            for symbol in symbols.navigation_order() {
                self.emitter.emit_symbol_page(&module, symbol)?;
            }
            self.report.symbol_pages += symbols.page_count();
            self.emitter.emit_module_page(&module, &symbols)?;
            self.report.module_pages += 1;
            modules.push(module.stem);
        }

        let subdirs: Vec<String> = children.iter().map(|c| c.name.clone()).collect();
        let navigation = splice_navigation(order_children(&subdirs, &modules, rules), &children);
        let stepped = !rel.is_empty() && rules.is_stepped(rel);

        if rel.is_empty() {
            debug!("Root directory page is composed by the index");
        } else if stepped {
            debug!(dir = %rel, entries = navigation.len(), "Stepping through directory");
        } else if dir.has_readme {
            self.emitter.emit_directory_index(&dir, &navigation)?;
            self.report.directory_pages += 1;
        } else {
            self.emitter.emit_package_page(&dir)?;
            self.report.directory_pages += 1;
        }

        Ok(DirOutcome {
            name: dir.name,
            rel: dir.rel,
            subdirs,
            modules,
            stepped,
            navigation,
            children,
        })
    }

    pub fn into_report(self) -> GenerationReport {
        self.report
    }
}

/// Replaces each stepped child with its own entries, prefixed by its name.
fn splice_navigation(ordered: Vec<String>, children: &[DirOutcome]) -> Vec<String> {
    let mut entries = Vec::with_capacity(ordered.len());
    for name in ordered {
        match children.iter().find(|c| c.name == name && c.stepped) {
            Some(child) => entries.extend(child.navigation.iter().map(|e| format!("{name}/{e}"))),
            None => entries.push(name),
        }
    }
    entries
}

pub(crate) fn join_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn dotted(package: &str, rel: &str) -> String {
    std::iter::once(package)
        .chain(rel.split('/').filter(|s| !s.is_empty()))
        .collect::<Vec<_>>()
        .join(".")
}
