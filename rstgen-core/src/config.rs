use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::contract::GenerateError;
use crate::rules::ExclusionRules;

pub const DEFAULT_OUTPUT_DIR: &str = "autogenerated_source";
pub const DEFAULT_MANIFEST: &str = "doc_pages.txt";
pub const DEFAULT_README_NAME: &str = "README.rst";
pub const DEFAULT_MODULE_EXTENSION: &str = "py";

/// Where the generator reads its static inputs and writes its output.
#[derive(Debug, Clone)]
pub struct DocsLayout {
    pub docs_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Top-level readme folded into the root index.
    pub readme: PathBuf,
    /// Names of the auxiliary pages listed under the root `docs` toctree.
    pub manifest: PathBuf,
    /// File name marking a directory as carrying its own index page.
    pub readme_name: String,
    pub module_extension: String,
}

impl DocsLayout {
    /// The stock layout rooted at `docs_dir`.
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        let docs_dir = docs_dir.into();
        Self {
            output_dir: docs_dir.join(DEFAULT_OUTPUT_DIR),
            readme: docs_dir.join("..").join(DEFAULT_README_NAME),
            manifest: docs_dir.join(DEFAULT_MANIFEST),
            readme_name: DEFAULT_README_NAME.to_string(),
            module_extension: DEFAULT_MODULE_EXTENSION.to_string(),
            docs_dir,
        }
    }

    pub fn partial_source(&self) -> PathBuf {
        self.docs_dir.join("partial_source")
    }

    pub fn supported_frameworks(&self) -> PathBuf {
        self.partial_source().join("supported_frameworks.rst")
    }

    pub fn index_prepend(&self) -> PathBuf {
        self.partial_source().join("index_prepend.rst")
    }

    pub fn index_append(&self) -> PathBuf {
        self.partial_source().join("index_append.rst")
    }

    pub fn conf_py(&self) -> PathBuf {
        self.partial_source().join("conf.py")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.partial_source().join("images")
    }

    pub fn build_images_dir(&self) -> PathBuf {
        self.docs_dir.join("build").join("_images")
    }

    /// Output location for a root-relative stem, e.g. `geometry/shapes` ->
    /// `<output>/geometry/shapes.rst`.
    pub fn page_path(&self, rel_stem: &str) -> PathBuf {
        let mut segments: Vec<&str> = rel_stem.split('/').filter(|s| !s.is_empty()).collect();
        let file = format!("{}.rst", segments.pop().unwrap_or("index"));
        let mut path = self.output_dir.clone();
        path.extend(segments);
        path.push(file);
        path
    }
}

/// Immutable settings for one generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub root_dir: PathBuf,
    /// Leading segment of every qualified name (the root directory's name).
    pub package_name: String,
    pub layout: DocsLayout,
    pub rules: ExclusionRules,
    /// When set, the root index groups the root's own modules under this caption.
    pub submodules_title: Option<String>,
}

impl GeneratorConfig {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        layout: DocsLayout,
        rules: ExclusionRules,
        submodules_title: Option<String>,
    ) -> Result<Self, GenerateError> {
        let root_dir = root_dir.into();
        let package_name = package_name(&root_dir)?;
        rules.validate()?;
        Ok(Self {
            root_dir,
            package_name,
            layout,
            rules,
            submodules_title,
        })
    }

    pub fn trace_loaded(&self) {
        info!(
            root_dir = %self.root_dir.display(),
            package = %self.package_name,
            output_dir = %self.layout.output_dir.display(),
            submodules_title = self.submodules_title.as_deref().unwrap_or("<per directory>"),
            "Loaded generator config"
        );
        debug!(?self, "Generator config (full debug)");
    }
}

fn package_name(root_dir: &Path) -> Result<String, GenerateError> {
    if let Some(name) = root_dir.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    let resolved = fs::canonicalize(root_dir).map_err(|source| GenerateError::ReadDir {
        path: root_dir.to_path_buf(),
        source,
    })?;
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            GenerateError::InvalidConfig(format!(
                "cannot derive a package name from {}",
                root_dir.display()
            ))
        })
}
