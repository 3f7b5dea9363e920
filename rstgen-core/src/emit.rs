//! Page emission for symbols, modules and directories.
//!
//! Layout of the output tree, for a module `geometry/shapes/shapes.py`:
//!
//! ```text
//! <output>/geometry.rst                    directory page of geometry/
//! <output>/geometry/shapes.rst             directory page of geometry/shapes/
//! <output>/geometry/shapes/shapes.rst      module page
//! <output>/geometry/shapes/shapes/area.rst symbol page
//! ```

use std::fs;
use std::path::PathBuf;

use tracing::{debug, error};

use crate::config::GeneratorConfig;
use crate::contract::{DocPage, GenerateError, PageSink};
use crate::extract::{ModuleSymbols, Symbol, SymbolKind};
use crate::toctree::{self, human_case, NavigationBlock};
use crate::walk::{SourceDir, SourceModule};

pub struct PageEmitter<'a, S: PageSink + ?Sized> {
    config: &'a GeneratorConfig,
    sink: &'a S,
    supported_frameworks: &'a str,
}

impl<'a, S: PageSink + ?Sized> PageEmitter<'a, S> {
    pub fn new(config: &'a GeneratorConfig, sink: &'a S, supported_frameworks: &'a str) -> Self {
        Self {
            config,
            sink,
            supported_frameworks,
        }
    }

    /// One page per symbol, with the supported-frameworks footer rewritten for
    /// the page's depth.
    pub fn emit_symbol_page(
        &self,
        module: &SourceModule,
        symbol: &Symbol,
    ) -> Result<PathBuf, GenerateError> {
        let path = self
            .config
            .layout
            .page_path(&format!("{}/{}", module.rel, symbol.name));
        let footer = footer_for_depth(self.supported_frameworks, module.depth());
        let body = match symbol.kind {
            SymbolKind::Function => {
                format!(".. autofunction:: {}\n{footer}", symbol.qualified_name)
            }
            SymbolKind::Class => format!(
                ".. autoclass:: {}\n{}{footer}",
                symbol.qualified_name,
                member_flags("   ")
            ),
        };
        DocPage::titled(path.clone(), symbol.name.as_str(), body).write_to(self.sink)?;
        debug!(symbol = %symbol.qualified_name, kind = ?symbol.kind, "Emitted symbol page");
        Ok(path)
    }

    /// The module's automodule page plus a toctree over its symbol pages.
    pub fn emit_module_page(
        &self,
        module: &SourceModule,
        symbols: &ModuleSymbols,
    ) -> Result<PathBuf, GenerateError> {
        let path = self.config.layout.page_path(&module.rel);
        automodule_page(path.clone(), &module.stem, &module.namespace).write_to(self.sink)?;

        let entries = symbols
            .navigation_order()
            .into_iter()
            .map(|s| s.name.clone())
            .collect();
        let block = NavigationBlock::new(module.stem.as_str(), entries);
        toctree::append(self.sink, &path, &[block], None)?;
        debug!(module = %module.namespace, symbols = symbols.len(), "Emitted module page");
        Ok(path)
    }

    /// The README copy of a directory followed by a toctree over `entries`.
    /// A stepped directory never reaches this point.
    pub fn emit_directory_index(
        &self,
        dir: &SourceDir,
        entries: &[String],
    ) -> Result<PathBuf, GenerateError> {
        let readme_path = dir.path.join(&self.config.layout.readme_name);
        let readme = fs::read_to_string(&readme_path).map_err(|e| {
            error!(path = %readme_path.display(), error = ?e, "Failed to read directory readme");
            GenerateError::file(&readme_path, e)
        })?;
        let path = self.config.layout.page_path(&dir.rel);
        DocPage::raw(path.clone(), readme).write_to(self.sink)?;

        let block = NavigationBlock::new(dir.name.as_str(), entries.to_vec());
        toctree::append(self.sink, &path, &[block], None)?;
        debug!(dir = %dir.rel, entries = entries.len(), "Emitted directory index");
        Ok(path)
    }

    /// Package page for a directory with no readme of its own.
    pub fn emit_package_page(&self, dir: &SourceDir) -> Result<PathBuf, GenerateError> {
        let path = self.config.layout.page_path(&dir.rel);
        automodule_page(path.clone(), &dir.name, &dir.namespace).write_to(self.sink)?;
        debug!(dir = %dir.rel, "Emitted package page");
        Ok(path)
    }
}

fn automodule_page(path: PathBuf, name: &str, namespace: &str) -> DocPage {
    DocPage::titled(
        path,
        human_case(name),
        format!(".. automodule:: {namespace}\n{}", member_flags("    ")),
    )
}

fn member_flags(indent: &str) -> String {
    [":members:", ":special-members: __init__", ":undoc-members:", ":show-inheritance:"]
        .iter()
        .map(|flag| format!("{indent}{flag}\n"))
        .collect()
}

/// Prefixes every `logos` path in the footer with one `../` per level the page
/// sits below the output root.
pub fn footer_for_depth(fragment: &str, depth: usize) -> String {
    fragment.replace("logos", &format!("{}logos", "../".repeat(depth)))
}
