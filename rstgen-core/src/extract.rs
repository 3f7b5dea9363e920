//! Best-effort symbol extraction.
//!
//! This is a line scanner, not a parser: only `def ` and `class ` at the very
//! start of a line count as declarations. Decorators, nested definitions and
//! multi-line signatures get no special treatment.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Class,
}

impl SymbolKind {
    fn keyword(self) -> &'static str {
        match self {
            SymbolKind::Function => "def ",
            SymbolKind::Class => "class ",
        }
    }
}

/// A top-level declaration found in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// `package.sub.module.name`
    pub qualified_name: String,
    /// Position among the module's kept declarations.
    pub rank: usize,
}

/// The symbols of one module, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ModuleSymbols {
    symbols: Vec<Symbol>,
}

impl ModuleSymbols {
    pub fn functions(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind == SymbolKind::Function)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind == SymbolKind::Class)
    }

    /// Functions first, then classes, each in declaration order.
    pub fn navigation_order(&self) -> Vec<&Symbol> {
        self.functions().chain(self.classes()).collect()
    }

    /// Distinct pages the module's symbols end up as on disk.
    pub fn page_count(&self) -> usize {
        self.symbols
            .iter()
            .map(|s| s.name.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Names declared more than once; their pages overwrite each other.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for symbol in &self.symbols {
            *seen.entry(symbol.name.as_str()).or_default() += 1;
        }
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Decodes module bytes, replacing invalid UTF-8 with U+FFFD.
pub fn decode_module(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Every line-leading declaration as `(kind, name)`, in source order, before
/// any filtering.
pub fn scan_declarations(text: &str) -> Vec<(SymbolKind, String)> {
    let mut found = Vec::new();
    for line in text.lines() {
        for kind in [SymbolKind::Function, SymbolKind::Class] {
            if let Some(rest) = line.strip_prefix(kind.keyword()) {
                let end = rest.find(['(', ':']).unwrap_or(rest.len());
                let name = rest[..end].trim();
                if !name.is_empty() {
                    found.push((kind, name.to_string()));
                }
            }
        }
    }
    found
}

/// Extracts the public top-level functions and all top-level classes of a
/// module, qualified by `namespace`.
pub fn extract_symbols(text: &str, namespace: &str) -> ModuleSymbols {
    let symbols = scan_declarations(text)
        .into_iter()
        .filter(|(kind, name)| !(*kind == SymbolKind::Function && name.starts_with('_')))
        .enumerate()
        .map(|(rank, (kind, name))| Symbol {
            qualified_name: format!("{namespace}.{name}"),
            name,
            kind,
            rank,
        })
        .collect();
    ModuleSymbols { symbols }
}
