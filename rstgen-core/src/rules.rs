//! Exclusion rules: which directories and modules are documented, which
//! subtrees are skipped or stepped through, and explicit child orderings.
//!
//! The rules are loaded once from plain-text list files and never change
//! during a run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, error, info};

use crate::contract::GenerateError;

pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[".pytest_cache", "docs", "tests", "__pycache__"];
pub const DEFAULT_EXCLUDED_MODULES: &[&str] = &["exceptions", "library_getter", "setup", "__init__"];

pub const SKIP_LIST_FILE: &str = "submods_to_skip.txt";
pub const STEP_LIST_FILE: &str = "submods_to_step.txt";
pub const ORDER_LIST_FILE: &str = "submod_orders.txt";

#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    /// Directory base names never walked.
    pub excluded_dirs: BTreeSet<String>,
    /// Module stems (file name without extension) never documented.
    pub excluded_modules: BTreeSet<String>,
    /// Root-relative directory paths omitted together with their subtree.
    pub skip: BTreeSet<String>,
    /// Root-relative directory paths whose entries are flattened into the parent.
    pub step: BTreeSet<String>,
    /// Sorted child names -> explicit order.
    pub orders: BTreeMap<Vec<String>, Vec<String>>,
}

impl ExclusionRules {
    pub fn new<D, M>(excluded_dirs: D, excluded_modules: M) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            excluded_dirs: excluded_dirs.into_iter().map(Into::into).collect(),
            excluded_modules: excluded_modules.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Rules with the stock exclusion lists and no skip/step/order entries.
    pub fn with_defaults() -> Self {
        Self::new(
            DEFAULT_EXCLUDED_DIRS.iter().copied(),
            DEFAULT_EXCLUDED_MODULES.iter().copied(),
        )
    }

    pub fn with_skip_list<I: IntoIterator<Item = String>>(mut self, entries: I) -> Self {
        self.skip = entries.into_iter().map(|e| normalize_rel(&e)).collect();
        self
    }

    pub fn with_step_list<I: IntoIterator<Item = String>>(mut self, entries: I) -> Self {
        self.step = entries.into_iter().map(|e| normalize_rel(&e)).collect();
        self
    }

    /// Registers explicit orders. Each order is keyed by its own sorted names.
    pub fn with_orders<I: IntoIterator<Item = Vec<String>>>(mut self, orders: I) -> Self {
        for order in orders {
            let mut key = order.clone();
            key.sort();
            self.orders.insert(key, order);
        }
        self
    }

    /// Reads the skip, step and order lists from `docs_dir`. Missing files are
    /// treated as empty lists.
    pub fn load_lists(self, docs_dir: &Path) -> Result<Self, GenerateError> {
        let skip = read_list(&docs_dir.join(SKIP_LIST_FILE))?;
        let step = read_list(&docs_dir.join(STEP_LIST_FILE))?;
        let orders = read_list(&docs_dir.join(ORDER_LIST_FILE))?
            .iter()
            .map(|line| parse_order_line(line))
            .filter(|order| !order.is_empty())
            .collect::<Vec<_>>();

        info!(
            skip = skip.len(),
            step = step.len(),
            orders = orders.len(),
            "Loaded exclusion lists"
        );

        Ok(self.with_skip_list(skip).with_step_list(step).with_orders(orders))
    }

    /// A subtree cannot be both skipped and stepped through.
    pub fn validate(&self) -> Result<(), GenerateError> {
        let conflicts: Vec<&str> = self
            .skip
            .intersection(&self.step)
            .map(String::as_str)
            .collect();
        if !conflicts.is_empty() {
            error!(?conflicts, "Paths listed in both skip and step lists");
            return Err(GenerateError::InvalidConfig(format!(
                "paths listed in both {SKIP_LIST_FILE} and {STEP_LIST_FILE}: {}",
                conflicts.join(", ")
            )));
        }
        Ok(())
    }

    pub fn is_dir_excluded(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    pub fn is_module_excluded(&self, stem: &str) -> bool {
        self.excluded_modules.contains(stem)
    }

    pub fn is_skipped(&self, rel: &str) -> bool {
        self.skip.contains(rel)
    }

    pub fn is_stepped(&self, rel: &str) -> bool {
        self.step.contains(rel)
    }

    /// Looks up an explicit order for this exact set of children, whatever
    /// order the names arrive in.
    pub fn order_override(&self, names: &[String]) -> Option<&[String]> {
        let mut key = names.to_vec();
        key.sort();
        let found = self.orders.get(&key).map(Vec::as_slice);
        if found.is_some() {
            debug!(?key, "Applying explicit child order");
        }
        found
    }
}

/// Reads a list file, dropping its header line and blank lines.
pub fn read_list(path: &Path) -> Result<Vec<String>, GenerateError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_list(&contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "List file absent, using empty list");
            Ok(Vec::new())
        }
        Err(e) => {
            error!(path = %path.display(), error = ?e, "Failed to read list file");
            Err(GenerateError::file(path, e))
        }
    }
}

pub fn parse_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// `(a, b, c)` -> `["a", "b", "c"]`
pub fn parse_order_line(line: &str) -> Vec<String> {
    let squashed: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    squashed
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']'])
        .split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_rel(entry: &str) -> String {
    entry.trim().replace('\\', "/").trim_matches('/').to_string()
}
