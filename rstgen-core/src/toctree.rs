//! Navigation blocks ("toctrees") and the ordering of a page's children.

use std::path::Path;

use tracing::debug;

use crate::contract::{GenerateError, PageSink};
use crate::rules::ExclusionRules;

/// One `.. toctree::` directive: a caption and the pages it links, in order.
///
/// Entries are page stems relative to `key`; rendering adds the `key/` prefix
/// and the `.rst` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationBlock {
    pub key: String,
    pub entries: Vec<String>,
}

impl NavigationBlock {
    pub fn new(key: impl Into<String>, entries: Vec<String>) -> Self {
        Self {
            key: key.into(),
            entries,
        }
    }

    pub fn render(&self, caption: Option<&str>) -> String {
        let caption = caption.map_or_else(|| human_case(&self.key), str::to_string);
        let mut out = format!(
            "\n.. toctree::\n   :hidden:\n   :maxdepth: -1\n   :caption: {caption}\n\n"
        );
        for entry in &self.entries {
            if self.key.is_empty() {
                out.push_str(&format!("   {entry}.rst\n"));
            } else {
                out.push_str(&format!("   {}/{entry}.rst\n", self.key));
            }
        }
        out.push('\n');
        out
    }
}

/// Renders a group of blocks the way they are appended to a page.
pub fn render_blocks(blocks: &[NavigationBlock], caption: Option<&str>) -> String {
    let mut out = String::from("\n");
    for block in blocks {
        out.push_str(&block.render(caption));
    }
    out
}

/// Appends `blocks` to the page at `page`, leaving earlier content (including
/// earlier blocks) in place. `caption` overrides every block's caption.
pub fn append<S: PageSink + ?Sized>(
    sink: &S,
    page: &Path,
    blocks: &[NavigationBlock],
    caption: Option<&str>,
) -> Result<(), GenerateError> {
    debug!(
        page = %page.display(),
        blocks = blocks.len(),
        entries = blocks.iter().map(|b| b.entries.len()).sum::<usize>(),
        "Appending toctree"
    );
    sink.append_page(page, &render_blocks(blocks, caption))
}

/// Sub-directories first, then modules, each already sorted; replaced wholesale
/// by an explicit order when one is registered for exactly this set of names.
pub fn order_children(subdirs: &[String], modules: &[String], rules: &ExclusionRules) -> Vec<String> {
    let names: Vec<String> = subdirs.iter().chain(modules).cloned().collect();
    match rules.order_override(&names) {
        Some(order) => order.to_vec(),
        None => names,
    }
}

/// `special_members` -> `Special members`
pub fn human_case(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
