//! Root index composition: prelude + rewritten top-level readme + appendix,
//! followed by the top-level toctrees and the auxiliary `docs` pages.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::contract::{read_fragment, DocPage, GenerateError, PageSink};
use crate::toctree::{self, human_case, NavigationBlock};
use crate::walk::DirOutcome;

pub const PROMO_SENTENCE: &str = "Check out the docs_ for more info!";
const SPACING_MARKER: &str = "</div>\n    <br clear=\"all\" />\n";
const AUX_PAGES_KEY: &str = "docs";

static ABSOLUTE_IMAGE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(\s*\.\.\s*image::\s*)https://github\.com/\S*?(docs/partial_source)")
        .expect("valid image link pattern")
});

/// Image prefixes folded into the flat `_images/` directory, most specific first.
const IMAGE_PREFIXES: [&str; 3] = [
    "../autogenerated_source/logos/supported/",
    "../autogenerated_source/logos/",
    "../autogenerated_source/images/",
];

/// How the root toctrees are grouped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    /// One captioned block listing the root directory's own modules.
    Titled(String),
    /// One block per top-level directory.
    PerDirectory,
}

impl Grouping {
    pub fn from_title(title: Option<&str>) -> Self {
        match title {
            Some(title) => Grouping::Titled(title.to_string()),
            None => Grouping::PerDirectory,
        }
    }
}

/// Rewrites the repository readme so it renders inside the generated tree.
pub fn transform_readme(readme: &str) -> String {
    let mut text = readme.replace(PROMO_SENTENCE, "");
    text = text.replace(
        SPACING_MARKER,
        &format!("{SPACING_MARKER}    <br/>\n    <br/>\n"),
    );
    text = ABSOLUTE_IMAGE_LINK.replace_all(&text, "$1$2").into_owned();
    text = text.replace("docs/partial_source/", "../autogenerated_source/");
    for prefix in IMAGE_PREFIXES {
        text = text.replace(prefix, "_images/");
    }
    text
}

pub struct IndexComposer<'a, S: PageSink + ?Sized> {
    config: &'a GeneratorConfig,
    sink: &'a S,
}

impl<'a, S: PageSink + ?Sized> IndexComposer<'a, S> {
    pub fn new(config: &'a GeneratorConfig, sink: &'a S) -> Self {
        Self { config, sink }
    }

    /// Writes `index.rst` and the auxiliary stub pages. Returns how many stub
    /// pages were written.
    pub fn compose_root(&self, root: &DirOutcome, aux_pages: &[String]) -> Result<usize, GenerateError> {
        let layout = &self.config.layout;
        let prelude = read_fragment(&layout.index_prepend())?;
        let readme = read_fragment(&layout.readme)?;
        let appendix = read_optional(&layout.index_append())?;

        let index_path = layout.page_path("index");
        let body = format!("{prelude}\n{}\n{appendix}", transform_readme(&readme));
        DocPage::raw(index_path.clone(), body).write_to(self.sink)?;

        let aux_block = NavigationBlock::new(AUX_PAGES_KEY, aux_pages.to_vec());
        match Grouping::from_title(self.config.submodules_title.as_deref()) {
            Grouping::Titled(title) => {
                let block = NavigationBlock::new("", root.modules.clone());
                toctree::append(self.sink, &index_path, &[block], Some(&title))?;
                toctree::append(self.sink, &index_path, &[aux_block], None)?;
            }
            Grouping::PerDirectory => {
                let mut blocks: Vec<NavigationBlock> = root
                    .children
                    .iter()
                    .map(|child| NavigationBlock::new(child.name.as_str(), child.navigation.clone()))
                    .collect();
                blocks.push(aux_block);
                toctree::append(self.sink, &index_path, &blocks, None)?;
            }
        }

        for name in aux_pages {
            let path = layout.page_path(&format!("{AUX_PAGES_KEY}/{name}"));
            DocPage::titled(path, human_case(name), "").write_to(self.sink)?;
        }
        info!(path = %index_path.display(), aux_pages = aux_pages.len(), "Composed root index");
        Ok(aux_pages.len())
    }
}

fn read_optional(path: &Path) -> Result<String, GenerateError> {
    if path.exists() {
        read_fragment(path)
    } else {
        debug!(path = %path.display(), "Optional fragment absent");
        Ok(String::new())
    }
}
