//! # contract: the page sink and the shared error type
//!
//! Every page the generator produces goes through a [`PageSink`]. The sink is
//! write-only: pages are created with [`PageSink::write_page`] and navigation
//! blocks are added afterwards with [`PageSink::append_page`]. Nothing is ever
//! read back.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so emitter tests can assert on the
//!   exact page paths and contents without touching the filesystem.
//! - [`FsSink`] is the production implementation.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use mockall::automock;
use tracing::{debug, error};

/// Errors raised while generating the page tree. All of them abort the run.
#[derive(Debug)]
pub enum GenerateError {
    Io(std::io::Error),
    /// Reading or writing a specific file failed.
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A source directory could not be listed.
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A required static fragment (prelude, readme, manifest, ...) is missing.
    MissingFragment {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidConfig(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Io(e) => write!(f, "I/O error: {e}"),
            GenerateError::File { path, source } => {
                write!(f, "I/O error on {}: {source}", path.display())
            }
            GenerateError::ReadDir { path, source } => {
                write!(f, "failed to read directory {}: {source}", path.display())
            }
            GenerateError::MissingFragment { path, source } => {
                write!(f, "missing required file {}: {source}", path.display())
            }
            GenerateError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::Io(e) => Some(e),
            GenerateError::File { source, .. } => Some(source),
            GenerateError::ReadDir { source, .. } => Some(source),
            GenerateError::MissingFragment { source, .. } => Some(source),
            GenerateError::InvalidConfig(_) => None,
        }
    }
}

impl GenerateError {
    pub fn file(path: &Path, source: std::io::Error) -> Self {
        GenerateError::File {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<std::io::Error> for GenerateError {
    fn from(e: std::io::Error) -> Self {
        GenerateError::Io(e)
    }
}

/// Reads a file that must exist for the run to make sense.
pub fn read_fragment(path: &Path) -> Result<String, GenerateError> {
    fs::read_to_string(path).map_err(|source| {
        error!(path = %path.display(), error = ?source, "Required fragment is missing");
        GenerateError::MissingFragment {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Destination for generated pages.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait PageSink {
    /// Create (or truncate) the page at `path` with `contents`, creating parent
    /// directories as needed.
    fn write_page(&self, path: &Path, contents: &str) -> Result<(), GenerateError>;

    /// Append `contents` to the page at `path`, creating it if it does not exist.
    fn append_page(&self, path: &Path, contents: &str) -> Result<(), GenerateError>;
}

/// Writes pages straight to the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSink;

impl FsSink {
    fn ensure_parent(path: &Path) -> Result<(), GenerateError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                error!(path = %parent.display(), error = ?e, "Failed to create output directory");
                GenerateError::file(parent, e)
            })?;
        }
        Ok(())
    }
}

impl PageSink for FsSink {
    fn write_page(&self, path: &Path, contents: &str) -> Result<(), GenerateError> {
        Self::ensure_parent(path)?;
        fs::write(path, contents).map_err(|e| {
            error!(path = %path.display(), error = ?e, "Failed to write page");
            GenerateError::file(path, e)
        })?;
        debug!(path = %path.display(), bytes = contents.len(), "Wrote page");
        Ok(())
    }

    fn append_page(&self, path: &Path, contents: &str) -> Result<(), GenerateError> {
        Self::ensure_parent(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                error!(path = %path.display(), error = ?e, "Failed to open page for appending");
                GenerateError::file(path, e)
            })?;
        file.write_all(contents.as_bytes()).map_err(|e| {
            error!(path = %path.display(), error = ?e, "Failed to append to page");
            GenerateError::file(path, e)
        })?;
        debug!(path = %path.display(), bytes = contents.len(), "Appended to page");
        Ok(())
    }
}

/// One generated page before it reaches a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPage {
    pub path: PathBuf,
    pub title: Option<String>,
    pub body: String,
}

impl DocPage {
    pub fn titled(path: PathBuf, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path,
            title: Some(title.into()),
            body: body.into(),
        }
    }

    /// A page whose body already carries its own heading (e.g. a copied README).
    pub fn raw(path: PathBuf, body: impl Into<String>) -> Self {
        Self {
            path,
            title: None,
            body: body.into(),
        }
    }

    /// Title line, `=` underline of the same width, blank line, body.
    /// A titled page with an empty body renders as the heading alone.
    pub fn render(&self) -> String {
        match &self.title {
            Some(title) if self.body.is_empty() => heading(title),
            Some(title) => format!("{}\n\n{}", heading(title), self.body),
            None => self.body.clone(),
        }
    }

    pub fn write_to<S: PageSink + ?Sized>(&self, sink: &S) -> Result<(), GenerateError> {
        sink.write_page(&self.path, &self.render())
    }
}

fn heading(title: &str) -> String {
    format!("{}\n{}", title, "=".repeat(title.chars().count()))
}
