//! PDF page counting, merging and bookmark outlines, delegated to the
//! [`pdfcpu`](https://pdfcpu.io) command line tool.
//!
//! Every operation blocks until pdfcpu exits; call them from a blocking
//! context when running inside an async runtime.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::instrument;

/// One top-level outline entry: a title and the 1-based page it opens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bookmark {
    pub title: String,
    pub page: u32,
}
impl Bookmark {
    pub fn new(title: impl Into<String>, page: u32) -> Self {
        Self { title: title.into(), page }
    }
}

#[derive(Serialize)]
struct BookmarkFile<'a> {
    bookmarks: &'a [Bookmark],
}

#[derive(Deserialize)]
struct InfoReport {
    infos: Vec<Info>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Info {
    page_count: u32,
}

/// A pdfcpu executable.
#[derive(Clone, Debug)]
pub struct Pdfcpu {
    path: PathBuf,
}
impl Pdfcpu {
    pub fn discover() -> Result<Self> {
        match which::which("pdfcpu") {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Discovered pdfcpu executable");
                Ok(Self { path })
            },
            Err(_) => exn::bail!(ErrorKind::ToolNotFound),
        }
    }

    /// Uses an explicitly configured executable (a path, or a name looked up
    /// in `PATH`).
    pub fn at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match which::which(path) {
            Ok(path) => Ok(Self { path }),
            Err(_) => exn::bail!(ErrorKind::ToolMissing(path.to_path_buf())),
        }
    }

    /// Number of pages in the document at `path`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn page_count(&self, path: &Path) -> Result<u32> {
        let output = self.run("info", Command::new(&self.path).args(["info", "-j"]).arg(path))?;
        parse_page_count(&output.stdout)
    }

    /// Concatenates `inputs`, in order, into a new document at `output`.
    #[instrument(skip_all, fields(inputs = inputs.len(), output = %output.display()))]
    pub fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            exn::bail!(ErrorKind::NoInputs);
        }
        // pdfcpu refuses to merge into an existing file without -append.
        if output.exists() {
            std::fs::remove_file(output).or_raise(|| ErrorKind::Io)?;
        }
        self.run("merge", Command::new(&self.path).arg("merge").arg(output).args(inputs))?;
        Ok(())
    }

    /// Writes a copy of `input` to `output` whose outline is exactly
    /// `bookmarks` (any existing outline is replaced).
    #[instrument(skip(self, bookmarks), fields(input = %input.display(), output = %output.display(), bookmarks = bookmarks.len()))]
    pub fn import_bookmarks(&self, input: &Path, bookmarks: &[Bookmark], output: &Path) -> Result<()> {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().or_raise(|| ErrorKind::Io)?;
        json.write_all(bookmarks_json(bookmarks)?.as_bytes()).or_raise(|| ErrorKind::Io)?;
        json.flush().or_raise(|| ErrorKind::Io)?;
        self.run(
            "bookmarks import",
            Command::new(&self.path).args(["bookmarks", "import", "-replace"]).arg(input).arg(json.path()).arg(output),
        )?;
        Ok(())
    }

    fn run(&self, name: &'static str, command: &mut Command) -> Result<Output> {
        let output = command.output().or_raise(|| ErrorKind::Io)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or_default().trim().to_string();
            exn::bail!(ErrorKind::ToolFailed { command: name, code: output.status.code().unwrap_or(-1), message });
        }
        Ok(output)
    }
}

fn parse_page_count(json: &[u8]) -> Result<u32> {
    let report: InfoReport =
        serde_json::from_slice(json).or_raise(|| ErrorKind::Unexpected(String::from_utf8_lossy(json).into_owned()))?;
    let info = report.infos.first().ok_or_raise(|| ErrorKind::Unexpected("empty info report".into()))?;
    Ok(info.page_count)
}

fn bookmarks_json(bookmarks: &[Bookmark]) -> Result<String> {
    serde_json::to_string_pretty(&BookmarkFile { bookmarks }).or_raise(|| ErrorKind::Unexpected("bookmarks".into()))
}
