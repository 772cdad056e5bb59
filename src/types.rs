//! Shared types used across the compile pipeline.
//!
//! A [`ContentDocument`] is produced by the front-matter parser and read by
//! every later stage (renderer, template binder, listing rebuild). Nothing
//! mutates it after parsing.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Page layout selected by the `type:` front-matter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One main image above the article body.
    #[default]
    Single,
    /// A main image plus a row of thumbnail buttons for every image.
    Gallery,
}

impl Layout {
    /// Lenient parse: `gallery` (any case) selects the gallery layout,
    /// everything else falls back to single.
    pub fn from_front_matter(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("gallery") {
            Layout::Gallery
        } else {
            Layout::Single
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::Gallery => "gallery",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed content file: resolved metadata plus the raw body lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentDocument {
    pub title: String,
    /// Free-form; listings sort it as a raw string, so ISO-8601 is expected.
    pub date: String,
    pub section: String,
    pub layout: Layout,
    /// Listing meta label. Empty means "use the capitalized layout name".
    pub label: String,
    /// Listing summary. Empty means "derive from the body".
    pub summary: String,
    pub publish_to_index: bool,
    #[serde(skip)]
    pub body_lines: Vec<String>,
    pub source: PathBuf,
}

impl ContentDocument {
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// An image line (`![alt](path)`) as written in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub alt: String,
    /// Unresolved path exactly as written.
    pub path: String,
}

/// A compiled page, ready to be written below the posts directory.
#[derive(Debug, Clone)]
pub struct PageOutput {
    /// Relative to the posts directory: `<section>/<slug>.html`.
    pub path: PathBuf,
    pub html: String,
}

impl PageOutput {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn write_under(&self, posts_dir: &Path) -> std::io::Result<PathBuf> {
        let target = posts_dir.join(&self.path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &self.html)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_parse_is_lenient() {
        assert_eq!(Layout::from_front_matter("gallery"), Layout::Gallery);
        assert_eq!(Layout::from_front_matter(" Gallery "), Layout::Gallery);
        assert_eq!(Layout::from_front_matter("single"), Layout::Single);
        assert_eq!(Layout::from_front_matter("carousel"), Layout::Single);
        assert_eq!(Layout::from_front_matter(""), Layout::Single);
    }

    #[test]
    fn page_output_writes_nested_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let page = PageOutput {
            path: PathBuf::from("music/first-song.html"),
            html: "<p>hi</p>".to_string(),
        };
        let written = page.write_under(tmp.path()).unwrap();
        assert_eq!(written, tmp.path().join("music/first-song.html"));
        assert_eq!(std::fs::read_to_string(written).unwrap(), "<p>hi</p>");
        assert_eq!(page.file_name(), "first-song.html");
    }
}
