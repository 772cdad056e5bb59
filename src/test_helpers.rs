//! Shared test utilities for the folio test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = load_config(tmp.path()).unwrap();
//! let report = build(tmp.path(), &config).unwrap();
//!
//! assert_eq!(failed_sources(&report), vec!["broken-gallery.md"]);
//! assert_tags_balanced(&read_post(tmp.path(), "art/studio-notes.html"));
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::pipeline::BuildReport;

// =========================================================================
// Fixture setup
// =========================================================================

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site")
}

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    copy_dir_recursive(&fixtures_dir(), tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// The fixture single-image template.
pub fn single_template() -> String {
    std::fs::read_to_string(fixtures_dir().join("posts/art/_single-template.html")).unwrap()
}

// =========================================================================
// Output readers: panic with the missing path
// =========================================================================

/// Read a generated post, relative to `posts/`.
pub fn read_post(root: &Path, relative: &str) -> String {
    let path = root.join("posts").join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("post {} not readable: {e}", path.display()))
}

/// Read a section fragment by id.
pub fn read_section(root: &Path, id: &str) -> String {
    let path = root.join("sections").join(format!("{id}.html"));
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("section {} not readable: {e}", path.display()))
}

// =========================================================================
// Report extractors
// =========================================================================

/// Titles of compiled posts in report order.
pub fn post_titles(report: &BuildReport) -> Vec<&str> {
    report.posts.iter().map(|p| p.title.as_str()).collect()
}

/// File names of failed content files in report order.
pub fn failed_sources(report: &BuildReport) -> Vec<String> {
    report
        .failures
        .iter()
        .map(|f| f.source.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

// =========================================================================
// HTML assertions
// =========================================================================

/// Assert every block element folio emits is closed as often as it is opened.
pub fn assert_tags_balanced(html: &str) {
    for tag in ["div", "section", "ul", "ol", "li", "pre", "code", "p", "h1", "h2", "h3", "button"] {
        let opened = html.matches(&format!("<{tag}>")).count()
            + html.matches(&format!("<{tag} ")).count();
        let closed = html.matches(&format!("</{tag}>")).count();
        assert_eq!(opened, closed, "unbalanced <{tag}> in:\n{html}");
    }
}
