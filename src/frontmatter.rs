//! Front-matter parsing.
//!
//! A content file starts with a block of `key: value` lines terminated by the
//! first blank line; everything after that line is the markdown body.
//!
//! ```text
//! title: Night Walk
//! date: 2025-03-14
//! section: field-notes
//! type: gallery
//! post-to-site: yes
//!
//! # Night Walk
//! ![Bridge](bridge.jpg)
//! ```
//!
//! Parsing is deliberately lenient: lines without a colon are skipped,
//! unknown keys are ignored and every missing key resolves to a default (see
//! [`FrontMatter::resolve`]). The only hard failure is a file with no blank
//! line at all, since the body cannot be located.

use crate::types::{ContentDocument, Layout};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_DATE: &str = "YYYY-MM-DD";
pub const DEFAULT_SECTION: &str = "art";

const TRUTHY: &[&str] = &["true", "yes", "1"];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Missing blank line after front matter in {0}")]
    MalformedDocument(PathBuf),
}

/// Raw front-matter values as written. `None` means the key was absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub section: Option<String>,
    pub layout: Option<String>,
    pub label: Option<String>,
    pub summary: Option<String>,
    pub post_to_site: Option<String>,
}

impl FrontMatter {
    /// Collect `key: value` pairs. Keys are case-insensitive, the first colon
    /// splits, a repeated key keeps its last value.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut fm = FrontMatter::default();
        for line in lines {
            let line = line.as_ref();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = Some(value.trim().to_string());
            match key.trim().to_lowercase().as_str() {
                "title" => fm.title = value,
                "date" => fm.date = value,
                "section" => fm.section = value,
                "type" => fm.layout = value,
                "label" => fm.label = value,
                "summary" => fm.summary = value,
                "post-to-site" => fm.post_to_site = value,
                other => tracing::debug!(key = other, "ignoring unknown front-matter key"),
            }
        }
        fm
    }

    /// Apply defaults and produce the document.
    ///
    /// | key            | default        |
    /// |----------------|----------------|
    /// | `title`        | `Untitled`     |
    /// | `date`         | `YYYY-MM-DD`   |
    /// | `section`      | `art`          |
    /// | `type`         | `single`       |
    /// | `label`        | empty          |
    /// | `summary`      | empty          |
    /// | `post-to-site` | `false`        |
    pub fn resolve(self, body_lines: Vec<String>, source: &Path) -> ContentDocument {
        ContentDocument {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            date: self.date.unwrap_or_else(|| DEFAULT_DATE.to_string()),
            section: self.section.unwrap_or_else(|| DEFAULT_SECTION.to_string()),
            layout: self
                .layout
                .as_deref()
                .map(Layout::from_front_matter)
                .unwrap_or_default(),
            label: self.label.unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
            publish_to_index: self.post_to_site.as_deref().is_some_and(is_truthy),
            body_lines,
            source: source.to_path_buf(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    TRUTHY.iter().any(|t| value.eq_ignore_ascii_case(t))
}

/// Split lines at the first blank line and parse the metadata above it.
pub fn parse_lines<S: AsRef<str>>(lines: &[S], source: &Path) -> Result<ContentDocument, ParseError> {
    let blank = lines
        .iter()
        .position(|l| l.as_ref().trim().is_empty())
        .ok_or_else(|| ParseError::MalformedDocument(source.to_path_buf()))?;

    let front = FrontMatter::from_lines(&lines[..blank]);
    let body = lines[blank + 1..]
        .iter()
        .map(|l| l.as_ref().to_string())
        .collect();
    Ok(front.resolve(body, source))
}

/// Parse a whole content file.
pub fn parse_document(text: &str, source: &Path) -> Result<ContentDocument, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    parse_lines(&lines, source)
}

impl ContentDocument {
    /// Serialize the resolved metadata back to front-matter lines.
    ///
    /// Parsing the output reproduces the same metadata.
    pub fn front_matter_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("title: {}", self.title),
            format!("date: {}", self.date),
            format!("section: {}", self.section),
            format!("type: {}", self.layout),
        ];
        if !self.label.is_empty() {
            lines.push(format!("label: {}", self.label));
        }
        if !self.summary.is_empty() {
            lines.push(format!("summary: {}", self.summary));
        }
        lines.push(format!("post-to-site: {}", self.publish_to_index));
        lines
    }
}
