//! Section listing regeneration.
//!
//! Each section fragment (`sections/<section>.html`) may contain a generated
//! region between two marker comments:
//!
//! ```html
//! <div class="post-list">
//!   <!-- md-posts:start -->
//!   ...owned by folio, rewritten on every build...
//!   <!-- md-posts:end -->
//!   <article class="post-item">hand-written entries stay put</article>
//! </div>
//! ```
//!
//! The region is rebuilt from scratch from the posts compiled in the current
//! run: whatever was there before is discarded, never merged. Sections whose
//! fragment is missing or has no complete marker pair are left alone. Every
//! fragment that does carry markers is rebuilt, even when no post of this run
//! belongs to it, so a section emptied by moving or deleting posts is cleared.
//!
//! Entries are ordered by `date` descending using plain string comparison, so
//! dates must be zero-padded ISO-8601 to sort correctly. Equal dates keep
//! their input order.

use crate::config::SiteConfig;
use crate::naming::title_case;
use maud::html;
use regex::{NoExpand, Regex};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One compiled post as seen by the listing rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    pub title: String,
    pub date: String,
    pub section: String,
    /// Resolved meta label: explicit `label:` or the capitalized layout.
    pub meta: String,
    /// Link target relative to the site shell.
    pub href: String,
    pub summary: String,
    pub publish: bool,
}

impl ListingEntry {
    fn render(&self) -> String {
        html! {
            article.post-item data-origin="md" {
                div.post-meta { (self.meta) }
                h3 { a.content-link href=(self.href) { (self.title) } }
                p { (self.summary) }
            }
        }
        .into_string()
    }
}

/// What happened to one section fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ListingOutcome {
    Updated { entries: usize },
    NoFragment,
    NoMarkers,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingUpdate {
    pub section: String,
    pub fragment: PathBuf,
    #[serde(flatten)]
    pub outcome: ListingOutcome,
}

/// Build the meta label shown above a listing entry.
pub fn meta_label(label: &str, layout: &str) -> String {
    if label.is_empty() {
        title_case(layout)
    } else {
        label.to_string()
    }
}

/// Replace the marker-delimited region of `fragment` with `entries`, newest
/// first. Returns `None` when the markers are missing or out of order.
pub fn rebuild_listing(
    fragment: &str,
    entries: &[&ListingEntry],
    start_marker: &str,
    end_marker: &str,
) -> Option<String> {
    let region = region_re(start_marker, end_marker)?;
    if !region.is_match(fragment) {
        return None;
    }

    let mut sorted: Vec<&ListingEntry> = entries.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut block = String::from(start_marker);
    block.push('\n');
    for entry in sorted {
        block.push_str("    ");
        block.push_str(&entry.render());
        block.push('\n');
    }
    block.push_str("    ");
    block.push_str(end_marker);

    Some(region.replace(fragment, NoExpand(&block)).into_owned())
}

/// Whether `fragment` holds a start marker followed by an end marker.
pub fn has_listing_region(fragment: &str, start_marker: &str, end_marker: &str) -> bool {
    region_re(start_marker, end_marker).is_some_and(|re| re.is_match(fragment))
}

fn region_re(start_marker: &str, end_marker: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"{}[\s\S]*?{}",
        regex::escape(start_marker),
        regex::escape(end_marker)
    ))
    .ok()
}

/// Rebuild the listing region of every section in `entries`, plus every
/// marker-bearing fragment in `sections_dir`.
///
/// Sections are considered whether their posts are published or not, so a
/// section whose last published post was withdrawn gets an empty region.
/// Fragments are rewritten only when their content actually changes.
pub fn rebuild_section_listings(
    sections_dir: &Path,
    entries: &[ListingEntry],
    config: &SiteConfig,
) -> Result<Vec<ListingUpdate>, ListingError> {
    let mut by_section: BTreeMap<String, Vec<&ListingEntry>> =
        marked_fragments(sections_dir, config)?
            .into_iter()
            .map(|section| (section, Vec::new()))
            .collect();
    for entry in entries {
        let bucket = by_section.entry(entry.section.clone()).or_default();
        if entry.publish {
            bucket.push(entry);
        }
    }

    let mut updates = Vec::new();
    for (section, published) in by_section {
        let fragment = sections_dir.join(format!("{section}.html"));
        let outcome = rebuild_fragment(&fragment, &published, config)?;
        match &outcome {
            ListingOutcome::Updated { entries } => {
                tracing::info!(section = section.as_str(), entries, "rebuilt section listing")
            }
            ListingOutcome::NoFragment => {
                tracing::debug!(section = section.as_str(), "no section fragment; listing skipped")
            }
            ListingOutcome::NoMarkers => {
                tracing::warn!(section = section.as_str(), path = %fragment.display(), "section fragment has no listing markers")
            }
        }
        updates.push(ListingUpdate {
            section,
            fragment,
            outcome,
        });
    }
    Ok(updates)
}

/// Stems of the `.html` fragments directly in `sections_dir` that contain a
/// listing region. A missing directory yields an empty list.
fn marked_fragments(sections_dir: &Path, config: &SiteConfig) -> Result<Vec<String>, ListingError> {
    if !sections_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut sections = Vec::new();
    for entry in WalkDir::new(sections_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();
        let is_html = entry.file_type().is_file()
            && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("html"));
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).filter(|_| is_html) else {
            continue;
        };
        let html = fs::read_to_string(path).map_err(|source| ListingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if has_listing_region(&html, &config.listing.start_marker, &config.listing.end_marker) {
            sections.push(stem.to_string());
        }
    }
    Ok(sections)
}

fn rebuild_fragment(
    path: &Path,
    published: &[&ListingEntry],
    config: &SiteConfig,
) -> Result<ListingOutcome, ListingError> {
    let io_err = |source| ListingError::Io {
        path: path.to_path_buf(),
        source,
    };
    if !path.is_file() {
        return Ok(ListingOutcome::NoFragment);
    }
    let html = fs::read_to_string(path).map_err(io_err)?;
    let Some(updated) = rebuild_listing(
        &html,
        published,
        &config.listing.start_marker,
        &config.listing.end_marker,
    ) else {
        return Ok(ListingOutcome::NoMarkers);
    };
    if updated != html {
        fs::write(path, updated).map_err(io_err)?;
    }
    Ok(ListingOutcome::Updated {
        entries: published.len(),
    })
}
