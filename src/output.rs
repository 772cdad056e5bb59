//! CLI output formatting for build, check and compose.
//!
//! Output is information-first: each post leads with its positional index
//! and title, with source and output paths as indented context lines. Paths
//! are shown relative to the site root.
//!
//! # Output Format
//!
//! ## Build / Check
//!
//! ```text
//! Posts
//! 001 Night Walk (gallery)
//!     Source: markdown/night-walk.md
//!     Output: posts/field-notes/night-walk.html
//! 002 Untitled Song (single)
//!     Source: markdown/untitled-song.md
//!     Output: posts/music/untitled-song.html
//!     Not listed
//!
//! Failures
//! 001 broken-gallery.md
//!     Gallery type requires images in markdown/broken-gallery.md
//!
//! Listings
//! art → sections/art.html (2 entries)
//! music: no listing markers in sections/music.html
//!
//! Compiled 2 posts, 1 failure
//! ```
//!
//! ## Compose
//!
//! ```text
//! Shell → index.html
//!     Sections: art, header, music
//! ```
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::compose::ComposeReport;
use crate::listing::{ListingOutcome, ListingUpdate};
use crate::pipeline::{BuildReport, Failure, PostRecord};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Display `path` relative to `root` when it lives under it.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn count(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

fn post_lines(index: usize, post: &PostRecord, root: &Path) -> Vec<String> {
    let mut lines = vec![
        format!("{} {} ({})", format_index(index), post.title, post.layout),
        format!("    Source: {}", relative(&post.source, root)),
        format!("    Output: {}", post.output.display()),
    ];
    if !post.published {
        lines.push("    Not listed".to_string());
    }
    lines
}

fn failure_lines(index: usize, failure: &Failure, root: &Path) -> Vec<String> {
    let name = failure
        .source
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| relative(&failure.source, root));
    // Messages embed absolute paths; shorten them for display.
    let root_prefix = format!("{}/", root.display());
    vec![
        format!("{} {}", format_index(index), name),
        format!("    {}", failure.message.replace(&root_prefix, "")),
    ]
}

fn listing_line(update: &ListingUpdate, root: &Path) -> String {
    let fragment = relative(&update.fragment, root);
    match &update.outcome {
        ListingOutcome::Updated { entries } => format!(
            "{} \u{2192} {} ({})",
            update.section,
            fragment,
            count(*entries, "entry", "entries")
        ),
        ListingOutcome::NoFragment => format!("{}: no fragment at {}", update.section, fragment),
        ListingOutcome::NoMarkers => {
            format!("{}: no listing markers in {}", update.section, fragment)
        }
    }
}

/// Format a build or check report.
pub fn format_build_output(report: &BuildReport, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.posts.is_empty() {
        lines.push("Posts".to_string());
        for (i, post) in report.posts.iter().enumerate() {
            lines.extend(post_lines(i + 1, post, root));
        }
    }

    if !report.failures.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Failures".to_string());
        for (i, failure) in report.failures.iter().enumerate() {
            lines.extend(failure_lines(i + 1, failure, root));
        }
    }

    if !report.listings.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Listings".to_string());
        for update in &report.listings {
            lines.push(listing_line(update, root));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Compiled {}, {}",
        count(report.posts.len(), "post", "posts"),
        count(report.failures.len(), "failure", "failures")
    ));
    lines
}

/// Print a build or check report to stdout.
pub fn print_build_output(report: &BuildReport, root: &Path) {
    for line in format_build_output(report, root) {
        println!("{}", line);
    }
}

/// Format the result of composing the site shell.
pub fn format_compose_output(report: &ComposeReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!("Shell \u{2192} {}", relative(&report.output, root))];
    if report.sections.is_empty() {
        lines.push("    No section placeholders".to_string());
    } else {
        lines.push(format!("    Sections: {}", report.sections.join(", ")));
    }
    lines
}

/// Print compose output to stdout.
pub fn print_compose_output(report: &ComposeReport, root: &Path) {
    for line in format_compose_output(report, root) {
        println!("{}", line);
    }
}
