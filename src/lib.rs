//! # Folio
//!
//! A content compiler for a hand-built static site. Posts are written as
//! small Markdown files with a front-matter header; folio renders them into
//! hand-written HTML page templates, keeps each section's post listing in
//! sync, and assembles the top-level page from reusable section fragments.
//!
//! # Architecture
//!
//! ```text
//! markdown/*.md
//!    │  frontmatter   split metadata / body
//!    │  markdown      body lines → HTML fragment
//!    │  template      fragment + metadata → posts/<section>/<slug>.html
//!    ▼
//! compiled posts ──listing──▶ sections/<section>.html  (marker region rebuilt)
//!                                   │
//!                                   ▼
//! index.template.html ──compose──▶ index.html
//! ```
//!
//! Every stage is a plain function over strings and structs. Only
//! [`pipeline`], [`listing::rebuild_section_listings`] and
//! [`compose::compose_site`] touch the filesystem, so the rest is tested
//! without any setup.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | `key: value` header parsing with defaults, and re-serialization |
//! | [`markdown`] | Line-oriented Markdown subset renderer |
//! | [`template`] | Binds a document into the single or gallery page template |
//! | [`listing`] | Rebuilds the marker-delimited post listing of each section fragment |
//! | [`compose`] | Replaces `{{section:<id>}}` placeholders in the site shell |
//! | [`pipeline`] | Discovers content, compiles documents in parallel, runs the listing rebuild |
//! | [`config`] | `site.toml` loading, merging and validation |
//! | [`types`] | Shared types: `ContentDocument`, `Layout`, `ImageRef`, `PageOutput` |
//! | [`naming`] | Slugs and display-title casing |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Templates Stay Hand-Written
//!
//! Page templates are ordinary HTML files a person edits in a browser-ready
//! state, with literal placeholder text ("Art Title", "YYYY-MM-DD · Art")
//! where generated values go. There is no templating language: binding is a
//! fixed sequence of string replacements plus wrapper-scoped block swaps.
//! Only the markup folio generates itself (gallery blocks, listing entries,
//! back links) is built with [Maud](https://maud.lambda.xyz/), which escapes
//! interpolated text.
//!
//! ## Generated Regions Are Replaced, Never Merged
//!
//! A section listing is rebuilt from scratch on every run from the posts
//! compiled in that run. Everything outside the markers is left byte-for-byte
//! alone, so hand-written entries can sit next to generated ones. Running a
//! build twice produces identical files.

pub mod compose;
pub mod config;
pub mod frontmatter;
pub mod listing;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
