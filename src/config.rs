//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. The file lives at the
//! site root and is optional: stock defaults describe the standard layout, and
//! a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! name = "Zach Isn't Dead"       # Appended to page titles: "<title> · <name>"
//! assets_root = "../../assets"   # Prefix for bare image paths in posts
//! posts_url = "posts"            # Listing links: <posts_url>/<section>/<slug>.html
//! index_page = "../../index.html" # Back-link target from a post page
//!
//! [paths]
//! markdown_dir = "markdown"
//! posts_dir = "posts"
//! sections_dir = "sections"
//! shell_template = "index.template.html"
//! shell_output = "index.html"
//!
//! [templates]
//! single = "posts/art/_single-template.html"
//! gallery = "posts/art/_gallery-template.html"
//! single_title = "Art Title"
//! gallery_title = "Art Series Title"
//! byline = "YYYY-MM-DD · Art"
//! image_placeholder = "../../assets/your-image.jpg"
//!
//! [listing]
//! start_marker = "<!-- md-posts:start -->"
//! end_marker = "<!-- md-posts:end -->"
//! fallback_summary = "New post."
//!
//! [processing]
//! max_processes = 4              # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity and URL layout.
    pub site: SiteMeta,
    /// Input and output locations, relative to the site root.
    pub paths: PathsConfig,
    /// Page template files and the literal placeholders inside them.
    pub templates: TemplatesConfig,
    /// Section listing markers and defaults.
    pub listing: ListingConfig,
    /// Parallel compile settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate values that would make substitution silently misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.name.trim().is_empty() {
            return Err(ConfigError::Validation("site.name must not be empty".into()));
        }
        if self.listing.start_marker.is_empty() || self.listing.end_marker.is_empty() {
            return Err(ConfigError::Validation(
                "listing markers must not be empty".into(),
            ));
        }
        if self.listing.start_marker == self.listing.end_marker {
            return Err(ConfigError::Validation(
                "listing.start_marker and listing.end_marker must differ".into(),
            ));
        }
        for (key, value) in [
            ("templates.single_title", &self.templates.single_title),
            ("templates.gallery_title", &self.templates.gallery_title),
            ("templates.byline", &self.templates.byline),
            ("templates.image_placeholder", &self.templates.image_placeholder),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Site name, as it appears after the `·` in every page title.
    pub name: String,
    /// Prefix for image paths written without a directory root.
    pub assets_root: String,
    /// URL prefix of the posts directory as seen from the site shell.
    pub posts_url: String,
    /// Shell page as seen from a post page; the back link appends `#<section>`.
    pub index_page: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            name: "Zach Isn't Dead".to_string(),
            assets_root: "../../assets".to_string(),
            posts_url: "posts".to_string(),
            index_page: "../../index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub markdown_dir: String,
    pub posts_dir: String,
    pub sections_dir: String,
    pub shell_template: String,
    pub shell_output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            markdown_dir: "markdown".to_string(),
            posts_dir: "posts".to_string(),
            sections_dir: "sections".to_string(),
            shell_template: "index.template.html".to_string(),
            shell_output: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Single-image layout template file.
    pub single: String,
    /// Gallery layout template file.
    pub gallery: String,
    /// Title text in the single template that gets replaced.
    pub single_title: String,
    /// Title text in the gallery template that gets replaced.
    pub gallery_title: String,
    /// Byline text (`date · Section`) in both templates.
    pub byline: String,
    /// Main image `src` in the single template.
    pub image_placeholder: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            single: "posts/art/_single-template.html".to_string(),
            gallery: "posts/art/_gallery-template.html".to_string(),
            single_title: "Art Title".to_string(),
            gallery_title: "Art Series Title".to_string(),
            byline: "YYYY-MM-DD · Art".to_string(),
            image_placeholder: "../../assets/your-image.jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    pub start_marker: String,
    pub end_marker: String,
    /// Summary used when a post has neither a `summary:` key nor body text.
    pub fallback_summary: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            start_marker: "<!-- md-posts:start -->".to_string(),
            end_marker: "<!-- md-posts:end -->".to_string(),
            fallback_summary: "New post.".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of documents compiled in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never below one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load the site config: stock defaults with the user's `site.toml` merged on
/// top, unknown keys rejected, result validated.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to the site root.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity and URLs
# ---------------------------------------------------------------------------
[site]
# Appended to every page title as "<title> · <name>".
name = "Zach Isn't Dead"

# Bare image paths in posts (no "/", "../" or URL prefix) are placed here.
assets_root = "../../assets"

# Posts directory as linked from section listings.
posts_url = "posts"

# Shell page as linked from a post's "Back to" link.
index_page = "../../index.html"

# ---------------------------------------------------------------------------
# Locations
# ---------------------------------------------------------------------------
[paths]
markdown_dir = "markdown"
posts_dir = "posts"
sections_dir = "sections"
shell_template = "index.template.html"
shell_output = "index.html"

# ---------------------------------------------------------------------------
# Page templates and the literal text replaced inside them
# ---------------------------------------------------------------------------
[templates]
single = "posts/art/_single-template.html"
gallery = "posts/art/_gallery-template.html"
single_title = "Art Title"
gallery_title = "Art Series Title"
byline = "YYYY-MM-DD · Art"
image_placeholder = "../../assets/your-image.jpg"

# ---------------------------------------------------------------------------
# Section listings
# ---------------------------------------------------------------------------
[listing]
# Everything between these markers in sections/<section>.html is regenerated.
start_marker = "<!-- md-posts:start -->"
end_marker = "<!-- md-posts:end -->"
fallback_summary = "New post."

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum documents compiled in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
