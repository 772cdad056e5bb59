//! Site shell composition.
//!
//! The top-level page is a template containing `{{section:<id>}}` tokens.
//! Each token is replaced by the content of `sections/<id>.html` with trailing
//! whitespace removed. Substitution is single-pass: fragment contents are not
//! scanned for further tokens.
//!
//! Every referenced fragment is loaded before anything is substituted, and
//! the output file is written only once the whole page is composed. A missing
//! fragment aborts the run with [`ComposeError::MissingSection`] and leaves any
//! previous output untouched.

use crate::config::SiteConfig;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing section file: {0}")]
    MissingSection(PathBuf),
}

/// Placeholder id → fragment content, built fresh for every composition.
pub type PlaceholderMap = BTreeMap<String, String>;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{\{section:([a-zA-Z0-9_-]+)\}\}").unwrap())
}

/// Distinct placeholder ids in order of first appearance.
pub fn placeholder_ids(template: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for caps in placeholder_re().captures_iter(template) {
        let id = &caps[1];
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Load every fragment the template references.
pub fn load_placeholders(template: &str, sections_dir: &Path) -> Result<PlaceholderMap, ComposeError> {
    let mut map = PlaceholderMap::new();
    for id in placeholder_ids(template) {
        let path = sections_dir.join(format!("{id}.html"));
        if !path.is_file() {
            return Err(ComposeError::MissingSection(path));
        }
        let content = fs::read_to_string(&path)?;
        map.insert(id, content.trim_end().to_string());
    }
    Ok(map)
}

/// Replace every placeholder with its fragment. Ids absent from the map are
/// left as written.
pub fn substitute(template: &str, fragments: &PlaceholderMap) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| match fragments.get(&caps[1]) {
            Some(content) => content.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Compose a template against a sections directory, in memory.
pub fn compose_shell(template: &str, sections_dir: &Path) -> Result<String, ComposeError> {
    let fragments = load_placeholders(template, sections_dir)?;
    Ok(substitute(template, &fragments))
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposeReport {
    pub output: PathBuf,
    pub sections: Vec<String>,
}

/// Compose the site shell from the configured template and write it.
pub fn compose_site(root: &Path, config: &SiteConfig) -> Result<ComposeReport, ComposeError> {
    let template_path = root.join(&config.paths.shell_template);
    let sections_dir = root.join(&config.paths.sections_dir);
    let output = root.join(&config.paths.shell_output);

    let template = fs::read_to_string(&template_path)?;
    let fragments = load_placeholders(&template, &sections_dir)?;
    let html = substitute(&template, &fragments);
    fs::write(&output, html)?;
    tracing::info!(output = %output.display(), sections = fragments.len(), "composed site shell");

    Ok(ComposeReport {
        output,
        sections: fragments.into_keys().collect(),
    })
}
