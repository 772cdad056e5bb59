//! Build pipeline: content files in, post pages and section listings out.
//!
//! ```text
//! markdown/*.md ──parse──▶ ContentDocument ──render+bind──▶ posts/<section>/<slug>.html
//!                                   │
//!                                   └── ListingEntry ──(after all docs)──▶ sections/<section>.html
//! ```
//!
//! Documents are independent, so they are parsed and bound in parallel on
//! the rayon pool. Output paths are then claimed in content-file order: the
//! first document to map to a `<section>/<slug>.html` owns it and any later
//! one is recorded as a failure. Only then are pages written, again in
//! parallel. The listing rebuild touches shared section fragments and
//! therefore runs once, sequentially, after every document has finished.
//!
//! A document that is malformed (no blank line after the front matter), is a
//! gallery without images, needs a missing template, or collides with an
//! earlier document's output path is recorded as a
//! [`Failure`] and the batch carries on. I/O errors abort the run; files
//! already written stay written, and re-running is always safe because every
//! output is fully overwritten.

use crate::config::{ConfigError, SiteConfig};
use crate::frontmatter::{ParseError, parse_document};
use crate::listing::{ListingEntry, ListingError, ListingUpdate, meta_label, rebuild_section_listings};
use crate::markdown::extract_summary;
use crate::naming::slugify;
use crate::template::{BindError, PageTemplates, TemplateBinder, TemplateReadError};
use crate::types::{ContentDocument, Layout, PageOutput};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),
    #[error(transparent)]
    Template(#[from] TemplateReadError),
}

impl BuildError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
        move |source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Per-document failure. Does not stop the rest of the batch.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("Output {path} already produced by {first}")]
    DuplicateOutput { path: PathBuf, first: PathBuf },
}

/// A document that made it all the way to HTML.
#[derive(Debug, Clone)]
pub struct CompiledPost {
    pub document: ContentDocument,
    pub page: PageOutput,
    pub entry: ListingEntry,
}

/// Report line for a compiled post.
#[derive(Debug, Clone, Serialize)]
pub struct PostRecord {
    pub title: String,
    pub date: String,
    pub section: String,
    pub layout: Layout,
    pub source: PathBuf,
    /// Output path relative to the site root.
    pub output: PathBuf,
    pub published: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub source: PathBuf,
    pub message: String,
}

/// Everything a build did, in content-file order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub posts: Vec<PostRecord>,
    pub failures: Vec<Failure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub listings: Vec<ListingUpdate>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compile one parsed document into its page and listing entry.
pub fn compile_document(
    document: ContentDocument,
    binder: &TemplateBinder<'_>,
    config: &SiteConfig,
) -> Result<CompiledPost, BindError> {
    let html = binder.bind(&document)?;
    let page = PageOutput {
        path: PathBuf::from(&document.section).join(format!("{}.html", slugify(&document.title))),
        html,
    };

    let summary = if document.summary.is_empty() {
        extract_summary(&document.body_lines)
            .unwrap_or_else(|| config.listing.fallback_summary.clone())
    } else {
        document.summary.clone()
    };
    let entry = ListingEntry {
        title: document.title.clone(),
        date: document.date.clone(),
        section: document.section.clone(),
        meta: meta_label(&document.label, document.layout.as_str()),
        href: format!(
            "{}/{}/{}",
            config.site.posts_url.trim_end_matches('/'),
            document.section,
            page.file_name()
        ),
        summary,
        publish: document.publish_to_index,
    };

    Ok(CompiledPost {
        document,
        page,
        entry,
    })
}

/// Parse and compile the text of one content file.
pub fn compile_source(
    text: &str,
    source: &Path,
    binder: &TemplateBinder<'_>,
    config: &SiteConfig,
) -> Result<CompiledPost, CompileError> {
    let document = parse_document(text, source)?;
    Ok(compile_document(document, binder, config)?)
}

/// Markdown files directly inside `dir`, sorted by name. Names starting with
/// `_` or `.` are drafts/partials and skipped. A missing directory yields an
/// empty list.
pub fn discover_content(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "no markdown directory found");
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy();
        let is_markdown = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if is_markdown && !name.starts_with('_') && !name.starts_with('.') {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

enum Outcome {
    Compiled(Box<CompiledPost>),
    Failed(Failure),
}

/// Compile every content file. Pages are written only when `write` is set.
fn compile_all(
    root: &Path,
    config: &SiteConfig,
    write: bool,
) -> Result<(BuildReport, Vec<ListingEntry>), BuildError> {
    let markdown_dir = root.join(&config.paths.markdown_dir);
    let posts_dir = root.join(&config.paths.posts_dir);
    let files = discover_content(&markdown_dir)?;
    tracing::info!(count = files.len(), dir = %markdown_dir.display(), "compiling content files");

    let templates = PageTemplates::load(root, config)?;
    let binder = TemplateBinder::new(config, &templates);

    let outcomes = files
        .par_iter()
        .map(|path| -> Result<Outcome, BuildError> {
            let text = fs::read_to_string(path).map_err(BuildError::io(path))?;
            match compile_source(&text, path, &binder, config) {
                Ok(post) => {
                    tracing::debug!(
                        source = %post.document.source_name(),
                        output = %post.page.path.display(),
                        "compiled"
                    );
                    Ok(Outcome::Compiled(Box::new(post)))
                }
                Err(e) => {
                    tracing::error!(source = %path.display(), "{e}");
                    Ok(Outcome::Failed(Failure {
                        source: path.clone(),
                        message: e.to_string(),
                    }))
                }
            }
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let mut report = BuildReport::default();
    let mut entries = Vec::new();
    let mut pages = Vec::new();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Compiled(post) => {
                let CompiledPost {
                    document,
                    page,
                    entry,
                } = *post;
                if let Some(first) = claimed.get(&page.path) {
                    let e = CompileError::DuplicateOutput {
                        path: page.path.clone(),
                        first: first.clone(),
                    };
                    tracing::error!(source = %document.source.display(), "{e}");
                    report.failures.push(Failure {
                        source: document.source,
                        message: e.to_string(),
                    });
                    continue;
                }
                claimed.insert(page.path.clone(), document.source.clone());
                report.posts.push(PostRecord {
                    title: document.title,
                    date: document.date,
                    section: document.section,
                    layout: document.layout,
                    source: document.source,
                    output: Path::new(&config.paths.posts_dir).join(&page.path),
                    published: document.publish_to_index,
                });
                entries.push(entry);
                pages.push(page);
            }
            Outcome::Failed(failure) => report.failures.push(failure),
        }
    }

    if write {
        pages.par_iter().try_for_each(|page| {
            page.write_under(&posts_dir)
                .map(|_| ())
                .map_err(BuildError::io(&posts_dir.join(&page.path)))
        })?;
    }
    Ok((report, entries))
}

/// Run a full build: compile and write every post, then rebuild the section
/// listings from the posts compiled in this run.
pub fn build(root: &Path, config: &SiteConfig) -> Result<BuildReport, BuildError> {
    let (mut report, entries) = compile_all(root, config, true)?;
    let sections_dir = root.join(&config.paths.sections_dir);
    report.listings = rebuild_section_listings(&sections_dir, &entries, config)?;
    tracing::info!(
        posts = report.posts.len(),
        failures = report.failures.len(),
        "build finished"
    );
    Ok(report)
}

/// Compile everything in memory without writing pages or fragments.
pub fn check(root: &Path, config: &SiteConfig) -> Result<BuildReport, BuildError> {
    let (report, _) = compile_all(root, config, false)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn discover_skips_partials_and_other_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        for name in ["b.md", "a.MD", "_draft.md", ".hidden.md", "notes.txt"] {
            fs::write(tmp.path().join(name), "title: x\n\n").unwrap();
        }
        fs::create_dir(tmp.path().join("nested.md")).unwrap();
        let names: Vec<String> = discover_content(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.MD", "b.md"]);
    }

    #[test]
    fn discover_missing_dir_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(discover_content(&tmp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn compile_document_builds_entry() {
        let config = SiteConfig::default();
        let templates = PageTemplates::new(Some(single_template()), None);
        let binder = TemplateBinder::new(&config, &templates);
        let post = compile_source(
            "title: Hello, World!\nsection: music\npost-to-site: yes\n\n# Hello\n![a](a.jpg)\nFirst words.\n",
            Path::new("hello.md"),
            &binder,
            &config,
        )
        .unwrap();
        assert_eq!(post.page.path, PathBuf::from("music/hello-world.html"));
        assert_eq!(post.entry.href, "posts/music/hello-world.html");
        assert_eq!(post.entry.summary, "First words.");
        assert_eq!(post.entry.meta, "Single");
        assert!(post.entry.publish);
    }

    #[test]
    fn explicit_label_and_summary_win() {
        let config = SiteConfig::default();
        let templates = PageTemplates::new(Some(single_template()), None);
        let binder = TemplateBinder::new(&config, &templates);
        let post = compile_source(
            "title: T\nlabel: Sketch\nsummary: Given.\n\nBody text.\n",
            Path::new("t.md"),
            &binder,
            &config,
        )
        .unwrap();
        assert_eq!(post.entry.meta, "Sketch");
        assert_eq!(post.entry.summary, "Given.");
    }

    #[test]
    fn empty_body_uses_fallback_summary() {
        let config = SiteConfig::default();
        let templates = PageTemplates::new(Some(single_template()), None);
        let binder = TemplateBinder::new(&config, &templates);
        let post = compile_source("title: T\n\n# Only a heading\n", Path::new("t.md"), &binder, &config)
            .unwrap();
        assert_eq!(post.entry.summary, "New post.");
    }

    #[test]
    fn malformed_document_is_compile_error() {
        let config = SiteConfig::default();
        let templates = PageTemplates::new(Some(single_template()), None);
        let binder = TemplateBinder::new(&config, &templates);
        let result = compile_source("title: T", Path::new("t.md"), &binder, &config);
        assert!(matches!(result, Err(CompileError::Parse(ParseError::MalformedDocument(_)))));
    }

    #[test]
    fn build_fixture_site() {
        let tmp = setup_fixtures();
        let config = crate::config::load_config(tmp.path()).unwrap();
        let report = build(tmp.path(), &config).unwrap();

        assert_eq!(
            post_titles(&report),
            vec!["Night Walk", "Older Sketch", "Studio Notes", "Untitled Song"]
        );
        assert_eq!(failed_sources(&report), vec!["broken-gallery.md", "no-blank-separator.md"]);
        assert!(!report.is_success());

        let night_walk = read_post(tmp.path(), "field-notes/night-walk.html");
        assert!(night_walk.contains("<title>Night Walk · Zach Isn't Dead</title>"));
        assert!(night_walk.contains(r#"class="gallery-thumb""#));
        assert_tags_balanced(&night_walk);

        let art = read_section(tmp.path(), "art");
        let newer = art.find(">Studio Notes<").unwrap();
        let older = art.find(">Older Sketch<").unwrap();
        assert!(newer < older);
        assert!(art.contains("<article class=\"post-item\">Hand-written entry</article>"));
        assert!(!tmp.path().join("posts/art/draft-idea.html").exists());
    }

    #[test]
    fn colliding_output_is_a_failure_and_first_document_wins() {
        let tmp = setup_fixtures();
        fs::write(
            tmp.path().join("markdown/zz-studio-notes.md"),
            "title: Studio Notes\ndate: 2025-05-05\nsection: art\npost-to-site: yes\n\nA second take.\n",
        )
        .unwrap();
        let config = crate::config::load_config(tmp.path()).unwrap();
        let report = build(tmp.path(), &config).unwrap();

        assert!(failed_sources(&report).contains(&"zz-studio-notes.md".to_string()));
        let failure = report
            .failures
            .iter()
            .find(|f| f.source.ends_with("zz-studio-notes.md"))
            .unwrap();
        assert!(failure.message.contains("studio-notes.md"));

        let page = read_post(tmp.path(), "art/studio-notes.html");
        assert!(page.contains("Reorganised"));
        assert!(!page.contains("A second take."));
        assert_eq!(read_section(tmp.path(), "art").matches(">Studio Notes<").count(), 1);
    }

    #[test]
    fn unreadable_template_is_reported_with_its_path() {
        let tmp = setup_fixtures();
        let config = crate::config::load_config(tmp.path()).unwrap();
        let single = tmp.path().join(&config.templates.single);
        fs::remove_file(&single).unwrap();
        fs::create_dir(&single).unwrap();

        let err = build(tmp.path(), &config).unwrap_err();
        assert!(matches!(&err, BuildError::Template(e) if e.path == single));
        assert!(err.to_string().contains("_single-template.html"));
    }

    #[test]
    fn check_writes_nothing() {
        let tmp = setup_fixtures();
        let config = crate::config::load_config(tmp.path()).unwrap();
        let before = read_section(tmp.path(), "art");
        let report = check(tmp.path(), &config).unwrap();
        assert!(!report.posts.is_empty());
        assert!(report.listings.is_empty());
        assert!(!tmp.path().join("posts/art/studio-notes.html").exists());
        assert_eq!(read_section(tmp.path(), "art"), before);
    }

    #[test]
    fn build_twice_is_byte_identical() {
        let tmp = setup_fixtures();
        let config = crate::config::load_config(tmp.path()).unwrap();
        build(tmp.path(), &config).unwrap();
        let first_art = read_section(tmp.path(), "art");
        let first_post = read_post(tmp.path(), "art/studio-notes.html");
        build(tmp.path(), &config).unwrap();
        assert_eq!(read_section(tmp.path(), "art"), first_art);
        assert_eq!(read_post(tmp.path(), "art/studio-notes.html"), first_post);
    }
}
