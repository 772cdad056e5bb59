//! Page template binding.
//!
//! Post pages are not generated from scratch: each layout has a hand-written
//! HTML template containing literal placeholder text (`Art Title`,
//! `YYYY-MM-DD · Art`, a placeholder image path). Binding is a fixed sequence
//! of literal replacements plus a few wrapper-scoped block swaps:
//!
//! 1. `"<title placeholder> · <site name>"` → `"<title> · <site name>"`
//! 2. `<title placeholder>` → `<title>`
//! 3. byline placeholder → `"<date> · <Section>"`
//! 4. layout blocks (gallery main image and thumbnails, or the single image)
//! 5. the first `<section class="article">` block → rendered body + back link
//!
//! Block swaps replace the wrapper's whole inner content; whatever the
//! template had there is discarded. Generated markup is built with maud so
//! titles, alt text and paths are escaped.

use crate::config::SiteConfig;
use crate::markdown::{MarkdownRenderer, thumbnail_path};
use crate::naming::title_case;
use crate::types::{ContentDocument, ImageRef, Layout};
use maud::html;
use regex::{NoExpand, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("Gallery type requires images in {0}")]
    NoGalleryImages(PathBuf),
    #[error("No {0} template available (expected at {1})")]
    MissingTemplate(Layout, PathBuf),
}

/// A template file exists but could not be read.
#[derive(Error, Debug)]
#[error("Cannot read template {path}: {source}")]
pub struct TemplateReadError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

static GALLERY_MAIN_RE: OnceLock<Regex> = OnceLock::new();
static GALLERY_THUMBS_RE: OnceLock<Regex> = OnceLock::new();
static ARTICLE_RE: OnceLock<Regex> = OnceLock::new();

fn gallery_main_re() -> &'static Regex {
    GALLERY_MAIN_RE.get_or_init(|| Regex::new(r#"<div class="gallery-main">[\s\S]*?</div>"#).unwrap())
}

fn gallery_thumbs_re() -> &'static Regex {
    GALLERY_THUMBS_RE
        .get_or_init(|| Regex::new(r#"<div class="gallery-thumbs">[\s\S]*?</div>"#).unwrap())
}

fn article_re() -> &'static Regex {
    ARTICLE_RE.get_or_init(|| Regex::new(r#"<section class="article">[\s\S]*?</section>"#).unwrap())
}

/// HTML-escape text for use in element content or attribute values.
pub fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// The two layout templates. Either may be absent; a document only fails if
/// it needs the missing one.
#[derive(Debug, Clone, Default)]
pub struct PageTemplates {
    pub single: Option<String>,
    pub gallery: Option<String>,
    single_path: PathBuf,
    gallery_path: PathBuf,
}

impl PageTemplates {
    pub fn new(single: Option<String>, gallery: Option<String>) -> Self {
        Self {
            single,
            gallery,
            ..Self::default()
        }
    }

    /// Read both templates relative to the site root.
    pub fn load(root: &Path, config: &SiteConfig) -> Result<Self, TemplateReadError> {
        let single_path = root.join(&config.templates.single);
        let gallery_path = root.join(&config.templates.gallery);
        Ok(Self {
            single: read_optional(&single_path)?,
            gallery: read_optional(&gallery_path)?,
            single_path,
            gallery_path,
        })
    }

    fn get(&self, layout: Layout) -> Result<&str, BindError> {
        let (text, path) = match layout {
            Layout::Single => (&self.single, &self.single_path),
            Layout::Gallery => (&self.gallery, &self.gallery_path),
        };
        text.as_deref()
            .ok_or_else(|| BindError::MissingTemplate(layout, path.clone()))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, TemplateReadError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(TemplateReadError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Leading image run of a body, as consumed by the page layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadImages {
    pub images: Vec<ImageRef>,
    /// Body with the consumed image lines removed.
    pub body: Vec<String>,
}

/// Find the image run that opens a post: after any blank lines, at most one
/// `# ` heading, and blank lines after it. `take` limits how many of those
/// images are consumed; the rest stay in the body.
pub fn split_lead_images(lines: &[String], take: Option<usize>) -> LeadImages {
    let skip_blank = |mut i: usize| {
        while i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
        i
    };
    let mut index = skip_blank(0);
    if index < lines.len() && lines[index].trim().starts_with("# ") {
        index += 1;
    }
    index = skip_blank(index);

    let block_start = index;
    let mut images = Vec::new();
    while index < lines.len() && take.is_none_or(|n| images.len() < n) {
        match crate::markdown::parse_image(&lines[index]) {
            Some(image) => images.push(image),
            None => break,
        }
        index += 1;
    }

    if images.is_empty() {
        return LeadImages {
            images,
            body: lines.to_vec(),
        };
    }
    let body = lines[..block_start]
        .iter()
        .chain(&lines[index..])
        .cloned()
        .collect();
    LeadImages { images, body }
}

/// Binds documents into their layout template.
#[derive(Debug)]
pub struct TemplateBinder<'a> {
    config: &'a SiteConfig,
    templates: &'a PageTemplates,
    renderer: MarkdownRenderer,
}

impl<'a> TemplateBinder<'a> {
    pub fn new(config: &'a SiteConfig, templates: &'a PageTemplates) -> Self {
        Self {
            config,
            templates,
            renderer: MarkdownRenderer::new(config.site.assets_root.clone()),
        }
    }

    /// Render the document body and bind it into its layout template.
    pub fn bind(&self, doc: &ContentDocument) -> Result<String, BindError> {
        let template = self.templates.get(doc.layout)?;
        let take = match doc.layout {
            Layout::Gallery => None,
            Layout::Single => Some(1),
        };
        let lead = split_lead_images(&doc.body_lines, take);
        let body_html = self.renderer.render(&lead.body);

        let html = match doc.layout {
            Layout::Gallery => self.bind_gallery(template, doc, &lead.images)?,
            Layout::Single => self.bind_single(template, doc, &lead.images),
        };
        Ok(self.inject_article(html, doc, &body_html))
    }

    fn bind_header(&self, template: &str, placeholder: &str, doc: &ContentDocument) -> String {
        let site = &self.config.site.name;
        let title = escape(&doc.title);
        template
            .replace(
                &format!("{placeholder} · {site}"),
                &format!("{title} · {site}"),
            )
            .replace(placeholder, &title)
            .replace(
                &self.config.templates.byline,
                &format!("{} · {}", escape(&doc.date), escape(&title_case(&doc.section))),
            )
    }

    fn bind_gallery(
        &self,
        template: &str,
        doc: &ContentDocument,
        images: &[ImageRef],
    ) -> Result<String, BindError> {
        let Some(main) = images.first() else {
            return Err(BindError::NoGalleryImages(doc.source.clone()));
        };
        let html = self.bind_header(template, &self.config.templates.gallery_title, doc);

        let main_block = html! {
            img src=(self.renderer.resolve(&main.path)) alt=(main.alt);
        }
        .into_string();
        let html = gallery_main_re().replace(
            &html,
            NoExpand(&format!(
                "<div class=\"gallery-main\">\n            {main_block}\n          </div>"
            )),
        );

        let thumbs: Vec<String> = images
            .iter()
            .enumerate()
            .map(|(i, image)| self.thumbnail_button(i + 1, image))
            .collect();
        let html = gallery_thumbs_re().replace(
            &html,
            NoExpand(&format!(
                "<div class=\"gallery-thumbs\">\n{}\n          </div>",
                thumbs.join("\n")
            )),
        );
        Ok(html.into_owned())
    }

    fn thumbnail_button(&self, number: usize, image: &ImageRef) -> String {
        let full = self.renderer.resolve(&image.path);
        let thumb = self.renderer.resolve(&thumbnail_path(&image.path));
        let alt = if image.alt.is_empty() {
            format!("Image {number}")
        } else {
            image.alt.clone()
        };
        let button = html! {
            button.gallery-thumb type="button" data-full=(full) data-alt=(alt) data-caption="" {
                img src=(thumb) alt={ "Thumbnail " (number) "." };
            }
        };
        format!("            {}", button.into_string())
    }

    fn bind_single(&self, template: &str, doc: &ContentDocument, images: &[ImageRef]) -> String {
        let html = self.bind_header(template, &self.config.templates.single_title, doc);
        match images.first() {
            Some(main) => html.replace(
                &self.config.templates.image_placeholder,
                &escape(&self.renderer.resolve(&main.path)),
            ),
            None => html,
        }
    }

    fn inject_article(&self, html: String, doc: &ContentDocument, body_html: &str) -> String {
        if !article_re().is_match(&html) {
            tracing::warn!(
                source = %doc.source.display(),
                "template has no <section class=\"article\"> block; body not injected"
            );
            return html;
        }
        let back_link = html! {
            a.back-link href={ (self.config.site.index_page) "#" (doc.section) } {
                "← Back to " (title_case(&doc.section))
            }
        }
        .into_string();
        let block = format!(
            "<section class=\"article\">\n{body_html}\n        {back_link}\n      </section>"
        );
        article_re().replace(&html, NoExpand(&block)).into_owned()
    }
}
