//! Markdown renderer for the post body dialect.
//!
//! Only a small, line-oriented subset is understood:
//!
//! | Syntax                | Output                                   |
//! |-----------------------|------------------------------------------|
//! | `# text` / `## text`  | `<h1>` / `<h2>`                          |
//! | `- text`, `* text`    | `<ul><li>`                               |
//! | `1. text`             | `<ol><li>`                               |
//! | fenced code block     | `<pre><code>` with lines kept verbatim   |
//! | `![alt](path)`        | inline image, or a gallery block for runs |
//! | `` `code` ``          | `<code>` inside any of the above          |
//! | anything else         | `<p>`                                    |
//!
//! Rendering is one pass with an explicit [`Block`] state and a pending image
//! run. Consecutive image lines are buffered and flushed together: one image
//! renders as a plain `<img>`, two or more collapse into a single
//! `<div class="inline-gallery">`. Blank lines and the end of input both go
//! through the same flush so nothing is dropped and no list or code block is
//! left open.
//!
//! Text is passed through unescaped, so raw HTML written in a post survives.

use crate::types::ImageRef;
use regex::Regex;
use std::sync::OnceLock;

pub const FENCE: &str = "```";

/// Assets root used when no site config is at hand.
pub const DEFAULT_ASSETS_ROOT: &str = "../../assets";

const THUMB_MARKER: &str = "-thumb";
const THUMB_SUFFIXES: &[&str] = &["-thumb.png", "-thumb.jpg", "-thumb.jpeg"];

static IMAGE_RE: OnceLock<Regex> = OnceLock::new();
static INLINE_CODE_RE: OnceLock<Regex> = OnceLock::new();
static ORDERED_RE: OnceLock<Regex> = OnceLock::new();
static UNORDERED_RE: OnceLock<Regex> = OnceLock::new();

fn image_re() -> &'static Regex {
    IMAGE_RE.get_or_init(|| Regex::new(r"^!\[(.*?)\]\((.*?)\)\s*$").unwrap())
}

fn inline_code_re() -> &'static Regex {
    INLINE_CODE_RE.get_or_init(|| Regex::new(r"`([^`]+)`").unwrap())
}

fn ordered_re() -> &'static Regex {
    ORDERED_RE.get_or_init(|| Regex::new(r"^\s*\d+\.\s+(.*)$").unwrap())
}

fn unordered_re() -> &'static Regex {
    UNORDERED_RE.get_or_init(|| Regex::new(r"^\s*[-*]\s+(.*)$").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }
}

/// Block-level state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Normal,
    CodeBlock,
    List(ListKind),
}

/// Parse a whole line as `![alt](path)`.
pub fn parse_image(line: &str) -> Option<ImageRef> {
    image_re().captures(line.trim()).map(|c| ImageRef {
        alt: c[1].to_string(),
        path: c[2].to_string(),
    })
}

/// Replace `` `x` `` spans with `<code>x</code>`.
pub fn format_inline_code(text: &str) -> String {
    inline_code_re()
        .replace_all(text, "<code>$1</code>")
        .into_owned()
}

fn is_external(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Resolve an image path as written in a post against the assets root.
///
/// URLs and rooted paths (`/…`, `../…`) pass through; bare paths are placed
/// under `assets_root`.
pub fn resolve_image_path(path: &str, assets_root: &str) -> String {
    if is_external(path) || path.starts_with('/') || path.starts_with("../") {
        return path.to_string();
    }
    let root = assets_root.trim_end_matches('/');
    if root.is_empty() {
        path.to_string()
    } else {
        format!("{root}/{path}")
    }
}

/// Derive the gallery thumbnail path for an image: `a/b.jpg` → `a/b-thumb.jpg`.
///
/// URLs, paths that already are thumbnails, and paths whose file name has no
/// extension are returned unchanged.
pub fn thumbnail_path(path: &str) -> String {
    if is_external(path) || THUMB_SUFFIXES.iter().any(|s| path.ends_with(s)) {
        return path.to_string();
    }
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = name_start + dot;
            format!("{}{}{}", &path[..dot], THUMB_MARKER, &path[dot..])
        }
        _ => path.to_string(),
    }
}

/// Line-oriented renderer. Holds only configuration; each call to
/// [`MarkdownRenderer::render`] starts from a fresh state.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    assets_root: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_ASSETS_ROOT)
    }
}

impl MarkdownRenderer {
    pub fn new(assets_root: impl Into<String>) -> Self {
        Self {
            assets_root: assets_root.into(),
        }
    }

    pub fn resolve(&self, path: &str) -> String {
        resolve_image_path(path, &self.assets_root)
    }

    /// Render body lines into an HTML fragment, one output line per element.
    pub fn render<S: AsRef<str>>(&self, lines: &[S]) -> String {
        let mut state = RenderState::new(self);
        for line in lines {
            state.feed(line.as_ref());
        }
        state.finish()
    }
}

struct RenderState<'a> {
    renderer: &'a MarkdownRenderer,
    out: Vec<String>,
    block: Block,
    image_run: Vec<ImageRef>,
}

impl<'a> RenderState<'a> {
    fn new(renderer: &'a MarkdownRenderer) -> Self {
        Self {
            renderer,
            out: Vec::new(),
            block: Block::Normal,
            image_run: Vec::new(),
        }
    }

    fn feed(&mut self, raw: &str) {
        let line = raw.trim_end();
        let stripped = line.trim();

        if stripped.starts_with(FENCE) {
            self.flush_images();
            self.close_list();
            if self.block == Block::CodeBlock {
                self.out.push("</code></pre>".to_string());
                self.block = Block::Normal;
            } else {
                self.out.push("<pre><code>".to_string());
                self.block = Block::CodeBlock;
            }
            return;
        }

        if self.block == Block::CodeBlock {
            self.out.push(line.to_string());
            return;
        }

        if stripped.is_empty() {
            self.flush_images();
            self.close_list();
            self.out.push(String::new());
            return;
        }

        if let Some(image) = parse_image(stripped) {
            self.image_run.push(image);
            return;
        }

        self.flush_images();

        if let Some((kind, text)) = list_item(stripped) {
            if self.block != Block::List(kind) {
                self.close_list();
                self.out.push(format!("<{}>", kind.tag()));
                self.block = Block::List(kind);
            }
            self.out
                .push(format!("  <li>{}</li>", format_inline_code(text.trim())));
            return;
        }

        self.close_list();

        if let Some(text) = stripped.strip_prefix("## ") {
            self.out
                .push(format!("<h2>{}</h2>", format_inline_code(text.trim())));
        } else if let Some(text) = stripped.strip_prefix("# ") {
            self.out
                .push(format!("<h1>{}</h1>", format_inline_code(text.trim())));
        } else {
            self.out.push(format!("<p>{}</p>", format_inline_code(stripped)));
        }
    }

    fn flush_images(&mut self) {
        let renderer = self.renderer;
        match self.image_run.as_slice() {
            [] => return,
            [img] => self.out.push(image_tag(renderer, img)),
            run => {
                self.out.push(r#"<div class="inline-gallery">"#.to_string());
                for img in run {
                    self.out.push(format!("  {}", image_tag(renderer, img)));
                }
                self.out.push("</div>".to_string());
            }
        }
        self.image_run.clear();
    }

    fn close_list(&mut self) {
        if let Block::List(kind) = self.block {
            self.out.push(format!("</{}>", kind.tag()));
            self.block = Block::Normal;
        }
    }

    fn finish(mut self) -> String {
        self.flush_images();
        self.close_list();
        if self.block == Block::CodeBlock {
            self.out.push("</code></pre>".to_string());
            self.block = Block::Normal;
        }
        self.out.join("\n")
    }
}

fn image_tag(renderer: &MarkdownRenderer, img: &ImageRef) -> String {
    format!(
        r#"<img class="inline-image" src="{}" alt="{}" />"#,
        renderer.resolve(&img.path),
        img.alt
    )
}

fn list_item(line: &str) -> Option<(ListKind, &str)> {
    if let Some(c) = ordered_re().captures(line) {
        return c.get(1).map(|m| (ListKind::Ordered, m.as_str()));
    }
    unordered_re()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| (ListKind::Unordered, m.as_str()))
}

/// First body line usable as a listing summary: not blank, not a heading,
/// not an image.
pub fn extract_summary<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .find(|l| !l.is_empty() && !l.starts_with('#') && parse_image(l).is_none())
        .map(str::to_string)
}
