//! End-to-end build of the fixture site through the library API.
//!
//! Every test works on its own temp copy of `fixtures/site/`.

use folio::compose::{ComposeError, compose_site};
use folio::config::load_config;
use folio::frontmatter::parse_document;
use folio::listing::ListingOutcome;
use folio::pipeline::{BuildReport, build};
use std::fs;
use std::path::Path;

mod common;
use common::site;

fn build_site(root: &Path) -> BuildReport {
    let config = load_config(root).unwrap();
    build(root, &config).unwrap()
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

fn listing_outcome(report: &BuildReport, section: &str) -> ListingOutcome {
    report
        .listings
        .iter()
        .find(|u| u.section == section)
        .map(|u| u.outcome.clone())
        .unwrap_or_else(|| panic!("no listing update for {section}"))
}

#[test]
fn posts_land_under_section_and_slug() {
    let tmp = site();
    build_site(tmp.path());
    for page in [
        "posts/field-notes/night-walk.html",
        "posts/art/studio-notes.html",
        "posts/art/older-sketch.html",
        "posts/music/untitled-song.html",
    ] {
        assert!(tmp.path().join(page).is_file(), "{page} missing");
    }
    assert!(!tmp.path().join("posts/art/broken-gallery.html").exists());
}

#[test]
fn single_page_binds_hero_and_article() {
    let tmp = site();
    build_site(tmp.path());
    let html = read(tmp.path(), "posts/art/studio-notes.html");

    assert!(html.contains("<title>Studio Notes · Zach Isn't Dead</title>"));
    assert!(html.contains(r#"<p class="byline">2024-11-02 · Art</p>"#));
    assert!(html.contains(r#"<img src="../../assets/studio/easel.jpg" alt="Studio Notes" />"#));
    assert!(!html.contains("Write the story of the piece here."));
    assert!(html.contains("<h2>Palette</h2>"));
    assert!(html.contains("<ol>\n  <li>ultramarine</li>"));
    assert!(html.contains("<pre><code>\ngesso: 3 coats\nsand: 220 grit\n</code></pre>"));
    assert!(html.contains(r#"<a class="back-link" href="../../index.html#art">← Back to Art</a>"#));
}

#[test]
fn gallery_page_lists_every_lead_image() {
    let tmp = site();
    build_site(tmp.path());
    let html = read(tmp.path(), "posts/field-notes/night-walk.html");

    assert!(html.contains(r#"<img src="../../assets/night/bridge.jpg" alt="Bridge at midnight">"#));
    assert_eq!(html.matches(r#"class="gallery-thumb""#).count(), 3);
    assert!(html.contains(r#"data-full="../../assets/night/river.png" data-alt="Image 2""#));
    assert!(html.contains(r#"data-full="https://cdn.example.com/night/lamp.jpg""#));
    assert!(html.contains("<code>canal path</code>"));
    assert!(html.contains("2025-03-14 · Field-Notes"));
    assert!(!html.contains("your-image"));
}

#[test]
fn listings_follow_publish_flags() {
    let tmp = site();
    let report = build_site(tmp.path());

    assert_eq!(listing_outcome(&report, "art"), ListingOutcome::Updated { entries: 2 });
    assert_eq!(listing_outcome(&report, "field-notes"), ListingOutcome::Updated { entries: 1 });
    assert_eq!(listing_outcome(&report, "music"), ListingOutcome::NoMarkers);

    let art = read(tmp.path(), "sections/art.html");
    assert!(!art.contains("stale generated content"));
    assert!(art.contains(r#"<div class="post-meta">Sketch</div>"#));
    assert!(art.contains(r#"href="posts/art/studio-notes.html""#));
    assert!(art.contains("<p>Reorganised the studio so the light hits the easel in the morning.</p>"));

    let notes = read(tmp.path(), "sections/field-notes.html");
    assert!(notes.contains(r#"<div class="post-meta">Gallery</div>"#));
    assert!(notes.contains("<p>Bridges and rivers after dark.</p>"));

    let untouched = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site/sections/music.html");
    assert_eq!(read(tmp.path(), "sections/music.html"), fs::read_to_string(untouched).unwrap());
}

#[test]
fn withdrawing_a_post_removes_it_from_the_listing() {
    let tmp = site();
    build_site(tmp.path());
    assert!(read(tmp.path(), "sections/art.html").contains(">Older Sketch<"));

    let source = tmp.path().join("markdown/older-sketch.md");
    let text = fs::read_to_string(&source).unwrap().replace("post-to-site: 1", "post-to-site: no");
    fs::write(&source, text).unwrap();
    build_site(tmp.path());

    let art = read(tmp.path(), "sections/art.html");
    assert!(!art.contains(">Older Sketch<"));
    assert!(art.contains(">Studio Notes<"));
    // The page itself is still generated.
    assert!(tmp.path().join("posts/art/older-sketch.html").is_file());
}

#[test]
fn moving_a_post_clears_its_old_section() {
    let tmp = site();
    build_site(tmp.path());
    assert!(read(tmp.path(), "sections/field-notes.html").contains(r#"href="posts/field-notes/night-walk.html""#));

    let source = tmp.path().join("markdown/night-walk.md");
    let text = fs::read_to_string(&source).unwrap().replace("section: field-notes", "section: art");
    fs::write(&source, text).unwrap();
    let report = build_site(tmp.path());

    assert_eq!(listing_outcome(&report, "field-notes"), ListingOutcome::Updated { entries: 0 });
    assert_eq!(listing_outcome(&report, "art"), ListingOutcome::Updated { entries: 3 });
    let notes = read(tmp.path(), "sections/field-notes.html");
    assert!(!notes.contains("night-walk.html"));
    assert!(notes.contains("<!-- md-posts:start -->\n    <!-- md-posts:end -->"));
    assert!(read(tmp.path(), "sections/art.html").contains(r#"href="posts/art/night-walk.html""#));
}

#[test]
fn rebuild_is_byte_identical() {
    let tmp = site();
    build_site(tmp.path());
    let outputs = [
        "sections/art.html",
        "sections/field-notes.html",
        "posts/field-notes/night-walk.html",
    ];
    let snapshot: Vec<String> = outputs.iter().map(|p| read(tmp.path(), p)).collect();
    build_site(tmp.path());
    let again: Vec<String> = outputs.iter().map(|p| read(tmp.path(), p)).collect();
    assert_eq!(snapshot, again);
}

#[test]
fn compose_after_build_inlines_listings() {
    let tmp = site();
    build_site(tmp.path());
    let config = load_config(tmp.path()).unwrap();
    let report = compose_site(tmp.path(), &config).unwrap();

    assert_eq!(report.sections, vec!["art", "field-notes", "header", "music"]);
    let index = read(tmp.path(), "index.html");
    assert!(!index.contains("{{section:"));
    assert!(index.contains("<h1>Zach Isn't Dead</h1>"));
    assert!(index.contains(r#"<a class="content-link" href="posts/field-notes/night-walk.html">Night Walk</a>"#));
}

#[test]
fn compose_with_missing_section_writes_nothing() {
    let tmp = site();
    fs::remove_file(tmp.path().join("sections/music.html")).unwrap();
    let config = load_config(tmp.path()).unwrap();

    let result = compose_site(tmp.path(), &config);
    assert!(matches!(result, Err(ComposeError::MissingSection(path)) if path.ends_with("music.html")));
    assert!(!tmp.path().join("index.html").exists());
}

#[test]
fn re_serialized_front_matter_parses_the_same() {
    let tmp = site();
    for name in ["night-walk.md", "studio-notes.md", "older-sketch.md", "untitled-song.md"] {
        let path = tmp.path().join("markdown").join(name);
        let doc = parse_document(&fs::read_to_string(&path).unwrap(), &path).unwrap();
        let mut text = doc.front_matter_lines().join("\n");
        text.push_str("\n\n");
        text.push_str(&doc.body_lines.join("\n"));
        let again = parse_document(&text, &path).unwrap();
        assert_eq!(again, doc, "{name}");
    }
}
