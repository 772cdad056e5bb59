//! Naming conventions shared by every output: slugs and display titles.
//!
//! ## Slugs
//!
//! Page filenames are derived from the post title. The slug is lower-cased,
//! every run of characters outside `[a-z0-9]` becomes a single dash, and
//! dashes at either end are dropped:
//!
//! - `"Hello, World!"` → `hello-world`
//! - `"  Night Walk #3 "` → `night-walk-3`
//! - `"!!!"` → `post` (empty slugs fall back to [`DEFAULT_SLUG`])
//!
//! Two posts with the same slug in the same section overwrite each other;
//! titles are expected to be unique per section.
//!
//! ## Display titles
//!
//! Section ids and layout names are shown title-cased in bylines, back links
//! and listing labels: `field-notes` → `Field-Notes`, `gallery` → `Gallery`.

/// Slug used when a title contains no ASCII letters or digits.
pub const DEFAULT_SLUG: &str = "post";

/// Derive the URL slug for a post title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}

/// Title-case a word list: the first letter after any non-letter is
/// upper-cased, every other letter lower-cased.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn slug_strips_edges() {
        assert_eq!(slugify("  --Night Walk #3-- "), "night-walk-3");
    }

    #[test]
    fn slug_punctuation_only_falls_back() {
        assert_eq!(slugify("!!! ???"), DEFAULT_SLUG);
        assert_eq!(slugify(""), DEFAULT_SLUG);
    }

    #[test]
    fn slug_drops_non_ascii_letters() {
        assert_eq!(slugify("Café Noir"), "caf-noir");
    }

    #[test]
    fn slug_is_deterministic() {
        let title = "Studio Notes: Week 12";
        assert_eq!(slugify(title), slugify(title));
        assert_eq!(slugify(title), "studio-notes-week-12");
    }

    #[test]
    fn title_case_single_word() {
        assert_eq!(title_case("art"), "Art");
        assert_eq!(title_case("gallery"), "Gallery");
    }

    #[test]
    fn title_case_dashed_section() {
        assert_eq!(title_case("field-notes"), "Field-Notes");
    }

    #[test]
    fn title_case_lowers_the_rest() {
        assert_eq!(title_case("MUSIC"), "Music");
        assert_eq!(title_case("3d prints"), "3D Prints");
    }
}
