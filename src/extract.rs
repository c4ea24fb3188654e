//! Regex extraction of profile fields from a static page.
//!
//! This is a best-effort scan, not an HTML parser: only the first `<h1>` and
//! the first `<img src>` are looked at, and anything missing falls back to a
//! default instead of failing.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::sections::SectionTable;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<h1[^>]*>([\s\S]*?)</h1>").unwrap());
static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap());
// Underscores are only allowed singly, between digits.
static ROLL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+(?:_[0-9]+)*$").unwrap());

const PARENT_SEGMENT: &str = "../";

/// One row of the `entries` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    pub roll: String,
    pub section: String,
    pub name: String,
    pub image_url: String,
    pub page_url: String,
}

/// What to do with a heading that exists but has no text left after cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyHeading {
    /// Keep the empty string: the heading was found.
    #[default]
    Keep,
    /// Treat it like a missing heading and use `Student {roll}`.
    Placeholder,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub empty_heading: EmptyHeading,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Skip {
    #[error("filename is not a number")]
    NonNumericRoll,
    #[error("roll {0} is out of defined ranges")]
    OutOfRange(i64),
}

/// Split `119.html` into the raw roll string (`"119"`) and its numeric value.
///
/// Digit groups may be separated by `_`, so `1_0.html` is roll 10.
pub fn parse_roll(file_name: &str) -> Option<(String, i64)> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let digits = stem.trim();
    if !ROLL_RE.is_match(digits) {
        return None;
    }
    let roll = digits.replace('_', "").parse::<i64>().ok()?;
    Some((stem.to_string(), roll))
}

/// Text of the first `<h1>`, with `<br>` turned into spaces and all other markup removed.
pub fn extract_name(content: &str) -> Option<String> {
    let inner = HEADING_RE.captures(content)?.get(1)?.as_str();
    let spaced = BREAK_RE.replace_all(inner, " ");
    let text = TAG_RE.replace_all(&spaced, "");
    Some(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// `src` of the first `<img>`, made relative to the site root.
pub fn extract_image_url(content: &str) -> Option<String> {
    let src = IMAGE_RE.captures(content)?.get(1)?.as_str();
    Some(strip_parent_segments(src).to_string())
}

fn strip_parent_segments(src: &str) -> &str {
    let mut rest = src;
    while let Some(stripped) = rest.strip_prefix(PARENT_SEGMENT) {
        rest = stripped;
    }
    rest
}

pub fn placeholder_name(roll: i64) -> String {
    format!("Student {}", roll)
}

/// Build the record for one page, or say why the page is skipped.
pub fn extract_record(
    file_name: &str,
    content: &str,
    table: &SectionTable,
    options: ExtractOptions,
) -> Result<ProfileRecord, Skip> {
    let (roll_str, roll) = parse_roll(file_name).ok_or(Skip::NonNumericRoll)?;
    let rule = table.classify(roll).ok_or(Skip::OutOfRange(roll))?;

    let name = match extract_name(content) {
        Some(n) if n.is_empty() && options.empty_heading == EmptyHeading::Placeholder => {
            placeholder_name(roll)
        }
        Some(n) => n,
        None => placeholder_name(roll),
    };

    Ok(ProfileRecord {
        roll: roll_str,
        section: rule.section.clone(),
        name,
        image_url: extract_image_url(content).unwrap_or_default(),
        page_url: rule.page_url(file_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn record(file_name: &str, content: &str) -> Result<ProfileRecord, Skip> {
        extract_record(
            file_name,
            content,
            &SectionTable::default(),
            ExtractOptions::default(),
        )
    }

    #[test]
    fn roll_from_file_name() {
        assert_eq!(parse_roll("119.html"), Some(("119".to_string(), 119)));
        assert_eq!(parse_roll("050.html"), Some(("050".to_string(), 50)));
        assert_eq!(parse_roll("abc.html"), None);
        assert_eq!(parse_roll("12a.html"), None);
        assert_eq!(parse_roll(".html"), None);
        assert_eq!(parse_roll(" 42 .html"), Some((" 42 ".to_string(), 42)));
        assert_eq!(parse_roll("-5.html"), Some(("-5".to_string(), -5)));
    }

    #[test]
    fn roll_with_digit_separators() {
        assert_eq!(parse_roll("1_0.html"), Some(("1_0".to_string(), 10)));
        assert_eq!(parse_roll("1_2_3.html"), Some(("1_2_3".to_string(), 123)));
        for bad in ["_10.html", "10_.html", "1__0.html", "_.html", "+_1.html"] {
            assert_eq!(parse_roll(bad), None, "{bad}");
        }
    }

    #[test]
    fn name_with_line_break() {
        assert_eq!(extract_name("<h1>Jane <br/> Doe</h1>").as_deref(), Some("Jane Doe"));
        assert_eq!(extract_name("<H1>Jane<BR>Doe</H1>").as_deref(), Some("Jane Doe"));
        assert_eq!(extract_name("<h1>Jane<br />Doe</h1>").as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn name_strips_nested_markup() {
        let html = "<h1 class=\"title\">\n  <span>Mary</span>\n  <em>Ann</em>   Lee\n</h1>";
        assert_eq!(extract_name(html).as_deref(), Some("Mary Ann Lee"));
    }

    #[test]
    fn only_first_heading_counts() {
        let html = "<h1>First</h1><h1>Second</h1>";
        assert_eq!(extract_name(html).as_deref(), Some("First"));
    }

    #[test]
    fn missing_heading() {
        assert_eq!(extract_name("<h2>Not a title</h2>"), None);
        assert_eq!(extract_name("<h1>never closed"), None);
    }

    #[test]
    fn image_src_variants() {
        assert_eq!(
            extract_image_url(r#"<img src="../assets/photo.jpg">"#).as_deref(),
            Some("assets/photo.jpg")
        );
        assert_eq!(
            extract_image_url("<IMG alt='x' SRC='../../img/a.png'>").as_deref(),
            Some("img/a.png")
        );
        assert_eq!(
            extract_image_url(r#"<img src="photos/../a.png">"#).as_deref(),
            Some("photos/../a.png")
        );
        assert_eq!(extract_image_url("<p>no picture</p>"), None);
    }

    #[test]
    fn full_profile_fixture() {
        let r = record("119.html", &fixture("119")).unwrap();
        assert_eq!(r.roll, "119");
        assert_eq!(r.section, "Section B");
        assert_eq!(r.name, "Hana Sato");
        assert_eq!(r.image_url, "assets/119.jpg");
        assert_eq!(
            r.page_url,
            "https://ulabhsc26bsec.netlify.app/students/119.html"
        );
    }

    #[test]
    fn bare_fixture_uses_defaults() {
        let r = record("050.html", &fixture("bare")).unwrap();
        assert_eq!(r.roll, "050");
        assert_eq!(r.section, "Section A");
        assert_eq!(r.name, "Student 50");
        assert_eq!(r.image_url, "");
        assert_eq!(
            r.page_url,
            "https://ulabhsc26asec.netlify.app/students/050.html"
        );
    }

    #[test]
    fn skips() {
        assert_eq!(record("abc.html", "<h1>x</h1>"), Err(Skip::NonNumericRoll));
        assert_eq!(record("100.html", "<h1>x</h1>"), Err(Skip::OutOfRange(100)));
        assert_eq!(record("250.html", "<h1>x</h1>"), Err(Skip::OutOfRange(250)));
        assert_eq!(record("-5.html", "<h1>x</h1>"), Err(Skip::OutOfRange(-5)));
    }

    #[test]
    fn empty_heading_is_kept_by_default() {
        let r = record("301.html", "<h1> <br> </h1>").unwrap();
        assert_eq!(r.section, "Section H");
        assert_eq!(r.name, "");
    }

    #[test]
    fn empty_heading_can_fall_back() {
        let options = ExtractOptions {
            empty_heading: EmptyHeading::Placeholder,
        };
        let r = extract_record("301.html", "<h1></h1>", &SectionTable::default(), options)
            .unwrap();
        assert_eq!(r.name, "Student 301");
    }

    #[test]
    fn record_serializes_to_entries_row() {
        let r = record("119.html", &fixture("119")).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["roll"], "119");
        assert_eq!(json["section"], "Section B");
        assert_eq!(json["name"], "Hana Sato");
        assert_eq!(json["image_url"], "assets/119.jpg");
        assert_eq!(json.as_object().unwrap().len(), 5);
    }
}
