//! Presentation helpers shared by recipe and meal-plan views.

use chrono::{Days, NaiveDate};
use serde_json::Value;

use crate::normalize::keys_to_camel_case;
use crate::types::OpenGraph;

/// URL slug for a recipe title: lowercase ASCII alphanumerics, every other
/// run of characters collapsed into one `-`, no dashes at either end.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// The week starting at `start`: `"Mon 01/01/2024 - Sun 07/01/2024"`.
pub fn format_date_range(start: NaiveDate) -> String {
    let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
    format!("{} - {}", start.format("%a %d/%m/%Y"), end.format("%a %d/%m/%Y"))
}

/// Like `format_date_range` for a `YYYY-MM-DD` or RFC 3339 string.
pub fn format_date_range_str(start: &str) -> Option<String> {
    let date_part = start.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(format_date_range)
}

/// Reduce a raw open-graph scrape to title, description and image, with
/// placeholder text for whatever is missing.
pub fn open_graph_summary(raw: &Value) -> OpenGraph {
    let data = keys_to_camel_case(raw);
    let pick = |keys: &[&str], fallback: &str| {
        keys.iter()
            .filter_map(|k| data.get(*k).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };
    OpenGraph {
        title: pick(&["title", "ogTitle"], "No title available"),
        description: pick(&["description", "ogDescription"], "No description available"),
        og_image: pick(&["ogImage"], "No image available"),
    }
}
