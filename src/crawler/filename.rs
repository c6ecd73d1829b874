use std::sync::OnceLock;

use regex::Regex;

use crate::common::{ArticleRecord, UNKNOWN};

/// Longest sanitized title kept in a filename, in characters
pub const MAX_TITLE_LENGTH: usize = 100;

/// Make an article title safe to use inside a filename
///
/// Characters not allowed in Windows filenames become `_`, runs of
/// whitespace and underscores collapse to a single `_`, the result is cut to
/// `max_length` characters and stripped of leading and trailing `_`.
///
/// # Example
///
/// ```
/// use pmc_crawler::crawler::sanitize_filename;
///
/// assert_eq!(sanitize_filename("A/B: a  study?", 100), "A_B_a_study");
/// assert_eq!(sanitize_filename("", 100), "Unknown");
/// ```
pub fn sanitize_filename(name: &str, max_length: usize) -> String {
    static FORBIDDEN: OnceLock<Regex> = OnceLock::new();
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();

    let forbidden = FORBIDDEN
        .get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("Failed to compile filename regex"));
    let separators =
        SEPARATORS.get_or_init(|| Regex::new(r"[\s_]+").expect("Failed to compile separator regex"));

    let name = if name.is_empty() { UNKNOWN } else { name };
    let replaced = forbidden.replace_all(name, "_");
    let collapsed = separators.replace_all(&replaced, "_");
    let truncated: String = collapsed.chars().take(max_length).collect();

    truncated.trim_matches('_').to_string()
}

/// Output filename for an article: `<id>_<year>_<sanitized title>.pdf`
pub fn article_filename(id: &str, record: &ArticleRecord) -> String {
    format!(
        "{}_{}_{}.pdf",
        id,
        record.year,
        sanitize_filename(&record.title, MAX_TITLE_LENGTH)
    )
}

/// Title shortened for progress output
pub(crate) fn short_title(title: &str) -> String {
    const LIMIT: usize = 40;
    if title.chars().count() > LIMIT {
        format!("{}...", title.chars().take(LIMIT).collect::<String>())
    } else {
        title.to_string()
    }
}
