use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Album identifier derived from its display title.
///
/// Lowercases, strips diacritics, collapses every run of characters outside
/// `[a-z0-9]` into one `-` and trims hyphens from both ends.
pub fn to_album_id(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.to_lowercase().nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
