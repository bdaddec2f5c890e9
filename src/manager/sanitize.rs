const HOSTILE: &[char] = &['\\', ':', '*', '?', '"', '<', '>', '|'];

/// Trim, collapse whitespace runs to one space, replace filesystem-hostile
/// characters with `-` and strip slashes from both ends.
fn clean(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let replaced: String = collapsed
        .chars()
        .map(|c| if HOSTILE.contains(&c) { '-' } else { c })
        .collect();
    replaced.trim_matches('/').to_string()
}

/// A single path segment: inner slashes become `-` as well.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_segment(value: &str) -> Option<String> {
    let cleaned = clean(value).replace('/', "-");
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned)
    }
}

/// File names never come back empty: a generated name stands in.
pub fn sanitize_file_name(value: &str) -> String {
    sanitize_segment(value)
        .unwrap_or_else(|| format!("upload-{}.bin", uuid::Uuid::new_v4().simple()))
}

/// Normalise a `/`-separated folder path coming from a client.
///
/// Returns `None` for paths with empty, `.` or `..` segments.
pub fn normalize_path(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Some(String::new());
    }
    let valid = trimmed
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    valid.then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_replaces_hostile_characters() {
        assert_eq!(
            sanitize_segment("  Moda   Praia:  2024?  ").as_deref(),
            Some("Moda Praia- 2024-")
        );
        assert_eq!(sanitize_segment("a\\b*c\"d<e>f|g").as_deref(), Some("a-b-c-d-e-f-g"));
    }

    #[test]
    fn strips_outer_slashes_and_flattens_inner_ones() {
        assert_eq!(sanitize_segment("/Praia/").as_deref(), Some("Praia"));
        assert_eq!(sanitize_segment("a/b.jpg").as_deref(), Some("a-b.jpg"));
    }

    #[test]
    fn empty_or_dot_segments_are_rejected() {
        assert_eq!(sanitize_segment("   "), None);
        assert_eq!(sanitize_segment("///"), None);
        assert_eq!(sanitize_segment(".."), None);
    }

    #[test]
    fn empty_file_name_gets_a_fallback() {
        let name = sanitize_file_name("  ");
        assert!(name.starts_with("upload-"));
        assert!(name.ends_with(".bin"));
        assert_eq!(sanitize_file_name(" foto 1.jpg "), "foto 1.jpg");
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("/albuns/Praia/").as_deref(), Some("albuns/Praia"));
        assert_eq!(normalize_path("").as_deref(), Some(""));
        assert_eq!(normalize_path("albuns/../home"), None);
        assert_eq!(normalize_path("albuns//Praia"), None);
    }
}
