/// Slug used when sanitization leaves nothing behind.
pub const FALLBACK_SLUG: &str = "article";

/// Normalize an arbitrary string into a filesystem- and URL-safe slug.
///
/// Lower-cases the input, maps every character outside `[a-z0-9-]` to a
/// hyphen, collapses hyphen runs and trims hyphens from both ends. Never
/// returns an empty string.
pub fn sanitize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        let mapped = if ch.is_ascii_lowercase() || ch.is_ascii_digit() { ch } else { '-' };
        if mapped == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(mapped);
    }

    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}
