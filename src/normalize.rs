use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical form of a category label as sent to the backend.
///
/// The label is lowercased and decomposed (NFD), combining marks are dropped,
/// and runs of whitespace collapse to a single space. Leading and
/// trailing whitespace is removed, so blank input yields an empty string.
pub(crate) fn normalize(s: &str) -> String {
    // Lowercase first: some uppercase letters lowercase into base + mark.
    let stripped: String = s
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
