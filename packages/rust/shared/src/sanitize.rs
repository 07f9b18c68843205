//! Filesystem-safe names for section folders and output files.

/// Characters mapped to `_` after spaces and punctuation are handled.
const REPLACED_CHARS: &[char] = &['-', '/', '\\', ':', '*', '"', '<', '>', '|', '?'];

/// Turn a free-text title into a filesystem-safe token.
///
/// Spaces become `_`, commas and dots are dropped, and path/shell-hostile
/// characters are mapped to `_`. Roman numerals and diacritics are kept.
pub fn sanitize_name(text: &str) -> String {
    map_chars(&collapse_punctuation(text))
}

/// Like [`sanitize_name`], but also strips navigator boilerplate prefixes
/// (e.g. `Nawigator_-_`) from anchor labels.
///
/// Prefixes are matched after the space replacement and before the character
/// mapping, so they are written with `_` for spaces and may contain `-`.
pub fn sanitize_folder_label(text: &str, prefixes: &[String]) -> String {
    let mut label = collapse_punctuation(text);
    for prefix in prefixes {
        label = label.replace(prefix.as_str(), "");
    }
    map_chars(&label)
}

fn collapse_punctuation(text: &str) -> String {
    text.replace(' ', "_").replace([',', '.'], "")
}

fn map_chars(text: &str) -> String {
    text.chars()
        .map(|c| if REPLACED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
