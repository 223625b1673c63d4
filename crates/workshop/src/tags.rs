//! Tag assembly for published items.

use moduploader_protocol::{CATEGORY_TAG, COMPATIBLE_SUFFIX};

/// Builds the compatibility tag for a game version (`1.17.1-f2-compatible`).
pub fn compatibility_tag(version: &str) -> String {
    format!("{version}{COMPATIBLE_SUFFIX}")
}

/// Returns true for tags of the form `<version>-compatible`.
pub fn is_compatibility_tag(tag: &str) -> bool {
    let tag = tag.trim();
    tag.len() > COMPATIBLE_SUFFIX.len()
        && tag
            .get(tag.len() - COMPATIBLE_SUFFIX.len()..)
            .is_some_and(|suffix| suffix.eq_ignore_ascii_case(COMPATIBLE_SUFFIX))
}

/// Final tag set of a submission.
///
/// The category tag comes first, then `compat`, then the custom tags in their
/// original order. Blank tags and stale compatibility tags are dropped and
/// duplicates are removed case-insensitively, keeping the first spelling.
pub fn assemble_tags(compat: &str, custom: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(custom.len() + 2);
    let fixed = [CATEGORY_TAG, compat];
    let custom = custom
        .iter()
        .map(|t| t.trim())
        .filter(|t| !is_compatibility_tag(t));

    for tag in fixed.into_iter().chain(custom) {
        if tag.is_empty() || tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        tags.push(tag.to_string());
    }
    tags
}
