//! Workshop item references: deep links out, ids and page URLs in.

use crate::constants::COMMUNITY_HOST;
use crate::types::PublishedFileId;

/// Errors produced when parsing an item reference typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemReferenceError {
    #[error("empty item reference")]
    Empty,

    #[error("URL host `{0}` is not supported")]
    UnsupportedHost(String),

    #[error("URL has no `id` parameter")]
    MissingId,

    #[error("invalid workshop id `{0}`")]
    InvalidId(String),
}

/// Returns the Steam client deep link that opens the item's community page.
pub fn community_page_link(id: PublishedFileId) -> String {
    format!("steam://url/CommunityFilePage/{id}")
}

/// Parses either a bare numeric id or a workshop page URL such as
/// `https://steamcommunity.com/sharedfiles/filedetails/?id=123`.
pub fn parse_item_reference(input: &str) -> Result<PublishedFileId, ItemReferenceError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ItemReferenceError::Empty);
    }

    if input.bytes().all(|b| b.is_ascii_digit()) {
        return parse_id(input);
    }

    let rest = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);

    let host_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let host = &rest[..host_end];
    if !host.to_ascii_lowercase().ends_with(COMMUNITY_HOST) {
        return Err(ItemReferenceError::UnsupportedHost(host.to_string()));
    }

    let query = match rest.split_once('?') {
        Some((_, q)) => q.split('#').next().unwrap_or_default(),
        None => return Err(ItemReferenceError::MissingId),
    };

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "id")
        .map(|(_, value)| parse_id(value))
        .unwrap_or(Err(ItemReferenceError::MissingId))
}

fn parse_id(value: &str) -> Result<PublishedFileId, ItemReferenceError> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => Err(ItemReferenceError::InvalidId(value.to_string())),
        Ok(id) => Ok(PublishedFileId(id)),
    }
}
