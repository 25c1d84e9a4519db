//! Magnet URI derivation from hash-carrying download page links
//!
//! Upstream links look like `https://host/link.php?hash=<prefix><infohash>`
//! where the value is longer than a 40-character info hash. The canonical
//! hash is always the last 40 characters of the value.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::Url;

const INFO_HASH_LEN: usize = 40;
const MAGNET_PREFIX: &str = "magnet:?xt=urn:btih:";

static HASH_IN_TEXT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"hash=([0-9a-fA-F]+)").ok());

/// Derive a magnet URI from a link carrying a `hash` value
///
/// The query-parameter path validates the trailing 40 characters as hex; the
/// substring fallback takes its trailing 40 characters as matched.
pub fn decode(source_link_url: &str) -> Option<String> {
    if let Some(info_hash) = from_query_param(source_link_url) {
        return Some(format_magnet(&info_hash));
    }
    from_raw_text(source_link_url).map(|info_hash| format_magnet(&info_hash))
}

fn from_query_param(source_link_url: &str) -> Option<String> {
    let parsed = match Url::parse(source_link_url) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(url = source_link_url, error = %e, "Could not parse hash link");
            return None;
        }
    };

    let value = parsed
        .query_pairs()
        .find(|(key, _)| key == "hash")
        .map(|(_, value)| value.into_owned())?;

    let tail = last_chars(&value, INFO_HASH_LEN)?;
    if tail.len() == INFO_HASH_LEN && tail.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(tail.to_string())
    } else {
        None
    }
}

fn from_raw_text(source_link_url: &str) -> Option<String> {
    let regex = HASH_IN_TEXT.as_ref()?;
    let captures = regex.captures(source_link_url)?;
    let value = captures.get(1)?.as_str();
    last_chars(value, INFO_HASH_LEN).map(str::to_string)
}

/// Last `n` characters of `value`, or `None` when it is shorter
fn last_chars(value: &str, n: usize) -> Option<&str> {
    let count = value.chars().count();
    if count < n {
        return None;
    }
    let start = value
        .char_indices()
        .nth(count - n)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    Some(&value[start..])
}

fn format_magnet(info_hash: &str) -> String {
    format!("{}{}", MAGNET_PREFIX, info_hash)
}
