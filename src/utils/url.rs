// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;
use url::form_urlencoded;

/// Query parameter the portal appends to every link. It names the list the
/// visitor came from, not the announcement itself.
pub const VOLATILE_PARAM: &str = "channelId";

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Canonicalize an announcement URL into its identity key.
///
/// Every `channelId` value is dropped and the remaining parameters are
/// re-encoded grouped by key, keys in order of first occurrence. Links without
/// a query string come back untouched, and so does anything that fails to
/// parse.
///
/// # Examples
/// ```
/// use oa_notices::utils::url::normalize_link;
///
/// assert_eq!(
///     normalize_link("https://oa.example.edu/read.action?channelId=1&id=7"),
///     "https://oa.example.edu/read.action?id=7"
/// );
/// ```
pub fn normalize_link(raw: &str) -> String {
    if !raw.contains('?') {
        return raw.to_string();
    }

    let mut parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Link normalization failed for {raw} ({e}), keeping original");
            return raw.to_string();
        }
    };

    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in parsed.query_pairs() {
        if key == VOLATILE_PARAM {
            continue;
        }
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }

    if grouped.is_empty() {
        parsed.set_query(None);
    } else {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &grouped {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        parsed.set_query(Some(&serializer.finish()));
    }

    parsed.to_string()
}
