//! Ordered query-string parameters.

use percent_encoding::percent_decode_str;
use std::borrow::Cow;

/// An ordered string multimap of query parameters.
///
/// Keys may repeat (`age.gte=18&age.lte=65`); insertion order is kept so
/// filters compile in the order the caller wrote them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Parses a raw `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored, empty segments are skipped and a key with
    /// no `=` gets an empty value.
    pub fn from_query_string(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = raw
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
                (decode(key), decode(value))
            })
            .collect();
        Self { pairs }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn decode(component: &str) -> String {
    let spaced: Cow<'_, str> = if component.contains('+') {
        Cow::Owned(component.replace('+', " "))
    } else {
        Cow::Borrowed(component)
    };
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_keeps_order() {
        let params = QueryParams::from_query_string(
            "?title.ilike=%25war+and%25&age.gte=18&age.lte=65&flag",
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params.get("title.ilike"), Some("%war and%"));
        assert_eq!(params.get("age.gte"), Some("18"));
        assert_eq!(params.get("flag"), Some(""));
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["title.ilike", "age.gte", "age.lte", "flag"]);
    }

    #[test]
    fn repeated_keys_are_all_kept() {
        let params = QueryParams::from_query_string("status=eq.open&status=neq.closed");
        let values: Vec<_> = params
            .iter()
            .filter(|(k, _)| *k == "status")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, ["eq.open", "neq.closed"]);
    }

    #[test]
    fn empty_string_has_no_params() {
        assert!(QueryParams::from_query_string("").is_empty());
        assert!(QueryParams::from_query_string("&&").is_empty());
    }
}
