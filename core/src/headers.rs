//! Ordered, case-insensitive header collection.
//!
//! # Design
//! Entries live in a `Vec` kept sorted by lower-cased name, one entry per
//! name. Every operation locates its name with `binary_search_by` using
//! plain ordinal string comparison, so ordering is identical on every
//! platform and iteration is always ascending by name. Appending to an
//! existing name joins the values with `", "` instead of adding a second
//! entry. Validation runs before any mutation, so a rejected call leaves the
//! collection untouched.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::FetchError;
use crate::validate::{normalize_and_validate, normalize_and_validate_name};

/// A single normalized header: lower-case token name and validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<HeaderEntry>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from any recognized initializer shape.
    ///
    /// Fails on the first invalid name or value, or on a flat list with an
    /// odd number of items.
    pub fn try_from_init(init: impl Into<HeadersInit>) -> Result<Self, FetchError> {
        let mut headers = Headers::new();
        match init.into() {
            HeadersInit::Empty => {}
            HeadersInit::Existing(existing) => headers = existing,
            HeadersInit::Pairs(pairs) => {
                for (name, value) in &pairs {
                    headers.append(name, value)?;
                }
            }
            HeadersInit::Flat(items) => {
                if items.len() % 2 != 0 {
                    return Err(FetchError::InvalidHeaderEntry);
                }
                for pair in items.chunks_exact(2) {
                    headers.append(&pair[0], &pair[1])?;
                }
            }
            HeadersInit::Mapping(map) => {
                for (name, value) in &map {
                    headers.append(name, value)?;
                }
            }
        }
        Ok(headers)
    }

    /// Index of `name` if present, otherwise the position keeping the order.
    fn locate(&self, name: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|entry| entry.name.as_str().cmp(name))
    }

    /// Adds a value, joining it onto an existing value with `", "`.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), FetchError> {
        let (name, value) = normalize_and_validate(name, value)?;
        match self.locate(&name) {
            Ok(idx) => {
                let existing = &mut self.entries[idx].value;
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Err(idx) => self.entries.insert(idx, HeaderEntry { name, value }),
        }
        Ok(())
    }

    /// Sets a value, replacing any existing one.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), FetchError> {
        let (name, value) = normalize_and_validate(name, value)?;
        match self.locate(&name) {
            Ok(idx) => self.entries[idx].value = value,
            Err(idx) => self.entries.insert(idx, HeaderEntry { name, value }),
        }
        Ok(())
    }

    /// Returns the combined value for `name`, or `None` if absent.
    ///
    /// Only an invalid `name` is an error.
    pub fn get(&self, name: &str) -> Result<Option<&str>, FetchError> {
        let name = normalize_and_validate_name(name)?;
        Ok(self
            .locate(&name)
            .ok()
            .map(|idx| self.entries[idx].value.as_str()))
    }

    pub fn has(&self, name: &str) -> Result<bool, FetchError> {
        let name = normalize_and_validate_name(name)?;
        Ok(self.locate(&name).is_ok())
    }

    /// Removes `name`. Deleting an absent name is not an error.
    pub fn delete(&mut self, name: &str) -> Result<(), FetchError> {
        let name = normalize_and_validate_name(name)?;
        if let Ok(idx) = self.locate(&name) {
            self.entries.remove(idx);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name/value pairs in ascending name order.
    pub fn entries(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.value.as_str())
    }

    /// Calls `f(value, name, self)` for each entry in order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &str, &Headers),
    {
        for entry in &self.entries {
            f(&entry.value, &entry.name, self);
        }
    }

    /// Owned copy of the entries, as handed to a transport.
    pub fn to_wire(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.value.clone()))
            .collect()
    }
}

/// Iterator over `(name, value)` pairs of a `Headers`.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, HeaderEntry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|e| (e.name.as_str(), e.value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl TryFrom<HeadersInit> for Headers {
    type Error = FetchError;

    fn try_from(init: HeadersInit) -> Result<Self, Self::Error> {
        Headers::try_from_init(init)
    }
}

/// The shapes a `Headers` can be initialized from.
///
/// Unrecognized shapes coming in through deserialization resolve to `Empty`
/// rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HeadersInit {
    #[default]
    Empty,
    Pairs(Vec<(String, String)>),
    /// Alternating names and values.
    Flat(Vec<String>),
    Mapping(BTreeMap<String, String>),
    Existing(Headers),
}

impl From<Headers> for HeadersInit {
    fn from(headers: Headers) -> Self {
        HeadersInit::Existing(headers)
    }
}

impl From<&Headers> for HeadersInit {
    fn from(headers: &Headers) -> Self {
        HeadersInit::Existing(headers.clone())
    }
}

impl From<Vec<(String, String)>> for HeadersInit {
    fn from(pairs: Vec<(String, String)>) -> Self {
        HeadersInit::Pairs(pairs)
    }
}

impl From<Vec<(&str, &str)>> for HeadersInit {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        HeadersInit::Pairs(
            pairs
                .into_iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, &str); N]> for HeadersInit {
    fn from(pairs: [(&str, &str); N]) -> Self {
        HeadersInit::from(pairs.to_vec())
    }
}

impl From<Vec<String>> for HeadersInit {
    fn from(items: Vec<String>) -> Self {
        HeadersInit::Flat(items)
    }
}

impl From<BTreeMap<String, String>> for HeadersInit {
    fn from(map: BTreeMap<String, String>) -> Self {
        HeadersInit::Mapping(map)
    }
}

impl From<HashMap<String, String>> for HeadersInit {
    fn from(map: HashMap<String, String>) -> Self {
        HeadersInit::Mapping(map.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for HeadersInit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Nested(Vec<Vec<String>>),
            Flat(Vec<String>),
            Mapping(BTreeMap<String, String>),
            Other(serde::de::IgnoredAny),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Nested(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for entry in entries {
                    match <[String; 2]>::try_from(entry) {
                        Ok([name, value]) => pairs.push((name, value)),
                        Err(_) => {
                            return Err(serde::de::Error::custom(FetchError::InvalidHeaderEntry))
                        }
                    }
                }
                Ok(HeadersInit::Pairs(pairs))
            }
            Raw::Flat(items) => Ok(HeadersInit::Flat(items)),
            Raw::Mapping(map) => Ok(HeadersInit::Mapping(map)),
            Raw::Other(_) => Ok(HeadersInit::Empty),
        }
    }
}

impl fmt::Display for Headers {
    /// Renders the entries as `name: value` lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keys_are_sorted_regardless_of_insertion_order() {
        let headers = Headers::try_from_init([("b", "2"), ("a", "1")]).unwrap();
        assert_eq!(headers.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(headers.values().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn append_combines_values() {
        let mut headers = Headers::new();
        headers.append("x", "a").unwrap();
        headers.append("x", "b").unwrap();
        assert_eq!(headers.get("x").unwrap(), Some("a, b"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn append_normalizes_name_and_value() {
        let mut a = Headers::new();
        a.append("X", " b ").unwrap();
        let mut b = Headers::new();
        b.append("x", "b").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn set_overwrites_instead_of_combining() {
        let mut headers = Headers::new();
        headers.set("undici", "fetch1").unwrap();
        headers.append("undici", "fetch2").unwrap();
        headers.set("Undici", "fetch3").unwrap();
        assert_eq!(headers.get("undici").unwrap(), Some("fetch3"));
    }

    #[test]
    fn get_miss_is_none_but_invalid_name_is_error() {
        let headers = Headers::new();
        assert_eq!(headers.get("undici").unwrap(), None);
        assert!(matches!(
            headers.get("invalid @ header ? name"),
            Err(FetchError::InvalidHeaderName(_))
        ));
        assert!(headers.get("").is_err());
    }

    #[test]
    fn has_and_delete() {
        let mut headers = Headers::new();
        assert!(!headers.has("undici").unwrap());
        headers.append("undici", "fetch").unwrap();
        assert!(headers.has("UNDICI").unwrap());
        headers.delete("Undici").unwrap();
        assert!(!headers.has("undici").unwrap());
        headers.delete("undici").unwrap();
        assert!(headers.delete("invalid @ name").is_err());
    }

    #[test]
    fn failed_validation_leaves_store_unchanged() {
        let mut headers = Headers::try_from_init([("a", "1")]).unwrap();
        let before = headers.clone();
        assert!(headers.append("bad name", "x").is_err());
        assert!(headers.append("a", "bad\nvalue").is_err());
        assert!(headers.set("c", "").is_err());
        assert_eq!(headers, before);
    }

    #[test]
    fn init_from_flat_list() {
        let init = vec!["b".to_string(), "2".to_string(), "a".to_string(), "1".to_string()];
        let headers = Headers::try_from_init(init).unwrap();
        assert_eq!(
            headers.entries().collect::<Vec<_>>(),
            vec![("a", "1"), ("b", "2")]
        );
    }

    #[test]
    fn init_from_odd_flat_list_fails() {
        let init = vec!["a".to_string(), "1".to_string(), "b".to_string()];
        assert!(matches!(
            Headers::try_from_init(init),
            Err(FetchError::InvalidHeaderEntry)
        ));
    }

    #[test]
    fn init_from_mapping_and_existing() {
        let mut map = HashMap::new();
        map.insert("undici".to_string(), "fetch".to_string());
        map.insert("fetch".to_string(), "undici".to_string());
        let headers = Headers::try_from_init(map).unwrap();
        let copy = Headers::try_from_init(&headers).unwrap();
        assert_eq!(headers, copy);
        assert_eq!(copy.keys().collect::<Vec<_>>(), vec!["fetch", "undici"]);
    }

    #[test]
    fn init_with_duplicate_pairs_combines() {
        let headers = Headers::try_from_init([("a", "1"), ("A", "2")]).unwrap();
        assert_eq!(headers.get("a").unwrap(), Some("1, 2"));
    }

    #[test]
    fn for_each_visits_value_then_name() {
        let headers = Headers::try_from_init([("abc", "123"), ("def", "456")]).unwrap();
        let mut seen = Vec::new();
        headers.for_each(|value, name, h| {
            assert_eq!(h.len(), 2);
            seen.push(format!("{name}={value}"));
        });
        assert_eq!(seen, vec!["abc=123", "def=456"]);
    }

    #[test]
    fn entries_iteration_is_restartable() {
        let headers = Headers::try_from_init([("b", "2"), ("a", "1")]).unwrap();
        let first: Vec<_> = headers.entries().collect();
        let second: Vec<_> = (&headers).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(headers.entries().len(), 2);
    }

    #[test]
    fn deserializes_each_shape() {
        let pairs: HeadersInit = serde_json::from_str(r#"[["b","2"],["a","1"]]"#).unwrap();
        assert_eq!(
            pairs,
            HeadersInit::Pairs(vec![("b".into(), "2".into()), ("a".into(), "1".into())])
        );

        let flat: HeadersInit = serde_json::from_str(r#"["a","1"]"#).unwrap();
        assert_eq!(flat, HeadersInit::Flat(vec!["a".into(), "1".into()]));

        let map: HeadersInit = serde_json::from_str(r#"{"a":"1"}"#).unwrap();
        assert!(matches!(map, HeadersInit::Mapping(m) if m["a"] == "1"));
    }

    #[test]
    fn unrecognized_shapes_deserialize_to_empty() {
        for raw in ["1", "\"1\"", "true", "{\"a\":1}"] {
            let init: HeadersInit = serde_json::from_str(raw).unwrap();
            assert_eq!(init, HeadersInit::Empty, "{raw}");
        }
    }

    #[test]
    fn nested_entry_of_wrong_length_is_rejected() {
        let res: Result<HeadersInit, _> = serde_json::from_str(r#"[["undici","fetch"],["fetch"]]"#);
        let err = res.unwrap_err();
        assert!(err.to_string().contains("header entry must be of length two"));
    }

    #[test]
    fn display_renders_lines() {
        let headers = Headers::try_from_init([("b", "2"), ("a", "1")]).unwrap();
        assert_eq!(headers.to_string(), "a: 1\nb: 2\n");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Append(String, String),
        Set(String, String),
        Delete(String),
    }

    fn op() -> impl Strategy<Value = Op> {
        let name = "[a-dA-D][a-d-]{0,3}";
        let value = "[a-z0-9]{1,4}";
        prop_oneof![
            (name, value).prop_map(|(n, v)| Op::Append(n, v)),
            (name, value).prop_map(|(n, v)| Op::Set(n, v)),
            name.prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn entries_stay_sorted_and_unique(ops in proptest::collection::vec(op(), 0..64)) {
            let mut headers = Headers::new();
            for op in ops {
                match op {
                    Op::Append(n, v) => headers.append(&n, &v).unwrap(),
                    Op::Set(n, v) => headers.set(&n, &v).unwrap(),
                    Op::Delete(n) => headers.delete(&n).unwrap(),
                }
                let keys: Vec<_> = headers.keys().collect();
                prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
            }
        }

        #[test]
        fn append_twice_joins_with_comma(
            name in "[a-z]{1,8}",
            a in "[a-z]{1,8}",
            b in "[a-z]{1,8}",
        ) {
            let mut headers = Headers::new();
            headers.append(&name, &a).unwrap();
            headers.append(&name, &b).unwrap();
            let expected = format!("{a}, {b}");
            prop_assert_eq!(headers.get(&name).unwrap(), Some(expected.as_str()));
        }
    }
}
