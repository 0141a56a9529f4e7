//! Ordered multi-value parameter storage.
//!
//! [`Params`] is the shared key/value container used for query parameters,
//! path parameters, and form fields on both [`Client`](crate::Client) and
//! [`Request`](crate::Request). Keys keep insertion order and each key maps
//! to an ordered list of values, mirroring the shape of an encoded query
//! string.
//!
//! The container is deliberately not thread-safe: it lives either behind a
//! client's setters (mutated only at setup time) or inside a single-owner
//! request.
//!
//! # Examples
//!
//! ```rust
//! use reqkit::Params;
//!
//! let mut params = Params::new();
//! params.set("a", "1");
//! params.add("a", "2");
//! assert_eq!(params.get("a"), Some("1"));
//! assert_eq!(params.get_all("a"), ["1", "2"]);
//! ```

/// An ordered mapping from keys to lists of values.
///
/// `set` replaces the whole value list for a key, `add` appends to it, and
/// `get` returns the first value. Merging against another `Params` follows
/// the crate-wide precedence rule: a key present here is never touched, a
/// key absent here inherits the other side's full value list verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Vec<String>)>,
}

impl Params {
    /// Creates an empty parameter store.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Replaces every value under `key` with the single value given.
    ///
    /// Inserts the key at the end if it was absent.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entry_mut(&key) {
            Some(values) => {
                values.clear();
                values.push(value);
            }
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Appends a value under `key`, keeping any existing values.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entry_mut(&key) {
            Some(values) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Returns the first value under `key`, or `None` if the key is absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value under `key`, in insertion order.
    ///
    /// The slice is empty when the key is absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entry(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` if `key` has at least one value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// Removes `key` and returns its values, if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, values)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Iterates over flattened `(key, value)` pairs in insertion order,
    /// repeating the key for multi-valued entries. This is the shape the
    /// query-string encoder consumes.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, values)| {
            values.iter().map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// Copies every entry of `defaults` whose key is absent here.
    ///
    /// A key present on both sides keeps this store's value list untouched;
    /// value lists are never merged element-by-element. Inherited keys are
    /// appended after the existing ones, keeping `defaults`' relative order.
    pub fn merge_defaults(&mut self, defaults: &Params) {
        for (key, values) in defaults.iter() {
            if !self.contains_key(key) {
                self.entries.push((key.to_owned(), values.to_vec()));
            }
        }
    }

    fn entry(&self, key: &str) -> Option<&Vec<String>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values)
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut Vec<String>> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values)
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}
