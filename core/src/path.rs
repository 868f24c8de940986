//! Segment walking and query flags.
//!
//! # Design
//! A [`Path`] is the decoded request path split into its non-empty
//! segments, plus a cursor. Cursor position 0 is the root, before the first
//! segment, so the top-level handler looks at [`Path::next`] exactly like
//! every handler below it. Segments are shared behind an `Arc`, which makes
//! a `Path` cheap to clone: the context hands each child handler its own
//! advanced copy instead of moving a cursor shared with the request.
//!
//! HTTP targets and CLI pseudo-URLs (`http://app.cli/<path>`) both go
//! through [`Target::parse`], so the two transports split paths and read
//! flags the same way.

use std::collections::BTreeMap;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use url::Url;

/// Slash-delimited segments with a forward-only cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    raw: String,
    segments: Arc<[String]>,
    cursor: usize,
}

impl Path {
    /// Split a plain path such as `/user/42` or `user/42`.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode)
            .collect();
        Self {
            raw: format!("/{}", segments.join("/")),
            segments: segments.into(),
            cursor: 0,
        }
    }

    pub fn from_url(url: &Url) -> Self {
        let segments: Vec<String> = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .map(decode)
            .collect();
        Self {
            raw: decode(url.path()),
            segments: segments.into(),
            cursor: 0,
        }
    }

    /// Segment the cursor stands on; empty at the root or past the end.
    pub fn current(&self) -> &str {
        match self.cursor {
            0 => "",
            n => self.segment(n - 1),
        }
    }

    /// Segment after the cursor; empty when there is none.
    pub fn next(&self) -> &str {
        self.segment(self.cursor)
    }

    /// Move the cursor one segment forward. Safe to call past the end.
    pub fn increment(&mut self) {
        self.cursor = self.cursor.saturating_add(1);
    }

    /// Copy of this path with the cursor one segment further.
    pub fn advanced(&self) -> Self {
        let mut next = self.clone();
        next.increment();
        next
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The decoded path as it appeared in the request, e.g. `/user/42`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn segment(&self, index: usize) -> &str {
        self.segments.get(index).map(String::as_str).unwrap_or("")
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Query parameters for HTTP, flags for the CLI. Keys map to every value
/// given for them, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Flags(BTreeMap<String, Vec<String>>);

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_url(url: &Url) -> Self {
        let mut flags = Self::new();
        for (key, value) in url.query_pairs() {
            flags.add(&key, &value);
        }
        flags
    }

    /// First value given for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), vec![value.to_string()]);
    }

    pub fn add(&mut self, key: &str, value: &str) {
        self.0
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, String)> for Flags {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut flags = Self::new();
        for (key, value) in iter {
            flags.add(&key, &value);
        }
        flags
    }
}

/// The routable part of a request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub path: Path,
    pub flags: Flags,
}

impl Target {
    /// Parse an absolute URL into its path and query flags.
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::from_url(&Url::parse(url)?))
    }

    pub fn from_url(url: &Url) -> Self {
        Self {
            path: Path::from_url(url),
            flags: Flags::from_url(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn root_cursor_looks_at_first_segment() {
        let path = Path::parse("/api/user/42");
        assert_eq!(path.segments(), ["api", "user", "42"]);
        assert_eq!(path.cursor(), 0);
        assert_eq!(path.current(), "");
        assert_eq!(path.next(), "api");
        assert_eq!(path.as_str(), "/api/user/42");
    }

    #[test]
    fn increment_walks_segments_in_order() {
        let mut path = Path::parse("api/user");
        path.increment();
        assert_eq!((path.current(), path.next()), ("api", "user"));
        path.increment();
        assert_eq!((path.current(), path.next()), ("user", ""));
    }

    #[rstest]
    #[case("")]
    #[case("/")]
    #[case("/one")]
    #[case("/one/two/three")]
    fn probing_past_the_end_yields_empty_segments(#[case] raw: &str) {
        let mut path = Path::parse(raw);
        let n = path.segments().len();
        for _ in 0..n + 5 {
            path.increment();
        }
        assert_eq!(path.current(), "");
        assert_eq!(path.next(), "");
    }

    #[test]
    fn empty_pieces_are_dropped() {
        let path = Path::parse("//user///42/");
        assert_eq!(path.segments(), ["user", "42"]);
    }

    #[test]
    fn advanced_leaves_the_original_untouched() {
        let path = Path::parse("/a/b");
        let child = path.advanced();
        assert_eq!(path.next(), "a");
        assert_eq!(child.next(), "b");
        assert_eq!(child.current(), "a");
    }

    #[test]
    fn target_splits_path_and_query() {
        let target = Target::parse("http://app.cli/user/42?verbose=1&tag=a&tag=b").unwrap();
        assert_eq!(target.path.segments(), ["user", "42"]);
        assert_eq!(target.path.as_str(), "/user/42");
        assert_eq!(target.flags.get("verbose"), Some("1"));
        assert_eq!(target.flags.get_all("tag"), ["a", "b"]);
        assert!(target.flags.get("missing").is_none());
    }

    #[test]
    fn target_decodes_percent_escapes() {
        let target = Target::parse("http://app.cli/files/hello%20world").unwrap();
        assert_eq!(target.path.segments(), ["files", "hello world"]);
    }

    #[test]
    fn set_replaces_every_value() {
        let mut flags: Flags = vec![
            ("k".to_string(), "1".to_string()),
            ("k".to_string(), "2".to_string()),
        ]
        .into_iter()
        .collect();
        flags.set("k", "3");
        assert_eq!(flags.get_all("k"), ["3"]);
    }
}
