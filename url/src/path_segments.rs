// Copyright 2013-2024 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Path-components view (C7): an ordered, range-replaceable collection of
//! decoded path segments over a URL's hierarchical path, in the style of
//! the teacher's old `path_segments_mut` but generalized to range
//! replacement rather than a single push/pop-style cursor.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::ops::Range;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet};

use crate::encode_sets::PATH;
use crate::parser;
use crate::Url;

/// `/` and `\` are not in [`PATH`] (they're structural there), but inside an
/// inserted component they would silently fragment it into more segments
/// than the caller asked for, so this view encodes them too.
const PATH_COMPONENT: &AsciiSet = &PATH.add(b'/').add(b'\\');

/// A scoped, mutable view over a URL's path segments. Obtained via
/// [`Url::with_mutable_path_components`]; indices are segment positions
/// (like a `Vec`'s), not byte offsets.
pub struct PathComponents<'a> {
    url: &'a mut Url,
}

impl<'a> PathComponents<'a> {
    pub(crate) fn new(url: &'a mut Url) -> Self {
        PathComponents { url }
    }

    fn raw_segments(&self) -> Vec<String> {
        let path = self.url.path();
        let path = path.strip_prefix('/').unwrap_or(path);
        path.split('/').map(str::to_string).collect()
    }

    /// Number of path segments.
    pub fn len(&self) -> usize {
        self.raw_segments().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decoded segments, in order.
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        self.raw_segments().into_iter().map(|s| decode(&s))
    }

    /// The decoded segment at `index`, if any.
    pub fn get(&self, index: usize) -> Option<String> {
        self.raw_segments().into_iter().nth(index).map(|s| decode(&s))
    }

    /// Insert `components` before segment `at`, shifting later segments
    /// right. `at == len()` appends.
    pub fn insert_slice(&mut self, at: usize, components: &[&str]) {
        self.replace_range(at..at, components);
    }

    /// Remove the segments in `range`.
    pub fn remove_range(&mut self, range: Range<usize>) {
        self.replace_range(range, &[]);
    }

    /// Replace the segments in `range` with `components`, the general form
    /// every other mutator specializes.
    pub fn replace_range(&mut self, range: Range<usize>, components: &[&str]) {
        let mut segments = self.raw_segments();
        let start = range.start.min(segments.len());
        let end = range.end.clamp(start, segments.len());
        let in_file = self.url.scheme_is_file();
        let encoded: Vec<String> = components
            .iter()
            .enumerate()
            .map(|(i, c)| encode_component(c, in_file && start + i == 0))
            .collect();
        segments.splice(start..end, encoded);
        if segments.is_empty() {
            segments.push(String::new());
        }
        self.url.replace_path_bytes(&segments);
    }
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// `.`/`..`, left unescaped, would be reinterpreted as a dot-segment on
/// reparse instead of a literal component; disarm them by escaping the
/// first dot.
fn dot_normalize(raw: &str) -> String {
    match raw {
        "." => "%2E".to_string(),
        ".." => "%2E.".to_string(),
        other => other.to_string(),
    }
}

fn encode_component(raw: &str, drive_letter_position: bool) -> String {
    if drive_letter_position && parser::is_drive_letter(raw) {
        let mut s = String::with_capacity(2);
        s.push_str(&raw[..1]);
        s.push(':');
        return s;
    }
    let normalized = dot_normalize(raw);
    utf8_percent_encode(&normalized, PATH_COMPONENT).collect()
}

#[cfg(test)]
mod tests {
    use crate::Url;

    #[test]
    fn replace_range_splices_components() {
        let mut url = Url::parse("http://example.com/1/2/3/4").unwrap();
        url.with_mutable_path_components(|p| {
            p.replace_range(1..3, &["a", "b", "c", "d"]);
        })
        .unwrap();
        assert_eq!(url.as_str(), "http://example.com/1/a/b/c/d/4");
    }

    #[test]
    fn insert_slice_at_zero_prepends() {
        let mut url = Url::parse("http://example.com/b/c").unwrap();
        url.with_mutable_path_components(|p| {
            p.insert_slice(0, &["a"]);
        })
        .unwrap();
        assert_eq!(url.as_str(), "http://example.com/a/b/c");
    }

    #[test]
    fn remove_range_full_leaves_root_path() {
        let mut url = Url::parse("http://example.com/a/b").unwrap();
        let len = url
            .with_mutable_path_components(|p| p.len())
            .unwrap();
        url.with_mutable_path_components(|p| {
            p.remove_range(0..len);
        })
        .unwrap();
        assert_eq!(url.as_str(), "http://example.com/");
    }

    #[test]
    fn dot_segment_insertion_is_disarmed() {
        let mut url = Url::parse("http://example.com/a").unwrap();
        url.with_mutable_path_components(|p| {
            p.insert_slice(1, &[".."]);
        })
        .unwrap();
        assert_eq!(url.path_segments().unwrap().collect::<Vec<_>>(), ["a", "%2E."]);
    }

    #[test]
    fn drive_letter_normalized_at_position_zero() {
        let mut url = Url::parse("file:///C:/foo").unwrap();
        url.with_mutable_path_components(|p| {
            p.replace_range(0..1, &["D|"]);
        })
        .unwrap();
        assert_eq!(url.as_str(), "file:///D:/foo");
    }
}
