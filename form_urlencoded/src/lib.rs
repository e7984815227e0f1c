// Copyright 2013-2016 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parser and serializer for the [`application/x-www-form-urlencoded`](
//! https://url.spec.whatwg.org/#application/x-www-form-urlencoded) syntax,
//! as used by HTML forms.
//!
//! Converts between a string (such as an URL's query string)
//! and a sequence of (name, value) pairs.

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

use alloc::borrow::{Cow, ToOwned};
use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::str;

use percent_encoding::{percent_decode, percent_encode, AsciiSet, CONTROLS};

mod query_encoding;
pub use crate::query_encoding::EncodingOverride;

/// The [form encode set](spec.md §4.1): `FormEncoding`. Everything the query encode set
/// encodes, plus `!`, `'`, `(`, `)`, and `~` to match HTML's form submission algorithm.
const FORM_URLENCODED_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Convert a byte string in the `application/x-www-form-urlencoded` syntax
/// into a iterator of (name, value) pairs.
///
/// Use [`parse(input.as_bytes())`](parse) to parse a `&str` directly.
///
/// The names and values are percent-decoded, with `+` decoded to a space and,
/// unlike the general percent-decode, invalid UTF-8 percent-escapes replaced
/// with U+FFFD as part of decoding (matching HTML's form-decode algorithm).
/// Empty pairs produced by consecutive `&` separators are skipped, per
/// spec.md §4.8's "empty pairs are skipped" rule.
pub fn parse(input: &[u8]) -> Parse<'_> {
    Parse { input }
}

/// The return type of [`parse`].
#[derive(Copy, Clone)]
pub struct Parse<'a> {
    input: &'a [u8],
}

impl<'a> Parse<'a> {
    /// Return a new iterator that yields pairs of `String` instead of pairs of `Cow<str>`.
    pub fn into_owned(self) -> ParseIntoOwned<'a> {
        ParseIntoOwned { inner: self }
    }
}

impl<'a> Iterator for Parse<'a> {
    type Item = (Cow<'a, str>, Cow<'a, str>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.input.is_empty() {
                return None;
            }
            let pair_end = self
                .input
                .iter()
                .position(|&b| b == b'&')
                .unwrap_or(self.input.len());
            let pair = &self.input[..pair_end];
            self.input = if pair_end < self.input.len() {
                &self.input[pair_end + 1..]
            } else {
                &self.input[pair_end..]
            };
            if pair.is_empty() {
                continue;
            }
            let (name, value) = splitn2(pair, b'=');
            return Some((decode(name), decode(value.unwrap_or(&[][..]))));
        }
    }
}

fn splitn2(input: &[u8], separator: u8) -> (&[u8], Option<&[u8]>) {
    match input.iter().position(|&b| b == separator) {
        Some(index) => (&input[..index], Some(&input[index + 1..])),
        None => (input, None),
    }
}

fn decode(input: &[u8]) -> Cow<'_, str> {
    let replaced = replace_plus(input);
    match percent_decode(&replaced).if_any() {
        Some(bytes) => String::from_utf8_lossy(&bytes).into_owned().into(),
        None => match replaced {
            Cow::Borrowed(b) => String::from_utf8_lossy(b),
            Cow::Owned(o) => Cow::Owned(String::from_utf8_lossy(&o).into_owned()),
        },
    }
}

/// Replace `+` with ` ` before percent-decoding, matching the form-encoded schema's
/// `decode_plus_as_space` flag from spec.md §4.8.
fn replace_plus(input: &[u8]) -> Cow<'_, [u8]> {
    if input.contains(&b'+') {
        Cow::Owned(
            input
                .iter()
                .map(|&b| if b == b'+' { b' ' } else { b })
                .collect(),
        )
    } else {
        Cow::Borrowed(input)
    }
}

/// Like [`Parse`], but yields pairs of `String` instead of pairs of `Cow<str>`.
#[derive(Copy, Clone)]
pub struct ParseIntoOwned<'a> {
    inner: Parse<'a>,
}

impl<'a> Iterator for ParseIntoOwned<'a> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
    }
}

/// The [byte-serialize](https://url.spec.whatwg.org/#concept-urlencoded-byte-serializer)
/// algorithm, as a lazy iterator of `&str` slices.
pub fn byte_serialize(input: &[u8]) -> ByteSerialize<'_> {
    ByteSerialize {
        inner: percent_encode(input, FORM_URLENCODED_ENCODE_SET),
    }
}

/// The return type of [`byte_serialize`].
#[derive(Clone)]
pub struct ByteSerialize<'a> {
    inner: percent_encoding::PercentEncode<'a>,
}

impl<'a> Iterator for ByteSerialize<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        // Space is in FORM_URLENCODED_ENCODE_SET so percent_encode always emits
        // "%20" for it; substitute "+" per the form schema's `encode_space_as_plus`.
        self.inner.next().map(|s| if s == "%20" { "+" } else { s })
    }
}

/// The [application/x-www-form-urlencoded serializer](
/// https://url.spec.whatwg.org/#concept-urlencoded-serializer).
///
/// Extends any type that implements the [`Target`] trait, such as `&mut String`,
/// `String`, or a `url::UrlQuery` produced by [`url::Url::query_pairs_mut`].
pub struct Serializer<'a, T: Target> {
    target: Option<T>,
    start_position: usize,
    encoding: EncodingOverride<'a>,
}

/// A target for [`Serializer`]: something that percent-encoded keys and values
/// can be appended to.
pub trait Target {
    /// Call `string.push_str(s)`, or equivalent.
    fn as_mut_string(&mut self) -> &mut String;
    /// Called when the serializer is dropped or `finish()`ed. Default no-op.
    fn finish(self) -> Self
    where
        Self: Sized,
    {
        self
    }
}

impl Target for String {
    fn as_mut_string(&mut self) -> &mut String {
        self
    }
}

impl<'a> Target for &'a mut String {
    fn as_mut_string(&mut self) -> &mut String {
        &mut **self
    }
}

impl<'a, T: Target> Serializer<'a, T> {
    /// Create a new `Serializer` for the given target.
    ///
    /// Always succeeds, but the target may be empty or may already contain
    /// `application/x-www-form-urlencoded` pairs, in which case the serializer
    /// will append a `&` separator before its first pair.
    pub fn new(target: T) -> Self {
        Self::for_suffix(target, 0)
    }

    /// Create a new `Serializer` that will *not* append a `&` separator before
    /// the first pair it appends, regardless of what the target currently contains.
    /// `start_position` is the length, in bytes, of the suffix of `target`'s
    /// string that should be erased and rewritten when `clear()` is called.
    pub fn for_suffix(mut target: T, start_position: usize) -> Self {
        assert!(target.as_mut_string().len() >= start_position);
        Serializer {
            target: Some(target),
            start_position,
            encoding: None,
        }
    }

    /// Remove any existing name/value pairs from the suffix this `Serializer` governs.
    pub fn clear(&mut self) -> &mut Self {
        let target = self.target.as_mut().unwrap().as_mut_string();
        target.truncate(self.start_position);
        self
    }

    /// Set a character encoding to be used for names and values before percent-encoding.
    pub fn encoding_override(&mut self, new: EncodingOverride<'a>) -> &mut Self {
        self.encoding = new;
        self
    }

    /// Serialize and append a name/value pair.
    pub fn append_pair(&mut self, name: &str, value: &str) -> &mut Self {
        self.with_target(|string, encoding| {
            append_pair(string, encoding, name, value);
        });
        self
    }

    /// Serialize and append a name of a name/value pair, with no value.
    ///
    /// The output will only contain the name, not followed by any `=` sign.
    pub fn append_key_only(&mut self, name: &str) -> &mut Self {
        self.with_target(|string, encoding| {
            append_separator_if_needed(string);
            append_encoded(name, string, encoding);
        });
        self
    }

    /// Serialize and append a number of name/value pairs.
    pub fn extend_pairs<I, K, V>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.with_target(|string, encoding| {
            for pair in iter {
                let &(ref k, ref v) = pair.borrow();
                append_pair(string, encoding, k.as_ref(), v.as_ref());
            }
        });
        self
    }

    /// Consume this `Serializer` and return the underlying `Target`.
    pub fn finish(&mut self) -> T {
        self.target.take().unwrap().finish()
    }

    fn with_target<F: FnOnce(&mut String, EncodingOverride<'_>)>(&mut self, f: F) {
        let encoding = self.encoding;
        f(self.target.as_mut().unwrap().as_mut_string(), encoding);
    }
}

fn append_separator_if_needed(string: &mut String) {
    if !string.is_empty() {
        string.push('&');
    }
}

fn append_pair(
    string: &mut String,
    encoding: EncodingOverride<'_>,
    name: &str,
    value: &str,
) {
    append_separator_if_needed(string);
    append_encoded(name, string, encoding);
    string.push('=');
    append_encoded(value, string, encoding);
}

fn append_encoded(s: &str, string: &mut String, encoding: EncodingOverride<'_>) {
    let bytes = query_encoding::encode(encoding, s);
    string.extend(byte_serialize(&bytes));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_empty_pairs() {
        let pairs: Vec<_> = parse(b"a=1&&b=2&&&c=3")
            .into_owned()
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_owned(), "1".to_owned()),
                ("b".to_owned(), "2".to_owned()),
                ("c".to_owned(), "3".to_owned()),
            ]
        );
    }

    #[test]
    fn parse_decodes_plus_as_space() {
        let pairs: Vec<_> = parse(b"q=green+eggs+%26+ham").into_owned().collect();
        assert_eq!(pairs, vec![("q".to_owned(), "green eggs & ham".to_owned())]);
    }

    #[test]
    fn parse_no_value_means_empty_value() {
        let pairs: Vec<_> = parse(b"flag&name=value").into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("flag".to_owned(), "".to_owned()),
                ("name".to_owned(), "value".to_owned()),
            ]
        );
    }

    #[test]
    fn serialize_roundtrips_through_parse() {
        let mut target = String::new();
        Serializer::new(&mut target)
            .append_pair("q", "green eggs & ham")
            .append_pair("n", "1")
            .finish();
        assert_eq!(target, "q=green+eggs+%26+ham&n=1");
        let pairs: Vec<_> = parse(target.as_bytes()).into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_owned(), "green eggs & ham".to_owned()),
                ("n".to_owned(), "1".to_owned()),
            ]
        );
    }

    #[test]
    fn append_key_only_has_no_equals_sign() {
        let mut target = String::new();
        Serializer::new(&mut target).append_key_only("flag").finish();
        assert_eq!(target, "flag");
    }
}
