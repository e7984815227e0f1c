// Copyright 2013-2016 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! URLs use special characters to indicate the parts of the request.
//! For example, a `?` question mark marks the end of a path and the start of a query string.
//! In order for that character to exist inside a path, it needs to be encoded differently.
//!
//! Percent encoding replaces reserved characters with the `%` escape character
//! followed by a byte value as two hexadecimal digits.
//! For example, an ASCII space inside a query string is replaced with `%20`.
//!
//! This crate defines a common interface for percent encoding and decoding that is used
//! by the `url` and `form_urlencoded` crates. Sets of characters that should be percent-encoded
//! in a given context are expressed as an [`AsciiSet`], a bitset over the ASCII range.

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::slice;
use core::str;

/// Represents a set of characters or bytes in the ASCII range.
///
/// This is used in [`percent_encode`] and [`utf8_percent_encode`].
/// This is a bitset: each ASCII code point in `0x00..=0x7F` is represented by one bit,
/// stored as four `u32` words.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AsciiSet {
    mask: [u32; 4],
}

impl AsciiSet {
    const fn bit(byte: u8) -> (usize, u32) {
        ((byte / 32) as usize, 1u32 << (byte % 32))
    }

    /// Called with UTF-8 bytes rather than code points.
    /// Since the Percent-Encoding Standard is defined in terms of bytes,
    /// a byte outside the ASCII range is always percent-encoded.
    const fn contains(&self, byte: u8) -> bool {
        if byte >= 0x80 {
            return true;
        }
        let (word, bit) = Self::bit(byte);
        self.mask[word] & bit != 0
    }

    /// Called with an ASCII byte (`< 0x80`) to check whether this set contains it.
    pub(crate) fn should_percent_encode(&self, byte: u8) -> bool {
        self.contains(byte)
    }

    /// Return a new set that is this one plus the given byte.
    pub const fn add(&self, byte: u8) -> Self {
        let (word, bit) = Self::bit(byte);
        let mut mask = self.mask;
        mask[word] |= bit;
        AsciiSet { mask }
    }

    /// Return a new set that is this one minus the given byte.
    pub const fn remove(&self, byte: u8) -> Self {
        let (word, bit) = Self::bit(byte);
        let mut mask = self.mask;
        mask[word] &= !bit;
        AsciiSet { mask }
    }

    /// Return a new set that is the union of this one and `other`.
    pub const fn union(&self, other: &AsciiSet) -> Self {
        AsciiSet {
            mask: [
                self.mask[0] | other.mask[0],
                self.mask[1] | other.mask[1],
                self.mask[2] | other.mask[2],
                self.mask[3] | other.mask[3],
            ],
        }
    }
}

const fn controls() -> AsciiSet {
    let mut set = AsciiSet { mask: [0; 4] };
    let mut byte = 0u8;
    while byte < 0x20 {
        set = set.add(byte);
        byte += 1;
    }
    set.add(0x7f)
}

/// The C0 control percent-encode set: the C0 controls (U+0000 to U+001F) and 0x7F (DEL).
///
/// This is the smallest set, and every encode set in this crate or built from it
/// via [`AsciiSet::add`] contains it, matching spec.md §4.1's "named sets" contract.
pub const CONTROLS: AsciiSet = controls();

/// Everything that is not an ASCII letter or digit.
///
/// This is a reasonable default encode set for ad hoc encoding of arbitrary strings,
/// but it is not used internally by `url`: each URL component has its own, narrower set
/// (see the `url` crate's `encode_sets` module).
pub const NON_ALPHANUMERIC: AsciiSet = controls()
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'-')
    .add(b'.')
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
    .add(b'_')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}')
    .add(b'~');

#[rustfmt::skip]
static PERCENT_ENCODE_TABLE: [&str; 256] = [
    "%00", "%01", "%02", "%03", "%04", "%05", "%06", "%07",
    "%08", "%09", "%0A", "%0B", "%0C", "%0D", "%0E", "%0F",
    "%10", "%11", "%12", "%13", "%14", "%15", "%16", "%17",
    "%18", "%19", "%1A", "%1B", "%1C", "%1D", "%1E", "%1F",
    "%20", "%21", "%22", "%23", "%24", "%25", "%26", "%27",
    "%28", "%29", "%2A", "%2B", "%2C", "%2D", "%2E", "%2F",
    "%30", "%31", "%32", "%33", "%34", "%35", "%36", "%37",
    "%38", "%39", "%3A", "%3B", "%3C", "%3D", "%3E", "%3F",
    "%40", "%41", "%42", "%43", "%44", "%45", "%46", "%47",
    "%48", "%49", "%4A", "%4B", "%4C", "%4D", "%4E", "%4F",
    "%50", "%51", "%52", "%53", "%54", "%55", "%56", "%57",
    "%58", "%59", "%5A", "%5B", "%5C", "%5D", "%5E", "%5F",
    "%60", "%61", "%62", "%63", "%64", "%65", "%66", "%67",
    "%68", "%69", "%6A", "%6B", "%6C", "%6D", "%6E", "%6F",
    "%70", "%71", "%72", "%73", "%74", "%75", "%76", "%77",
    "%78", "%79", "%7A", "%7B", "%7C", "%7D", "%7E", "%7F",
    "%80", "%81", "%82", "%83", "%84", "%85", "%86", "%87",
    "%88", "%89", "%8A", "%8B", "%8C", "%8D", "%8E", "%8F",
    "%90", "%91", "%92", "%93", "%94", "%95", "%96", "%97",
    "%98", "%99", "%9A", "%9B", "%9C", "%9D", "%9E", "%9F",
    "%A0", "%A1", "%A2", "%A3", "%A4", "%A5", "%A6", "%A7",
    "%A8", "%A9", "%AA", "%AB", "%AC", "%AD", "%AE", "%AF",
    "%B0", "%B1", "%B2", "%B3", "%B4", "%B5", "%B6", "%B7",
    "%B8", "%B9", "%BA", "%BB", "%BC", "%BD", "%BE", "%BF",
    "%C0", "%C1", "%C2", "%C3", "%C4", "%C5", "%C6", "%C7",
    "%C8", "%C9", "%CA", "%CB", "%CC", "%CD", "%CE", "%CF",
    "%D0", "%D1", "%D2", "%D3", "%D4", "%D5", "%D6", "%D7",
    "%D8", "%D9", "%DA", "%DB", "%DC", "%DD", "%DE", "%DF",
    "%E0", "%E1", "%E2", "%E3", "%E4", "%E5", "%E6", "%E7",
    "%E8", "%E9", "%EA", "%EB", "%EC", "%ED", "%EE", "%EF",
    "%F0", "%F1", "%F2", "%F3", "%F4", "%F5", "%F6", "%F7",
    "%F8", "%F9", "%FA", "%FB", "%FC", "%FD", "%FE", "%FF",
];

/// Percent-encode the given bytes with the given set, as a lazy iterator of `&str` slices.
///
/// Non-encoded bytes are yielded together as one borrowed slice when possible,
/// so that the common case of an input with few characters to encode
/// does the minimum number of allocation-free `str` pushes. Restart iteration
/// by `.clone()`-ing the returned iterator (spec.md §4.1's "restartable" requirement).
#[inline]
pub fn percent_encode(input: &[u8], ascii_set: &'static AsciiSet) -> PercentEncode<'_> {
    PercentEncode {
        bytes: input,
        ascii_set,
    }
}

/// Percent-encode the UTF-8 encoding of the given string with the given set,
/// as a lazy iterator of `&str` slices.
#[inline]
pub fn utf8_percent_encode(input: &str, ascii_set: &'static AsciiSet) -> PercentEncode<'_> {
    percent_encode(input.as_bytes(), ascii_set)
}

/// The return type of [`percent_encode`] and [`utf8_percent_encode`].
#[derive(Clone)]
pub struct PercentEncode<'a> {
    bytes: &'a [u8],
    ascii_set: &'static AsciiSet,
}

impl<'a> Iterator for PercentEncode<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let (&first, rest) = self.bytes.split_first()?;
        if self.ascii_set.should_percent_encode(first) {
            self.bytes = rest;
            Some(PERCENT_ENCODE_TABLE[first as usize])
        } else {
            let unencoded_len = rest
                .iter()
                .position(|&b| self.ascii_set.should_percent_encode(b))
                .map_or(rest.len(), |i| i)
                + 1;
            let (chunk, rest) = self.bytes.split_at(unencoded_len);
            self.bytes = rest;
            // Safe: every byte in `chunk` failed `should_percent_encode`,
            // which is true for every non-ASCII byte, so `chunk` is pure ASCII.
            Some(unsafe { str::from_utf8_unchecked(chunk) })
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.bytes.is_empty() {
            (0, Some(0))
        } else {
            (1, Some(self.bytes.len()))
        }
    }
}

impl<'a> DoubleEndedIterator for PercentEncode<'a> {
    fn next_back(&mut self) -> Option<&'a str> {
        let (&last, rest) = self.bytes.split_last()?;
        if self.ascii_set.should_percent_encode(last) {
            self.bytes = rest;
            Some(PERCENT_ENCODE_TABLE[last as usize])
        } else {
            let start = rest
                .iter()
                .rposition(|&b| self.ascii_set.should_percent_encode(b))
                .map_or(0, |i| i + 1);
            let (rest, chunk) = self.bytes.split_at(start);
            self.bytes = rest;
            Some(unsafe { str::from_utf8_unchecked(chunk) })
        }
    }
}

impl<'a> fmt::Display for PercentEncode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.clone().try_for_each(|s| f.write_str(s))
    }
}

impl<'a> From<PercentEncode<'a>> for Cow<'a, str> {
    fn from(mut iter: PercentEncode<'a>) -> Self {
        match (iter.next(), iter.next()) {
            (None, _) => Cow::Borrowed(""),
            (Some(first), None) => Cow::Borrowed(first),
            (Some(first), Some(second)) => {
                let mut string = String::with_capacity(iter.bytes.len() + first.len() + second.len());
                string.push_str(first);
                string.push_str(second);
                string.extend(iter);
                Cow::Owned(string)
            }
        }
    }
}

#[inline]
fn from_hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// Percent-decode the given bytes, as a lazy iterator of bytes.
///
/// Bytes that are not a well-formed `%XX` escape (including a lone trailing `%`
/// or a `%` followed by non-hex-digit bytes) are passed through unchanged,
/// per spec.md §4.1's decoder contract: decoding never fails.
#[inline]
pub fn percent_decode(input: &[u8]) -> PercentDecode<'_> {
    PercentDecode { bytes: input.iter() }
}

/// Percent-decode the given string, as a lazy iterator of bytes.
#[inline]
pub fn percent_decode_str(input: &str) -> PercentDecode<'_> {
    percent_decode(input.as_bytes())
}

/// The return type of [`percent_decode`] and [`percent_decode_str`].
#[derive(Clone, Debug)]
pub struct PercentDecode<'a> {
    bytes: slice::Iter<'a, u8>,
}

fn after_percent_sign(iter: &mut slice::Iter<'_, u8>) -> Option<u8> {
    let mut cloned_iter = iter.clone();
    let h = from_hex_digit(*cloned_iter.next()?)?;
    let l = from_hex_digit(*cloned_iter.next()?)?;
    *iter = cloned_iter;
    Some(h * 0x10 + l)
}

impl<'a> Iterator for PercentDecode<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.bytes.next().map(|&byte| {
            if byte == b'%' {
                after_percent_sign(&mut self.bytes).unwrap_or(byte)
            } else {
                byte
            }
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (_, upper) = self.bytes.size_hint();
        (0, upper)
    }
}

impl<'a> PercentDecode<'a> {
    /// If the percent-decoding is different from the input, return it as a new
    /// owned, byte vector.
    pub fn if_any(&self) -> Option<Vec<u8>> {
        let mut bytes_iter = self.bytes.clone();
        bytes_iter
            .position(|&b| b == b'%')
            .and_then(|first_percent_sign| {
                after_percent_sign(&mut bytes_iter.clone()).map(|_| {
                    let mut decoded = self.bytes.as_slice()[..first_percent_sign].to_owned();
                    decoded.extend(PercentDecode {
                        bytes: self.bytes.as_slice()[first_percent_sign..].iter(),
                    });
                    decoded
                })
            })
    }

    /// Decode the result of percent-decoding as UTF-8, lossily.
    ///
    /// Invalid UTF-8 percent-encoded byte sequences will be replaced
    /// with the replacement character U+FFFD.
    pub fn decode_utf8_lossy(self) -> Cow<'a, str> {
        decode_utf8_lossy(match self.if_any() {
            Some(bytes) => Cow::Owned(bytes),
            None => Cow::Borrowed(self.bytes.as_slice()),
        })
    }

    /// Decode the result of percent-decoding as UTF-8, and error on invalid UTF-8.
    pub fn decode_utf8(self) -> Result<Cow<'a, str>, str::Utf8Error> {
        match self.if_any() {
            Some(bytes) => match String::from_utf8(bytes) {
                Ok(s) => Ok(Cow::Owned(s)),
                Err(e) => Err(e.utf8_error()),
            },
            None => match str::from_utf8(self.bytes.as_slice()) {
                Ok(s) => Ok(Cow::Borrowed(s)),
                Err(e) => Err(e),
            },
        }
    }
}

fn decode_utf8_lossy(input: Cow<'_, [u8]>) -> Cow<'_, str> {
    match input {
        Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
        Cow::Owned(bytes) => Cow::Owned(match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(utf8) => {
                // If from_utf8_lossy returns a Cow::Borrowed, then we can safely
                // say the original buffer is valid UTF-8. This is because
                // if the buffer was not valid UTF-8, the Cow would be Cow::Owned.
                let offset = utf8.as_ptr() as usize - bytes.as_ptr() as usize;
                debug_assert_eq!(offset, 0);
                let _ = offset;
                // SAFETY: `utf8` is a view into `bytes` and has the same length.
                unsafe { String::from_utf8_unchecked(bytes) }
            }
            Cow::Owned(s) => s,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

    #[test]
    fn encode_then_decode_roundtrips() {
        let input = "foo <bar> \"baz\" r\u{e9}sum\u{e9}.html";
        let encoded: String = utf8_percent_encode(input, PATH).collect();
        assert_eq!(encoded, "foo%20%3Cbar%3E%20%22baz%22%20r%C3%A9sum%C3%A9.html");
        let decoded = percent_decode_str(&encoded).decode_utf8().unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn decode_passes_through_invalid_escapes() {
        let decoded: Vec<u8> = percent_decode(b"100%25 not %ZZ hex% and%1").collect();
        assert_eq!(decoded, b"100% not %ZZ hex% and%1");
    }

    #[test]
    fn decode_is_clonable_and_restartable() {
        let a = percent_decode_str("%61%62%63");
        let b = a.clone();
        assert_eq!(a.collect::<Vec<u8>>(), b"abc");
        assert_eq!(b.collect::<Vec<u8>>(), b"abc");
    }

    #[test]
    fn encode_is_bidirectional() {
        let forward: Vec<&str> = utf8_percent_encode("a b", PATH).collect();
        let mut backward: Vec<&str> = utf8_percent_encode("a b", PATH).rev().collect();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn no_trigger_byte_is_allocation_free_pass_through() {
        let decoded = percent_decode_str("nothing to decode here");
        assert!(decoded.if_any().is_none());
    }
}
