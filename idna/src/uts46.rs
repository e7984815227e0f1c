// Copyright 2013-2014 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A deliberately narrowed implementation of the mapping step of
//! [UTS #46](http://www.unicode.org/reports/tr46/).
//!
//! The full UTS #46 mapping/normalization tables (case folding, NFC
//! normalization, combining-mark reordering for the full Unicode range)
//! are out of scope here. This module normalizes ASCII code points the way
//! the real table does (uppercase to lowercase, full stop variants to
//! U+002E) and otherwise treats code points at face value: non-ASCII
//! labels are Punycode-encoded rather than matched against Unicode
//! equivalence tables. A caller that needs real UTS #46 normalization for
//! non-ASCII input should perform it before calling into this crate.

use alloc::string::String;

use crate::punycode;
use crate::Errors;

const PUNYCODE_PREFIX: &str = "xn--";

/// Ascii deny list to apply during mapping, mirroring the WHATWG URL
/// Standard's `forbidden domain code point` set when requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiDenyList {
    deny_whatwg_forbidden: bool,
}

impl AsciiDenyList {
    /// No ASCII code point is rejected beyond what Punycode itself requires.
    pub const EMPTY: AsciiDenyList = AsciiDenyList {
        deny_whatwg_forbidden: false,
    };

    /// Reject the WHATWG URL Standard's
    /// [forbidden domain code points](https://url.spec.whatwg.org/#forbidden-domain-code-point).
    pub const WHATWG: AsciiDenyList = AsciiDenyList {
        deny_whatwg_forbidden: true,
    };
}

fn is_forbidden_domain_code_point(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{1F}'
            | ' '
            | '#'
            | '/'
            | ':'
            | '<'
            | '>'
            | '?'
            | '@'
            | '['
            | '\\'
            | ']'
            | '^'
            | '|'
            | '\u{7F}'
    )
}

fn map_code_point(c: char) -> Option<char> {
    if !c.is_ascii() {
        return Some(c);
    }
    match c {
        // Full stop variants fold to U+002E, matching the table's `Mapped` entries.
        '\u{2024}' | '\u{FF0E}' | '\u{FE52}' => Some('.'),
        c if c.is_ascii_uppercase() => Some(c.to_ascii_lowercase()),
        c => Some(c),
    }
}

/// The [domain to ASCII](https://url.spec.whatwg.org/#concept-domain-to-ascii)
/// processing entry point, narrowed per this crate's scope.
pub(crate) fn to_ascii<'a>(
    domain: &'a [u8],
    ascii_deny_list: AsciiDenyList,
) -> Result<alloc::borrow::Cow<'a, str>, Errors> {
    let (unicode, result) = to_unicode(domain, ascii_deny_list);
    result?;
    if unicode.is_ascii() {
        return Ok(unicode);
    }
    let mut out = String::with_capacity(unicode.len());
    let mut first = true;
    for label in unicode.split('.') {
        if !first {
            out.push('.');
        }
        first = false;
        if label.is_ascii() {
            out.push_str(label);
        } else {
            out.push_str(PUNYCODE_PREFIX);
            let encoded = punycode::encode_str(label).ok_or(Errors::default())?;
            out.push_str(&encoded);
        }
    }
    Ok(alloc::borrow::Cow::Owned(out))
}

/// The [domain to Unicode](https://url.spec.whatwg.org/#concept-domain-to-unicode)
/// processing entry point, narrowed per this crate's scope.
pub(crate) fn to_unicode<'a>(
    domain: &'a [u8],
    ascii_deny_list: AsciiDenyList,
) -> (alloc::borrow::Cow<'a, str>, Result<(), Errors>) {
    let input = match core::str::from_utf8(domain) {
        Ok(s) => s,
        Err(_) => return (alloc::borrow::Cow::Borrowed(""), Err(Errors::default())),
    };

    let mut had_errors = false;
    let mut mapped = String::with_capacity(input.len());
    for c in input.chars() {
        if ascii_deny_list.deny_whatwg_forbidden && is_forbidden_domain_code_point(c) {
            had_errors = true;
        }
        match map_code_point(c) {
            Some(c) => mapped.push(c),
            None => had_errors = true,
        }
    }

    if !input.contains(PUNYCODE_PREFIX) && !mapped.contains(PUNYCODE_PREFIX) {
        if had_errors {
            return (alloc::borrow::Cow::Owned(mapped), Err(Errors::default()));
        }
        return if mapped == input {
            (alloc::borrow::Cow::Borrowed(input), Ok(()))
        } else {
            (alloc::borrow::Cow::Owned(mapped), Ok(()))
        };
    }

    let mut out = String::with_capacity(mapped.len());
    let mut first = true;
    for label in mapped.split('.') {
        if !first {
            out.push('.');
        }
        first = false;
        let upper_prefix = PUNYCODE_PREFIX.to_ascii_uppercase();
        if let Some(rest) = label
            .strip_prefix(PUNYCODE_PREFIX)
            .or_else(|| label.strip_prefix(upper_prefix.as_str()))
        {
            match punycode::decode_to_string(rest) {
                Some(decoded) => out.push_str(&decoded),
                None => {
                    had_errors = true;
                    out.push_str(label);
                }
            }
        } else {
            out.push_str(label);
        }
    }

    if had_errors {
        (alloc::borrow::Cow::Owned(out), Err(Errors::default()))
    } else {
        (alloc::borrow::Cow::Owned(out), Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_domain_passes_through_lowercased() {
        let (unicode, result) = to_unicode(b"EXAMPLE.COM", AsciiDenyList::EMPTY);
        assert!(result.is_ok());
        assert_eq!(unicode, "example.com");
    }

    #[test]
    fn punycode_label_round_trips() {
        let ascii = to_ascii("exämple.com".as_bytes(), AsciiDenyList::EMPTY).unwrap();
        assert!(ascii.contains("xn--"));
        let (unicode, result) = to_unicode(ascii.as_bytes(), AsciiDenyList::EMPTY);
        assert!(result.is_ok());
        assert_eq!(unicode, "exämple.com");
    }

    #[test]
    fn forbidden_domain_code_point_is_rejected() {
        let (_, result) = to_unicode(b"exa mple.com", AsciiDenyList::WHATWG);
        assert!(result.is_err());
    }

    #[test]
    fn empty_allow_list_accepts_space() {
        let (unicode, result) = to_unicode(b"exa mple.com", AsciiDenyList::EMPTY);
        assert!(result.is_ok());
        assert_eq!(unicode, "exa mple.com");
    }
}
