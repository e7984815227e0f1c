// Copyright 2016 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! This crate implements the domain-name branch of IDNA
//! [per the WHATWG URL Standard](https://url.spec.whatwg.org/#idna), treated
//! as an external collaborator the URL parser calls into rather than code
//! the parser owns.
//!
//! Full [UTS #46](http://www.unicode.org/reports/tr46/) mapping and
//! normalization over the entire Unicode range is out of scope for this
//! crate (see [`uts46`]'s module docs); what's implemented is the part the
//! URL Standard actually needs: ASCII case-folding, a forbidden-code-point
//! deny list, and [Punycode (RFC 3492)](https://tools.ietf.org/html/rfc3492)
//! for labels that aren't already ASCII.
#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

#[cfg(not(feature = "alloc"))]
compile_error!("the `alloc` feature must be enabled");

use alloc::borrow::Cow;
use alloc::string::String;

pub mod punycode;
pub mod uts46;

pub use crate::uts46::AsciiDenyList;

/// Errors during domain-to-ASCII or domain-to-Unicode processing.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Errors {}

impl From<Errors> for Result<(), Errors> {
    fn from(e: Errors) -> Result<(), Errors> {
        Err(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Errors {}

impl core::fmt::Display for Errors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

/// The [domain to ASCII](https://url.spec.whatwg.org/#concept-domain-to-ascii) algorithm;
/// version returning a `Cow`.
///
/// If `reject_forbidden_domain_code_points` is `true`, [forbidden domain code
/// points](https://url.spec.whatwg.org/#forbidden-domain-code-point) are treated as errors.
pub fn domain_to_ascii_cow(
    domain: &str,
    reject_forbidden_domain_code_points: bool,
) -> Result<Cow<'_, str>, Errors> {
    uts46::to_ascii(
        domain.as_bytes(),
        if reject_forbidden_domain_code_points {
            AsciiDenyList::WHATWG
        } else {
            AsciiDenyList::EMPTY
        },
    )
}

/// The [domain to ASCII](https://url.spec.whatwg.org/#concept-domain-to-ascii) algorithm;
/// version returning `String` and no ASCII deny list.
///
/// This function exists for backward-compatibility; prefer [`domain_to_ascii_cow`].
pub fn domain_to_ascii(domain: &str) -> Result<String, Errors> {
    domain_to_ascii_cow(domain, false).map(|cow| cow.into_owned())
}

/// The [domain to Unicode](https://url.spec.whatwg.org/#concept-domain-to-unicode) algorithm;
/// version returning a `Cow`.
///
/// If the second item of the tuple indicates an error, the first item denotes errors using
/// REPLACEMENT CHARACTERs and must not be used in a network protocol.
pub fn domain_to_unicode_cow(
    domain: &str,
    reject_forbidden_domain_code_points: bool,
) -> (Cow<'_, str>, Result<(), Errors>) {
    uts46::to_unicode(
        domain.as_bytes(),
        if reject_forbidden_domain_code_points {
            AsciiDenyList::WHATWG
        } else {
            AsciiDenyList::EMPTY
        },
    )
}

/// The [domain to Unicode](https://url.spec.whatwg.org/#concept-domain-to-unicode) algorithm;
/// version returning `String` and no ASCII deny list.
///
/// This function exists for backward-compatibility; prefer [`domain_to_unicode_cow`].
pub fn domain_to_unicode(domain: &str) -> (String, Result<(), Errors>) {
    let (cow, result) = domain_to_unicode_cow(domain, false);
    (cow.into_owned(), result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_only_domain_is_unchanged_but_lowercased() {
        assert_eq!(domain_to_ascii("EXAMPLE.com").unwrap(), "example.com");
    }

    #[test]
    fn non_ascii_label_becomes_punycode() {
        let ascii = domain_to_ascii("straße.example").unwrap();
        assert_eq!(ascii, "xn--strae-oqa.example");
    }

    #[test]
    fn domain_to_unicode_decodes_punycode_label() {
        let (unicode, result) = domain_to_unicode("xn--strae-oqa.example");
        assert!(result.is_ok());
        assert_eq!(unicode, "straße.example");
    }

    #[test]
    fn forbidden_code_point_is_reported_when_requested() {
        assert!(domain_to_ascii_cow("exa mple.com", true).is_err());
        assert!(domain_to_ascii_cow("exa mple.com", false).is_ok());
    }
}
