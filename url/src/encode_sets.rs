// Copyright 2013-2024 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The named percent-encode sets the parser and setters use, layered on
//! `percent_encoding::AsciiSet` the way the teacher's old `encode_sets`
//! module layered on its own byte-set type.

use percent_encoding::{AsciiSet, CONTROLS};

/// The C0 control percent-encode set: C0 controls and all non-ASCII bytes.
pub const C0_CONTROL: &AsciiSet = &CONTROLS;

/// The fragment percent-encode set.
pub const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// The query percent-encode set.
pub const QUERY: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'<').add(b'>');

/// The special-query percent-encode set: `QUERY` plus `'`, used for the
/// query strings of special-scheme URLs.
pub const SPECIAL_QUERY: &AsciiSet = &QUERY.add(b'\'');

/// The path percent-encode set.
pub const PATH: &AsciiSet = &QUERY.add(b'?').add(b'`').add(b'{').add(b'}');

/// The userinfo percent-encode set: `PATH` plus the bytes that would be
/// ambiguous inside `user:pass@host`.
pub const USERINFO: &AsciiSet = &PATH
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'|');

/// The component percent-encode set: `USERINFO` plus `$`, `%`, `&`, `+`, `,`.
/// Used when encoding a standalone value with no other applicable set (e.g.
/// path- and key-value-view insertions' generic fallback).
pub const COMPONENT: &AsciiSet = &USERINFO
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',');

/// `FormEncoding`'s percent-encode set (space/`+` substitution is applied
/// separately by the key-value schema, not by this set).
pub const FORM_ENCODING: &AsciiSet = &COMPONENT.add(b'!').add(b'\'').add(b'(').add(b')').add(b'~');

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::utf8_percent_encode;

    #[test]
    fn component_is_superset_of_userinfo() {
        let sample = "$%&+,/:;=@[\\]^|!'()~ \"<>`";
        let via_userinfo = utf8_percent_encode(sample, USERINFO).to_string();
        let via_component = utf8_percent_encode(sample, COMPONENT).to_string();
        for c in via_userinfo.split('%').filter(|s| !s.is_empty()) {
            assert!(
                via_component.contains(&format!("%{}", &c[..2.min(c.len())])),
                "byte encoded by USERINFO should also be encoded by COMPONENT"
            );
        }
    }

    #[test]
    fn path_encodes_question_and_hash() {
        assert_eq!(utf8_percent_encode("a?b#c", PATH).to_string(), "a%3Fb%23c");
    }

    #[test]
    fn special_query_encodes_apostrophe() {
        assert_eq!(utf8_percent_encode("it's", SPECIAL_QUERY).to_string(), "it%27s");
        assert_eq!(utf8_percent_encode("it's", QUERY).to_string(), "it's");
    }
}
