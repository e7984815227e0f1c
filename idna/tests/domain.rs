// Copyright 2024 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#[test]
fn ascii_round_trips_unchanged() {
    assert_eq!(idna::domain_to_ascii("example.com").unwrap(), "example.com");
}

#[test]
fn mixed_case_is_folded() {
    assert_eq!(idna::domain_to_ascii("ExAmPlE.CoM").unwrap(), "example.com");
}

#[test]
fn non_ascii_label_round_trips_through_punycode() {
    let ascii = idna::domain_to_ascii("mañana.example").unwrap();
    let (unicode, result) = idna::domain_to_unicode(&ascii);
    assert!(result.is_ok());
    assert_eq!(unicode, "mañana.example");
}

#[test]
fn multi_label_domain_punycodes_only_non_ascii_labels() {
    let ascii = idna::domain_to_ascii("www.münchen.de").unwrap();
    assert_eq!(ascii, "www.xn--mnchen-3ya.de");
}

#[test]
fn forbidden_code_points_rejected_only_when_requested() {
    assert!(idna::domain_to_ascii_cow("exa\u{0}mple.com", true).is_err());
    assert!(idna::domain_to_ascii_cow("exa\u{0}mple.com", false).is_ok());
}
