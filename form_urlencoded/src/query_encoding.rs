// Copyright 2019 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::borrow::Cow;

/// A legacy character-encoding hook for serializing query strings/form bodies
/// whose surrounding document is not UTF-8. `None` means UTF-8 (the common case,
/// and the only option the WHATWG URL Standard itself uses).
pub type EncodingOverride<'a> = Option<&'a dyn for<'b> Fn(&'b str) -> Cow<'b, [u8]>>;

pub fn encode<'a>(encoding_override: EncodingOverride<'_>, input: &'a str) -> Cow<'a, [u8]> {
    if let Some(o) = encoding_override {
        return Cow::Owned(o(input).into_owned());
    }
    input.as_bytes().into()
}
