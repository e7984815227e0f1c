// Copyright 2013-2024 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A WHATWG-compliant URL: state-machine parser, component setters, and two
//! mutable collection views (path components, key-value query/fragment
//! pairs) layered on a single compact string buffer plus a header of byte
//! offsets.
//!
//! ```
//! let mut url = url::Url::parse("https://example.net/a/b?x=1#frag").unwrap();
//! assert_eq!(url.host_str(), Some("example.net"));
//! url.set_path("/c/d");
//! assert_eq!(url.as_str(), "https://example.net/c/d?x=1#frag");
//! ```

extern crate alloc;

use alloc::borrow::ToOwned;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str;
use std::net::{Ipv4Addr, Ipv6Addr};

pub use crate::host::{Host, HostContext, HostParseError};
pub use crate::kv::{FormEncoded, KeyValuePairs, KeyValueSchema, PercentEncoded};
pub use crate::origin::{Origin, OpaqueOrigin};
pub use crate::path_segments::PathComponents;

use crate::encode_sets::{FRAGMENT, QUERY, SPECIAL_QUERY, USERINFO};
use percent_encoding::utf8_percent_encode;

mod encode_sets;
mod file_path;
mod host;
mod kv;
mod origin;
mod parser;
mod path_segments;

pub use crate::file_path::{
    posix_path_from_url, url_from_posix_path, url_from_windows_path, windows_path_from_url,
    PosixPathError, WindowsPathError,
};

/// A non-fatal issue encountered while parsing. Fatal conditions produce
/// [`ParseError`] instead; these are purely informational and never change
/// whether parsing succeeds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SyntaxViolation {
    /// A `\t`, `\n`, or `\r` byte was stripped from the input before parsing.
    TabOrNewlineIgnored,
    /// Leading or trailing C0 control or space was trimmed.
    C0SpaceIgnored,
    /// A backslash was used where a forward slash was expected in a special
    /// URL (they are equivalent there, but this is non-conformant input).
    BackslashAsDelimiter,
    /// The authority had more than one `@`.
    UnencodedAtSign,
    /// A host component had a byte that had to be percent-encoded.
    NonUrlCodePoint,
    /// An empty port (bare `:`) was seen.
    ExpectedPortDigit,
}

impl fmt::Display for SyntaxViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyntaxViolation::TabOrNewlineIgnored => "tab or newline ignored",
            SyntaxViolation::C0SpaceIgnored => "leading or trailing control/space ignored",
            SyntaxViolation::BackslashAsDelimiter => "backslash used as a delimiter",
            SyntaxViolation::UnencodedAtSign => "unencoded @ in userinfo",
            SyntaxViolation::NonUrlCodePoint => "non-URL code point",
            SyntaxViolation::ExpectedPortDigit => "expected a port number",
        };
        f.write_str(s)
    }
}

/// A fatal parse failure: the input could not be turned into a [`Url`] at
/// all.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    /// The scheme is missing and no base URL was given, or the input was
    /// empty/otherwise unparseable as either absolute or relative.
    RelativeUrlWithoutBase,
    /// The input has no scheme and the base URL cannot be a base (e.g. it
    /// has an opaque path), so relative resolution is impossible.
    RelativeUrlWithCannotBeABaseBase,
    /// The scheme is empty or contains a byte outside `[a-zA-Z0-9+-.]`, or
    /// does not start with a letter.
    InvalidScheme,
    /// A special non-`file` scheme requires a host, and none (or an empty
    /// one) was given.
    EmptyHost,
    /// Host parsing failed; see the inner [`HostParseError`] for detail.
    InvalidHost(HostParseError),
    /// The port is present but is not a valid `u16`, or the scheme is
    /// `file` (which cannot have a port at all).
    InvalidPort,
    /// IDNA processing of a domain failed.
    IdnaError,
    /// The authority ended unexpectedly (e.g. trailing `@` with no host).
    EmptyAuthority,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::RelativeUrlWithoutBase => {
                f.write_str("relative URL without a base")
            }
            ParseError::RelativeUrlWithCannotBeABaseBase => {
                f.write_str("relative URL with a cannot-be-a-base base")
            }
            ParseError::InvalidScheme => f.write_str("invalid scheme"),
            ParseError::EmptyHost => f.write_str("empty host"),
            ParseError::InvalidHost(e) => write!(f, "invalid host: {}", e),
            ParseError::InvalidPort => f.write_str("invalid port number"),
            ParseError::IdnaError => f.write_str("IDNA processing error"),
            ParseError::EmptyAuthority => f.write_str("empty or malformed authority"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<HostParseError> for ParseError {
    fn from(e: HostParseError) -> ParseError {
        ParseError::InvalidHost(e)
    }
}

/// A position within a [`Url`]'s serialization, for [`Url::range`]-style
/// introspection (mostly useful to callers that want a sub-slice boundary
/// without parsing the whole thing themselves).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position {
    BeforeScheme,
    AfterScheme,
    BeforeUsername,
    AfterUsername,
    BeforePassword,
    AfterPassword,
    BeforeHost,
    AfterHost,
    BeforePort,
    AfterPort,
    BeforePath,
    AfterPath,
    BeforeQuery,
    AfterQuery,
    BeforeFragment,
    AfterFragment,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SchemeType {
    File,
    SpecialNotFile,
    NotSpecial,
}

impl SchemeType {
    pub(crate) fn for_scheme(scheme: &str) -> SchemeType {
        match scheme {
            "file" => SchemeType::File,
            "http" | "https" | "ws" | "wss" | "ftp" => SchemeType::SpecialNotFile,
            _ => SchemeType::NotSpecial,
        }
    }

    pub(crate) fn is_special(self) -> bool {
        !matches!(self, SchemeType::NotSpecial)
    }
}

pub(crate) fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

/// The parsed host, carried internally without duplicating the textual
/// form (which always lives in `serialization[host_start..host_end]`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum HostInternal {
    None,
    Domain,
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Opaque,
    Empty,
}

/// A builder for non-default parse behavior: a base URL to resolve
/// relative references against, and a callback for [`SyntaxViolation`]s.
#[derive(Default)]
pub struct ParseOptions<'a> {
    base_url: Option<&'a Url>,
    syntax_violation_callback: Option<&'a dyn Fn(SyntaxViolation)>,
}

impl<'a> ParseOptions<'a> {
    pub fn base_url(mut self, base: Option<&'a Url>) -> Self {
        self.base_url = base;
        self
    }

    pub fn syntax_violation_callback(
        mut self,
        callback: Option<&'a dyn Fn(SyntaxViolation)>,
    ) -> Self {
        self.syntax_violation_callback = callback;
        self
    }

    pub fn parse(self, input: &str) -> Result<Url, ParseError> {
        parser::parse(input, self.base_url, self.syntax_violation_callback)
    }
}

/// A parsed, WHATWG-compliant URL.
///
/// Internally this is a single `String` (the exact serialized form) plus a
/// small header of byte offsets into it — mutation always re-derives the
/// offsets rather than storing components separately, so `as_str()` is a
/// free borrow and every mutation preserves everything around the edited
/// range byte-for-byte.
#[derive(Clone)]
pub struct Url {
    serialization: String,
    scheme_end: u32,
    username_end: u32,
    host_start: u32,
    host_end: u32,
    host: HostInternal,
    port: Option<u16>,
    path_start: u32,
    query_start: Option<u32>,
    fragment_start: Option<u32>,
    cannot_be_a_base: bool,
    has_path_sigil: bool,
    query_is_form_encoded: bool,
}

impl Url {
    /// Parse an absolute URL, with no base.
    pub fn parse(input: &str) -> Result<Url, ParseError> {
        parser::parse(input, None, None)
    }

    /// Parse, possibly relative to `self`.
    pub fn join(&self, input: &str) -> Result<Url, ParseError> {
        parser::parse(input, Some(self), None)
    }

    /// Start building a parse with non-default options.
    pub fn options<'a>() -> ParseOptions<'a> {
        ParseOptions::default()
    }

    /// The complete serialized form.
    pub fn as_str(&self) -> &str {
        &self.serialization
    }

    pub fn into_string(self) -> String {
        self.serialization
    }

    fn scheme_type(&self) -> SchemeType {
        SchemeType::for_scheme(self.scheme())
    }

    /// The scheme, always ASCII-lowercase, without the trailing `:`.
    pub fn scheme(&self) -> &str {
        &self.serialization[..self.scheme_end as usize]
    }

    /// Whether this URL has an authority component (`//...`), i.e. a host
    /// (possibly empty), as opposed to an opaque or authority-less path.
    pub fn has_authority(&self) -> bool {
        !matches!(self.host, HostInternal::None)
    }

    /// Whether this URL cannot be used as a base for relative resolution
    /// (an opaque-path URL with no authority, e.g. `mailto:a@b.com`).
    pub fn cannot_be_a_base(&self) -> bool {
        self.cannot_be_a_base
    }

    /// The username, percent-encoded, empty string if absent.
    pub fn username(&self) -> &str {
        let start = self.scheme_end as usize + 3;
        if !self.has_authority() || self.username_end as usize <= start {
            ""
        } else {
            &self.serialization[start..self.username_end as usize]
        }
    }

    /// The password, if one is present (distinct from an empty password).
    pub fn password(&self) -> Option<&str> {
        let start = self.scheme_end as usize + 3;
        let username_end = self.username_end as usize;
        if !self.has_authority() || username_end >= self.host_start as usize {
            return None;
        }
        let bytes = self.serialization.as_bytes();
        if username_end < bytes.len() && bytes[username_end] == b':' {
            // password runs from username_end+1 to the '@'
            let at = self.host_start as usize - 1;
            Some(&self.serialization[username_end + 1..at])
        } else {
            None
        }
    }

    /// The `Host<&str>`, or `None` if this URL has no authority at all.
    pub fn host(&self) -> Option<Host<&str>> {
        match &self.host {
            HostInternal::None => None,
            HostInternal::Empty => Some(Host::Empty),
            HostInternal::Domain => Some(Host::Domain(self.host_text())),
            HostInternal::Opaque => Some(Host::Opaque(self.host_text())),
            HostInternal::Ipv4(addr) => Some(Host::Ipv4(*addr)),
            HostInternal::Ipv6(addr) => Some(Host::Ipv6(*addr)),
        }
    }

    fn host_text(&self) -> &str {
        &self.serialization[self.host_start as usize..self.host_end as usize]
    }

    /// The host as a string, including `[...]` brackets for IPv6.
    pub fn host_str(&self) -> Option<&str> {
        if matches!(self.host, HostInternal::None) {
            None
        } else {
            Some(&self.serialization[self.host_start as usize..self.host_end as usize])
        }
    }

    /// The port, only if one was explicitly given and it differs from the
    /// scheme's default.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The port, falling back to the scheme's well-known default.
    pub fn port_or_known_default(&self) -> Option<u16> {
        self.port.or_else(|| default_port(self.scheme()))
    }

    /// The path: an opaque string for cannot-be-a-base URLs, otherwise the
    /// leading-`/`-joined hierarchical path (e.g. `/a/b/c`).
    pub fn path(&self) -> &str {
        let end = self
            .query_start
            .or(self.fragment_start)
            .unwrap_or(self.serialization.len() as u32) as usize;
        let start = self.path_start as usize;
        if start > end {
            ""
        } else {
            &self.serialization[start..end]
        }
    }

    /// An iterator over decoded path segments, or `None` for an opaque path.
    pub fn path_segments(&self) -> Option<impl Iterator<Item = &str>> {
        if self.cannot_be_a_base {
            None
        } else {
            let path = self.path();
            let path = path.strip_prefix('/').unwrap_or(path);
            Some(path.split('/'))
        }
    }

    /// The query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        let start = self.query_start? as usize + 1;
        let end = self.fragment_start.unwrap_or(self.serialization.len() as u32) as usize;
        Some(&self.serialization[start..end])
    }

    /// The fragment, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        let start = self.fragment_start? as usize + 1;
        Some(&self.serialization[start..])
    }

    /// Whether the query is known to already be in canonical
    /// form-encoded shape (an optimization hint for [`KeyValuePairs`]).
    pub fn query_is_form_encoded(&self) -> bool {
        self.query_is_form_encoded
    }

    pub fn origin(&self) -> Origin {
        origin::url_origin(self)
    }

    // ---- C6: component setters -------------------------------------------------

    /// Replace the scheme. See the setter table in the crate's design notes
    /// for the exact error conditions.
    pub fn set_scheme(&mut self, scheme: &str) -> Result<(), SetSchemeError> {
        let scheme = scheme.trim();
        let (normalized, rest) =
            parser::parse_scheme_only(scheme).ok_or(SetSchemeError::InvalidScheme)?;
        if !rest.is_empty() {
            return Err(SetSchemeError::InvalidScheme);
        }
        let new_type = SchemeType::for_scheme(&normalized);
        let old_type = self.scheme_type();
        if new_type.is_special() != old_type.is_special() {
            return Err(SetSchemeError::ChangeOfSchemeSpecialness);
        }
        if new_type == SchemeType::File {
            if self.username() != "" || self.password().is_some() || self.port.is_some() {
                return Err(SetSchemeError::NewSchemeCannotHaveCredentialsOrPort);
            }
            if matches!(self.host, HostInternal::None) {
                return Err(SetSchemeError::NewSchemeCannotHaveEmptyHostname);
            }
        }
        let old_port_is_default = self.port.is_none();
        let old_scheme_end = self.scheme_end as usize;
        self.serialization.replace_range(0..old_scheme_end, &normalized);
        let delta = normalized.len() as i64 - old_scheme_end as i64;
        self.scheme_end = normalized.len() as u32;
        self.shift_from(old_scheme_end, delta);
        // A changed scheme may change the default port; re-evaluate.
        if old_port_is_default {
            self.port = None;
        }
        Ok(())
    }

    /// Replace the username. `None` to remove credentials entirely is not
    /// distinguished from empty by this setter; use `""` to clear.
    pub fn set_username(&mut self, username: &str) -> Result<(), CredentialsError> {
        if matches!(self.host, HostInternal::None) {
            return Err(CredentialsError::CannotHaveCredentialsOrPort);
        }
        let encoded: String = utf8_percent_encode(username, USERINFO).collect();
        let start = self.scheme_end as usize + 3;
        let old_end = self.username_end as usize;
        self.serialization.replace_range(start..old_end, &encoded);
        let delta = encoded.len() as i64 - (old_end - start) as i64;
        self.username_end = (start + encoded.len()) as u32;
        self.shift_from(old_end, delta);
        Ok(())
    }

    pub fn set_password(&mut self, password: Option<&str>) -> Result<(), CredentialsError> {
        if matches!(self.host, HostInternal::None) {
            return Err(CredentialsError::CannotHaveCredentialsOrPort);
        }
        let username_end = self.username_end as usize;
        let at = self.host_start as usize - 1; // '@' position, valid since has_authority
        let old_has_password =
            username_end < at && self.serialization.as_bytes()[username_end] == b':';
        let old_range = if old_has_password {
            username_end..at
        } else {
            username_end..username_end
        };
        let replacement = match password {
            None => String::new(),
            Some(p) => {
                let encoded: String = utf8_percent_encode(p, USERINFO).collect();
                alloc::format!(":{}", encoded)
            }
        };
        let delta = replacement.len() as i64 - (old_range.end - old_range.start) as i64;
        self.serialization
            .replace_range(old_range.start..old_range.end, &replacement);
        self.shift_from(old_range.end, delta);
        Ok(())
    }

    /// Replace the hostname. `None` removes the host (requires the URL to
    /// keep a hierarchical path).
    pub fn set_hostname(&mut self, host: Option<&str>) -> Result<(), HostnameError> {
        if self.cannot_be_a_base {
            return Err(HostnameError::CannotSetHostWithOpaquePath);
        }
        let scheme_type = self.scheme_type();
        match host {
            None => {
                if scheme_type.is_special() {
                    return Err(HostnameError::SchemeDoesNotSupportNilOrEmptyHostnames);
                }
                if self.username() != "" || self.password().is_some() || self.port.is_some() {
                    return Err(HostnameError::CannotSetEmptyHostnameWithCredentialsOrPort);
                }
                if self.path().is_empty() {
                    return Err(HostnameError::CannotRemoveHostnameWithoutPath);
                }
                self.remove_authority();
                Ok(())
            }
            Some(text) => {
                let context = match scheme_type {
                    SchemeType::File => HostContext::File,
                    SchemeType::SpecialNotFile => HostContext::Special,
                    SchemeType::NotSpecial => HostContext::NonSpecial,
                };
                if text.is_empty() {
                    if scheme_type.is_special() && scheme_type != SchemeType::File {
                        return Err(HostnameError::SchemeDoesNotSupportNilOrEmptyHostnames);
                    }
                    if self.username() != "" || self.password().is_some() || self.port.is_some() {
                        return Err(HostnameError::CannotSetEmptyHostnameWithCredentialsOrPort);
                    }
                }
                let parsed =
                    host::parse_host(text, context).map_err(HostnameError::InvalidHostname)?;
                self.write_host(&parsed, text);
                Ok(())
            }
        }
    }

    fn remove_authority(&mut self) {
        let scheme_colon = self.scheme_end as usize;
        let old_end = self.path_start as usize;
        self.serialization.replace_range(scheme_colon + 1..old_end, "");
        let delta = -((old_end - scheme_colon - 1) as i64);
        self.username_end = self.scheme_end + 1;
        self.host_start = self.scheme_end + 1;
        self.host_end = self.scheme_end + 1;
        self.host = HostInternal::None;
        self.port = None;
        self.shift_from(old_end, delta);
    }

    fn write_host(&mut self, host: &Host<String>, _raw: &str) {
        let text = host.to_string();
        let old_start = self.host_start as usize;
        let old_end = self.host_end as usize;
        self.serialization.replace_range(old_start..old_end, &text);
        let delta = text.len() as i64 - (old_end - old_start) as i64;
        self.host_end = (old_start + text.len()) as u32;
        self.host = match host {
            Host::Domain(_) => HostInternal::Domain,
            Host::Opaque(_) => HostInternal::Opaque,
            Host::Ipv4(a) => HostInternal::Ipv4(*a),
            Host::Ipv6(a) => HostInternal::Ipv6(*a),
            Host::Empty => HostInternal::Empty,
        };
        self.shift_from(old_end, delta);
    }

    pub fn set_ip_host(&mut self, address: std::net::IpAddr) -> Result<(), HostnameError> {
        let s = address.to_string();
        self.set_hostname(Some(&s))
    }

    /// Replace the port. `None` removes it (falling back to the scheme
    /// default, if any).
    pub fn set_port(&mut self, port: Option<u16>) -> Result<(), PortError> {
        if matches!(self.host, HostInternal::None) || self.scheme_type() == SchemeType::File {
            if port.is_some() {
                return Err(PortError::CannotHaveCredentialsOrPort);
            }
        }
        let normalized = match port {
            Some(p) if Some(p) == default_port(self.scheme()) => None,
            other => other,
        };
        let text = match normalized {
            Some(p) => alloc::format!(":{}", p),
            None => String::new(),
        };
        let host_end = self.host_end as usize;
        let old_end = self.path_start as usize;
        self.serialization.replace_range(host_end..old_end, &text);
        let delta = text.len() as i64 - (old_end - host_end) as i64;
        self.port = normalized;
        self.shift_from(old_end, delta);
        Ok(())
    }

    /// Replace the path. Fails only if the current URL has an opaque path.
    pub fn set_path(&mut self, path: &str) -> Result<(), PathError> {
        if self.cannot_be_a_base {
            return Err(PathError::CannotModifyOpaquePath);
        }
        let mut segments = Vec::new();
        let special = self.scheme_type().is_special();
        let in_file = self.scheme_type() == SchemeType::File;
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        parser::push_path_segments(&mut segments, trimmed, special, in_file);
        self.write_path(&segments);
        Ok(())
    }

    fn write_path(&mut self, segments: &[String]) {
        let mut new_path = String::new();
        for (i, seg) in segments.iter().enumerate() {
            if i > 0 || !self.has_authority() {
                new_path.push('/');
            } else {
                new_path.push('/');
            }
            new_path.push_str(seg);
        }
        if new_path.is_empty() {
            new_path.push('/');
        }
        let needs_sigil = !self.has_authority() && new_path.starts_with("//");
        let sigil_start = self.path_start as usize - if self.has_path_sigil { 2 } else { 0 };
        let old_end = self
            .query_start
            .or(self.fragment_start)
            .unwrap_or(self.serialization.len() as u32) as usize;
        let mut replacement = String::new();
        if needs_sigil {
            replacement.push_str("/.");
        }
        replacement.push_str(&new_path);
        self.serialization
            .replace_range(sigil_start..old_end, &replacement);
        let delta = replacement.len() as i64 - (old_end - sigil_start) as i64;
        self.has_path_sigil = needs_sigil;
        self.path_start = (sigil_start + if needs_sigil { 2 } else { 0 }) as u32;
        self.shift_from(old_end, delta);
    }

    /// Replace the query. `None` removes it entirely (no `?`).
    pub fn set_query(&mut self, query: Option<&str>) {
        let set = self.scheme_type().is_special();
        let encode_set = if set { SPECIAL_QUERY } else { QUERY };
        let old_start = self
            .query_start
            .map(|q| q as usize)
            .unwrap_or(self.fragment_start.unwrap_or(self.serialization.len() as u32) as usize);
        let old_end = self.fragment_start.unwrap_or(self.serialization.len() as u32) as usize;
        let (replacement, new_query_start, form_encoded) = match query {
            None => (String::new(), None, true),
            Some(q) => {
                let encoded: String = utf8_percent_encode(q, encode_set).collect();
                let mut r = String::from("?");
                r.push_str(&encoded);
                (r, Some(old_start as u32), q.is_empty())
            }
        };
        self.serialization
            .replace_range(old_start..old_end, &replacement);
        let delta = replacement.len() as i64 - (old_end - old_start) as i64;
        self.query_start = new_query_start;
        self.query_is_form_encoded = form_encoded;
        self.shift_from(old_end, delta);
    }

    /// Replace the fragment. `None` removes it entirely (no `#`).
    pub fn set_fragment(&mut self, fragment: Option<&str>) {
        let old_start = self
            .fragment_start
            .map(|f| f as usize)
            .unwrap_or(self.serialization.len());
        let old_end = self.serialization.len();
        let (replacement, new_start) = match fragment {
            None => (String::new(), None),
            Some(f) => {
                let encoded: String = utf8_percent_encode(f, FRAGMENT).collect();
                let mut r = String::from("#");
                r.push_str(&encoded);
                (r, Some(old_start as u32))
            }
        };
        self.serialization
            .replace_range(old_start..old_end, &replacement);
        self.fragment_start = new_start;
    }

    /// Shift every stored offset that lies at or after `old_pos` by
    /// `delta` bytes, to account for a splice that grew or shrank the
    /// buffer at that point.
    fn shift_from(&mut self, old_pos: usize, delta: i64) {
        let apply = |v: u32| -> u32 { ((v as i64) + delta) as u32 };
        if self.username_end as usize >= old_pos {
            self.username_end = apply(self.username_end);
        }
        if self.host_start as usize >= old_pos {
            self.host_start = apply(self.host_start);
        }
        if self.host_end as usize >= old_pos {
            self.host_end = apply(self.host_end);
        }
        if self.path_start as usize >= old_pos {
            self.path_start = apply(self.path_start);
        }
        if let Some(q) = self.query_start {
            if q as usize >= old_pos {
                self.query_start = Some(apply(q));
            }
        }
        if let Some(f) = self.fragment_start {
            if f as usize >= old_pos {
                self.fragment_start = Some(apply(f));
            }
        }
    }

    /// Run `f` with exclusive, scoped access to a [`PathComponents`] view.
    pub fn with_mutable_path_components<R>(
        &mut self,
        f: impl FnOnce(&mut PathComponents<'_>) -> R,
    ) -> Result<R, PathError> {
        if self.cannot_be_a_base {
            return Err(PathError::CannotModifyOpaquePath);
        }
        let mut view = PathComponents::new(self);
        Ok(f(&mut view))
    }

    /// Run `f` with exclusive, scoped access to a [`KeyValuePairs`] view
    /// over the query string, under `schema`.
    pub fn with_mutable_query_pairs<S: KeyValueSchema, R>(
        &mut self,
        schema: S,
        f: impl FnOnce(&mut KeyValuePairs<'_, S>) -> R,
    ) -> R {
        let mut view = KeyValuePairs::over_query(self, schema);
        f(&mut view)
    }

    /// Run `f` with exclusive, scoped access to a [`KeyValuePairs`] view
    /// over the fragment, under `schema`.
    pub fn with_mutable_fragment_pairs<S: KeyValueSchema, R>(
        &mut self,
        schema: S,
        f: impl FnOnce(&mut KeyValuePairs<'_, S>) -> R,
    ) -> R {
        let mut view = KeyValuePairs::over_fragment(self, schema);
        f(&mut view)
    }

    // --- crate-internal accessors used by parser/path_segments/kv ---

    pub(crate) fn path_range(&self) -> core::ops::Range<usize> {
        let end = self
            .query_start
            .or(self.fragment_start)
            .unwrap_or(self.serialization.len() as u32) as usize;
        self.path_start as usize..end
    }

    pub(crate) fn query_range(&self) -> Option<core::ops::Range<usize>> {
        let start = self.query_start? as usize + 1;
        let end = self.fragment_start.unwrap_or(self.serialization.len() as u32) as usize;
        Some(start..end)
    }

    pub(crate) fn fragment_range(&self) -> Option<core::ops::Range<usize>> {
        let start = self.fragment_start? as usize + 1;
        Some(start..self.serialization.len())
    }

    pub(crate) fn mutate_query_bytes(&mut self, text: &str, form_encoded: bool) {
        let old_start = self
            .query_start
            .map(|q| q as usize + 1)
            .unwrap_or_else(|| self.fragment_start.unwrap_or(self.serialization.len() as u32) as usize);
        let old_end = self.fragment_start.unwrap_or(self.serialization.len() as u32) as usize;
        let had_query = self.query_start.is_some();
        let marker_start = if had_query { old_start - 1 } else { old_start };
        let mut replacement = String::new();
        let becomes_absent = text.is_empty() && !form_encoded;
        if !becomes_absent {
            replacement.push('?');
            replacement.push_str(text);
        }
        self.serialization
            .replace_range(marker_start..old_end, &replacement);
        let delta = replacement.len() as i64 - (old_end - marker_start) as i64;
        self.query_start = if becomes_absent {
            None
        } else {
            Some(marker_start as u32)
        };
        self.query_is_form_encoded = form_encoded;
        self.shift_from(old_end, delta);
    }

    pub(crate) fn mutate_fragment_bytes(&mut self, text: &str, keep_even_if_empty: bool) {
        let old_start = self
            .fragment_start
            .map(|f| f as usize)
            .unwrap_or(self.serialization.len());
        let old_end = self.serialization.len();
        let mut replacement = String::new();
        let becomes_absent = text.is_empty() && !keep_even_if_empty;
        if !becomes_absent {
            replacement.push('#');
            replacement.push_str(text);
        }
        self.serialization
            .replace_range(old_start..old_end, &replacement);
        self.fragment_start = if becomes_absent {
            None
        } else {
            Some(old_start as u32)
        };
    }

    pub(crate) fn replace_path_bytes(&mut self, segments: &[String]) {
        self.write_path(segments);
    }

    pub(crate) fn scheme_is_special(&self) -> bool {
        self.scheme_type().is_special()
    }

    pub(crate) fn scheme_is_file(&self) -> bool {
        self.scheme_type() == SchemeType::File
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialization)
    }
}

impl fmt::Debug for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Url").field("serialization", &self.serialization).finish()
    }
}

impl PartialEq for Url {
    fn eq(&self, other: &Self) -> bool {
        self.serialization == other.serialization
    }
}

impl Eq for Url {}

impl core::hash::Hash for Url {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.serialization.hash(state)
    }
}

impl str::FromStr for Url {
    type Err = ParseError;
    fn from_str(input: &str) -> Result<Url, ParseError> {
        Url::parse(input)
    }
}

impl AsRef<str> for Url {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Url {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Url {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Error from [`Url::set_scheme`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SetSchemeError {
    InvalidScheme,
    ChangeOfSchemeSpecialness,
    NewSchemeCannotHaveCredentialsOrPort,
    NewSchemeCannotHaveEmptyHostname,
}

impl fmt::Display for SetSchemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetSchemeError::InvalidScheme => "invalid scheme",
            SetSchemeError::ChangeOfSchemeSpecialness => {
                "cannot change between special and non-special scheme"
            }
            SetSchemeError::NewSchemeCannotHaveCredentialsOrPort => {
                "new scheme cannot have credentials or port"
            }
            SetSchemeError::NewSchemeCannotHaveEmptyHostname => {
                "new scheme cannot have an empty hostname"
            }
        })
    }
}

impl std::error::Error for SetSchemeError {}

/// Error from [`Url::set_username`] / [`Url::set_password`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum CredentialsError {
    CannotHaveCredentialsOrPort,
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cannot have credentials or a port without a host")
    }
}

impl std::error::Error for CredentialsError {}

/// Error from [`Url::set_hostname`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum HostnameError {
    InvalidHostname(HostParseError),
    CannotSetHostWithOpaquePath,
    SchemeDoesNotSupportNilOrEmptyHostnames,
    CannotSetEmptyHostnameWithCredentialsOrPort,
    CannotRemoveHostnameWithoutPath,
}

impl fmt::Display for HostnameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostnameError::InvalidHostname(e) => write!(f, "invalid hostname: {}", e),
            HostnameError::CannotSetHostWithOpaquePath => {
                f.write_str("cannot set a host on a URL with an opaque path")
            }
            HostnameError::SchemeDoesNotSupportNilOrEmptyHostnames => {
                f.write_str("this scheme requires a non-empty hostname")
            }
            HostnameError::CannotSetEmptyHostnameWithCredentialsOrPort => {
                f.write_str("cannot set an empty hostname while credentials or a port are set")
            }
            HostnameError::CannotRemoveHostnameWithoutPath => {
                f.write_str("cannot remove the hostname without a path to keep the URL valid")
            }
        }
    }
}

impl std::error::Error for HostnameError {}

/// Error from [`Url::set_port`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PortError {
    PortValueOutOfBounds,
    CannotHaveCredentialsOrPort,
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PortError::PortValueOutOfBounds => "port value out of bounds",
            PortError::CannotHaveCredentialsOrPort => "cannot have credentials or a port without a host",
        })
    }
}

impl std::error::Error for PortError {}

/// Error from [`Url::set_path`] and the path-components view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PathError {
    CannotModifyOpaquePath,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cannot modify the path of a URL with an opaque path")
    }
}

impl std::error::Error for PathError {}

pub(crate) struct UrlInternalBuild {
    pub serialization: String,
    pub scheme_end: u32,
    pub username_end: u32,
    pub host_start: u32,
    pub host_end: u32,
    pub host: HostInternal,
    pub port: Option<u16>,
    pub path_start: u32,
    pub query_start: Option<u32>,
    pub fragment_start: Option<u32>,
    pub cannot_be_a_base: bool,
    pub has_path_sigil: bool,
    pub query_is_form_encoded: bool,
}

impl UrlInternalBuild {
    pub(crate) fn finish(self) -> Url {
        Url {
            serialization: self.serialization,
            scheme_end: self.scheme_end,
            username_end: self.username_end,
            host_start: self.host_start,
            host_end: self.host_end,
            host: self.host,
            port: self.port,
            path_start: self.path_start,
            query_start: self.query_start,
            fragment_start: self.fragment_start,
            cannot_be_a_base: self.cannot_be_a_base,
            has_path_sigil: self.has_path_sigil,
            query_is_form_encoded: self.query_is_form_encoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_http_url() {
        let url = Url::parse("https://example.com/a/b?x=1#frag").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/a/b");
        assert_eq!(url.query(), Some("x=1"));
        assert_eq!(url.fragment(), Some("frag"));
    }

    #[test]
    fn set_path_updates_serialization() {
        let mut url = Url::parse("https://example.com/a/b?x=1").unwrap();
        url.set_path("/c/d");
        assert_eq!(url.as_str(), "https://example.com/c/d?x=1");
    }

    #[test]
    fn set_scheme_rejects_specialness_change() {
        let mut url = Url::parse("http://example.com/").unwrap();
        assert_eq!(
            url.set_scheme("mailto"),
            Err(SetSchemeError::ChangeOfSchemeSpecialness)
        );
    }

    #[test]
    fn set_fragment_none_removes_it() {
        let mut url = Url::parse("http://example.com/#frag").unwrap();
        url.set_fragment(None);
        assert_eq!(url.as_str(), "http://example.com/");
    }
}
