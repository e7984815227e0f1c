// Copyright 2013-2024 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The state-machine parser (C5): absolute and relative parsing against an
//! optional base URL, across all three scheme classes (`file`, other
//! special schemes, non-special schemes). Each WHATWG "state" is a small
//! function rather than one big dispatch loop, the way the teacher's
//! original `parser.rs` was shaped (`parse_userinfo`, `parse_hostname`,
//! `parse_file_host`, `parse_path`, ...), just ported to modern idiomatic
//! Rust and built around an intermediate `Parts` value instead of writing
//! straight into the final buffer segment-by-segment.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use percent_encoding::utf8_percent_encode;

use crate::encode_sets::{PATH, QUERY, SPECIAL_QUERY, USERINFO};
use crate::host::{self, Host, HostContext};
use crate::{default_port, HostInternal, ParseError, SchemeType, SyntaxViolation, Url, UrlInternalBuild};

type Violations<'a> = Option<&'a dyn Fn(SyntaxViolation)>;

fn report(vfn: Violations<'_>, v: SyntaxViolation) {
    if let Some(f) = vfn {
        f(v);
    }
}

/// Strip leading/trailing C0-control-or-space, and interior tab/CR/LF.
fn clean(input: &str, vfn: Violations<'_>) -> String {
    let trimmed = input.trim_matches(|c: char| c as u32 <= 0x20);
    if trimmed.len() != input.len() {
        report(vfn, SyntaxViolation::C0SpaceIgnored);
    }
    if trimmed.contains(['\t', '\n', '\r']) {
        report(vfn, SyntaxViolation::TabOrNewlineIgnored);
        trimmed.chars().filter(|c| !matches!(c, '\t' | '\n' | '\r')).collect()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn parse_scheme_only(input: &str) -> Option<(String, &str)> {
    parse_scheme(input).map(|(s, rest)| (s.to_ascii_lowercase(), rest))
}

fn parse_scheme(input: &str) -> Option<(&str, &str)> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() => {}
        _ => return None,
    }
    for (i, c) in chars {
        if c == ':' {
            return Some((&input[..i], &input[i + 1..]));
        }
        if !(c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') {
            return None;
        }
    }
    None
}

pub(crate) fn parse(
    input: &str,
    base: Option<&Url>,
    vfn: Violations<'_>,
) -> Result<Url, ParseError> {
    let input = clean(input, vfn);
    if let Some((scheme, rest)) = parse_scheme(&input) {
        let scheme_lower = scheme.to_ascii_lowercase();
        parse_with_scheme(&scheme_lower, rest, base, vfn)
    } else {
        parse_relative(&input, base, vfn)
    }
}

fn parse_with_scheme(
    scheme: &str,
    rest: &str,
    base: Option<&Url>,
    vfn: Violations<'_>,
) -> Result<Url, ParseError> {
    match SchemeType::for_scheme(scheme) {
        SchemeType::File => parse_file(scheme, rest, base, vfn),
        SchemeType::SpecialNotFile => parse_special(scheme, rest, vfn),
        SchemeType::NotSpecial => parse_non_special_absolute(scheme, rest, vfn),
    }
}

/// Everything needed to assemble a final [`Url`], before it is serialized.
struct Parts {
    scheme: String,
    username: String,
    password: Option<String>,
    host: Host<String>,
    has_authority: bool,
    port: Option<u16>,
    cannot_be_a_base: bool,
    path: PathBody,
    query: Option<String>,
    fragment: Option<String>,
}

enum PathBody {
    Opaque(String),
    Segments(Vec<String>),
}

fn split_query_fragment(s: &str) -> (&str, Option<&str>, Option<&str>) {
    if let Some(hash) = s.find('#') {
        let before_hash = &s[..hash];
        let fragment = Some(&s[hash + 1..]);
        if let Some(q) = before_hash.find('?') {
            (&before_hash[..q], Some(&before_hash[q + 1..]), fragment)
        } else {
            (before_hash, None, fragment)
        }
    } else if let Some(q) = s.find('?') {
        (&s[..q], Some(&s[q + 1..]), None)
    } else {
        (s, None, None)
    }
}

fn split_authority(s: &str, special: bool) -> (&str, &str) {
    let end = s
        .find(|c| c == '/' || c == '?' || c == '#' || (special && c == '\\'))
        .unwrap_or(s.len());
    (&s[..end], &s[end..])
}

fn split_host_port(s: &str) -> Result<(&str, Option<&str>), ParseError> {
    if let Some(inner_and_rest) = s.strip_prefix('[') {
        let close = inner_and_rest.find(']').ok_or(ParseError::InvalidHost(
            crate::HostParseError::UnclosedIpv6Address,
        ))?;
        let host = &s[..close + 2];
        let rest = &inner_and_rest[close + 1..];
        if let Some(port) = rest.strip_prefix(':') {
            Ok((host, Some(port)))
        } else {
            Ok((host, None))
        }
    } else if let Some(colon) = s.find(':') {
        Ok((&s[..colon], Some(&s[colon + 1..])))
    } else {
        Ok((s, None))
    }
}

fn parse_port(port_str: &str, scheme: &str, vfn: Violations<'_>) -> Result<Option<u16>, ParseError> {
    if port_str.is_empty() {
        report(vfn, SyntaxViolation::ExpectedPortDigit);
        return Ok(None);
    }
    if !port_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidPort);
    }
    let value: u32 = port_str.parse().map_err(|_| ParseError::InvalidPort)?;
    if value > u16::MAX as u32 {
        return Err(ParseError::InvalidPort);
    }
    let value = value as u16;
    Ok(if Some(value) == default_port(scheme) {
        None
    } else {
        Some(value)
    })
}

struct Authority {
    username: String,
    password: Option<String>,
    host: Host<String>,
    port: Option<u16>,
}

fn parse_authority_str(
    s: &str,
    scheme: &str,
    context: HostContext,
    vfn: Violations<'_>,
) -> Result<Authority, ParseError> {
    let (userinfo, host_port) = match s.rfind('@') {
        Some(at) => {
            if s[..at].contains('@') {
                report(vfn, SyntaxViolation::UnencodedAtSign);
            }
            (&s[..at], &s[at + 1..])
        }
        None => ("", s),
    };
    let (username, password) = match userinfo.find(':') {
        Some(colon) => (
            &userinfo[..colon],
            Some(&userinfo[colon + 1..]),
        ),
        None => (userinfo, None),
    };
    let (host_str, port_str) = split_host_port(host_port)?;
    let host = if host_str.is_empty() {
        if context == HostContext::Special {
            return Err(ParseError::EmptyHost);
        }
        Host::Empty
    } else {
        host::parse_host(host_str, context)?
    };
    let port = match port_str {
        Some(p) => parse_port(p, scheme, vfn)?,
        None => None,
    };
    if context == HostContext::File && port.is_some() {
        return Err(ParseError::InvalidPort);
    }
    Ok(Authority {
        username: utf8_percent_encode(username, USERINFO).collect(),
        password: password.map(|p| utf8_percent_encode(p, USERINFO).collect()),
        host,
        port,
    })
}

// ---- C3: path segment processing ------------------------------------------

pub(crate) fn is_drive_letter(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 2 && b[0].is_ascii_alphabetic() && (b[1] == b':' || b[1] == b'|')
}

fn starts_with_windows_drive_letter(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2
        && b[0].is_ascii_alphabetic()
        && (b[1] == b':' || b[1] == b'|')
        && (b.len() == 2 || matches!(b[2], b'/' | b'\\' | b'?' | b'#'))
}

fn normalize_drive_letter(s: &str) -> String {
    let mut out = String::with_capacity(2);
    out.push_str(&s[..1]);
    out.push(':');
    out
}

fn shorten_path(path: &mut Vec<String>, in_file_scheme: bool) {
    if in_file_scheme && path.len() == 1 && is_drive_letter(&path[0]) {
        return;
    }
    path.pop();
}

/// Append the segments of `input` (already past any authority and the
/// single leading path-start separator) onto `path`, applying dot-segment
/// resolution and (for `file` URLs) the Windows drive-letter quirk.
pub(crate) fn push_path_segments(
    path: &mut Vec<String>,
    input: &str,
    is_special: bool,
    in_file_scheme: bool,
) {
    let mut rest = input;
    loop {
        let sep_pos = rest.find(|c| c == '/' || (is_special && c == '\\'));
        let (segment, remainder, ends_with_slash) = match sep_pos {
            Some(pos) => (&rest[..pos], &rest[pos + 1..], true),
            None => (rest, "", false),
        };
        let lower = segment.to_ascii_lowercase();
        if lower == "." || lower == "%2e" {
            if !ends_with_slash {
                path.push(String::new());
            }
        } else if lower == ".." || lower == "%2e." || lower == ".%2e" || lower == "%2e%2e" {
            shorten_path(path, in_file_scheme);
            if !ends_with_slash {
                path.push(String::new());
            }
        } else {
            let normalized = if in_file_scheme && path.is_empty() && is_drive_letter(segment) {
                normalize_drive_letter(segment)
            } else {
                segment.to_string()
            };
            let encoded: String = utf8_percent_encode(&normalized, PATH).collect();
            path.push(encoded);
        }
        if !ends_with_slash {
            break;
        }
        rest = remainder;
    }
}

fn path_to_string(segments: &[String]) -> String {
    let mut s = String::new();
    for seg in segments {
        s.push('/');
        s.push_str(seg);
    }
    if s.is_empty() {
        s.push('/');
    }
    s
}

// ---- special (non-file) and non-special schemes ----------------------------

fn parse_special(scheme: &str, rest: &str, vfn: Violations<'_>) -> Result<Url, ParseError> {
    let after_slashes = rest.trim_start_matches(|c| c == '/' || c == '\\');
    if after_slashes.len() != rest.len() && rest.starts_with('\\') {
        report(vfn, SyntaxViolation::BackslashAsDelimiter);
    }
    let (authority_str, remainder) = split_authority(after_slashes, true);
    let authority = parse_authority_str(authority_str, scheme, HostContext::Special, vfn)?;
    let (path_str, query, fragment) = split_query_fragment(remainder);
    let mut path = Vec::new();
    let path_tail = path_str
        .strip_prefix('/')
        .or_else(|| path_str.strip_prefix('\\'))
        .unwrap_or(path_str);
    push_path_segments(&mut path, path_tail, true, false);
    finish(Parts {
        scheme: scheme.to_string(),
        username: authority.username,
        password: authority.password,
        host: authority.host,
        has_authority: true,
        port: authority.port,
        cannot_be_a_base: false,
        path: PathBody::Segments(path),
        query: query.map(str::to_string),
        fragment: fragment.map(str::to_string),
    })
}

fn parse_non_special_absolute(
    scheme: &str,
    rest: &str,
    vfn: Violations<'_>,
) -> Result<Url, ParseError> {
    if let Some(after) = rest.strip_prefix("//") {
        let (authority_str, remainder) = split_authority(after, false);
        let authority = parse_authority_str(authority_str, scheme, HostContext::NonSpecial, vfn)?;
        let (path_str, query, fragment) = split_query_fragment(remainder);
        let mut path = Vec::new();
        let path_tail = path_str.strip_prefix('/').unwrap_or(path_str);
        push_path_segments(&mut path, path_tail, false, false);
        finish(Parts {
            scheme: scheme.to_string(),
            username: authority.username,
            password: authority.password,
            host: authority.host,
            has_authority: true,
            port: authority.port,
            cannot_be_a_base: false,
            path: PathBody::Segments(path),
            query: query.map(str::to_string),
            fragment: fragment.map(str::to_string),
        })
    } else if let Some(after) = rest.strip_prefix('/') {
        let (path_str, query, fragment) = split_query_fragment(after);
        let mut path = Vec::new();
        push_path_segments(&mut path, path_str, false, false);
        finish(Parts {
            scheme: scheme.to_string(),
            username: String::new(),
            password: None,
            host: Host::Empty,
            has_authority: false,
            port: None,
            cannot_be_a_base: false,
            path: PathBody::Segments(path),
            query: query.map(str::to_string),
            fragment: fragment.map(str::to_string),
        })
    } else {
        let (path_str, query, fragment) = split_query_fragment(rest);
        let encoded: String = utf8_percent_encode(path_str, QUERY).collect();
        finish(Parts {
            scheme: scheme.to_string(),
            username: String::new(),
            password: None,
            host: Host::Empty,
            has_authority: false,
            port: None,
            cannot_be_a_base: true,
            path: PathBody::Opaque(encoded),
            query: query.map(str::to_string),
            fragment: fragment.map(str::to_string),
        })
    }
}

// ---- file scheme ------------------------------------------------------------

fn parse_file(
    _scheme: &str,
    rest: &str,
    base: Option<&Url>,
    vfn: Violations<'_>,
) -> Result<Url, ParseError> {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c == '/' || c == '\\' => {
            let rest1 = &rest[1..];
            match rest1.chars().next() {
                Some(c2) if c2 == '/' || c2 == '\\' => {
                    let after_two = &rest1[1..];
                    parse_file_two_slashes(after_two, vfn)
                }
                _ => parse_file_one_slash(rest1, base, vfn),
            }
        }
        _ => parse_file_no_slash(rest, base, vfn),
    }
}

fn parse_file_two_slashes(after_two: &str, vfn: Violations<'_>) -> Result<Url, ParseError> {
    let end = after_two
        .find(|c| c == '/' || c == '\\' || c == '?' || c == '#')
        .unwrap_or(after_two.len());
    let host_candidate = &after_two[..end];
    if is_drive_letter(host_candidate) {
        let (path_str, query, fragment) = split_query_fragment(after_two);
        let mut path = Vec::new();
        push_path_segments(&mut path, path_str, true, true);
        return finish(Parts {
            scheme: "file".to_string(),
            username: String::new(),
            password: None,
            host: Host::Empty,
            has_authority: true,
            port: None,
            cannot_be_a_base: false,
            path: PathBody::Segments(path),
            query: query.map(str::to_string),
            fragment: fragment.map(str::to_string),
        });
    }
    let tail = &after_two[end..];
    let host = if host_candidate.is_empty() {
        Host::Empty
    } else {
        host::parse_host(host_candidate, HostContext::File)?
    };
    let (path_str, query, fragment) = split_query_fragment(tail);
    let mut path = Vec::new();
    let path_tail = path_str
        .strip_prefix('/')
        .or_else(|| path_str.strip_prefix('\\'))
        .unwrap_or(path_str);
    push_path_segments(&mut path, path_tail, true, true);
    finish(Parts {
        scheme: "file".to_string(),
        username: String::new(),
        password: None,
        host,
        has_authority: true,
        port: None,
        cannot_be_a_base: false,
        path: PathBody::Segments(path),
        query: query.map(str::to_string),
        fragment: fragment.map(str::to_string),
    })
}

fn parse_file_one_slash(
    rest1: &str,
    base: Option<&Url>,
    _vfn: Violations<'_>,
) -> Result<Url, ParseError> {
    let (path_str, query, fragment) = split_query_fragment(rest1);
    let starts_with_drive = starts_with_windows_drive_letter(path_str);
    let mut seed: Vec<String> = Vec::new();
    let host = if let Some(base) = base {
        if base.scheme() == "file" {
            if !starts_with_drive {
                if let Some(first) = base.path_segments().and_then(|mut it| it.next()) {
                    if is_drive_letter(first) {
                        seed.push(first.to_string());
                    }
                }
            }
            base.host().map(|h| h.to_owned()).unwrap_or(Host::Empty)
        } else {
            Host::Empty
        }
    } else {
        Host::Empty
    };
    push_path_segments(&mut seed, path_str, true, true);
    finish(Parts {
        scheme: "file".to_string(),
        username: String::new(),
        password: None,
        host,
        has_authority: true,
        port: None,
        cannot_be_a_base: false,
        path: PathBody::Segments(seed),
        query: query.map(str::to_string),
        fragment: fragment.map(str::to_string),
    })
}

fn parse_file_no_slash(
    rest: &str,
    base: Option<&Url>,
    _vfn: Violations<'_>,
) -> Result<Url, ParseError> {
    let (path_str, query, fragment) = split_query_fragment(rest);
    if let Some(base) = base {
        if base.scheme() == "file" {
            let host = base.host().map(|h| h.to_owned()).unwrap_or(Host::Empty);
            let mut path: Vec<String> = if starts_with_windows_drive_letter(path_str) {
                Vec::new()
            } else {
                let mut inherited: Vec<String> = base
                    .path_segments()
                    .map(|it| it.map(str::to_string).collect())
                    .unwrap_or_default();
                shorten_path(&mut inherited, true);
                inherited
            };
            push_path_segments(&mut path, path_str, true, true);
            return finish(Parts {
                scheme: "file".to_string(),
                username: String::new(),
                password: None,
                host,
                has_authority: true,
                port: None,
                cannot_be_a_base: false,
                path: PathBody::Segments(path),
                query: query.map(str::to_string),
                fragment: fragment.map(str::to_string),
            });
        }
    }
    let mut path = Vec::new();
    push_path_segments(&mut path, path_str, true, true);
    finish(Parts {
        scheme: "file".to_string(),
        username: String::new(),
        password: None,
        host: Host::Empty,
        has_authority: true,
        port: None,
        cannot_be_a_base: false,
        path: PathBody::Segments(path),
        query: query.map(str::to_string),
        fragment: fragment.map(str::to_string),
    })
}

// ---- relative resolution against a base URL ---------------------------------

fn parse_relative(input: &str, base: Option<&Url>, vfn: Violations<'_>) -> Result<Url, ParseError> {
    let base = base.ok_or(ParseError::RelativeUrlWithoutBase)?;
    if base.cannot_be_a_base() && !input.is_empty() && !input.starts_with('#') {
        return Err(ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    if base.scheme_is_file() {
        return parse_file_no_slash(input, Some(base), vfn).or_else(|e| {
            if input.is_empty() {
                Ok(base.clone())
            } else {
                Err(e)
            }
        });
    }
    if input.is_empty() {
        return Ok(base.clone());
    }
    let special = base.scheme_is_special();
    let mut chars = input.chars();
    match chars.next().unwrap() {
        '#' => {
            let mut url = base.clone();
            url.set_fragment(Some(&input[1..]));
            Ok(url)
        }
        '?' => {
            let (q, frag) = match input[1..].find('#') {
                Some(h) => (&input[1..1 + h], Some(&input[2 + h..])),
                None => (&input[1..], None),
            };
            let mut url = base.clone();
            url.set_query(Some(q));
            url.set_fragment(frag);
            Ok(url)
        }
        '/' | '\\' if special => {
            let rest = &input[1..];
            if rest.starts_with('/') || rest.starts_with('\\') {
                let after_two = rest[1..].trim_start_matches(|c| c == '/' || c == '\\');
                let (authority_str, remainder) = split_authority(after_two, true);
                let authority =
                    parse_authority_str(authority_str, base.scheme(), HostContext::Special, vfn)?;
                let (path_str, query, fragment) = split_query_fragment(remainder);
                let mut path = Vec::new();
                let path_tail = path_str
                    .strip_prefix('/')
                    .or_else(|| path_str.strip_prefix('\\'))
                    .unwrap_or(path_str);
                push_path_segments(&mut path, path_tail, true, false);
                finish(Parts {
                    scheme: base.scheme().to_string(),
                    username: authority.username,
                    password: authority.password,
                    host: authority.host,
                    has_authority: true,
                    port: authority.port,
                    cannot_be_a_base: false,
                    path: PathBody::Segments(path),
                    query: query.map(str::to_string),
                    fragment: fragment.map(str::to_string),
                })
            } else {
                let (path_str, query, fragment) = split_query_fragment(rest);
                let mut path = Vec::new();
                push_path_segments(&mut path, path_str, true, false);
                finish(Parts {
                    scheme: base.scheme().to_string(),
                    username: base.username().to_string(),
                    password: base.password().map(str::to_string),
                    host: base.host().map(|h| h.to_owned()).unwrap_or(Host::Empty),
                    has_authority: base.has_authority(),
                    port: base.port(),
                    cannot_be_a_base: false,
                    path: PathBody::Segments(path),
                    query: query.map(str::to_string),
                    fragment: fragment.map(str::to_string),
                })
            }
        }
        '/' => {
            let (path_str, query, fragment) = split_query_fragment(&input[1..]);
            let mut path = Vec::new();
            push_path_segments(&mut path, path_str, false, false);
            finish(Parts {
                scheme: base.scheme().to_string(),
                username: base.username().to_string(),
                password: base.password().map(str::to_string),
                host: base.host().map(|h| h.to_owned()).unwrap_or(Host::Empty),
                has_authority: base.has_authority(),
                port: base.port(),
                cannot_be_a_base: false,
                path: PathBody::Segments(path),
                query: query.map(str::to_string),
                fragment: fragment.map(str::to_string),
            })
        }
        _ => {
            let (path_str, query, fragment) = split_query_fragment(input);
            let mut path: Vec<String> = base
                .path_segments()
                .map(|it| it.map(str::to_string).collect())
                .unwrap_or_default();
            shorten_path(&mut path, false);
            push_path_segments(&mut path, path_str, special, false);
            finish(Parts {
                scheme: base.scheme().to_string(),
                username: base.username().to_string(),
                password: base.password().map(str::to_string),
                host: base.host().map(|h| h.to_owned()).unwrap_or(Host::Empty),
                has_authority: base.has_authority(),
                port: base.port(),
                cannot_be_a_base: false,
                path: PathBody::Segments(path),
                query: query.map(str::to_string),
                fragment: fragment.map(str::to_string),
            })
        }
    }
}

// ---- assembling the final buffer -------------------------------------------

fn finish(parts: Parts) -> Result<Url, ParseError> {
    let mut out = String::new();
    out.push_str(&parts.scheme);
    let scheme_end = out.len() as u32;
    out.push(':');

    let mut username_end;
    let host_start;
    let host_end;
    let host_internal;

    if parts.has_authority {
        out.push_str("//");
        if !parts.username.is_empty() || parts.password.is_some() {
            out.push_str(&parts.username);
            if let Some(password) = &parts.password {
                out.push(':');
                out.push_str(password);
            }
            username_end = out.len() as u32;
            out.push('@');
        } else {
            username_end = out.len() as u32;
        }
        host_start = out.len() as u32;
        out.push_str(&parts.host.to_string());
        host_end = out.len() as u32;
        host_internal = match &parts.host {
            Host::Domain(_) => HostInternal::Domain,
            Host::Opaque(_) => HostInternal::Opaque,
            Host::Ipv4(a) => HostInternal::Ipv4(*a),
            Host::Ipv6(a) => HostInternal::Ipv6(*a),
            Host::Empty => HostInternal::Empty,
        };
        if let Some(port) = parts.port {
            out.push(':');
            out.push_str(&port.to_string());
        }
    } else {
        username_end = scheme_end + 1;
        host_start = scheme_end + 1;
        host_end = scheme_end + 1;
        host_internal = HostInternal::None;
    }

    let mut has_path_sigil = false;
    match &parts.path {
        PathBody::Opaque(text) => {
            out.push_str(text);
        }
        PathBody::Segments(segments) => {
            let rendered = path_to_string(segments);
            if !parts.has_authority && rendered.starts_with("//") {
                has_path_sigil = true;
                out.push_str("/.");
            }
            out.push_str(&rendered);
        }
    }
    // path_start points after any sigil, at the start of the logical path.
    let path_start = {
        let total_path_len = match &parts.path {
            PathBody::Opaque(text) => text.len(),
            PathBody::Segments(segments) => path_to_string(segments).len(),
        };
        out.len() as u32 - total_path_len as u32
    };

    let mut query_start = None;
    if let Some(query) = &parts.query {
        query_start = Some(out.len() as u32);
        out.push('?');
        let set = if SchemeType::for_scheme(&parts.scheme).is_special() {
            SPECIAL_QUERY
        } else {
            QUERY
        };
        let encoded: String = utf8_percent_encode(query, set).collect();
        out.push_str(&encoded);
    }

    let mut fragment_start = None;
    if let Some(fragment) = &parts.fragment {
        fragment_start = Some(out.len() as u32);
        out.push('#');
        let encoded: String = utf8_percent_encode(fragment, crate::encode_sets::FRAGMENT).collect();
        out.push_str(&encoded);
    }

    Ok(UrlInternalBuild {
        serialization: out,
        scheme_end,
        username_end,
        host_start,
        host_end,
        host: host_internal,
        port: parts.port,
        path_start,
        query_start,
        fragment_start,
        cannot_be_a_base: parts.cannot_be_a_base,
        has_path_sigil,
        query_is_form_encoded: parts.query.is_none(),
    }
    .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Url;

    #[test]
    fn scenario_file_dot_dot_dot_with_no_base() {
        let url = Url::parse("file:/a/./..").unwrap();
        assert_eq!(url.as_str(), "file:///");
    }

    #[test]
    fn scenario_relative_dot_dot_against_file_base() {
        let base = Url::parse("file:///a/b/c").unwrap();
        let url = base.join("..").unwrap();
        assert_eq!(url.as_str(), "file:///a/");
    }

    #[test]
    fn scenario_file_drive_letter_with_pipe_and_non_file_base() {
        let base = Url::parse("about:blank").unwrap();
        let url = Url::options()
            .base_url(Some(&base))
            .parse("file:C|")
            .unwrap();
        assert_eq!(url.as_str(), "file:///C:");
    }

    #[test]
    fn scenario_file_one_slash_drive_letter_discards_base_drive() {
        let base_a = Url::parse("file:///bar/baz/qux/").unwrap();
        let url_a = Url::options()
            .base_url(Some(&base_a))
            .parse("file:/D|/../foo")
            .unwrap();
        assert_eq!(url_a.as_str(), "file:///D:/foo");

        let base_b = Url::parse("file:///C:/base1/base2/").unwrap();
        let url_b = Url::options()
            .base_url(Some(&base_b))
            .parse("file:/D|/../foo")
            .unwrap();
        assert_eq!(url_b.as_str(), "file:///D:/foo");
    }

    #[test]
    fn scenario_file_one_slash_dot_keeps_base_drive() {
        let base = Url::parse("file:///C:/base1/base2/").unwrap();
        let url = Url::options()
            .base_url(Some(&base))
            .parse("file:/./D|/../foo")
            .unwrap();
        assert_eq!(url.as_str(), "file:///C:/foo");
    }

    #[test]
    fn scenario_path_sigil_is_preserved_on_relative_resolution() {
        let base = Url::parse("web+demo:/.//not-a-host/test").unwrap();
        assert_eq!(base.as_str(), "web+demo:/.//not-a-host/test");
        let url = base.join("hello").unwrap();
        assert_eq!(url.as_str(), "web+demo:/.//not-a-host/hello");
    }

    #[test]
    fn opaque_path_scheme_round_trips() {
        let url = Url::parse("mailto:bob@example.com").unwrap();
        assert!(url.cannot_be_a_base());
        assert_eq!(url.path(), "bob@example.com");
    }

    #[test]
    fn non_special_scheme_with_authority_parses_host() {
        let url = Url::parse("web+demo://host/path").unwrap();
        assert_eq!(url.host_str(), Some("host"));
        assert_eq!(url.path(), "/path");
    }

    #[test]
    fn port_equal_to_default_is_dropped() {
        let url = Url::parse("http://example.com:80/").unwrap();
        assert_eq!(url.port(), None);
        assert_eq!(url.as_str(), "http://example.com/");
    }
}
