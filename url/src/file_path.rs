// Copyright 2013-2024 The rust-url developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! POSIX and Windows filesystem-path conversions to and from `file:` URLs,
//! generalizing the teacher's old `Url::from_file_path`/`to_file_path`
//! (which only covered the running platform's own convention) to both
//! conventions unconditionally, plus UNC and `\\?\` long-path support.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet};

use crate::encode_sets::PATH;
use crate::host::Host;
use crate::parser::is_drive_letter;
use crate::Url;

/// Backslash must be encoded too: `file:` is a special scheme, so an
/// unencoded `\` in a path component would be reparsed as a separator.
const FILE_PATH_SAFE: &AsciiSet = &PATH.add(b'\\');

/// Error converting a POSIX path to or from a `file:` URL.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PosixPathError {
    NullBytes,
    NotAFileUrl,
    NonEmptyHost,
    OpaquePath,
}

impl fmt::Display for PosixPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PosixPathError::NullBytes => "path contains a NUL byte",
            PosixPathError::NotAFileUrl => "URL is not a file: URL",
            PosixPathError::NonEmptyHost => "file: URL has a non-empty host",
            PosixPathError::OpaquePath => "URL has an opaque path",
        })
    }
}

impl std::error::Error for PosixPathError {}

/// Error converting a Windows path to or from a `file:` URL.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum WindowsPathError {
    NullBytes,
    NonAsciiHostname,
    NotAFileUrl,
    OpaquePath,
    NoDriveLetterOrShare,
    ForwardSlashInLongPath,
    UnsupportedHost,
}

impl fmt::Display for WindowsPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindowsPathError::NullBytes => "path contains a NUL byte",
            WindowsPathError::NonAsciiHostname => "UNC hostname is not ASCII",
            WindowsPathError::NotAFileUrl => "URL is not a file: URL",
            WindowsPathError::OpaquePath => "URL has an opaque path",
            WindowsPathError::NoDriveLetterOrShare => "path has neither a drive letter nor a UNC share",
            WindowsPathError::ForwardSlashInLongPath => "forward slash in a \\\\?\\ long path",
            WindowsPathError::UnsupportedHost => "host cannot be represented as a UNC server name",
        })
    }
}

impl std::error::Error for WindowsPathError {}

fn encode_path_byte(b: u8, out: &mut String) {
    if let Some(piece) = percent_encode(&[b], FILE_PATH_SAFE).next() {
        out.push_str(piece);
    }
}

fn decode_string(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

// ---- POSIX ------------------------------------------------------------------

/// Convert a POSIX filesystem path to a `file:` URL. `path` is raw bytes,
/// not necessarily valid UTF-8 — non-UTF-8 byte sequences round-trip
/// through percent-encoding unchanged.
pub fn url_from_posix_path(path: &[u8]) -> Result<Url, PosixPathError> {
    if path.contains(&0) {
        return Err(PosixPathError::NullBytes);
    }
    let mut out = String::from("file://");
    if !path.starts_with(b"/") {
        out.push('/');
    }
    for &b in path {
        if b == b'/' {
            out.push('/');
        } else {
            encode_path_byte(b, &mut out);
        }
    }
    Url::parse(&out).map_err(|_| PosixPathError::NotAFileUrl)
}

/// Recover the original POSIX path from a `file:` URL with an empty host.
pub fn posix_path_from_url(url: &Url) -> Result<Vec<u8>, PosixPathError> {
    if url.scheme() != "file" {
        return Err(PosixPathError::NotAFileUrl);
    }
    if url.cannot_be_a_base() {
        return Err(PosixPathError::OpaquePath);
    }
    match url.host() {
        None | Some(Host::Empty) => {}
        _ => return Err(PosixPathError::NonEmptyHost),
    }
    let mut out = Vec::new();
    for segment in url.path_segments().ok_or(PosixPathError::OpaquePath)? {
        out.push(b'/');
        out.extend(percent_decode_str(segment).collect::<Vec<u8>>());
    }
    if out.is_empty() {
        out.push(b'/');
    }
    Ok(out)
}

// ---- Windows ------------------------------------------------------------------

/// Convert a Windows filesystem path (drive-letter, UNC, or `\\?\` long
/// form) to a `file:` URL.
pub fn url_from_windows_path(path: &str) -> Result<Url, WindowsPathError> {
    if path.contains('\0') {
        return Err(WindowsPathError::NullBytes);
    }
    if let Some(rest) = path.strip_prefix(r"\\?\UNC\").or_else(|| path.strip_prefix(r"\\?\unc\")) {
        if rest.contains('/') {
            return Err(WindowsPathError::ForwardSlashInLongPath);
        }
        return build_unc(&rest.replace('\\', "/"), false);
    }
    if let Some(rest) = path.strip_prefix(r"\\?\") {
        if rest.contains('/') {
            return Err(WindowsPathError::ForwardSlashInLongPath);
        }
        return build_drive(&rest.replace('\\', "/"), false);
    }
    if let Some(rest) = path.strip_prefix(r"\\").or_else(|| path.strip_prefix("//")) {
        return build_unc(&rest.replace('\\', "/"), true);
    }
    build_drive(&path.replace('\\', "/"), true)
}

fn build_drive(rest: &str, trim_trailing_dots: bool) -> Result<Url, WindowsPathError> {
    let mut parts = rest.split('/').filter(|s| !s.is_empty());
    let drive = parts.next().ok_or(WindowsPathError::NoDriveLetterOrShare)?;
    if !is_drive_letter(drive) {
        return Err(WindowsPathError::NoDriveLetterOrShare);
    }
    let mut out = String::from("file:///");
    out.push(drive.chars().next().unwrap().to_ascii_uppercase());
    out.push(':');
    for part in parts {
        let part = if trim_trailing_dots { part.trim_end_matches('.') } else { part };
        out.push('/');
        for b in part.bytes() {
            encode_path_byte(b, &mut out);
        }
    }
    Url::parse(&out).map_err(|_| WindowsPathError::NoDriveLetterOrShare)
}

fn build_unc(rest: &str, trim_trailing_dots: bool) -> Result<Url, WindowsPathError> {
    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let server = segments.next().ok_or(WindowsPathError::NoDriveLetterOrShare)?;
    if !server.is_ascii() {
        return Err(WindowsPathError::NonAsciiHostname);
    }
    let mut out = String::from("file://");
    out.push_str(server);
    for part in segments {
        let part = if trim_trailing_dots { part.trim_end_matches('.') } else { part };
        out.push('/');
        for b in part.bytes() {
            encode_path_byte(b, &mut out);
        }
    }
    Url::parse(&out).map_err(|_| WindowsPathError::NoDriveLetterOrShare)
}

/// Recover a Windows path (drive-letter or UNC form) from a `file:` URL.
pub fn windows_path_from_url(url: &Url) -> Result<String, WindowsPathError> {
    if url.scheme() != "file" {
        return Err(WindowsPathError::NotAFileUrl);
    }
    if url.cannot_be_a_base() {
        return Err(WindowsPathError::OpaquePath);
    }
    let mut segments = url.path_segments().ok_or(WindowsPathError::OpaquePath)?;
    match url.host() {
        None | Some(Host::Empty) => {
            let drive = segments.next().ok_or(WindowsPathError::NoDriveLetterOrShare)?;
            let drive_decoded = decode_string(drive);
            if !is_drive_letter(&drive_decoded) {
                return Err(WindowsPathError::NoDriveLetterOrShare);
            }
            let mut out = drive_decoded;
            for seg in segments {
                out.push('\\');
                out.push_str(&decode_string(seg));
            }
            Ok(out)
        }
        Some(Host::Domain(name)) => {
            if !name.is_ascii() {
                return Err(WindowsPathError::NonAsciiHostname);
            }
            let mut out = format!(r"\\{}", name);
            for seg in segments {
                out.push('\\');
                out.push_str(&decode_string(seg));
            }
            Ok(out)
        }
        _ => Err(WindowsPathError::UnsupportedHost),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_round_trip() {
        let url = url_from_posix_path(b"/home/user/my file.txt").unwrap();
        assert_eq!(url.as_str(), "file:///home/user/my%20file.txt");
        assert_eq!(posix_path_from_url(&url).unwrap(), b"/home/user/my file.txt");
    }

    #[test]
    fn posix_rejects_null_byte() {
        assert_eq!(url_from_posix_path(b"/a\0b"), Err(PosixPathError::NullBytes));
    }

    #[test]
    fn windows_drive_letter_round_trip() {
        let url = url_from_windows_path(r"C:\Users\me\file.txt").unwrap();
        assert_eq!(url.as_str(), "file:///C:/Users/me/file.txt");
        assert_eq!(windows_path_from_url(&url).unwrap(), r"C:\Users\me\file.txt");
    }

    #[test]
    fn windows_unc_round_trip() {
        let url = url_from_windows_path(r"\\server\share\dir\file.txt").unwrap();
        assert_eq!(url.as_str(), "file://server/share/dir/file.txt");
        assert_eq!(
            windows_path_from_url(&url).unwrap(),
            r"\\server\share\dir\file.txt"
        );
    }

    #[test]
    fn windows_long_path_rejects_forward_slash() {
        assert_eq!(
            url_from_windows_path(r"\\?\C:/Users"),
            Err(WindowsPathError::ForwardSlashInLongPath)
        );
    }

    #[test]
    fn windows_long_path_does_not_trim_trailing_dots() {
        let url = url_from_windows_path(r"\\?\C:\dir.\file.").unwrap();
        assert_eq!(url.as_str(), "file:///C:/dir./file.");
    }

    #[test]
    fn windows_regular_path_trims_trailing_dots() {
        let url = url_from_windows_path(r"C:\dir.\file.").unwrap();
        assert_eq!(url.as_str(), "file:///C:/dir/file");
    }
}
