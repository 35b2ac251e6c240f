//! Byte and string helpers shared by the key-system adapters.
//!
//! Legacy key systems exchange strings as UTF-16 little-endian buffers, and
//! the FairPlay content id is derived from a URI carried in the init data.
use byteorder::{ByteOrder, LittleEndian};
use url::Url;

/// Encode a string as UTF-16LE bytes.
#[must_use]
pub fn string_to_utf16le(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// Decode UTF-16LE bytes into a string.
///
/// A trailing odd byte is ignored and unpaired surrogates are replaced, so
/// this never fails on platform-supplied buffers.
#[must_use]
pub fn utf16le_to_string(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(LittleEndian::read_u16)
        .collect::<Vec<u16>>();
    String::from_utf16_lossy(&units)
}

/// Extract the hostname from a URI such as `skd://content-id`.
///
/// Leading garbage (length prefixes decoded as characters, NULs) is skipped
/// by locating the scheme in front of `://`.
#[must_use]
pub fn hostname_from_uri(uri: &str) -> Option<String> {
    let trimmed = uri.trim_matches(|c: char| c.is_control() || c.is_whitespace());
    if let Some(host) = parse_host(trimmed) {
        return Some(host);
    }

    let marker = trimmed.find("://")?;
    let scheme_start = trimmed[..marker]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .last()
        .map(|(i, _)| i)?;
    parse_host(&trimmed[scheme_start..])
}

fn parse_host(candidate: &str) -> Option<String> {
    Url::parse(candidate)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
}

/// Short hex preview of a buffer for log lines.
#[must_use]
pub(crate) fn preview(bytes: &[u8]) -> String {
    const MAX: usize = 8;
    if bytes.len() <= MAX {
        hex::encode(bytes)
    } else {
        format!("{}..({} bytes)", hex::encode(&bytes[..MAX]), bytes.len())
    }
}
