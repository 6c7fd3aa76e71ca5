//! Shared encoding utilities.

use crate::oid;
use base64::Engine;

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub(crate) fn hex_colon_upper(bytes: &[u8]) -> String {
    use std::fmt::Write;
    if bytes.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(bytes.len() * 3 - 1);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        let _ = write!(out, "{:02X}", b);
    }
    out
}

/// Encode bytes as base64 with PEM-style 64-character line wrapping.
pub(crate) fn base64_wrap(data: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    let num_lines = encoded.len().div_ceil(64);
    let mut result = String::with_capacity(encoded.len() + num_lines);
    let mut pos = 0;
    while pos < encoded.len() {
        if pos > 0 {
            result.push('\n');
        }
        let end = (pos + 64).min(encoded.len());
        result.push_str(&encoded[pos..end]);
        pos = end;
    }
    result
}

/// Detect whether input bytes are PEM-encoded.
///
/// Returns `true` if the input starts with `-----BEGIN` (after stripping
/// leading whitespace).
pub(crate) fn is_pem(input: &[u8]) -> bool {
    input
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take(10)
        .eq(b"-----BEGIN".iter())
}

/// Rebuild a single certificate's PEM armor from possibly mangled input.
///
/// TPP integrations routinely hand over PEM with stripped headers,
/// collapsed newlines, or embedded spaces. This strips any existing
/// CERTIFICATE armor and whitespace from the body and re-wraps it into
/// standard headers with 64-character lines.
pub fn normalize_armor(input: &[u8]) -> String {
    const PREFIX: &str = "-----BEGIN CERTIFICATE-----";
    const SUFFIX: &str = "-----END CERTIFICATE-----";

    let text = String::from_utf8_lossy(input);
    let body: String = text
        .replacen(PREFIX, "", 1)
        .replacen(SUFFIX, "", 1)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(body.len() + body.len() / 64 + 64);
    out.push_str(PREFIX);
    out.push('\n');
    let bytes = body.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let end = (pos + 64).min(bytes.len());
        out.push_str(&body[pos..end]);
        out.push('\n');
        pos = end;
    }
    out.push_str(SUFFIX);
    out.push('\n');
    out
}

/// Decode the whole input as base64, tolerating surrounding whitespace.
///
/// Returns `None` if any non-whitespace character is outside the base64
/// alphabet, so callers can fall through to the DER path.
pub(crate) fn decode_base64_body(input: &[u8]) -> Option<Vec<u8>> {
    let compact: Vec<u8> = input
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return None;
    }
    base64::engine::general_purpose::STANDARD
        .decode(&compact)
        .ok()
}

/// Map common OID dotted-decimal strings to their short name equivalents.
///
/// These match the names used by OpenSSL for distinguished name
/// components, plus the PSD2-relevant organizationIdentifier.
pub(crate) fn oid_short_name(oid: &str) -> String {
    match oid {
        oid::COMMON_NAME => "CN".into(),
        oid::SERIAL_NUMBER => "serialNumber".into(),
        oid::COUNTRY => "C".into(),
        oid::LOCALITY => "L".into(),
        oid::STATE_OR_PROVINCE => "ST".into(),
        oid::ORGANIZATION => "O".into(),
        oid::ORGANIZATIONAL_UNIT => "OU".into(),
        oid::ORGANIZATION_IDENTIFIER => "organizationIdentifier".into(),
        other => other.to_string(),
    }
}
