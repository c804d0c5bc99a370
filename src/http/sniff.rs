//! Content type detection from leading body bytes.
//!
//! Only the first [`SNIFF_LEN`] bytes are ever considered.

use std::path::Path;

use mime_guess::mime;

/// Upper bound on the number of bytes inspected.
pub const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00\x61\x73\x6D", "application/wasm"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"OggS\x00", "application/ogg"),
];

/// Guess the content type of a body from its first bytes.
///
/// Always returns a valid content type; unknown binary content is
/// `application/octet-stream`.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let start = data
        .iter()
        .position(|&b| !matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' '))
        .unwrap_or(data.len());
    let trimmed = &data[start..];

    if HTML_TAGS.iter().any(|tag| html_tag_at(trimmed, tag)) {
        return TEXT_HTML;
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    for &(magic, content_type) in SIGNATURES {
        if data.starts_with(magic) {
            return content_type;
        }
    }
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return "image/webp";
    }

    if data.iter().any(|&b| is_binary(b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

/// Content type for a file: by extension first, then by its first bytes.
pub fn content_type_for(path: &Path, head: &[u8]) -> String {
    match mime_guess::from_path(path).first() {
        Some(guess) if guess.type_() == mime::TEXT && guess.get_param(mime::CHARSET).is_none() => {
            format!("{guess}; charset=utf-8")
        }
        Some(guess) => guess.to_string(),
        None => detect_content_type(head).to_string(),
    }
}

/// Case-insensitive tag match, terminated by a space or `>`.
fn html_tag_at(data: &[u8], tag: &[u8]) -> bool {
    if data.len() <= tag.len() {
        return false;
    }
    if !data[..tag.len()].eq_ignore_ascii_case(tag) {
        return false;
    }
    // Comments have no terminator requirement beyond their opener.
    if tag == b"<!--" {
        return true;
    }
    matches!(data[tag.len()], b' ' | b'>')
}

fn is_binary(b: u8) -> bool {
    b <= 0x08 || b == 0x0B || (0x0E..=0x1A).contains(&b) || (0x1C..=0x1F).contains(&b)
}
