//! # Content Codec
//!
//! Conversions between the text forms documents travel in (raw base64 or a
//! `data:` URL) and binary [`Blob`]s, plus file-name sanitization for
//! uploads.
//!
//! ## Usage
//!
//! ```ignore
//! use core_library::codec::{sanitize_file_name, to_base64, to_blob};
//!
//! let blob = to_blob(&document.document, &document.doc_type)?;
//! let name = sanitize_file_name(&document.name);
//! dropbox.upload_file(blob, &format!("/{}", name)).await?;
//!
//! let encoded = to_base64(&downloaded.bytes);
//! ```

use crate::error::CodecError;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::write::EncoderStringWriter;
use base64::Engine;
use bridge_traits::records::Blob;
use std::io::Write;

/// Bytes encoded per step when converting large buffers.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Longest file name providers accept.
pub const MAX_FILE_NAME_LEN: usize = 255;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_EXTENSION: &str = ".pdf";
const DEFAULT_STEM: &str = "document";

// Accept input with or without trailing padding
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode base64 or a data URL into a blob tagged with `declared_type`.
///
/// Input containing `base64,` is decoded from the text after it. Other
/// `data:` URLs are percent-decoded. Anything else is treated as raw base64.
/// Whitespace inside the payload is ignored.
///
/// # Errors
///
/// [`CodecError::InvalidFormat`] if the payload is not valid base64, the data
/// URL has no payload separator, or the decoded content is empty.
pub fn to_blob(encoded: &str, declared_type: &str) -> Result<Blob, CodecError> {
    let bytes = if let Some(idx) = encoded.find("base64,") {
        decode_base64(&encoded[idx + "base64,".len()..])?
    } else if encoded.starts_with("data:") {
        decode_data_url(encoded)?
    } else {
        decode_base64(encoded)?
    };

    if bytes.is_empty() {
        return Err(CodecError::InvalidFormat);
    }

    let content_type = match declared_type.trim() {
        "" => DEFAULT_CONTENT_TYPE,
        declared => declared,
    };

    Ok(Blob::new(bytes, content_type))
}

/// Decode a raw base64 payload, ignoring embedded whitespace.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, CodecError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    LENIENT
        .decode(compact.as_bytes())
        .map_err(|_| CodecError::InvalidFormat)
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, CodecError> {
    let (_, payload) = url.split_once(',').ok_or(CodecError::InvalidFormat)?;
    Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
}

/// Standard base64 of `bytes`, encoded in [`DEFAULT_CHUNK_SIZE`] steps.
///
/// ```
/// use core_library::codec::to_base64;
///
/// assert_eq!(to_base64(b"%PDF-"), "JVBERi0=");
/// ```
pub fn to_base64(bytes: &[u8]) -> String {
    to_base64_chunked(bytes, DEFAULT_CHUNK_SIZE)
}

/// Standard base64 of `bytes`, feeding the encoder `chunk_size` bytes at a time.
pub fn to_base64_chunked(bytes: &[u8], chunk_size: usize) -> String {
    let mut writer = EncoderStringWriter::new(&base64::engine::general_purpose::STANDARD);
    for chunk in bytes.chunks(chunk_size.max(1)) {
        // Writing into a String cannot fail
        let _ = writer.write_all(chunk);
    }
    writer.into_inner()
}

/// Like [`to_base64_chunked`] but yields to the runtime between chunks so a
/// large file does not stall other tasks.
pub async fn to_base64_yielding(bytes: &[u8], chunk_size: usize) -> String {
    let mut writer = EncoderStringWriter::new(&base64::engine::general_purpose::STANDARD);
    for chunk in bytes.chunks(chunk_size.max(1)) {
        let _ = writer.write_all(chunk);
        tokio::task::yield_now().await;
    }
    writer.into_inner()
}

/// Make a name safe to upload.
///
/// Characters providers reject become `_`, whitespace runs become `_`,
/// repeated `_` collapse and edge `_` are trimmed. A name without an
/// extension gets `.pdf`. Names longer than 255 characters lose the end of
/// their stem, keeping the extension.
///
/// ```
/// use core_library::codec::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("Q1: Plan?  final"), "Q1_Plan_final.pdf");
/// assert_eq!(sanitize_file_name("report.docx"), "report.docx");
/// ```
pub fn sanitize_file_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut last_was_sep = false;

    for ch in name.chars() {
        let is_sep = ch.is_whitespace()
            || ch.is_control()
            || matches!(ch, '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' | '_');
        if is_sep {
            if !last_was_sep {
                cleaned.push('_');
            }
            last_was_sep = true;
        } else {
            cleaned.push(ch);
            last_was_sep = false;
        }
    }

    let mut sanitized = cleaned.trim_matches('_').to_string();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        sanitized = DEFAULT_STEM.to_string();
    }
    if !sanitized.contains('.') {
        sanitized.push_str(DEFAULT_EXTENSION);
    }

    truncate_preserving_extension(sanitized)
}

fn truncate_preserving_extension(name: String) -> String {
    let total = name.chars().count();
    if total <= MAX_FILE_NAME_LEN {
        return name;
    }

    let (stem, ext) = match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name.as_str(), ""),
    };

    let ext_len = ext.chars().count();
    if ext_len >= MAX_FILE_NAME_LEN {
        return name.chars().take(MAX_FILE_NAME_LEN).collect();
    }

    let keep = MAX_FILE_NAME_LEN - ext_len;
    let mut truncated: String = stem.chars().take(keep).collect();
    truncated.push_str(ext);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISALLOWED: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

    #[test]
    fn test_data_url_with_base64_marker() {
        let blob = to_blob("data:application/pdf;base64,JVBERi0=", "application/pdf").unwrap();
        assert_eq!(blob.content_type, "application/pdf");
        assert_eq!(&blob.bytes[..], b"%PDF-");
    }

    #[test]
    fn test_raw_base64_and_default_type() {
        let blob = to_blob("aGVsbG8=", "").unwrap();
        assert_eq!(&blob.bytes[..], b"hello");
        assert_eq!(blob.content_type, "application/octet-stream");
    }

    #[test]
    fn test_unpadded_and_wrapped_base64() {
        let blob = to_blob("aGVs\nbG8", "text/plain").unwrap();
        assert_eq!(&blob.bytes[..], b"hello");
    }

    #[test]
    fn test_percent_encoded_data_url() {
        let blob = to_blob("data:text/plain,hello%20world", "text/plain").unwrap();
        assert_eq!(&blob.bytes[..], b"hello world");
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(to_blob("", "text/plain"), Err(CodecError::InvalidFormat));
        assert_eq!(to_blob("not base64!", "text/plain"), Err(CodecError::InvalidFormat));
        assert_eq!(
            to_blob("data:application/pdf;base64,", "application/pdf"),
            Err(CodecError::InvalidFormat)
        );
        assert_eq!(to_blob("data:nocomma", ""), Err(CodecError::InvalidFormat));
        assert_eq!(CodecError::InvalidFormat.to_string(), "Invalid document format");
    }

    #[test]
    fn test_round_trip() {
        let samples: Vec<Vec<u8>> = vec![
            vec![0],
            vec![0xff; 3],
            b"%PDF-1.7".to_vec(),
            (0..=255u8).collect(),
            (0..20_000u32).map(|i| (i * 31 % 251) as u8).collect(),
        ];

        for bytes in samples {
            let blob = to_blob(&to_base64(&bytes), "application/octet-stream").unwrap();
            assert_eq!(blob.bytes.to_vec(), bytes);
        }
    }

    #[test]
    fn test_chunk_size_does_not_change_output() {
        let bytes: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();
        let expected = base64::engine::general_purpose::STANDARD.encode(&bytes);

        assert_eq!(to_base64_chunked(&bytes, 7), expected);
        assert_eq!(to_base64_chunked(&bytes, 8192), expected);
        assert_eq!(to_base64_chunked(&bytes, 0), expected);
        assert_eq!(to_base64(&[]), "");
    }

    #[tokio::test]
    async fn test_yielding_encoder_matches() {
        let bytes: Vec<u8> = (0..30_000u32).map(|i| (i % 199) as u8).collect();
        assert_eq!(to_base64_yielding(&bytes, 8192).await, to_base64(&bytes));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a<b>c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_file_name("  spaced   out .md "), "spaced_out_.md");
        assert_eq!(sanitize_file_name("no extension"), "no_extension.pdf");
        assert_eq!(sanitize_file_name("???"), "document.pdf");
        assert_eq!(sanitize_file_name("dir/sub\\file.csv"), "dir_sub_file.csv");
    }

    #[test]
    fn test_sanitize_long_name_keeps_extension() {
        let long = format!("{}.docx", "x".repeat(400));
        let sanitized = sanitize_file_name(&long);
        assert_eq!(sanitized.chars().count(), MAX_FILE_NAME_LEN);
        assert!(sanitized.ends_with(".docx"));

        let long_ext = format!("a.{}", "y".repeat(300));
        assert_eq!(sanitize_file_name(&long_ext).chars().count(), MAX_FILE_NAME_LEN);
    }

    #[test]
    fn test_sanitize_bounds() {
        let names = [
            String::new(),
            "*".repeat(600),
            format!("{}|{}", "é".repeat(300), "?.pdf"),
            "\"quoted\" <name>: final?.txt".to_string(),
        ];
        for name in names {
            let sanitized = sanitize_file_name(&name);
            assert!(sanitized.chars().count() <= MAX_FILE_NAME_LEN);
            assert!(!sanitized.contains(&DISALLOWED[..]));
            assert!(!sanitized.is_empty());
        }
    }
}
