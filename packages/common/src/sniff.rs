//! Content-based MIME detection.
//!
//! Only the bytes are inspected. Client-declared content types and filename
//! extensions never influence the result.

use std::io;
use std::path::Path;

use file_format::FileFormat;

/// Reported for zero-length content.
pub const EMPTY: &str = "application/x-empty";
/// Reported for UTF-8 text without a more specific signature.
pub const TEXT_PLAIN: &str = "text/plain";
/// Reported when nothing matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Determine the MIME type of in-memory content.
pub fn sniff_mime(content: &[u8]) -> String {
    classify(FileFormat::from_bytes(content), content)
}

/// Determine the MIME type of the file at `path`.
///
/// Container formats such as ZIP are identified from records at the end of
/// the file, so the whole file is read. `head` holds its leading bytes and
/// is used for the text fallback.
pub fn sniff_file(path: &Path, head: &[u8]) -> io::Result<String> {
    Ok(classify(FileFormat::from_file(path)?, head))
}

fn classify(format: FileFormat, head: &[u8]) -> String {
    if head.is_empty() {
        return EMPTY.to_string();
    }

    match format {
        FileFormat::ArbitraryBinaryData | FileFormat::PlainText | FileFormat::Empty => {
            if looks_like_text(head) {
                TEXT_PLAIN.to_string()
            } else {
                OCTET_STREAM.to_string()
            }
        }
        format => format.media_type().to_string(),
    }
}

/// UTF-8 without NUL or non-whitespace control characters.
///
/// A multi-byte sequence cut off at the end of `head` is tolerated, since
/// `head` is usually a prefix of the content.
fn looks_like_text(head: &[u8]) -> bool {
    let valid = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            match std::str::from_utf8(&head[..e.valid_up_to()]) {
                Ok(text) => text,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };

    valid
        .chars()
        .all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r' | '\x0c'))
}
