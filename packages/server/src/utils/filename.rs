/// Lowercased extension (with leading dot) of the last path component.
///
/// Leading dots belong to the stem, so `".pdf"` has no extension, and only
/// the final suffix counts: `"a.tar.gz"` yields `".gz"`.
pub fn extension_of(filename: &str) -> Option<String> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    let stem_start = base.len() - base.trim_start_matches('.').len();
    let dot = base.rfind('.')?;

    if dot < stem_start || dot + 1 == base.len() {
        return None;
    }
    Some(base[dot..].to_ascii_lowercase())
}

/// Build a `Content-Disposition: attachment` value carrying both an ASCII
/// fallback name and the RFC 5987 encoded original.
pub fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
