//! LSP document URI helpers.
//!
//! The diagnostics index is keyed by file path, while servers identify documents by URI.

use std::path::PathBuf;

/// Percent-decode a `file://` URI path component.
///
/// `%XX` escapes are decoded bytewise. Malformed or truncated escapes (`%zz`, a trailing `%2`)
/// are kept verbatim, and decoded bytes that are not UTF-8 become U+FFFD.
pub fn percent_decode_path(path: &str) -> String {
    fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = path.as_bytes();
    let mut out = Vec::<u8>::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2]))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Convert a `file://` URI into a local filesystem path. `None` for other schemes.
pub fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    // `file://localhost/x` and `file:///x` name the same file.
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);

    let mut path = percent_decode_path(rest);

    // `file:///C:/...` -> `C:/...`
    if cfg!(windows) {
        if path.starts_with('/') && path.get(2..3) == Some(":") {
            path.remove(0);
        }
        path = path.replace('/', "\\");
    }

    Some(PathBuf::from(path))
}

/// Key under which a document's diagnostics are stored.
///
/// `file://` URIs become their decoded path; any other URI (`untitled:`, `vscode-notebook-cell:`,
/// ...) is used verbatim.
pub fn uri_to_path_key(uri: &str) -> String {
    match file_uri_to_path(uri) {
        Some(path) => path.to_string_lossy().into_owned(),
        None => uri.to_string(),
    }
}
