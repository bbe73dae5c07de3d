//! Value encoding rules: RFC 2849 SAFE-STRING classification and the
//! base64 codec used for `attr::` values.

use ::base64::engine::general_purpose::STANDARD;
use ::base64::Engine as _;

/// Encode `src` as unfolded base64.  Folding is left to the formatter.
pub fn encode_base64(src: &[u8]) -> String {
    STANDARD.encode(src)
}

/// Decode base64 `src` into bytes.  Embedded whitespace (left over from
/// folding) is skipped.  Returns None on invalid input.
pub fn read_base64(src: &str) -> Option<Vec<u8>> {
    let compact: Vec<u8> = src
        .bytes()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact).ok()
}

/// Check if the value can be printed as an LDIF SAFE-STRING:
/// no leading space/colon/less-than, no null/CR/LF/non-ASCII bytes.
pub fn safe_string_p(data: &[u8]) -> bool {
    let Some(&c) = data.first() else {
        return true;
    };
    if c == b' ' || c == b':' || c == b'<' {
        return false;
    }
    data.iter()
        .all(|&c| c != 0 && c != b'\r' && c != b'\n' && c < 0x80)
}

/// Does `data` have to be written as `attr:: base64`?
///
/// A trailing space would be lost by readers that trim lines, so it forces
/// encoding as well.  Substrings such as `::` or `:<` after the first byte
/// are plain text.
pub fn must_encode(data: &[u8]) -> bool {
    if !safe_string_p(data) {
        return true;
    }
    if data.last() == Some(&b' ') {
        return true;
    }
    std::str::from_utf8(data).is_err()
}
