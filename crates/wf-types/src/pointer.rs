//! JSON Pointer (RFC 6901) codec.
//!
//! A pointer is either the empty string (the whole document) or a sequence
//! of `/`-prefixed tokens where `~` is written `~0` and `/` is written `~1`.

use crate::error::{TypeError, TypeResult};

/// Escape a single path token.
///
/// `~` is escaped before `/` so that the `~` introduced by `~1` is never
/// escaped a second time.
pub fn escape_token(token: &str) -> String {
    if !token.contains(['~', '/']) {
        return token.to_string();
    }
    token.replace('~', "~0").replace('/', "~1")
}

/// Reverse [`escape_token`]. `~1` is decoded before `~0`.
pub fn unescape_token(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    token.replace("~1", "/").replace("~0", "~")
}

/// Encode a token sequence as a pointer string.
pub fn to_pointer<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push('/');
        out.push_str(&escape_token(token.as_ref()));
    }
    out
}

/// Decode a pointer string into its token sequence.
pub fn from_pointer(pointer: &str) -> TypeResult<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(TypeError::MalformedPointer {
            pointer: pointer.to_string(),
        });
    };
    Ok(rest.split('/').map(unescape_token).collect())
}

/// Returns `true` if the token is a canonical non-negative array index
/// (`"0"`, `"17"`; not `"-1"`, `"01"` or `""`).
pub fn is_array_index(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.is_empty() || (bytes.len() > 1 && bytes[0] == b'0') {
        return false;
    }
    bytes.iter().all(u8::is_ascii_digit) && token.parse::<usize>().is_ok()
}
