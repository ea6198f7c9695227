//! Query-string text decoding
//!
//! Free-text request parameters arrive percent/plus encoded. Decoding only
//! ever shrinks, so it works in place on the caller's buffer. Malformed
//! escapes (a `%` not followed by two hex digits) are passed through as
//! literal characters rather than rejected; this is free-text input, not a
//! strict URI component.

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode `%XX` escapes and `+` (space) in place, truncating the buffer to
/// the decoded length.
pub fn percent_decode_in_place(buf: &mut Vec<u8>) {
    let mut read = 0;
    let mut write = 0;
    while read < buf.len() {
        match buf[read] {
            b'%' if read + 2 < buf.len() => {
                match (hex_val(buf[read + 1]), hex_val(buf[read + 2])) {
                    (Some(hi), Some(lo)) => {
                        buf[write] = hi * 16 + lo;
                        read += 3;
                    }
                    _ => {
                        // Malformed escape: keep the '%' literally and let
                        // the following characters decode on their own.
                        buf[write] = b'%';
                        read += 1;
                    }
                }
            }
            b'+' => {
                buf[write] = b' ';
                read += 1;
            }
            other => {
                buf[write] = other;
                read += 1;
            }
        }
        write += 1;
    }
    buf.truncate(write);
}

/// Find the raw (still encoded) value of `key` in a query string.
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == key).then_some(v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> String {
        let mut buf = s.as_bytes().to_vec();
        percent_decode_in_place(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    /// Percent-encode everything outside the unreserved set, with `+` for
    /// spaces; the inverse used by the round-trip property.
    fn encode(s: &str) -> String {
        let mut out = String::new();
        for &b in s.as_bytes() {
            match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(b as char)
                }
                b' ' => out.push('+'),
                _ => out.push_str(&format!("%{:02X}", b)),
            }
        }
        out
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(decode("HelloWorld"), "HelloWorld");
        assert_eq!(decode(""), "");
    }

    #[test]
    fn decoding_is_idempotent_on_decoded_text() {
        let once = decode("Hello%20World");
        assert_eq!(once, "Hello World");
        assert_eq!(decode(&once), once);
    }

    #[test]
    fn plus_becomes_space() {
        assert_eq!(decode("say+something+nice"), "say something nice");
    }

    #[test]
    fn hex_digits_are_case_insensitive() {
        assert_eq!(decode("%2f%2F"), "//");
    }

    #[test]
    fn encode_decode_roundtrip() {
        for text in [
            "Hello World",
            "100% pure & simple",
            "наука",
            "tabs\tand\nnewlines",
            "a=b&c=d",
        ] {
            assert_eq!(decode(&encode(text)), text);
        }
    }

    #[test]
    fn malformed_escapes_pass_through() {
        assert_eq!(decode("100%"), "100%");
        assert_eq!(decode("100%2"), "100%2");
        assert_eq!(decode("a%zzb"), "a%zzb");
        // The literal '%' is kept and the following valid escape decodes.
        assert_eq!(decode("%%41"), "%A");
    }

    #[test]
    fn in_place_decode_shrinks_the_buffer() {
        let mut buf = b"a%20b".to_vec();
        percent_decode_in_place(&mut buf);
        assert_eq!(buf, b"a b");
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn query_param_finds_named_key() {
        assert_eq!(query_param("s=hello&v=en", "s"), Some("hello"));
        assert_eq!(query_param("v=en&s=hello", "s"), Some("hello"));
        assert_eq!(query_param("s=", "s"), Some(""));
        assert_eq!(query_param("flag&s=x", "s"), Some("x"));
        assert_eq!(query_param("v=en", "s"), None);
        assert_eq!(query_param("", "s"), None);
    }

    #[test]
    fn query_param_does_not_match_prefixes() {
        assert_eq!(query_param("say=hello", "s"), None);
    }
}
