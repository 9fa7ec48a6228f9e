/// Decodes a percent-encoded string (`%XX`) and converts `+` to space.
/// Invalid escapes are kept literally; invalid UTF-8 is replaced.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(h), Some(l)) => {
                        out.push(((h << 4) | l) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn url_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Parses a `Cookie:` header value into `(name, value)` pairs.
pub fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header.split(';')
        .filter_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            Some((k.trim().to_owned(), v.trim().to_owned()))
        })
        .collect()
}

/// Looks up a key in parsed pairs, returning the value if found.
pub fn form_get<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip_utf8() {
        let msg = "File extension not allowed: \"exe\" – 100%";
        assert_eq!(url_decode(&url_encode(msg)), msg);
    }

    #[test]
    fn decode_tolerates_bad_escapes() {
        assert_eq!(url_decode("a%2"), "a%2");
        assert_eq!(url_decode("a%zzb"), "a%zzb");
        assert_eq!(url_decode("a+b%21"), "a b!");
    }

    #[test]
    fn cookies() {
        let pairs = parse_cookies("theme=dark; flash=No%20file ; empty=");
        assert_eq!(form_get(&pairs, "flash"), Some("No%20file"));
        assert_eq!(form_get(&pairs, "empty"), Some(""));
        assert_eq!(form_get(&pairs, "missing"), None);
    }
}
