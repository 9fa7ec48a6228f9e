use ferrite_vision::upload::UploadedFile;

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
}

/// One part of a multipart/form-data body.
#[derive(Debug)]
pub struct Part<'a> {
    pub name: Option<String>,
    /// `Some("")` when the browser sent a file input with nothing selected.
    pub filename: Option<String>,
    pub data: &'a [u8],
}

/// Splits a multipart body into its parts.  Preamble, epilogue and parts
/// without a header block are skipped.
pub fn parse_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{}", boundary);
    let sep = b"\r\n\r\n";

    split_on(body, delimiter.as_bytes())
        .into_iter()
        .filter_map(|part| {
            let sep_pos = find_subsequence(part, sep)?;
            let headers = String::from_utf8_lossy(&part[..sep_pos]);
            let disposition = headers
                .split("\r\n")
                .find(|line| line.to_ascii_lowercase().starts_with("content-disposition:"))?;
            let (name, filename) = parse_disposition(disposition);

            let raw = &part[sep_pos + sep.len()..];
            let data = raw.strip_suffix(b"\r\n").unwrap_or(raw);
            Some(Part { name, filename, data })
        })
        .collect()
}

/// Parses `name` and `filename` out of a Content-Disposition header line.
fn parse_disposition(line: &str) -> (Option<String>, Option<String>) {
    let value = line.split_once(':').map(|(_, v)| v).unwrap_or("");
    let mut name = None;
    let mut filename = None;
    for param in value.split(';').map(str::trim) {
        if let Some((key, val)) = param.split_once('=') {
            let val = val.trim().trim_matches('"').to_owned();
            match key.trim().to_ascii_lowercase().as_str() {
                "name" => name = Some(val),
                "filename" => filename = Some(val),
                _ => {}
            }
        }
    }
    (name, filename)
}

/// Returns the file submitted under `field`, if the body has one.
///
/// Browsers may send a client-side path as the filename; only the final
/// component is kept.
pub fn file_field(body: &[u8], boundary: &str, field: &str) -> Option<UploadedFile> {
    parse_parts(body, boundary)
        .into_iter()
        .find(|p| p.name.as_deref() == Some(field) && p.filename.is_some())
        .map(|p| {
            let raw = p.filename.unwrap_or_default();
            let filename = raw.rsplit(['/', '\\']).next().unwrap_or("").to_owned();
            UploadedFile { filename, bytes: p.data.to_vec() }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, filename, data) in parts {
            out.extend_from_slice(b"--XyZ\r\n");
            let disp = match filename {
                Some(f) => format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n", name, f),
                None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name),
            };
            out.extend_from_slice(disp.as_bytes());
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--XyZ--\r\n");
        out
    }

    #[test]
    fn boundary_from_content_type() {
        assert_eq!(extract_boundary("multipart/form-data; boundary=abc").as_deref(), Some("abc"));
        assert_eq!(extract_boundary("multipart/form-data; boundary=\"q q\"").as_deref(), Some("q q"));
        assert_eq!(extract_boundary("multipart/form-data"), None);
        assert_eq!(extract_boundary("multipart/form-data; boundary="), None);
    }

    #[test]
    fn picks_the_named_file_field() {
        let b = body(&[
            ("note", None, b"hello"),
            ("other", Some("a.txt"), b"nope"),
            ("image", Some("cat.png"), b"\x89PNG\r\n\x1a\nbinary\r\n--tricky"),
        ]);
        let file = file_field(&b, "XyZ", "image").unwrap();
        assert_eq!(file.filename, "cat.png");
        assert_eq!(file.bytes, b"\x89PNG\r\n\x1a\nbinary\r\n--tricky");
    }

    #[test]
    fn text_field_with_same_name_is_not_a_file() {
        let b = body(&[("image", None, b"just text")]);
        assert!(file_field(&b, "XyZ", "image").is_none());
    }

    #[test]
    fn empty_file_input_has_empty_filename() {
        let b = body(&[("image", Some(""), b"")]);
        let file = file_field(&b, "XyZ", "image").unwrap();
        assert!(file.filename.is_empty());
    }

    #[test]
    fn client_paths_are_reduced_to_the_basename() {
        let b = body(&[("image", Some("C:\\Users\\me\\cat.jpg"), b"x")]);
        assert_eq!(file_field(&b, "XyZ", "image").unwrap().filename, "cat.jpg");
    }
}
