//! URL validation and destination filename derivation.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::DownloadError;

/// Filename used when the URL path yields nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Parses `raw` and accepts only `http` and `https` URLs with a host.
pub fn validate_url(raw: &str) -> Result<Url, DownloadError> {
    let invalid = |reason: String| DownloadError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {:?}", other))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Last non-empty path segment of `url`, percent-decoded.
pub fn filename_from_url_path(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode(segment);
    (!decoded.is_empty() && decoded != "." && decoded != "..").then_some(decoded)
}

fn percent_decode(s: &str) -> String {
    fn hex(b: u8) -> Option<u8> {
        (b as char).to_digit(16).map(|d| d as u8)
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Makes `name` safe as a single path component: separators, NUL and control
/// characters become `_`, leading/trailing dots and spaces are dropped, and
/// the result is cut to NAME_MAX bytes on a char boundary.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

/// Destination for `url` inside `dir`, named after the URL path.
pub fn default_destination(url: &Url, dir: &Path) -> PathBuf {
    let name = filename_from_url_path(url)
        .map(|n| sanitize_filename(&n))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("http://example.com/a.msi").is_ok());
        assert!(validate_url("https://example.com/a.msi").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        for raw in ["ftp://example.com/a", "file:///etc/passwd", "not a url", ""] {
            let err = validate_url(raw).unwrap_err();
            assert!(matches!(err, DownloadError::InvalidUrl { .. }), "{}", raw);
        }
    }

    #[test]
    fn filename_from_path() {
        let url = Url::parse("https://nodejs.org/dist/v24.13.0/node-v24.13.0-x64.msi?x=1").unwrap();
        assert_eq!(filename_from_url_path(&url).as_deref(), Some("node-v24.13.0-x64.msi"));
        let root = Url::parse("https://example.com/").unwrap();
        assert_eq!(filename_from_url_path(&root), None);
    }

    #[test]
    fn filename_is_percent_decoded() {
        let url = Url::parse("https://example.com/my%20file.zip").unwrap();
        assert_eq!(filename_from_url_path(&url).as_deref(), Some("my file.zip"));
    }

    #[test]
    fn sanitize_strips_separators_and_dots() {
        assert_eq!(sanitize_filename("a/b\\c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_filename("  ..file.txt.. "), "file.txt");
        assert_eq!(sanitize_filename("x\u{7}y"), "x_y");
        assert_eq!(sanitize_filename(&"é".repeat(200)).len(), 254);
    }

    #[test]
    fn default_destination_falls_back() {
        let dir = Path::new("/tmp/dl");
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(default_destination(&url, dir), dir.join("download.bin"));
        let url = Url::parse("https://example.com/pkg/Git-2.52.0-64-bit.exe").unwrap();
        assert_eq!(default_destination(&url, dir), dir.join("Git-2.52.0-64-bit.exe"));
    }
}
