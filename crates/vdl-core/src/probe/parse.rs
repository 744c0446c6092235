//! Parse HTTP response header lines collected from curl callbacks.

/// Key headers of a HEAD response needed to pick a transfer strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// True if `Accept-Ranges` mentions `bytes`.
    pub accept_ranges: bool,
}

/// Parsed `Content-Range: bytes <start>-<end>/<total>` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    /// `None` when the server reports `*` (unknown length).
    pub total: Option<u64>,
}

/// Appends one raw header line, starting over on every new status line so
/// only the final response of a redirect chain is kept.
pub(crate) fn push_header_line(lines: &mut Vec<String>, data: &[u8]) {
    if let Ok(s) = std::str::from_utf8(data) {
        let line = s.trim_end();
        if line.starts_with("HTTP/") {
            lines.clear();
        }
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
}

/// Status code from the `HTTP/x y reason` line, if one was seen.
pub(crate) fn parse_http_status(lines: &[String]) -> Option<u32> {
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
}

/// Value of the first header named `name` (case-insensitive).
pub(crate) fn header_value<'a>(lines: &'a [String], name: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| {
        let (n, v) = line.split_once(':')?;
        n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

/// Parse collected header lines into HeadResult.
pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let content_length = header_value(lines, "content-length").and_then(|v| v.parse::<u64>().ok());
    let accept_ranges = header_value(lines, "accept-ranges")
        .map(|v| v.to_ascii_lowercase().contains("bytes"))
        .unwrap_or(false);
    HeadResult {
        content_length,
        accept_ranges,
    }
}

/// Parse a `Content-Range` value such as `bytes 0-0/1234` or `bytes 0-0/*`.
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    let rest = value.trim();
    let rest = rest
        .get(..5)
        .filter(|p| p.eq_ignore_ascii_case("bytes"))
        .map(|_| rest[5..].trim_start())?;
    let (range, total) = rest.split_once('/')?;
    let (start, end) = range.trim().split_once('-')?;
    let start = start.trim().parse().ok()?;
    let end = end.trim().parse().ok()?;
    let total = match total.trim() {
        "*" => None,
        t => Some(t.parse().ok()?),
    };
    Some(ContentRange { start, end, total })
}

/// Total size component of a `Content-Range` value; `None` if unknown or malformed.
pub fn content_range_total(value: &str) -> Option<u64> {
    match value.split_once('/') {
        Some((_, total)) => total.trim().parse().ok(),
        None => None,
    }
}
