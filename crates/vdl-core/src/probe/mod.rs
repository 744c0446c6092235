//! Remote probe: learn the size and range capability of a resource.
//!
//! Issues a `HEAD` first and falls back to a trial `GET` with
//! `Range: bytes=0-0`. A server that supports neither is not an error; it is
//! reported as an opaque single-stream resource.

pub(crate) mod parse;

use std::time::Duration;

use curl::easy::{Easy2, Handler, WriteError};

use crate::error::DownloadError;
pub use parse::{content_range_total, parse_content_range, ContentRange, HeadResult};

/// What the probe learned about a remote resource. Produced once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteDescriptor {
    /// Total size in bytes; `None` when the server does not say.
    pub total_size: Option<u64>,
    pub supports_ranges: bool,
}

impl RemoteDescriptor {
    /// Resource to be fetched as one unranged stream.
    pub fn opaque() -> Self {
        Self {
            total_size: None,
            supports_ranges: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Collects response headers. With `abort_unless_partial` set, the body is
/// refused unless the response is a 206, so a server ignoring `Range` does not
/// stream the whole resource into the probe.
#[derive(Default)]
struct ProbeHandler {
    headers: Vec<String>,
    abort_unless_partial: bool,
    refused_body: bool,
}

impl Handler for ProbeHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        parse::push_header_line(&mut self.headers, data);
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if self.abort_unless_partial && parse::parse_http_status(&self.headers) != Some(206) {
            self.refused_body = true;
            return Ok(0);
        }
        Ok(data.len())
    }
}

fn new_handle(url: &str, handler: ProbeHandler, opts: &ProbeOptions) -> Result<Easy2<ProbeHandler>, curl::Error> {
    let mut easy = Easy2::new(handler);
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    Ok(easy)
}

/// Performs a HEAD request. Returns the final status and parsed headers.
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn head(url: &str, opts: &ProbeOptions) -> Result<(u32, HeadResult), curl::Error> {
    let mut easy = new_handle(url, ProbeHandler::default(), opts)?;
    easy.nobody(true)?;
    easy.perform()?;
    let code = easy.response_code()?;
    Ok((code, parse::parse_headers(&easy.get_ref().headers)))
}

/// Trial `GET` for the first byte. Returns the status and, for a 206, the
/// raw `Content-Range` value.
fn range_probe(url: &str, opts: &ProbeOptions) -> Result<(u32, Option<String>), curl::Error> {
    let handler = ProbeHandler {
        abort_unless_partial: true,
        ..ProbeHandler::default()
    };
    let mut easy = new_handle(url, handler, opts)?;
    easy.range("0-0")?;
    if let Err(e) = easy.perform() {
        if !(e.is_write_error() && easy.get_ref().refused_body) {
            return Err(e);
        }
    }
    let headers = &easy.get_ref().headers;
    let status = match parse::parse_http_status(headers) {
        Some(s) => s,
        None => easy.response_code()?,
    };
    let content_range = parse::header_value(headers, "content-range").map(str::to_string);
    Ok((status, content_range))
}

/// Determines total size and range support of `url`.
///
/// Fails only when neither request could talk to the server at all; every
/// other shortfall degrades to a less capable descriptor.
pub fn probe(url: &str, opts: &ProbeOptions) -> Result<RemoteDescriptor, DownloadError> {
    let head_reached = match head(url, opts) {
        Ok((code, head)) => {
            let size = head.content_length.filter(|&n| n > 0);
            if (200..300).contains(&code) && head.accept_ranges {
                if let Some(size) = size {
                    tracing::debug!(url, size, "HEAD reports range support");
                    return Ok(RemoteDescriptor {
                        total_size: Some(size),
                        supports_ranges: true,
                    });
                }
            }
            tracing::debug!(url, code, ?head, "HEAD inconclusive, trying range probe");
            true
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "HEAD failed, trying range probe");
            false
        }
    };

    match range_probe(url, opts) {
        Ok((206, content_range)) => {
            let total = content_range.as_deref().and_then(content_range_total);
            tracing::debug!(url, ?total, "range probe answered 206");
            Ok(RemoteDescriptor {
                total_size: total,
                supports_ranges: true,
            })
        }
        Ok((status, _)) => {
            tracing::debug!(url, status, "server does not support ranges");
            Ok(RemoteDescriptor::opaque())
        }
        Err(e) if head_reached => {
            tracing::warn!(url, error = %e, "range probe failed, falling back to single stream");
            Ok(RemoteDescriptor::opaque())
        }
        Err(source) => Err(DownloadError::Probe {
            url: url.to_string(),
            source,
        }),
    }
}
