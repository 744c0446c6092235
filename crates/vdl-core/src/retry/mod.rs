//! Caller-side retry of whole downloads.
//!
//! The downloader never retries on its own. Callers that want retries wrap
//! the entry point with [`run_with_retry`]; re-running is cheap because a
//! verified destination short-circuits and a partial `.part` is resumed.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
