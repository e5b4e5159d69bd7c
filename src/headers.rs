//! Response header size accounting
//!
//! A reverse proxy in front of the service rejects responses whose headers
//! reach 4kb, so every successful response is measured the same way: the
//! byte length of each header name plus its value, summed over every header
//! line. Repeated headers count once per line.

use crate::error::{ProbeError, ProbeResult};
use crate::logging::log_debug;
use reqwest::header::HeaderMap;

/// Combined header name + value bytes
pub fn response_header_size(headers: &HeaderMap) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.as_bytes().len())
        .sum()
}

/// Measure `headers` and fail if they reach `limit` bytes
///
/// Returns the measured size when it is strictly below the limit.
pub fn check_response_headers(headers: &HeaderMap, limit: usize) -> ProbeResult<usize> {
    let size = response_header_size(headers);
    log_debug!(
        header_bytes = size,
        header_count = headers.len(),
        limit = limit,
        "Measured response headers"
    );

    if size >= limit {
        return Err(ProbeError::header_limit_exceeded(size, limit));
    }
    Ok(size)
}
