//! HTTP Range request parsing module
//!
//! Single-range `bytes=` header evaluation per RFC 7233. Multi-range
//! requests and malformed headers are ignored and answered with the full
//! representation.

/// An inclusive byte range, already clamped to the file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

/// How a request's `Range` header should be answered.
#[derive(Debug)]
pub enum RangeOutcome {
    /// No usable range: send the full body with 200.
    Full,
    /// Send 206 with the given slice.
    Partial(ByteRange),
    /// Send 416.
    Unsatisfiable,
}

/// Evaluate a `Range` header against the file size.
///
/// Supported forms: `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
pub fn evaluate(range_header: Option<&str>, file_size: usize) -> RangeOutcome {
    let Some(header) = range_header else {
        return RangeOutcome::Full;
    };
    let Some(spec) = header.strip_prefix("bytes=") else {
        return RangeOutcome::Full; // unknown unit
    };
    // Single range only
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        suffix_range(end_str, file_size)
    } else {
        bounded_range(start_str, end_str, file_size)
    }
}

/// `bytes=-suffix`: the last `suffix` bytes of the file.
fn suffix_range(suffix_str: &str, file_size: usize) -> RangeOutcome {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if suffix == 0 || file_size == 0 {
        return RangeOutcome::Unsatisfiable;
    }
    RangeOutcome::Partial(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// `bytes=start-` or `bytes=start-end`, end clamped to the file size.
fn bounded_range(start_str: &str, end_str: &str, file_size: usize) -> RangeOutcome {
    let Ok(start) = start_str.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if start >= file_size {
        return RangeOutcome::Unsatisfiable;
    }
    let end = if end_str.is_empty() {
        file_size - 1
    } else {
        match end_str.parse::<usize>() {
            Ok(e) => e.min(file_size - 1),
            Err(_) => return RangeOutcome::Full,
        }
    };
    if start > end {
        return RangeOutcome::Unsatisfiable;
    }
    RangeOutcome::Partial(ByteRange { start, end })
}
