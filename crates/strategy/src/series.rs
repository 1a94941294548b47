//! Bounds-checked lookups relative to the end of a series.
//!
//! The newest entry of a fetched series is still forming, so decisions read
//! from the "last closed" entry one step before it. Offsets here count from
//! the end: offset 1 is the newest entry, offset 2 the last closed one.

use common::{Error, Result};

/// Offset of the last closed candle from the end of a series.
pub const LAST_CLOSED: usize = 2;

/// Entry `offset` positions from the end (`offset >= 1`), if the series is long enough.
pub fn back<T: Copy>(series: &[T], offset: usize) -> Option<T> {
    if offset == 0 || offset > series.len() {
        return None;
    }
    Some(series[series.len() - offset])
}

/// Like [`back`], but reports how much history was missing.
pub fn require_back<T: Copy>(series: &[T], offset: usize, what: &'static str) -> Result<T> {
    back(series, offset).ok_or(Error::InsufficientHistory {
        what,
        needed: offset,
        available: series.len(),
    })
}

/// The `len` entries immediately preceding the last closed one, oldest first.
///
/// The last closed entry itself is excluded.
pub fn window_before_last_closed<'a, T>(
    series: &'a [T],
    len: usize,
    what: &'static str,
) -> Result<&'a [T]> {
    let needed = len + LAST_CLOSED;
    if series.len() < needed {
        return Err(Error::InsufficientHistory {
            what,
            needed,
            available: series.len(),
        });
    }
    let end = series.len() - LAST_CLOSED;
    Ok(&series[end - len..end])
}
