use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::Error;

/// Current wall-clock time as a duration since the Unix epoch.
///
/// Kept as a free function (rather than called inline at every use site) so
/// the rebroadcast loop's 20-minute gate (spec §4.F loop 7) has a single seam
/// to swap in tests.
pub fn now() -> Result<Duration, Error> {
    SystemTime::now().duration_since(UNIX_EPOCH).map_err(|_| Error::ClockBeforeEpoch)
}

pub fn now_secs() -> u64 {
    now().map(|d| d.as_secs()).unwrap_or(0)
}
