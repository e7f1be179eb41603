use std::fmt::Debug;

/// Errors that can occur in this crate's own helpers. Most failures in the
/// workspace belong to a more specific per-crate `Error` enum; this one only
/// covers what `dw-common` itself does.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("system clock is set before the Unix epoch")]
    ClockBeforeEpoch,
}
