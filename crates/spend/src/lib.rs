//! The spend pipeline (spec §4.G): validates destinations, selects inputs
//! with a deterministic greedy strategy, assembles and signs the
//! transaction (including stealth metadata outputs), broadcasts it, and
//! journals the resulting pending payment.
//!
//! Shares the same [`dw_sync::SyncContext`] the control loops run against
//! rather than owning a separate lock, per spec §5: no extra
//! synchronisation is needed because both sides run on the same
//! cooperative scheduler, and the pipeline only ever checks (never sets)
//! the `updating_history` flag the reorg loop maintains.

pub mod error;
pub mod pipeline;
pub mod selection;

pub use error::Error;
pub use pipeline::{send, Destination};
