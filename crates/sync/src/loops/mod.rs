//! One module per control loop (spec §4.F), each exposing an `update(&SyncContext)`
//! tick function the scheduler drives.

pub mod gap_limit;
pub mod history_scan;
pub mod mark_confirmed;
pub mod rebroadcast;
pub mod reorg;
pub mod stealth_scan;
pub mod tx_cache_fill;
