//! The wallet facade (spec §4.H): the single operation table `dw-daemon`
//! dispatches onto. Wires together the encrypted account store, the
//! explorer-backed control loops, and the spend pipeline behind the account
//! lifecycle (`create_account`/`set_account`/`delete_account`/`stop`) and
//! the per-account operations (`balance`, `history`, `send`, ...).

pub mod config;
pub mod error;
pub mod facade;

pub use config::Settings;
pub use error::Error;
pub use facade::{HistoryEntry, PendingPayment, Wallet};
