//! The in-memory account model: pockets, address index, history, the
//! transaction cache, and the sent-payments journal, plus the address
//! validator and stealth sender/receiver operations built on top of
//! `dw-crypto`'s primitives.

pub mod address_validator;
pub mod error;
pub mod model;
pub mod stealth;

pub use address_validator::{AddressType, AddressValidator};
pub use error::Error;
pub use model::{Account, ChainIndex, HistoryRow, NormalKey, Pocket, PocketId, SentPayment, SpendRef, StealthState, TxHash};
