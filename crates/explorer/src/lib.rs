//! The block-explorer collaborator boundary (spec §6): an async trait the
//! rest of the core depends on, a concrete Esplora-backed implementation,
//! and an in-memory mock used by `dw-sync`/`dw-spend`/`dw-wallet` tests —
//! the same role `andromeda_api`'s test wallet-mock plays for the teacher's
//! higher-level tests, except here the boundary is a trait rather than a
//! fixed HTTP client, so the test double just implements it directly.

pub mod error;
pub mod esplora;
pub mod mock;

pub use error::Error;

pub type TxHash = [u8; 32];

/// A transaction output point: which transaction, which output index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPoint {
    pub hash: TxHash,
    pub index: u32,
}

/// One row of an address's history: the output that paid it, and — if
/// spent — the point and height of the spend (spec §6 `history`).
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub output_point: OutputPoint,
    pub output_height: Option<u64>,
    pub value: u64,
    pub spend_point: Option<OutputPoint>,
    pub spend_height: Option<u64>,
}

/// One row returned by a stealth scan: the ephemeral public key's
/// x-coordinate, the hash160 of the derived receive address, and the
/// transaction it appeared in (spec §4.F loop 2, §6 `stealth`).
#[derive(Debug, Clone)]
pub struct StealthEntry {
    pub ephemeral_key_x: [u8; 32],
    pub address_hash: [u8; 20],
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub height: u64,
    pub hash: TxHash,
    pub previous_block_hash: TxHash,
    pub raw: Vec<u8>,
}

/// The external collaborator every control loop and the spend pipeline
/// consumes. Implementations are free to retry/cache internally; callers
/// treat every method as a single logical request with its own timeout.
#[async_trait::async_trait]
pub trait ExplorerClient: Send + Sync {
    async fn last_height(&self) -> Result<u64, Error>;
    async fn block_header(&self, height: u64) -> Result<BlockHeader, Error>;
    async fn history(&self, address: &str) -> Result<Vec<HistoryEntry>, Error>;
    async fn transaction(&self, hash: &TxHash) -> Result<Vec<u8>, Error>;
    async fn stealth(&self, prefix: &[u8], from_height: u64) -> Result<Vec<StealthEntry>, Error>;
    async fn broadcast(&self, raw_tx: &[u8]) -> Result<(), Error>;
}
