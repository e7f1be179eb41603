#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pocket name {0:?} already exists")]
    DuplicatePocket(String),
    #[error("pocket {0:?} not found")]
    PocketNotFound(String),
    #[error(transparent)]
    Crypto(#[from] dw_crypto::Error),
    #[error("invalid word list: {0}")]
    InvalidBrainwallet(String),
    #[error("no pocket has an unused address left")]
    NoUnusedAddress,
}
