#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("history is currently being rebuilt after a reorganisation")]
    UpdatingHistory,
    #[error("destination address {0:?} is invalid")]
    InvalidAddress(String),
    #[error("not enough funds to cover the requested amount and fee")]
    NotEnoughFunds,
    #[error("pocket {0:?} not found")]
    PocketNotFound(String),
    #[error("no private key found for a chosen input's address")]
    MissingKey,
    #[error("previous transaction for a chosen input is not in the cache")]
    MissingPreviousTransaction,
    #[error("previous output script is not a recognised P2KH/P2SH pattern")]
    UnrecognisedPreviousOutput,
    #[error("signed input script does not match the expected P2KH sign pattern")]
    SignPatternMismatch,
    #[error("no unused address available to receive change")]
    NoChangeAddress,
    #[error("failed to compute a legacy sighash: {0}")]
    Sighash(String),
    #[error(transparent)]
    Crypto(#[from] dw_crypto::Error),
    #[error(transparent)]
    Account(#[from] dw_account::Error),
    #[error(transparent)]
    Explorer(#[from] dw_explorer::Error),
}
