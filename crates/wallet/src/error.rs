//! The wire-facing error taxonomy (spec §7). Every lower-layer error is
//! mapped onto exactly one of these identifiers so the daemon's JSON
//! responses never need ad-hoc string matching — `Error::wire_name` is the
//! single place the taxonomy is a projection rather than scattered logic.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("decryption of account file failed")]
    WrongPassword,
    #[error("supplied word list fails checksum: {0}")]
    InvalidBrainwallet(String),
    #[error("operation requires an active account")]
    NoActiveAccountSet,
    #[error("{0:?} already exists")]
    Duplicate(String),
    #[error("{0:?} not found")]
    NotFound(String),
    #[error("coin selection could not cover amount and fee")]
    NotEnoughFunds,
    #[error("destination address {0:?} is invalid for this account's network")]
    InvalidAddress(String),
    #[error("password too short, must be at least {0} characters")]
    ShortPassword(usize),
    #[error("a reorganisation-triggered rebuild is in progress")]
    UpdatingHistory,
    #[error("invalid value for setting {0:?}")]
    InvalidSetting(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The exact identifier the daemon puts on the wire (spec §7's
    /// taxonomy names). Errors that don't correspond to any named identifier
    /// (config/IO failures the daemon can't recover from) don't get a wire
    /// projection at all; the daemon logs and aborts the request instead.
    pub fn wire_name(&self) -> Option<&'static str> {
        match self {
            Error::WrongPassword => Some("wrong_password"),
            Error::InvalidBrainwallet(_) => Some("invalid_brainwallet"),
            Error::NoActiveAccountSet => Some("no_active_account_set"),
            Error::Duplicate(_) => Some("duplicate"),
            Error::NotFound(_) => Some("not_found"),
            Error::NotEnoughFunds => Some("not_enough_funds"),
            Error::InvalidAddress(_) => Some("invalid_address"),
            Error::ShortPassword(_) => Some("short_password"),
            Error::UpdatingHistory => Some("updating_history"),
            Error::InvalidSetting(_) | Error::Config(_) | Error::Io(_) => None,
        }
    }
}

impl From<dw_store::Error> for Error {
    fn from(e: dw_store::Error) -> Self {
        match e {
            dw_store::Error::WrongPassword => Error::WrongPassword,
            dw_store::Error::NotFound => Error::NotFound("account".to_string()),
            dw_store::Error::AlreadyExists => Error::Duplicate("account".to_string()),
            dw_store::Error::Crypto(inner) => Error::from(inner),
            other => Error::Config(other.to_string()),
        }
    }
}

impl From<dw_crypto::Error> for Error {
    fn from(e: dw_crypto::Error) -> Self {
        match e {
            dw_crypto::Error::Mnemonic(inner) => Error::InvalidBrainwallet(inner.to_string()),
            dw_crypto::Error::ShortPassword(min) => Error::ShortPassword(min),
            dw_crypto::Error::Decryption => Error::WrongPassword,
            other => Error::Config(other.to_string()),
        }
    }
}

impl From<dw_account::Error> for Error {
    fn from(e: dw_account::Error) -> Self {
        match e {
            dw_account::Error::DuplicatePocket(name) => Error::Duplicate(name),
            dw_account::Error::PocketNotFound(name) => Error::NotFound(name),
            dw_account::Error::InvalidBrainwallet(msg) => Error::InvalidBrainwallet(msg),
            dw_account::Error::Crypto(inner) => Error::from(inner),
            dw_account::Error::NoUnusedAddress => Error::Config("no unused address available".to_string()),
        }
    }
}

impl From<dw_spend::Error> for Error {
    fn from(e: dw_spend::Error) -> Self {
        match e {
            dw_spend::Error::UpdatingHistory => Error::UpdatingHistory,
            dw_spend::Error::InvalidAddress(addr) => Error::InvalidAddress(addr),
            dw_spend::Error::NotEnoughFunds => Error::NotEnoughFunds,
            dw_spend::Error::PocketNotFound(name) => Error::NotFound(name),
            dw_spend::Error::Account(inner) => Error::from(inner),
            dw_spend::Error::Crypto(inner) => Error::from(inner),
            other => Error::Config(other.to_string()),
        }
    }
}

impl From<dw_explorer::Error> for Error {
    fn from(e: dw_explorer::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
