#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("wrong password")]
    WrongPassword,
    #[error("account file not found")]
    NotFound,
    #[error("account file already exists")]
    AlreadyExists,
    #[error(transparent)]
    Crypto(#[from] dw_crypto::Error),
    #[error("failed to serialise account state: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),
    #[error("failed to deserialise account state: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
