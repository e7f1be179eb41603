#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid derivation: {0}")]
    Derivation(String),
    #[error("invalid extended key: {0}")]
    ExtendedKey(#[from] bitcoin::bip32::Error),
    #[error("invalid secret key")]
    SecretKey(#[from] bitcoin::secp256k1::Error),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("invalid stealth address: {0}")]
    StealthAddress(String),
    #[error("invalid mnemonic: {0}")]
    Mnemonic(#[from] bip39::Error),
    #[error("decryption failed")]
    Decryption,
    #[error("password too short, must be at least {0} characters")]
    ShortPassword(usize),
    #[error("script does not match the expected sign pattern")]
    ScriptPatternMismatch,
}
