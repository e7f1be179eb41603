//! Crypto primitives facade for darkwallet: HD key derivation, payment and
//! stealth address encoding, output-script construction, ECDSA endorsements,
//! BIP39 mnemonics, and the password-based AEAD used to seal an account on
//! disk. Nothing in this crate knows about accounts, pockets, or the wire
//! protocol — it only deals in keys, bytes, and scripts.

pub mod address;
pub mod aead;
pub mod endorsement;
pub mod error;
pub mod hd;
pub mod mnemonic;
pub mod network;
pub mod script;
pub mod stealth;

pub use address::{AddressKind, PaymentAddress};
pub use endorsement::Endorsement;
pub use error::Error;
pub use hd::HdPrivate;
pub use mnemonic::Mnemonic;
pub use network::Network;
pub use stealth::{StealthAddress, StealthKeys};
