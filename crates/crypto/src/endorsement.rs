use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::sighash::EcdsaSighashType;

use crate::error::Error;

/// An ECDSA signature plus trailing sighash-type byte, i.e. a legacy
/// "endorsement" as it's pushed onto a P2KH input's scriptSig. Every
/// input this wallet signs uses `SIGHASH_ALL` (spec §4.G) so the type
/// byte is fixed, but we still append it explicitly rather than hardcode
/// it at every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endorsement(pub Vec<u8>);

impl Endorsement {
    pub fn sign(secret_key: &SecretKey, sighash: &[u8; 32]) -> Result<Self, Error> {
        let secp = Secp256k1::new();
        let message = Message::from_digest(*sighash);
        let signature = secp.sign_ecdsa(&message, secret_key);
        let mut bytes = signature.serialize_der().to_vec();
        bytes.push(EcdsaSighashType::All as u8);
        Ok(Self(bytes))
    }

    pub fn verify(&self, public_key: &PublicKey, sighash: &[u8; 32]) -> Result<bool, Error> {
        let secp = Secp256k1::new();
        let (sig_bytes, sighash_byte) =
            self.0.split_at(self.0.len().checked_sub(1).ok_or_else(|| Error::Derivation("empty endorsement".into()))?);
        if sighash_byte != [EcdsaSighashType::All as u8] {
            return Err(Error::Derivation("unsupported sighash type".into()));
        }
        let signature = Signature::from_der(sig_bytes)?;
        let message = Message::from_digest(*sighash);
        Ok(secp.verify_ecdsa(&message, &signature, public_key).is_ok())
    }
}
