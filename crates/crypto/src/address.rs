use bitcoin::hashes::{hash160, Hash};
use bitcoin::secp256k1::PublicKey;

use crate::error::Error;
use crate::network::Network;

/// Classification of a decoded payment address, mirroring the
/// `AddressType` taxonomy the original address validator exposed
/// (`mainnet_p2kh`, `mainnet_p2sh`, `testnet_p2kh`, `testnet_p2sh`,
/// `other_payment`, plus `stealth`/`invalid` handled one layer up by
/// whoever classifies a raw string as payment-vs-stealth-vs-garbage).
///
/// `bitcoin::Address::from_str` only recognizes the handful of version
/// bytes Bitcoin mainnet/testnet actually use, so it can't tell us "this
/// decoded fine but isn't a Bitcoin address" — it just errors. We decode
/// base58check ourselves so `OtherPayment` addresses (valid base58check,
/// unrecognized version byte) can still be accepted as opaque payment
/// destinations per spec §4.D.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    MainnetP2kh,
    MainnetP2sh,
    TestnetP2kh,
    TestnetP2sh,
    OtherPayment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAddress {
    pub kind: AddressKind,
    pub version: u8,
    pub hash: [u8; 20],
}

impl PaymentAddress {
    pub fn from_string(s: &str) -> Result<Self, Error> {
        let raw = bs58::decode(s).with_check(None).into_vec().map_err(|e| Error::Address(e.to_string()))?;
        if raw.len() != 21 {
            return Err(Error::Address(format!("expected 21 decoded bytes, got {}", raw.len())));
        }
        let version = raw[0];
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&raw[1..]);

        let kind = match version {
            0x00 => AddressKind::MainnetP2kh,
            0x05 => AddressKind::MainnetP2sh,
            0x6f => AddressKind::TestnetP2kh,
            0xc4 => AddressKind::TestnetP2sh,
            _ => AddressKind::OtherPayment,
        };

        Ok(Self { kind, version, hash })
    }

    pub fn to_string(&self) -> String {
        let mut raw = Vec::with_capacity(21);
        raw.push(self.version);
        raw.extend_from_slice(&self.hash);
        bs58::encode(raw).with_check().into_string()
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self.kind, AddressKind::MainnetP2kh | AddressKind::MainnetP2sh)
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self.kind, AddressKind::TestnetP2kh | AddressKind::TestnetP2sh)
    }

    /// Builds the P2KH address for `public_key` on `network`, per
    /// `hash160(pubkey)` base58check-encoded with the network's P2KH
    /// version byte (spec §4.D).
    pub fn p2kh_from_public_key(public_key: &PublicKey, network: Network) -> Self {
        let hash = hash160::Hash::hash(&public_key.serialize());
        let kind = if network.is_testnet() { AddressKind::TestnetP2kh } else { AddressKind::MainnetP2kh };
        Self { kind, version: network.p2kh_version(), hash: hash.to_byte_array() }
    }

    /// Extracts the address a previous output's script pays to, for a
    /// standard P2KH or P2SH script (spec §4.G step 6 `extract`). Parsed by
    /// hand rather than via `bitcoin::Script::is_p2pkh`/`p2pkh_public_key_hash`
    /// style helpers, since this wallet needs the network's *own* version
    /// byte attached (mainnet vs. testnet), not `rust-bitcoin`'s notion of
    /// which network a script belongs to.
    pub fn extract_from_script(script: &bitcoin::ScriptBuf, network: Network) -> Option<Self> {
        use bitcoin::blockdata::opcodes::all as opcodes;
        let bytes = script.as_bytes();

        if bytes.len() == 25
            && bytes[0] == opcodes::OP_DUP.to_u8()
            && bytes[1] == opcodes::OP_HASH160.to_u8()
            && bytes[2] == 20
            && bytes[23] == opcodes::OP_EQUALVERIFY.to_u8()
            && bytes[24] == opcodes::OP_CHECKSIG.to_u8()
        {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&bytes[3..23]);
            let kind = if network.is_testnet() { AddressKind::TestnetP2kh } else { AddressKind::MainnetP2kh };
            return Some(Self { kind, version: network.p2kh_version(), hash });
        }

        if bytes.len() == 23 && bytes[0] == opcodes::OP_HASH160.to_u8() && bytes[1] == 20 && bytes[22] == opcodes::OP_EQUAL.to_u8()
        {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&bytes[2..22]);
            let kind = if network.is_testnet() { AddressKind::TestnetP2sh } else { AddressKind::MainnetP2sh };
            return Some(Self { kind, version: network.p2sh_version(), hash });
        }

        None
    }
}
