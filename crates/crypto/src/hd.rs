use bitcoin::bip32::{ChildNumber, Xpriv, Xpub};
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::Network as BtcNetwork;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::network::Network;

/// A hardened-only HD private key.
///
/// The original wallet never mixes normal and hardened children: every path
/// in spec §3/§4.C (`main_key = root_key / H(index)`, `scan = main / H(0) /
/// H(0)`, `spend = main / H(0) / H(1)`) is built one hardened step at a time,
/// so this wrapper only exposes [`HdPrivate::derive_hardened`] rather than
/// the full BIP32 path grammar `bitcoin::bip32` supports.
#[derive(Clone)]
pub struct HdPrivate {
    xpriv: Xpriv,
    network: Network,
}

impl HdPrivate {
    pub fn from_seed(seed: &[u8], network: Network) -> Result<Self, Error> {
        let xpriv = Xpriv::new_master(BtcNetwork::from(network), seed)?;
        Ok(Self { xpriv, network })
    }

    pub fn from_string(s: &str, network: Network) -> Result<Self, Error> {
        let xpriv: Xpriv = s.parse().map_err(|_| Error::Derivation(s.to_string()))?;
        Ok(Self { xpriv, network })
    }

    pub fn to_string(&self) -> String {
        self.xpriv.to_string()
    }

    /// Derives the hardened child at `index`, i.e. `self / H(index)`.
    pub fn derive_hardened(&self, index: u32) -> Result<Self, Error> {
        let secp = Secp256k1::new();
        let child_number = ChildNumber::from_hardened_idx(index)
            .map_err(|_| Error::Derivation(format!("index {index} is not a valid hardened index")))?;
        let xpriv = self.xpriv.derive_priv(&secp, &[child_number])?;
        Ok(Self { xpriv, network: self.network })
    }

    pub fn secret_key(&self) -> SecretKey {
        self.xpriv.private_key
    }

    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        Xpub::from_priv(&secp, &self.xpriv).public_key
    }

    pub fn network(&self) -> Network {
        self.network
    }
}

impl std::fmt::Debug for HdPrivate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdPrivate").field("fingerprint", &self.xpriv.fingerprint(&Secp256k1::new())).finish()
    }
}

/// Serialized the same way the account store serializes every other key
/// material: as its string form, since `Xpriv`'s `Display`/`FromStr` is
/// already the canonical wire representation BIP32 tooling expects.
#[derive(Serialize, Deserialize)]
struct HdPrivateRepr {
    network: Network,
    xpriv: String,
}

impl Serialize for HdPrivate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        HdPrivateRepr { network: self.network, xpriv: self.xpriv.to_string() }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HdPrivate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = HdPrivateRepr::deserialize(deserializer)?;
        let xpriv: Xpriv = repr.xpriv.parse().map_err(serde::de::Error::custom)?;
        Ok(Self { xpriv, network: repr.network })
    }
}
