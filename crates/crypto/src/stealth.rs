use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use rand::RngCore;

use crate::error::Error;
use crate::network::Network;

/// The two keypairs that make up a stealth pocket: a `scan` key used to spot
/// incoming payments and a `spend` key used to actually move the funds.
/// Matches the original `StealthReceiver`'s `scan_secret`/`spend_secret`
/// pair (spec §4.E) — this wallet only ever uses a single spend key, so we
/// don't model the `[spend_public, ...]` list form the original database
/// schema allowed for.
#[derive(Debug, Clone)]
pub struct StealthKeys {
    pub scan_secret: SecretKey,
    pub spend_secret: SecretKey,
}

impl StealthKeys {
    pub fn scan_public(&self) -> PublicKey {
        let secp = Secp256k1::new();
        PublicKey::from_secret_key(&secp, &self.scan_secret)
    }

    pub fn spend_public(&self) -> PublicKey {
        let secp = Secp256k1::new();
        PublicKey::from_secret_key(&secp, &self.spend_secret)
    }
}

/// A stealth address is the scan and spend public keys, base58check-encoded
/// together with a dedicated version byte (spec §4.E). The original encodes
/// a whole list of spend keys; since every pocket here has exactly one, we
/// simplify the wire form to `version || scan_pub(33) || spend_pub(33)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthAddress {
    pub network: Network,
    pub scan_public: PublicKey,
    pub spend_public: PublicKey,
}

impl StealthAddress {
    pub fn from_string(s: &str) -> Result<Self, Error> {
        let raw = bs58::decode(s).with_check(None).into_vec().map_err(|e| Error::StealthAddress(e.to_string()))?;
        if raw.len() != 67 {
            return Err(Error::StealthAddress(format!("expected 67 decoded bytes, got {}", raw.len())));
        }
        let version = raw[0];
        let network = match version {
            0x2a => Network::Mainnet,
            0x2b => Network::Testnet,
            _ => return Err(Error::StealthAddress(format!("unknown stealth version byte {version:#x}"))),
        };
        let scan_public = PublicKey::from_slice(&raw[1..34]).map_err(Error::SecretKey)?;
        let spend_public = PublicKey::from_slice(&raw[34..67]).map_err(Error::SecretKey)?;
        Ok(Self { network, scan_public, spend_public })
    }

    pub fn to_string(&self) -> String {
        let mut raw = Vec::with_capacity(67);
        raw.push(self.network.stealth_version());
        raw.extend_from_slice(&self.scan_public.serialize());
        raw.extend_from_slice(&self.spend_public.serialize());
        bs58::encode(raw).with_check().into_string()
    }
}

/// Sender-side stealth math: picks a fresh ephemeral keypair, derives the
/// one-time destination public key the recipient's `uncover_stealth` will
/// later recognize, and hands back the 32-byte x-coordinate that goes into
/// the `OP_RETURN` metadata output.
///
/// `destination_public = spend_public + hash(ephemeral_secret * scan_public) * G`
/// matches the original `StealthSender.send_to_stealth_address`.
pub fn send_to_stealth_address(address: &StealthAddress) -> Result<(PublicKey, PublicKey, [u8; 32]), Error> {
    send_to_stealth_address_with_secret(address, None)
}

/// As [`send_to_stealth_address`], but lets the caller pin the ephemeral
/// secret instead of generating one — the original sender's
/// `send_to_stealth_address(addr, ephemeral_private?)` accepts this for
/// deterministic tests (spec §4.E).
pub fn send_to_stealth_address_with_secret(
    address: &StealthAddress,
    ephemeral_secret: Option<SecretKey>,
) -> Result<(PublicKey, PublicKey, [u8; 32]), Error> {
    let secp = Secp256k1::new();
    let ephemeral_secret = match ephemeral_secret {
        Some(secret) => secret,
        None => {
            let mut rng = rand::thread_rng();
            let mut ephemeral_bytes = [0u8; 32];
            rng.fill_bytes(&mut ephemeral_bytes);
            SecretKey::from_slice(&ephemeral_bytes)?
        }
    };
    let ephemeral_public = PublicKey::from_secret_key(&secp, &ephemeral_secret);

    let destination_public = uncover_stealth(&ephemeral_secret, &address.scan_public, &address.spend_public)?;

    let x_only = ephemeral_public.serialize();
    let mut x = [0u8; 32];
    x.copy_from_slice(&x_only[1..]);

    Ok((ephemeral_public, destination_public, x))
}

/// Shared math between sender and receiver: given one side's secret and the
/// other side's public scan/spend keys, computes the shared secret
/// `hash(secret * other_scan_public)` and tweaks `base_public` by it.
fn uncover_stealth(secret: &SecretKey, scan_public: &PublicKey, base_public: &PublicKey) -> Result<PublicKey, Error> {
    let shared_point = scan_public.mul_tweak(&Secp256k1::new(), &Scalar::from(*secret))?;
    let shared_secret = bitcoin::hashes::sha256::Hash::hash(&shared_point.serialize());
    let tweak = Scalar::from_be_bytes(shared_secret.to_byte_array()).map_err(|_| {
        Error::StealthAddress("shared secret hash did not reduce to a valid scalar".to_string())
    })?;
    Ok(base_public.add_exp_tweak(&Secp256k1::new(), &tweak)?)
}

/// Receiver-side stealth math: given the ephemeral public key observed in a
/// transaction's metadata output, derives the one-time destination public
/// key this payment landed on.
pub fn uncover_stealth_public(
    ephemeral_public: &PublicKey,
    scan_secret: &SecretKey,
    spend_public: &PublicKey,
) -> Result<PublicKey, Error> {
    let secp = Secp256k1::new();
    let shared_point = ephemeral_public.mul_tweak(&secp, &Scalar::from(*scan_secret))?;
    let shared_secret = bitcoin::hashes::sha256::Hash::hash(&shared_point.serialize());
    let tweak = Scalar::from_be_bytes(shared_secret.to_byte_array()).map_err(|_| {
        Error::StealthAddress("shared secret hash did not reduce to a valid scalar".to_string())
    })?;
    Ok(spend_public.add_exp_tweak(&secp, &tweak)?)
}

/// Receiver-side: derives the one-time private key for a payment this
/// wallet owns, so it can spend it.
pub fn uncover_stealth_private(
    ephemeral_public: &PublicKey,
    scan_secret: &SecretKey,
    spend_secret: &SecretKey,
) -> Result<SecretKey, Error> {
    let secp = Secp256k1::new();
    let shared_point = ephemeral_public.mul_tweak(&secp, &Scalar::from(*scan_secret))?;
    let shared_secret = bitcoin::hashes::sha256::Hash::hash(&shared_point.serialize());
    let tweak = Scalar::from_be_bytes(shared_secret.to_byte_array()).map_err(|_| {
        Error::StealthAddress("shared secret hash did not reduce to a valid scalar".to_string())
    })?;
    Ok(spend_secret.add_tweak(&tweak)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys() -> StealthKeys {
        StealthKeys {
            scan_secret: SecretKey::from_slice(&[13u8; 32]).unwrap(),
            spend_secret: SecretKey::from_slice(&[14u8; 32]).unwrap(),
        }
    }

    #[test]
    fn stealth_address_round_trips_through_string() {
        let keys = test_keys();
        let address =
            StealthAddress { network: Network::Mainnet, scan_public: keys.scan_public(), spend_public: keys.spend_public() };
        let reparsed = StealthAddress::from_string(&address.to_string()).unwrap();
        assert_eq!(address, reparsed);
    }

    #[test]
    fn sender_and_receiver_agree_on_destination_public_key() {
        let keys = test_keys();
        let address =
            StealthAddress { network: Network::Mainnet, scan_public: keys.scan_public(), spend_public: keys.spend_public() };

        let (ephemeral_public, destination_public, _x) = send_to_stealth_address(&address).unwrap();

        let recovered = uncover_stealth_public(&ephemeral_public, &keys.scan_secret, &keys.spend_public()).unwrap();
        assert_eq!(destination_public, recovered);
    }

    #[test]
    fn receiver_private_key_matches_destination_public_key() {
        let secp = Secp256k1::new();
        let keys = test_keys();
        let address =
            StealthAddress { network: Network::Mainnet, scan_public: keys.scan_public(), spend_public: keys.spend_public() };

        let (ephemeral_public, destination_public, _x) = send_to_stealth_address(&address).unwrap();

        let recovered_secret =
            uncover_stealth_private(&ephemeral_public, &keys.scan_secret, &keys.spend_secret).unwrap();
        let recovered_public = PublicKey::from_secret_key(&secp, &recovered_secret);
        assert_eq!(destination_public, recovered_public);
    }
}
