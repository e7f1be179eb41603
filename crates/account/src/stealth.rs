use bitcoin::secp256k1::{PublicKey, SecretKey};
use dw_crypto::{script, stealth as crypto_stealth, Network, PaymentAddress, StealthAddress};

use crate::error::Error;
use crate::model::StealthState;

/// Receiver-side operations for one pocket's stealth keypair (spec §4.E).
pub struct StealthReceiver<'a> {
    state: &'a StealthState,
}

impl<'a> StealthReceiver<'a> {
    pub fn new(state: &'a StealthState) -> Self {
        Self { state }
    }

    pub fn generate_stealth_address(&self, network: Network) -> StealthAddress {
        let keys = self.state.keys();
        StealthAddress { network, scan_public: keys.scan_public(), spend_public: keys.spend_public() }
    }

    /// Computes the candidate receive address for `ephemeral_public`, or
    /// `None` if the math rejects (out-of-range tweak).
    pub fn derive_address(&self, ephemeral_public: &PublicKey, network: Network) -> Option<String> {
        let keys = self.state.keys();
        let destination = crypto_stealth::uncover_stealth_public(ephemeral_public, &keys.scan_secret, &keys.spend_public()).ok()?;
        Some(PaymentAddress::p2kh_from_public_key(&destination, network).to_string())
    }

    pub fn derive_private(&self, ephemeral_public: &PublicKey) -> Result<SecretKey, Error> {
        let keys = self.state.keys();
        Ok(crypto_stealth::uncover_stealth_private(ephemeral_public, &keys.scan_secret, &keys.spend_secret)?)
    }
}

/// Sender-side: derives a fresh ephemeral keypair (or uses the one
/// supplied, for deterministic tests), the one-time destination p2kh
/// address, and the `OP_RETURN` metadata script to attach alongside the
/// payment output (spec §4.E).
pub fn send_to_stealth_address(
    address: &StealthAddress,
    ephemeral_secret: Option<SecretKey>,
    network: Network,
) -> Result<(bitcoin::ScriptBuf, String), Error> {
    let (_ephemeral_public, destination_public, x) =
        crypto_stealth::send_to_stealth_address_with_secret(address, ephemeral_secret)?;

    let mut padding = [0u8; 8];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut padding);
    let meta_script = script::stealth_meta_script(&x, &padding);

    let send_address = PaymentAddress::p2kh_from_public_key(&destination_public, network).to_string();

    Ok((meta_script, send_address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_and_receiver_agree_on_recovered_private_key() {
        use bitcoin::secp256k1::Secp256k1;

        let scan_secret = SecretKey::from_slice(&[21u8; 32]).unwrap();
        let spend_secret = SecretKey::from_slice(&[22u8; 32]).unwrap();
        let keys = dw_crypto::StealthKeys { scan_secret, spend_secret };
        let state = StealthState::new(&keys, Network::Mainnet);

        let receiver = StealthReceiver::new(&state);
        let address = receiver.generate_stealth_address(Network::Mainnet);

        let ephemeral_secret = SecretKey::from_slice(&[30u8; 32]).unwrap();
        let secp = Secp256k1::new();
        let ephemeral_public = PublicKey::from_secret_key(&secp, &ephemeral_secret);

        let (_meta_script, send_address) = send_to_stealth_address(&address, Some(ephemeral_secret), Network::Mainnet).unwrap();

        let recovered_private = receiver.derive_private(&ephemeral_public).unwrap();
        let recovered_public = PublicKey::from_secret_key(&secp, &recovered_private);
        let recovered_address = PaymentAddress::p2kh_from_public_key(&recovered_public, Network::Mainnet).to_string();

        assert_eq!(send_address, recovered_address);
    }
}
