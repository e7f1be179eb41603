use dw_crypto::{AddressKind as PaymentKind, PaymentAddress, StealthAddress};

/// Classification of an arbitrary address string, per spec §4.D. Unlike
/// [`dw_crypto::AddressKind`], this also covers the stealth and
/// invalid cases, since deciding between "payment" and "stealth" requires
/// trying both parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    MainnetP2kh,
    MainnetP2sh,
    TestnetP2kh,
    TestnetP2sh,
    OtherPayment,
    Stealth,
    Invalid,
}

/// Parses and classifies `s`: payment address first, then stealth address,
/// else invalid (spec §4.D algorithm).
#[derive(Debug, Clone)]
pub struct AddressValidator {
    address: String,
    payment: Option<PaymentAddress>,
    stealth: Option<StealthAddress>,
}

impl AddressValidator {
    pub fn new(s: &str) -> Self {
        if let Ok(payment) = PaymentAddress::from_string(s) {
            return Self { address: s.to_string(), payment: Some(payment), stealth: None };
        }
        if let Ok(stealth) = StealthAddress::from_string(s) {
            return Self { address: s.to_string(), payment: None, stealth: Some(stealth) };
        }
        Self { address: s.to_string(), payment: None, stealth: None }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn address_type(&self) -> AddressType {
        if let Some(payment) = &self.payment {
            return match payment.kind {
                PaymentKind::MainnetP2kh => AddressType::MainnetP2kh,
                PaymentKind::MainnetP2sh => AddressType::MainnetP2sh,
                PaymentKind::TestnetP2kh => AddressType::TestnetP2kh,
                PaymentKind::TestnetP2sh => AddressType::TestnetP2sh,
                PaymentKind::OtherPayment => AddressType::OtherPayment,
            };
        }
        if self.stealth.is_some() {
            return AddressType::Stealth;
        }
        AddressType::Invalid
    }

    pub fn payment(&self) -> Option<&PaymentAddress> {
        self.payment.as_ref()
    }

    pub fn stealth(&self) -> Option<&StealthAddress> {
        self.stealth.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.address_type() != AddressType::Invalid
    }

    pub fn is_payment(&self) -> bool {
        self.payment.is_some()
    }

    pub fn is_stealth(&self) -> bool {
        self.stealth.is_some()
    }

    pub fn is_p2kh(&self) -> bool {
        matches!(self.address_type(), AddressType::MainnetP2kh | AddressType::TestnetP2kh)
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self.address_type(), AddressType::MainnetP2kh | AddressType::MainnetP2sh)
            || self.stealth.as_ref().is_some_and(|s| !s.network.is_testnet())
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self.address_type(), AddressType::TestnetP2kh | AddressType::TestnetP2sh)
            || self.stealth.as_ref().is_some_and(|s| s.network.is_testnet())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
    use dw_crypto::Network;

    #[test]
    fn classifies_mainnet_p2kh() {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[6u8; 32]).unwrap();
        let pk = PublicKey::from_secret_key(&secp, &sk);
        let address = PaymentAddress::p2kh_from_public_key(&pk, Network::Mainnet).to_string();

        let validator = AddressValidator::new(&address);
        assert_eq!(validator.address_type(), AddressType::MainnetP2kh);
        assert!(validator.is_valid());
        assert!(validator.is_payment());
        assert!(!validator.is_stealth());
    }

    #[test]
    fn classifies_invalid_garbage() {
        let validator = AddressValidator::new("not an address");
        assert_eq!(validator.address_type(), AddressType::Invalid);
        assert!(!validator.is_valid());
    }

    #[test]
    fn classifies_stealth_address() {
        let scan_secret = SecretKey::from_slice(&[1u8; 32]).unwrap();
        let spend_secret = SecretKey::from_slice(&[2u8; 32]).unwrap();
        let secp = Secp256k1::new();
        let address = StealthAddress {
            network: Network::Testnet,
            scan_public: PublicKey::from_secret_key(&secp, &scan_secret),
            spend_public: PublicKey::from_secret_key(&secp, &spend_secret),
        };

        let validator = AddressValidator::new(&address.to_string());
        assert_eq!(validator.address_type(), AddressType::Stealth);
        assert!(validator.is_stealth());
        assert!(validator.is_testnet());
    }
}
