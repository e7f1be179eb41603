/// Which Bitcoin network an account's keys and addresses belong to. Kept as
/// a plain two-valued enum (rather than reusing `bitcoin::Network`'s wider
/// set of variants) because every account-level invariant in this codebase
/// only ever branches on mainnet vs. testnet (spec §3's `is_testnet` flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn from_is_testnet(is_testnet: bool) -> Self {
        if is_testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    pub fn is_testnet(self) -> bool {
        matches!(self, Network::Testnet)
    }

    pub fn p2kh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6f,
        }
    }

    pub fn p2sh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet => 0xc4,
        }
    }

    pub fn stealth_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x2a,
            Network::Testnet => 0x2b,
        }
    }
}

impl From<Network> for bitcoin::Network {
    fn from(value: Network) -> Self {
        match value {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
        }
    }
}
