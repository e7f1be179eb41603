use std::collections::BTreeMap;

use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use dw_crypto::{HdPrivate, Mnemonic, Network, PaymentAddress, StealthAddress, StealthKeys};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub type TxHash = [u8; 32];

/// `(height, block_hash)` — the chain-index watermark an account has
/// synced up to. `None` before the first detector tick (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIndex {
    pub height: u64,
    pub hash: TxHash,
}

/// Opaque identifier for a pocket, stable for the account's lifetime. A
/// plain index into `Account.pockets` rather than an object reference, per
/// the flat-table discipline spec §9 calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PocketId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalKey {
    pub index: u32,
    pub address: String,
    pub secret: SecretKey,
}

/// The stealth half of a pocket: its scan/spend keypair, its published
/// stealth address, and every one-time private key this pocket has
/// recovered so far, indexed by the derived receive address (spec §3/§4.E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StealthState {
    pub scan_secret: SecretKey,
    pub spend_secret: SecretKey,
    pub stealth_address: String,
    pub recovered_keys: BTreeMap<String, SecretKey>,
}

impl StealthState {
    pub fn new(keys: &StealthKeys, network: Network) -> Self {
        let address =
            StealthAddress { network, scan_public: keys.scan_public(), spend_public: keys.spend_public() };
        Self {
            scan_secret: keys.scan_secret,
            spend_secret: keys.spend_secret,
            stealth_address: address.to_string(),
            recovered_keys: BTreeMap::new(),
        }
    }

    pub fn keys(&self) -> StealthKeys {
        StealthKeys { scan_secret: self.scan_secret, spend_secret: self.spend_secret }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pocket {
    pub id: PocketId,
    pub name: String,
    pub index: u32,
    pub main_key: HdPrivate,
    pub keys: Vec<NormalKey>,
    pub address_index: BTreeMap<String, u32>,
    pub stealth: StealthState,
}

impl Pocket {
    /// Highest index with at least one history row, or `-1` if the pocket
    /// has never received anything (spec §4.F loop 6).
    pub fn max_used_index(&self, history: &BTreeMap<String, Vec<HistoryRow>>) -> i64 {
        self.keys
            .iter()
            .filter(|k| history.get(&k.address).is_some_and(|rows| !rows.is_empty()))
            .map(|k| k.index as i64)
            .max()
            .unwrap_or(-1)
    }

    pub fn unused_addresses(&self, history: &BTreeMap<String, Vec<HistoryRow>>) -> Vec<String> {
        self.keys
            .iter()
            .filter(|k| !history.get(&k.address).is_some_and(|rows| !rows.is_empty()))
            .map(|k| k.address.clone())
            .collect()
    }
}

/// One row of a `(pocket, address)`'s history: either a received output or
/// a spend of a prior output (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub pocket_id: PocketId,
    pub address: String,
    pub is_output: bool,
    pub hash: TxHash,
    pub index: u32,
    pub height: Option<u64>,
    pub value: i64,
    pub spend: Option<SpendRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendRef {
    pub hash: TxHash,
    pub index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentPayment {
    pub tx_hash: TxHash,
    pub raw_tx: Vec<u8>,
    pub pocket: Option<PocketId>,
    pub is_confirmed: bool,
    pub created_at: u64,
    pub destinations: Vec<(String, u64)>,
    /// Fee-bump replacement slot; always `None` today (spec §9, carried
    /// forward from the original schema's `replaced_by` column).
    pub replaced_by: Option<TxHash>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub wordlist: Vec<String>,
    pub is_testnet: bool,
    pub current_index: Option<ChainIndex>,
    pockets: Vec<Pocket>,
    next_pocket_id: u32,
    history: BTreeMap<String, Vec<HistoryRow>>,
    tx_cache: BTreeMap<TxHash, Vec<u8>>,
    sent_payments: Vec<SentPayment>,
    /// `address -> last_updated_height`, spec §3's `AddressUpdateTracker`,
    /// persisted as its own field rather than re-derived from history.
    pub tracker: BTreeMap<String, u64>,
}

impl Account {
    pub fn network(&self) -> Network {
        Network::from_is_testnet(self.is_testnet)
    }

    pub fn root_key(&self) -> Result<HdPrivate, Error> {
        let mnemonic = Mnemonic::from_phrase(&self.wordlist.join(" "))?;
        let seed = mnemonic.to_seed("");
        Ok(HdPrivate::from_seed(&seed, self.network())?)
    }

    pub fn from_wordlist(wordlist: Vec<String>, is_testnet: bool) -> Result<Self, Error> {
        Mnemonic::from_phrase(&wordlist.join(" "))
            .map_err(|e| Error::InvalidBrainwallet(e.to_string()))?;

        Ok(Self {
            wordlist,
            is_testnet,
            current_index: None,
            pockets: Vec::new(),
            next_pocket_id: 0,
            history: BTreeMap::new(),
            tx_cache: BTreeMap::new(),
            sent_payments: Vec::new(),
            tracker: BTreeMap::new(),
        })
    }

    pub fn pockets(&self) -> &[Pocket] {
        &self.pockets
    }

    pub fn pocket(&self, name: &str) -> Option<&Pocket> {
        self.pockets.iter().find(|p| p.name == name)
    }

    pub fn pocket_mut(&mut self, name: &str) -> Option<&mut Pocket> {
        self.pockets.iter_mut().find(|p| p.name == name)
    }

    pub fn pocket_by_id(&self, id: PocketId) -> Option<&Pocket> {
        self.pockets.iter().find(|p| p.id == id)
    }

    pub fn pocket_by_id_mut(&mut self, id: PocketId) -> Option<&mut Pocket> {
        self.pockets.iter_mut().find(|p| p.id == id)
    }

    /// Creates a pocket at the next dense index, deriving its `main_key`,
    /// stealth keypair and stealth address, with `gap_limit` normal keys
    /// already generated (spec §3, §4.H `create_pocket`).
    pub fn add_pocket(&mut self, name: &str, gap_limit: u32) -> Result<PocketId, Error> {
        if self.pocket(name).is_some() {
            return Err(Error::DuplicatePocket(name.to_string()));
        }

        // Derived from the monotonic pocket counter, not `self.pockets.len()`:
        // len() shrinks on delete_pocket and would otherwise hand a later
        // pocket the same HD index (and thus the same keys) as one still in
        // use.
        let index = self.next_pocket_id;
        let root_key = self.root_key()?;
        let main_key = root_key.derive_hardened(index)?;

        let scan_base = main_key.derive_hardened(0)?;
        let scan_secret = scan_base.derive_hardened(0)?.secret_key();
        let spend_secret = scan_base.derive_hardened(1)?.secret_key();
        let stealth_keys = StealthKeys { scan_secret, spend_secret };
        let stealth = StealthState::new(&stealth_keys, self.network());

        let id = PocketId(self.next_pocket_id);
        self.next_pocket_id += 1;

        let mut pocket =
            Pocket { id, name: name.to_string(), index, main_key, keys: Vec::new(), address_index: BTreeMap::new(), stealth };
        Self::grow_keys(&mut pocket, gap_limit)?;
        self.pockets.push(pocket);

        Ok(id)
    }

    pub fn delete_pocket(&mut self, name: &str) -> Result<(), Error> {
        let position = self.pockets.iter().position(|p| p.name == name).ok_or_else(|| Error::PocketNotFound(name.to_string()))?;
        self.pockets.remove(position);
        Ok(())
    }

    /// Appends normal keys at `p.main_key / H(i)` until the pocket has
    /// `target_len` of them (spec §3).
    fn grow_keys(pocket: &mut Pocket, target_len: u32) -> Result<(), Error> {
        while (pocket.keys.len() as u32) < target_len {
            let i = pocket.keys.len() as u32;
            let key = pocket.main_key.derive_hardened(i)?;
            let secret = key.secret_key();
            let secp = Secp256k1::new();
            let public = PublicKey::from_secret_key(&secp, &secret);
            let address = PaymentAddress::p2kh_from_public_key(&public, pocket.main_key.network()).to_string();
            pocket.address_index.insert(address.clone(), i);
            pocket.keys.push(NormalKey { index: i, address, secret });
        }
        Ok(())
    }

    /// Ensures every pocket has `max_used_index + 1 + gap_limit` normal
    /// keys (spec §4.F loop 6, §8 property 3).
    pub fn ensure_gap_limit(&mut self, gap_limit: u32) -> Result<(), Error> {
        let targets: Vec<u32> = self
            .pockets
            .iter()
            .map(|p| {
                let max_used = p.max_used_index(&self.history);
                (max_used + 1 + gap_limit as i64).max(gap_limit as i64) as u32
            })
            .collect();
        for (pocket, target) in self.pockets.iter_mut().zip(targets) {
            Self::grow_keys(pocket, target)?;
        }
        Ok(())
    }

    /// Searches normal keys, then stealth-recovered keys, across every
    /// pocket for `address` (spec §4.C `find_key`).
    pub fn find_key(&self, address: &str) -> Option<SecretKey> {
        for pocket in &self.pockets {
            if let Some(key) = pocket.keys.iter().find(|k| k.address == address) {
                return Some(key.secret);
            }
            if let Some(secret) = pocket.stealth.recovered_keys.get(address) {
                return Some(*secret);
            }
        }
        None
    }

    /// Unused normal-key addresses in one pocket, per [`Pocket::unused_addresses`]
    /// (spec §4.H `receive`, §4.G step 5's change-address pick).
    pub fn unused_addresses_in_pocket(&self, pocket_id: PocketId) -> Vec<String> {
        self.pocket_by_id(pocket_id).map(|p| p.unused_addresses(&self.history)).unwrap_or_default()
    }

    pub fn history_for(&self, address: &str) -> &[HistoryRow] {
        self.history.get(address).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn replace_history(&mut self, address: &str, rows: Vec<HistoryRow>) {
        self.history.insert(address.to_string(), rows);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.tracker.clear();
    }

    pub fn all_history(&self) -> impl Iterator<Item = &HistoryRow> {
        self.history.values().flatten()
    }

    pub fn history_in_pocket<'a>(&'a self, pocket_id: PocketId) -> impl Iterator<Item = &'a HistoryRow> + 'a {
        self.history.values().flatten().filter(move |row| row.pocket_id == pocket_id)
    }

    /// UTXOs: unspent output rows (spec §4.C `all_unspent_inputs`, §8
    /// property 5), optionally restricted to one pocket.
    pub fn all_unspent_inputs(&self, pocket_id: Option<PocketId>) -> Vec<&HistoryRow> {
        self.history
            .values()
            .flatten()
            .filter(|row| row.is_output && row.spend.is_none())
            .filter(|row| pocket_id.is_none_or(|id| row.pocket_id == id))
            .collect()
    }

    pub fn balance(&self, pocket_id: Option<PocketId>) -> i64 {
        self.all_unspent_inputs(pocket_id).iter().map(|row| row.value).sum()
    }

    pub fn tx_cache_get(&self, hash: &TxHash) -> Option<&Vec<u8>> {
        self.tx_cache.get(hash)
    }

    pub fn tx_cache_insert(&mut self, hash: TxHash, raw: Vec<u8>) {
        self.tx_cache.insert(hash, raw);
    }

    pub fn tx_cache_missing<'a>(&self, hashes: impl Iterator<Item = &'a TxHash>) -> Vec<TxHash> {
        hashes.filter(|h| !self.tx_cache.contains_key(*h)).copied().collect()
    }

    pub fn save_pending_transaction(
        &mut self,
        destinations: Vec<(String, u64)>,
        tx_hash: TxHash,
        raw_tx: Vec<u8>,
        pocket: Option<PocketId>,
        created_at: u64,
    ) {
        self.sent_payments.push(SentPayment {
            tx_hash,
            raw_tx,
            pocket,
            is_confirmed: false,
            created_at,
            destinations,
            replaced_by: None,
        });
    }

    pub fn sent_payments(&self) -> &[SentPayment] {
        &self.sent_payments
    }

    pub fn pending_payments(&self, pocket_id: Option<PocketId>) -> Vec<&SentPayment> {
        self.sent_payments
            .iter()
            .filter(|p| !p.is_confirmed)
            .filter(|p| pocket_id.is_none_or(|id| p.pocket == Some(id)))
            .collect()
    }

    /// Flips `is_confirmed` for any sent payment whose `tx_hash` now appears
    /// as the spending transaction of one of our own outputs (spec §4.C
    /// `mark_any_confirmed_sent_payments`, §4.F loop 4).
    ///
    /// An output row's `spend` back-reference names the transaction that
    /// consumed it; the synthesized spend *row* that accompanies it instead
    /// shares the output's own `(hash, index)` with a negated value (§8
    /// property 4), so confirmation is read off the back-reference, not the
    /// spend row's own `hash` field.
    pub fn mark_any_confirmed_sent_payments(&mut self) {
        let confirmed_hashes: std::collections::HashSet<TxHash> =
            self.history.values().flatten().filter(|row| row.is_output).filter_map(|row| row.spend.map(|s| s.hash)).collect();

        for payment in &mut self.sent_payments {
            if !payment.is_confirmed && confirmed_hashes.contains(&payment.tx_hash) {
                payment.is_confirmed = true;
            }
        }
    }

    pub fn compare_indexes(&self, other: ChainIndex) -> bool {
        self.current_index == Some(other)
    }

    /// A uniformly random pocket, for `stealth(pocket=None)` and the spend
    /// pipeline's change-address selection (spec §4.G step 5, §4.H `stealth`).
    pub fn random_pocket(&self) -> Option<&Pocket> {
        use rand::seq::SliceRandom;
        self.pockets.choose(&mut rand::thread_rng())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_WORDLIST: &[&str] =
        &["install", "oppose", "unique", "steel", "opera", "next", "add", "town", "warfare", "leave", "salt", "chimney"];

    fn wordlist() -> Vec<String> {
        TEST_WORDLIST.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn same_wordlist_derives_identical_main_keys() {
        let mut a = Account::from_wordlist(wordlist(), true).unwrap();
        let mut b = Account::from_wordlist(wordlist(), true).unwrap();
        a.add_pocket("master", 5).unwrap();
        b.add_pocket("master", 5).unwrap();

        assert_eq!(a.pocket("master").unwrap().main_key.secret_key(), b.pocket("master").unwrap().main_key.secret_key());
        assert_eq!(a.pocket("master").unwrap().keys[0].address, b.pocket("master").unwrap().keys[0].address);
    }

    #[test]
    fn fresh_pocket_has_gap_limit_unused_addresses() {
        let mut account = Account::from_wordlist(wordlist(), true).unwrap();
        account.add_pocket("master", 5).unwrap();
        let pocket = account.pocket("master").unwrap();
        assert_eq!(pocket.keys.len(), 5);
        assert_eq!(pocket.unused_addresses(&BTreeMap::new()).len(), 5);
    }

    #[test]
    fn duplicate_pocket_name_rejected() {
        let mut account = Account::from_wordlist(wordlist(), true).unwrap();
        account.add_pocket("master", 5).unwrap();
        assert!(matches!(account.add_pocket("master", 5), Err(Error::DuplicatePocket(_))));
    }

    #[test]
    fn gap_limit_grows_after_an_address_is_used() {
        let mut account = Account::from_wordlist(wordlist(), true).unwrap();
        account.add_pocket("master", 5).unwrap();
        let pocket_id = account.pocket("master").unwrap().id;
        let used_address = account.pocket("master").unwrap().keys[2].address.clone();

        account.replace_history(
            &used_address,
            vec![HistoryRow {
                pocket_id,
                address: used_address.clone(),
                is_output: true,
                hash: [1u8; 32],
                index: 0,
                height: Some(100),
                value: 1000,
                spend: None,
            }],
        );

        account.ensure_gap_limit(5).unwrap();
        assert_eq!(account.pocket("master").unwrap().keys.len(), 2 + 1 + 5);
    }

    #[test]
    fn unspent_inputs_match_unspent_output_rows() {
        let mut account = Account::from_wordlist(wordlist(), true).unwrap();
        account.add_pocket("master", 5).unwrap();
        let pocket_id = account.pocket("master").unwrap().id;
        let address = account.pocket("master").unwrap().keys[0].address.clone();

        account.replace_history(
            &address,
            vec![
                HistoryRow {
                    pocket_id,
                    address: address.clone(),
                    is_output: true,
                    hash: [1u8; 32],
                    index: 0,
                    height: Some(100),
                    value: 1000,
                    spend: None,
                },
                HistoryRow {
                    pocket_id,
                    address: address.clone(),
                    is_output: true,
                    hash: [2u8; 32],
                    index: 0,
                    height: Some(101),
                    value: 2000,
                    spend: Some(SpendRef { hash: [3u8; 32], index: 0 }),
                },
            ],
        );

        let utxos = account.all_unspent_inputs(None);
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].hash, [1u8; 32]);
        assert_eq!(account.balance(None), 1000);
    }
}
