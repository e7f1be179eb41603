//! The wallet facade (spec §4.H): the one operation table everything else
//! in this workspace exists to serve. Owns the account store, the loaded
//! config, and — at most one at a time — the in-memory state of whichever
//! account is currently active: its locked [`Account`], its explorer
//! client, and the [`Scheduler`] running its six control loops.
//!
//! Keeping the password of the active account in memory (rather than only
//! at unlock time) is a deliberate choice: the facade needs to re-seal the
//! account file on every save the control loops and spend pipeline trigger,
//! and `stop`/account-switch both need to flush a final save without asking
//! the caller to re-supply the password (spec §4.H `set_account` loads and
//! decrypts once; nothing in the operation table re-prompts for it later).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dw_account::{Account, HistoryRow, PocketId};
use dw_explorer::{esplora::EsploraClient, ExplorerClient};
use dw_spend::Destination;
use dw_store::AccountStore;
use dw_sync::{Scheduler, SyncContext};
use tokio::sync::{Mutex, RwLock};

use crate::config::Settings;
use crate::error::Error;

struct ActiveAccount {
    name: String,
    password: String,
    account: Arc<RwLock<Account>>,
    ctx: Arc<SyncContext>,
    scheduler: Scheduler,
}

pub struct Wallet {
    store: AccountStore,
    settings_path: PathBuf,
    settings: Mutex<Settings>,
    active: Mutex<Option<ActiveAccount>>,
}

/// One history row as handed back across the facade boundary: plain data,
/// no lock held, no reference into the account model (spec §4.H `history`).
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub address: String,
    pub is_output: bool,
    pub hash: [u8; 32],
    pub index: u32,
    pub height: Option<u64>,
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct PendingPayment {
    pub tx_hash: [u8; 32],
    pub destinations: Vec<(String, u64)>,
    pub created_at: u64,
}

impl Wallet {
    /// Loads (or defaults) the config at `settings_path` and opens the
    /// account store at `accounts_dir`. No account is active yet.
    pub fn open(accounts_dir: impl Into<PathBuf>, settings_path: impl Into<PathBuf>) -> Result<Self, Error> {
        let settings_path = settings_path.into();
        let settings = if settings_path.is_file() { Settings::load(&settings_path)? } else { Settings::default() };

        Ok(Self {
            store: AccountStore::new(accounts_dir.into())?,
            settings_path,
            settings: Mutex::new(settings),
            active: Mutex::new(None),
        })
    }

    fn explorer_for(settings: &Settings, is_testnet: bool) -> Result<Arc<dyn ExplorerClient>, Error> {
        let url = if is_testnet { &settings.testnet_url } else { &settings.explorer_url };
        let client = EsploraClient::new(url.clone(), Duration::from_secs(settings.query_expire_time))?;
        Ok(Arc::new(client))
    }

    /// Flushes the currently active account to disk (if any) and cancels
    /// its control loops, leaving no account active.
    async fn deactivate(&self) -> Result<(), Error> {
        let mut slot = self.active.lock().await;
        if let Some(active) = slot.take() {
            let account = active.account.read().await;
            self.store.save(&active.name, &active.password, &account)?;
            drop(account);
            active.scheduler.stop();
        }
        Ok(())
    }

    async fn activate(&self, name: &str, password: &str, account: Account) -> Result<(), Error> {
        self.deactivate().await?;

        let settings = self.settings.lock().await.clone();
        let explorer = Self::explorer_for(&settings, account.is_testnet)?;
        let account = Arc::new(RwLock::new(account));
        let ctx = Arc::new(SyncContext::new(account.clone(), explorer, settings.gap_limit));
        let scheduler = Scheduler::spawn(ctx.clone());

        *self.active.lock().await =
            Some(ActiveAccount { name: name.to_string(), password: password.to_string(), account, ctx, scheduler });
        Ok(())
    }

    async fn require_active(&self) -> Result<tokio::sync::MappedMutexGuard<'_, ActiveAccount>, Error> {
        let guard = self.active.lock().await;
        tokio::sync::MutexGuard::try_map(guard, |slot| slot.as_mut()).map_err(|_| Error::NoActiveAccountSet)
    }

    fn resolve_pocket(account: &Account, pocket: Option<&str>) -> Result<Option<PocketId>, Error> {
        match pocket {
            Some(name) => Ok(Some(account.pocket(name).ok_or_else(|| Error::NotFound(name.to_string()))?.id)),
            None => Ok(None),
        }
    }

    pub async fn create_account(&self, name: &str, password: &str, testnet: bool) -> Result<Vec<String>, Error> {
        if self.store.exists(name) {
            return Err(Error::Duplicate(name.to_string()));
        }

        let mnemonic = dw_crypto::Mnemonic::generate(12)?;
        let wordlist = mnemonic.words();
        let mut account = Account::from_wordlist(wordlist.clone(), testnet)?;

        let settings = self.settings.lock().await.clone();
        account.add_pocket(&settings.master_pocket_name, settings.gap_limit)?;

        self.store.create(name, password, &account)?;
        self.activate(name, password, account).await?;

        tracing::info!(account = name, testnet, "created account");
        Ok(wordlist)
    }

    pub async fn restore_account(&self, name: &str, wordlist: Vec<String>, password: &str, testnet: bool) -> Result<(), Error> {
        if self.store.exists(name) {
            return Err(Error::Duplicate(name.to_string()));
        }

        let mut account = Account::from_wordlist(wordlist, testnet)?;
        let settings = self.settings.lock().await.clone();
        account.add_pocket(&settings.master_pocket_name, settings.gap_limit)?;

        self.store.create(name, password, &account)?;
        self.activate(name, password, account).await?;

        tracing::info!(account = name, testnet, "restored account");
        Ok(())
    }

    pub async fn set_account(&self, name: &str, password: &str) -> Result<(), Error> {
        let account = self.store.load(name, password)?;
        self.activate(name, password, account).await?;
        tracing::info!(account = name, "activated account");
        Ok(())
    }

    pub async fn delete_account(&self, name: &str) -> Result<(), Error> {
        let mut slot = self.active.lock().await;
        if let Some(active) = slot.as_ref() {
            if active.name == name {
                let active = slot.take().unwrap();
                active.scheduler.stop();
            }
        }
        drop(slot);
        self.store.delete(name)?;
        tracing::info!(account = name, "deleted account");
        Ok(())
    }

    pub async fn list_accounts(&self) -> Result<(Option<String>, Vec<String>), Error> {
        let active_name = self.active.lock().await.as_ref().map(|a| a.name.clone());
        Ok((active_name, self.store.list()?))
    }

    pub async fn seed(&self) -> Result<Vec<String>, Error> {
        let active = self.require_active().await?;
        Ok(active.account.read().await.wordlist.clone())
    }

    pub async fn list_pockets(&self) -> Result<Vec<String>, Error> {
        let active = self.require_active().await?;
        let account = active.account.read().await;
        Ok(account.pockets().iter().map(|p| p.name.clone()).collect())
    }

    pub async fn create_pocket(&self, name: &str) -> Result<(), Error> {
        let active = self.require_active().await?;
        let gap_limit = active.ctx.gap_limit;
        active.account.write().await.add_pocket(name, gap_limit)?;
        Ok(())
    }

    pub async fn delete_pocket(&self, name: &str) -> Result<(), Error> {
        let active = self.require_active().await?;
        active.account.write().await.delete_pocket(name)?;
        Ok(())
    }

    pub async fn balance(&self, pocket: Option<&str>) -> Result<i64, Error> {
        let active = self.require_active().await?;
        let account = active.account.read().await;
        if active.ctx.is_updating_history() {
            return Err(Error::UpdatingHistory);
        }
        let pocket_id = Self::resolve_pocket(&account, pocket)?;
        Ok(account.balance(pocket_id))
    }

    /// Ordered by height then index, oldest first; unconfirmed rows
    /// (`height = None`) sort last. Rows belonging to one of this account's
    /// own sent-payment transactions, at an address the payment didn't
    /// explicitly name as a destination, are its change output and are
    /// elided (spec §4.H `history`).
    pub async fn history(&self, pocket: Option<&str>) -> Result<Vec<HistoryEntry>, Error> {
        let active = self.require_active().await?;
        let account = active.account.read().await;
        if active.ctx.is_updating_history() {
            return Err(Error::UpdatingHistory);
        }
        let pocket_id = Self::resolve_pocket(&account, pocket)?;

        let change_hashes: std::collections::HashMap<[u8; 32], Vec<String>> = account
            .sent_payments()
            .iter()
            .map(|p| (p.tx_hash, p.destinations.iter().map(|(addr, _)| addr.clone()).collect()))
            .collect();

        let is_change = |row: &HistoryRow| {
            row.is_output
                && change_hashes.get(&row.hash).is_some_and(|destinations| !destinations.contains(&row.address))
        };

        let mut rows: Vec<&HistoryRow> = match pocket_id {
            Some(id) => account.history_in_pocket(id).collect(),
            None => account.all_history().collect(),
        };
        rows.retain(|row| !is_change(row));
        rows.sort_by_key(|row| (row.height.unwrap_or(u64::MAX), row.index));

        Ok(rows
            .into_iter()
            .map(|row| HistoryEntry {
                address: row.address.clone(),
                is_output: row.is_output,
                hash: row.hash,
                index: row.index,
                height: row.height,
                value: row.value,
            })
            .collect())
    }

    /// Defaults to the configured master pocket when none is named; spec
    /// §4.H leaves `receive`'s no-pocket behaviour unspecified (unlike
    /// `stealth`, which explicitly falls back to a random pocket).
    pub async fn receive(&self, pocket: Option<&str>) -> Result<Vec<String>, Error> {
        let active = self.require_active().await?;
        let account = active.account.read().await;
        let settings = self.settings.lock().await;

        let name = pocket.unwrap_or(&settings.master_pocket_name);
        let pocket_id = account.pocket(name).ok_or_else(|| Error::NotFound(name.to_string()))?.id;
        Ok(account.unused_addresses_in_pocket(pocket_id))
    }

    pub async fn stealth(&self, pocket: Option<&str>) -> Result<String, Error> {
        let active = self.require_active().await?;
        let account = active.account.read().await;

        let chosen = match pocket {
            Some(name) => account.pocket(name).ok_or_else(|| Error::NotFound(name.to_string()))?,
            None => account.random_pocket().ok_or_else(|| Error::NotFound("no pockets exist".to_string()))?,
        };
        Ok(chosen.stealth.stealth_address.clone())
    }

    pub async fn send(&self, destinations: Vec<(String, u64)>, from_pocket: Option<&str>, fee: u64) -> Result<[u8; 32], Error> {
        let active = self.require_active().await?;
        let destinations = destinations.into_iter().map(|(address, value)| Destination { address, value }).collect();
        let hash = dw_spend::send(&active.ctx, destinations, from_pocket, fee).await?;
        Ok(hash)
    }

    pub async fn pending_payments(&self, pocket: Option<&str>) -> Result<Vec<PendingPayment>, Error> {
        let active = self.require_active().await?;
        let account = active.account.read().await;
        let pocket_id = Self::resolve_pocket(&account, pocket)?;

        Ok(account
            .pending_payments(pocket_id)
            .into_iter()
            .map(|p| PendingPayment { tx_hash: p.tx_hash, destinations: p.destinations.clone(), created_at: p.created_at })
            .collect())
    }

    pub async fn get_height(&self) -> Result<u64, Error> {
        let active = self.require_active().await?;
        Ok(active.ctx.explorer.last_height().await?)
    }

    pub async fn get_setting(&self, name: &str) -> Result<String, Error> {
        self.settings.lock().await.get(name)
    }

    pub async fn set_setting(&self, name: &str, value: &str) -> Result<(), Error> {
        let mut settings = self.settings.lock().await;
        settings.set(name, value)?;
        settings.save(&self.settings_path)?;
        Ok(())
    }

    /// Shuts the active account's control loops and flushes its state to
    /// disk, releasing its explorer client. Leaves the wallet free to
    /// `set_account`/`create_account` again (spec §4.H `stop`).
    pub async fn stop(&self) -> Result<(), Error> {
        self.deactivate().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_wallet() -> (tempfile::TempDir, Wallet) {
        let dir = tempfile::tempdir().unwrap();
        let wallet = Wallet::open(dir.path().join("accounts"), dir.path().join("settings.toml")).unwrap();
        (dir, wallet)
    }

    #[tokio::test]
    async fn operations_require_an_active_account() {
        let (_dir, wallet) = test_wallet();
        assert!(matches!(wallet.balance(None).await, Err(Error::NoActiveAccountSet)));
        assert!(matches!(wallet.seed().await, Err(Error::NoActiveAccountSet)));
    }

    #[tokio::test]
    async fn create_account_activates_it_with_a_master_pocket() {
        let (_dir, wallet) = test_wallet();
        let words = wallet.create_account("alice", "correct horse battery staple", true).await.unwrap();
        assert_eq!(words.len(), 12);

        let (active, names) = wallet.list_accounts().await.unwrap();
        assert_eq!(active, Some("alice".to_string()));
        assert_eq!(names, vec!["alice".to_string()]);

        assert_eq!(wallet.list_pockets().await.unwrap(), vec!["master".to_string()]);
        assert_eq!(wallet.balance(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_account_name_is_rejected() {
        let (_dir, wallet) = test_wallet();
        wallet.create_account("alice", "correct horse battery staple", true).await.unwrap();
        let result = wallet.create_account("alice", "correct horse battery staple", true).await;
        assert!(matches!(result, Err(Error::Duplicate(_))));
    }

    #[tokio::test]
    async fn restore_recreates_the_same_addresses_as_the_original() {
        let (_dir, wallet) = test_wallet();
        let words = wallet.create_account("alice", "correct horse battery staple", true).await.unwrap();
        let original_receive = wallet.receive(None).await.unwrap();
        wallet.stop().await.unwrap();

        wallet.delete_account("alice").await.unwrap();
        wallet.restore_account("alice", words, "correct horse battery staple", true).await.unwrap();
        let restored_receive = wallet.receive(None).await.unwrap();

        assert_eq!(original_receive, restored_receive);
    }

    #[tokio::test]
    async fn set_account_after_stop_reopens_the_saved_account() {
        let (_dir, wallet) = test_wallet();
        wallet.create_account("alice", "correct horse battery staple", true).await.unwrap();
        wallet.create_pocket("savings").await.unwrap();
        wallet.stop().await.unwrap();

        assert!(matches!(wallet.list_pockets().await, Err(Error::NoActiveAccountSet)));

        wallet.set_account("alice", "correct horse battery staple").await.unwrap();
        let mut pockets = wallet.list_pockets().await.unwrap();
        pockets.sort();
        assert_eq!(pockets, vec!["master".to_string(), "savings".to_string()]);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (_dir, wallet) = test_wallet();
        wallet.create_account("alice", "correct horse battery staple", true).await.unwrap();
        wallet.stop().await.unwrap();

        let result = wallet.set_account("alice", "totally the wrong password").await;
        assert!(matches!(result, Err(Error::WrongPassword)));
    }

    #[tokio::test]
    async fn get_and_set_setting_round_trip_and_persist() {
        let (dir, wallet) = test_wallet();
        wallet.set_setting("gap_limit", "8").await.unwrap();
        assert_eq!(wallet.get_setting("gap_limit").await.unwrap(), "8");

        let reloaded = Wallet::open(dir.path().join("accounts"), dir.path().join("settings.toml")).unwrap();
        assert_eq!(reloaded.get_setting("gap_limit").await.unwrap(), "8");
    }

    #[tokio::test]
    async fn send_with_no_funds_is_not_enough_funds() {
        use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};

        let (_dir, wallet) = test_wallet();
        wallet.create_account("alice", "correct horse battery staple", true).await.unwrap();

        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret);
        let address = dw_crypto::PaymentAddress::p2kh_from_public_key(&public, dw_crypto::Network::Testnet).to_string();

        let result = wallet.send(vec![(address, 1000)], None, 10).await;
        assert!(matches!(result, Err(Error::NotEnoughFunds)));
    }
}
