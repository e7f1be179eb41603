//! Encrypted single-file persistence for an account (spec §4.B).
//!
//! Each account lives at `<accounts_dir>/<name>`: canonical CBOR plaintext
//! (deterministic field order from `Account`'s fixed struct layout, and
//! deterministic key order within it since every persisted collection is a
//! `BTreeMap`) sealed under a password with `dw_crypto::aead`.

pub mod error;

use std::fs;
use std::path::PathBuf;

use dw_account::Account;
use dw_crypto::aead::{self, Sealed};

pub use error::Error;

pub struct AccountStore {
    accounts_dir: PathBuf,
}

impl AccountStore {
    pub fn new(accounts_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let accounts_dir = accounts_dir.into();
        fs::create_dir_all(&accounts_dir)?;
        Ok(Self { accounts_dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.accounts_dir.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn list(&self) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.accounts_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Encodes `account` to canonical CBOR, seals it under `password`, and
    /// atomically replaces `<accounts_dir>/<name>` (write-to-temp then
    /// rename, so a crash mid-write never leaves a half-written file).
    pub fn save(&self, name: &str, password: &str, account: &Account) -> Result<(), Error> {
        let mut plaintext = Vec::new();
        ciborium::ser::into_writer(account, &mut plaintext)?;

        let sealed = aead::seal(password, &plaintext)?;
        let bytes = sealed.to_bytes();

        let final_path = self.path_for(name);
        let tmp_path = final_path.with_extension("tmp");
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    pub fn create(&self, name: &str, password: &str, account: &Account) -> Result<(), Error> {
        if self.exists(name) {
            return Err(Error::AlreadyExists);
        }
        self.save(name, password, account)
    }

    /// Loads and decrypts `<accounts_dir>/<name>`. A wrong password and a
    /// corrupted file are both surfaced as [`Error::WrongPassword`], since
    /// the AEAD tag can't tell them apart — matching spec §4.B.
    pub fn load(&self, name: &str, password: &str) -> Result<Account, Error> {
        let path = self.path_for(name);
        let bytes = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound
            } else {
                Error::Io(e)
            }
        })?;

        let sealed = Sealed::from_bytes(&bytes).map_err(|_| Error::WrongPassword)?;
        let plaintext = aead::open(password, &sealed).map_err(|_| Error::WrongPassword)?;

        let account: Account = ciborium::de::from_reader(plaintext.as_slice())?;
        Ok(account)
    }

    pub fn delete(&self, name: &str) -> Result<(), Error> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dw_account::Account;

    const TEST_WORDLIST: &[&str] =
        &["install", "oppose", "unique", "steel", "opera", "next", "add", "town", "warfare", "leave", "salt", "chimney"];

    fn test_account() -> Account {
        let wordlist = TEST_WORDLIST.iter().map(|s| s.to_string()).collect();
        let mut account = Account::from_wordlist(wordlist, true).unwrap();
        account.add_pocket("master", 5).unwrap();
        account
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(dir.path()).unwrap();
        let account = test_account();

        store.create("alice", "correct horse battery staple", &account).unwrap();
        let loaded = store.load("alice", "correct horse battery staple").unwrap();

        assert_eq!(loaded.wordlist, account.wordlist);
        assert_eq!(loaded.pocket("master").unwrap().keys.len(), account.pocket("master").unwrap().keys.len());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(dir.path()).unwrap();
        store.create("alice", "correct horse battery staple", &test_account()).unwrap();

        assert!(matches!(store.load("alice", "totally wrong password"), Err(Error::WrongPassword)));
        assert!(store.load("alice", "correct horse battery staple").is_ok());
    }

    #[test]
    fn missing_account_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(dir.path()).unwrap();
        assert!(matches!(store.load("ghost", "password"), Err(Error::NotFound)));
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(dir.path()).unwrap();
        store.create("alice", "correct horse battery staple", &test_account()).unwrap();
        assert!(matches!(store.create("alice", "correct horse battery staple", &test_account()), Err(Error::AlreadyExists)));
    }

    #[test]
    fn list_returns_sorted_account_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(dir.path()).unwrap();
        store.create("bob", "correct horse battery staple", &test_account()).unwrap();
        store.create("alice", "correct horse battery staple", &test_account()).unwrap();

        assert_eq!(store.list().unwrap(), vec!["alice".to_string(), "bob".to_string()]);
    }
}
