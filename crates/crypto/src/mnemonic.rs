use bip39::{Language, Mnemonic as Bip39Mnemonic};

use crate::error::Error;

/// A BIP39 mnemonic phrase, wrapping the standalone `bip39` crate the same
/// way the teacher wallet's mnemonic module wraps BDK's bundled re-export —
/// the API surface this wallet actually needs (generate, parse, render,
/// derive the seed) is identical either way.
#[derive(Clone)]
pub struct Mnemonic(Bip39Mnemonic);

impl Mnemonic {
    /// Generates a fresh mnemonic. `word_count` must be one of BIP39's
    /// supported lengths (12, 15, 18, 21, 24); anything else is rejected by
    /// the underlying crate.
    pub fn generate(word_count: usize) -> Result<Self, Error> {
        let entropy_bits = word_count / 3 * 32;
        let mut entropy = vec![0u8; entropy_bits / 8];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut entropy);
        Ok(Self(Bip39Mnemonic::from_entropy_in(Language::English, &entropy)?))
    }

    pub fn from_phrase(phrase: &str) -> Result<Self, Error> {
        Ok(Self(Bip39Mnemonic::parse_in(Language::English, phrase)?))
    }

    pub fn as_phrase(&self) -> String {
        self.0.to_string()
    }

    pub fn words(&self) -> Vec<String> {
        self.0.words().map(str::to_string).collect()
    }

    /// Derives the 64-byte BIP39 seed, optionally with a passphrase. The
    /// wallet never actually sets a passphrase (spec §3 only ever seeds
    /// accounts from a bare wordlist), but the hook is free to carry.
    pub fn to_seed(&self, passphrase: &str) -> [u8; 64] {
        self.0.to_seed(passphrase)
    }
}

/// Every English BIP39 word starting with `prefix`, for interactive
/// autocomplete while a user is typing a restore phrase. Grounded in the
/// teacher wallet's `get_words_autocomplete` helper.
pub fn words_matching_prefix(prefix: &str) -> Vec<&'static str> {
    let prefix = prefix.to_lowercase();
    Language::English.word_list().iter().filter(|w| w.starts_with(&prefix)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_twelve_word_mnemonics() {
        let mnemonic = Mnemonic::generate(12).unwrap();
        assert_eq!(mnemonic.words().len(), 12);
    }

    #[test]
    fn round_trips_through_phrase() {
        let mnemonic = Mnemonic::generate(24).unwrap();
        let reparsed = Mnemonic::from_phrase(&mnemonic.as_phrase()).unwrap();
        assert_eq!(mnemonic.to_seed(""), reparsed.to_seed(""));
    }

    #[test]
    fn rejects_invalid_phrase() {
        assert!(Mnemonic::from_phrase("not a valid bip39 phrase at all").is_err());
    }

    #[test]
    fn autocomplete_filters_by_prefix() {
        let matches = words_matching_prefix("zeb");
        assert!(matches.contains(&"zebra"));
        assert!(matches.iter().all(|w| w.starts_with("zeb")));
    }
}
