use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

use crate::error::Error;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;

/// The minimum account password length. The original wallet rejects
/// anything shorter outright rather than letting a weak KDF input through
/// (spec §4.B `short_password` error).
pub const MIN_PASSWORD_LEN: usize = 8;

/// A sealed blob: random salt, random nonce, and the ciphertext (which
/// includes ChaCha20-Poly1305's 16-byte authentication tag). This is
/// exactly what gets written to an account's file on disk.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl Sealed {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < SALT_LEN + NONCE_LEN {
            return Err(Error::Decryption);
        }
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[..SALT_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[SALT_LEN..SALT_LEN + NONCE_LEN]);
        let ciphertext = bytes[SALT_LEN + NONCE_LEN..].to_vec();
        Ok(Self { salt, nonce, ciphertext })
    }
}

fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> Result<Key, Error> {
    let mut key_bytes = [0u8; 32];
    Argon2::default().hash_password_into(password.as_bytes(), salt, &mut key_bytes).map_err(|_| Error::Decryption)?;
    Ok(*Key::from_slice(&key_bytes))
}

/// Seals `plaintext` (the account's canonical CBOR encoding) under
/// `password`, generating a fresh random salt and nonce. Spec §4.B: a
/// password shorter than [`MIN_PASSWORD_LEN`] is rejected before we even
/// touch the KDF.
pub fn seal(password: &str, plaintext: &[u8]) -> Result<Sealed, Error> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::ShortPassword(MIN_PASSWORD_LEN));
    }

    let mut rng = rand::thread_rng();
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt)?;
    let cipher = ChaCha20Poly1305::new(&key);
    let ciphertext = cipher.encrypt(Nonce::from_slice(&nonce_bytes), plaintext).map_err(|_| Error::Decryption)?;

    Ok(Sealed { salt, nonce: nonce_bytes, ciphertext })
}

/// Opens a sealed blob with `password`. A wrong password surfaces as
/// [`Error::Decryption`] (the AEAD tag fails to verify) — the caller maps
/// this onto the wire `wrong_password` error, which is indistinguishable
/// from "the file is corrupted" by design, matching the original wallet's
/// behavior.
pub fn open(password: &str, sealed: &Sealed) -> Result<Vec<u8>, Error> {
    let key = derive_key(password, &sealed.salt)?;
    let cipher = ChaCha20Poly1305::new(&key);
    cipher.decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice()).map_err(|_| Error::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_open_round_trips() {
        let sealed = seal("correct horse battery staple", b"hello darkwallet").unwrap();
        let opened = open("correct horse battery staple", &sealed).unwrap();
        assert_eq!(opened, b"hello darkwallet");
    }

    #[test]
    fn wrong_password_fails_to_open() {
        let sealed = seal("correct horse battery staple", b"hello darkwallet").unwrap();
        assert!(open("wrong password entirely", &sealed).is_err());
    }

    #[test]
    fn short_password_rejected_before_sealing() {
        assert!(matches!(seal("short", b"data"), Err(Error::ShortPassword(_))));
    }

    #[test]
    fn serialized_blob_round_trips() {
        let sealed = seal("correct horse battery staple", b"hello darkwallet").unwrap();
        let bytes = sealed.to_bytes();
        let reparsed = Sealed::from_bytes(&bytes).unwrap();
        let opened = open("correct horse battery staple", &reparsed).unwrap();
        assert_eq!(opened, b"hello darkwallet");
    }
}
