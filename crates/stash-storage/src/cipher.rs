use std::fmt;

use aes::Aes256;
use base64::{engine::general_purpose, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::Sha512;
use stash_core::{Result, StorageError};
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// PBKDF2 rounds used for every derivation.
pub const KDF_ITERATIONS: u32 = 1_000_000;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// AES-256 key and CBC IV derived from a password and salt.
///
/// The IV is derived rather than random, so equal plaintexts under the same
/// password and salt produce equal ciphertexts. There is no integrity tag.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl KeyMaterial {
    /// PBKDF2-HMAC-SHA512 over the UTF-8 bytes of `password` and `salt`.
    /// The first 32 output bytes form the key, the next 16 the IV.
    pub fn derive(password: &str, salt: &str) -> Self {
        Self::derive_with_rounds(password, salt, KDF_ITERATIONS)
    }

    fn derive_with_rounds(password: &str, salt: &str, rounds: u32) -> Self {
        let mut okm = [0u8; KEY_LEN + IV_LEN];
        pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), rounds, &mut okm);

        let mut material = Self {
            key: [0u8; KEY_LEN],
            iv: [0u8; IV_LEN],
        };
        material.key.copy_from_slice(&okm[..KEY_LEN]);
        material.iv.copy_from_slice(&okm[KEY_LEN..]);
        okm.zeroize();
        material
    }
}

// Never print key bytes.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}

/// Encrypts and decrypts text payloads with already-derived key material.
#[derive(Debug, Clone)]
pub struct TextCipher {
    material: KeyMaterial,
}

impl TextCipher {
    /// Derive key material once; reuse the cipher for every value of an instance.
    pub fn new(password: &str, salt: &str) -> Self {
        Self::from_material(KeyMaterial::derive(password, salt))
    }

    pub fn from_material(material: KeyMaterial) -> Self {
        Self { material }
    }

    /// Encrypt and encode as standard, padded base64.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256CbcEnc::new_from_slices(&self.material.key, &self.material.iv)
            .map_err(|e| crypto_err(format!("cipher init failed: {e}")))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Ok(general_purpose::STANDARD.encode(ciphertext))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let ciphertext = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| crypto_err(format!("ciphertext decode failed: {e}")))?;

        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(crypto_err(format!(
                "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
                ciphertext.len()
            )));
        }

        let cipher = Aes256CbcDec::new_from_slices(&self.material.key, &self.material.iv)
            .map_err(|e| crypto_err(format!("cipher init failed: {e}")))?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|e| crypto_err(format!("decrypt failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| crypto_err(format!("decrypted payload is not UTF-8: {e}")))
    }
}

/// One-shot encryption; derives key material on every call.
pub fn encrypt(password: &str, salt: &str, plaintext: &str) -> Result<String> {
    TextCipher::new(password, salt).encrypt(plaintext)
}

/// One-shot decryption; derives key material on every call.
pub fn decrypt(password: &str, salt: &str, encoded: &str) -> Result<String> {
    TextCipher::new(password, salt).decrypt(encoded)
}

fn crypto_err(reason: String) -> StorageError {
    StorageError::Crypto { reason }
}
