//! Encryption utilities for configuration at rest.
//!
//! Responsibilities:
//! - Provide AES-256-GCM encryption and decryption.
//! - Handle key derivation using Argon2id.
//! - Define the on-disk envelope format for encrypted config files.
//!
//! Does NOT handle:
//! - File resolution or the config registry (handled by loader.rs).
//! - Obtaining the password (the loader reads it from the environment).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use rand::RngExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::ENVELOPE_VERSION;

/// Errors that can occur during encryption operations.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid nonce size: expected 12 bytes")]
    InvalidNonceSize,

    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(u32),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Environment variable {0} not set")]
    PasswordMissing(String),
}

pub type Result<T> = std::result::Result<T, EncryptionError>;

/// Core cryptographic logic for AES-256-GCM.
pub struct Encryptor;

impl Encryptor {
    /// Encrypts data using AES-256-GCM.
    /// Returns (ciphertext + tag, nonce).
    pub fn encrypt(data: &[u8], key: &[u8; 32]) -> Result<(Vec<u8>, [u8; 12])> {
        let cipher = Aes256Gcm::new(key.into());
        let mut nonce_bytes = [0u8; 12];
        rand::rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        Ok((ciphertext, nonce_bytes))
    }

    /// Decrypts data using AES-256-GCM.
    pub fn decrypt(ciphertext: &[u8], key: &[u8; 32], nonce: &[u8; 12]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());
        let nonce = Nonce::from_slice(nonce);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?;

        Ok(plaintext)
    }

    /// Derives a 32-byte key from a password and salt using Argon2id.
    pub fn derive_key(password: &SecretString, salt: &[u8]) -> Result<[u8; 32]> {
        let argon2 = Argon2::default();
        let mut key = [0u8; 32];
        argon2
            .hash_password_into(password.expose_secret().as_bytes(), salt, &mut key)
            .map_err(|e| EncryptionError::KeyDerivationFailed(e.to_string()))?;
        Ok(key)
    }

    /// Generates a random 16-byte salt for key derivation.
    pub fn generate_salt() -> [u8; 16] {
        let mut salt = [0u8; 16];
        rand::rng().fill(&mut salt);
        salt
    }
}

/// On-disk format for an encrypted config file.
///
/// Stored as a small YAML document so encrypted and plain config files share
/// a single file extension. All byte fields are hex-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope format version.
    pub version: u32,
    /// Hex-encoded Argon2id salt (16 bytes).
    pub kdf_salt: String,
    /// Hex-encoded AES-GCM nonce (12 bytes).
    pub nonce: String,
    /// Hex-encoded ciphertext with appended auth tag.
    pub ciphertext: String,
}

impl Envelope {
    /// Encrypts `plaintext` under a key derived from `password`, producing a
    /// complete envelope with a fresh salt and nonce.
    pub fn seal(plaintext: &[u8], password: &SecretString) -> Result<Self> {
        let salt = Encryptor::generate_salt();
        let key = Encryptor::derive_key(password, &salt)?;
        let (ciphertext, nonce) = Encryptor::encrypt(plaintext, &key)?;

        Ok(Self {
            version: ENVELOPE_VERSION,
            kdf_salt: hex::encode(salt),
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Recovers the plaintext using a key derived from `password`.
    pub fn open(&self, password: &SecretString) -> Result<Vec<u8>> {
        if self.version != ENVELOPE_VERSION {
            return Err(EncryptionError::UnsupportedVersion(self.version));
        }

        let salt = hex::decode(&self.kdf_salt)
            .map_err(|e| EncryptionError::MalformedEnvelope(format!("kdf_salt: {e}")))?;
        let nonce: [u8; 12] = hex::decode(&self.nonce)
            .map_err(|e| EncryptionError::MalformedEnvelope(format!("nonce: {e}")))?
            .try_into()
            .map_err(|_| EncryptionError::InvalidNonceSize)?;
        let ciphertext = hex::decode(&self.ciphertext)
            .map_err(|e| EncryptionError::MalformedEnvelope(format!("ciphertext: {e}")))?;

        let key = Encryptor::derive_key(password, &salt)?;
        Encryptor::decrypt(&ciphertext, &key, &nonce)
    }

    /// Parses an envelope from raw file bytes.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(bytes).map_err(|e| EncryptionError::MalformedEnvelope(e.to_string()))
    }

    /// Serializes the envelope for writing to disk.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))
    }
}
