use anyhow::{anyhow, bail, ensure, Context as _, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Key, XChaCha20Poly1305,
};
use std::path::Path;
use tokio::io::AsyncWriteExt as _;

const KEY_SIZE: usize = 32;
const NONCE_LEN: usize = 24;

/// Encrypts the database file. Ciphertexts are `nonce || XChaCha20-Poly1305 ciphertext`.
pub struct DbCipher {
    cipher: XChaCha20Poly1305,
}

impl DbCipher {
    pub fn with_key(key: &Key) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(key),
        }
    }

    /// Generates a new key and stores it base64 encoded in a new file only the current user can read.
    pub async fn create_key_file(path: &Path) -> Result<Self> {
        let key = XChaCha20Poly1305::generate_key(&mut OsRng);

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(path)
            .await
            .with_context(|| format!("Failed to create key file {}", path.display()))?;
        file.write_all(BASE64.encode(key).as_bytes()).await?;
        file.flush().await?;

        log::info!("Created database key at {}", path.display());
        Ok(Self::with_key(&key))
    }

    pub async fn load_key_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read key file {}", path.display()))?;
        let key_bytes = BASE64
            .decode(content.trim())
            .with_context(|| format!("Key file {} is not valid base64", path.display()))?;
        ensure!(
            key_bytes.len() == KEY_SIZE,
            "Key file {} has {} bytes but expected {KEY_SIZE}",
            path.display(),
            key_bytes.len(),
        );
        Ok(Self::with_key(Key::from_slice(&key_bytes)))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|err| anyhow!("Encryption failed: {err}"))?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            bail!("Ciphertext too small for nonce");
        }
        let (nonce, ciphertext) = ciphertext.split_at(NONCE_LEN);
        self.cipher
            .decrypt(nonce.into(), ciphertext)
            .map_err(|_| anyhow!("Decryption failed, wrong key or corrupted database"))
    }
}
