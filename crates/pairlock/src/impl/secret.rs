use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

use crate::models::Secret;
use crate::{Error, Pairlock, Result};

/// Byte length of an AES-GCM nonce
const NONCE_LENGTH: usize = 12;

impl Secret {
    /// Sign claims with secret
    pub fn sign_claims<T>(&self, claims: &T) -> String
    where
        T: Serialize,
    {
        let secret = self.expose().as_bytes();

        let (header, key) = (Header::default(), EncodingKey::from_secret(secret));

        jsonwebtoken::encode(&header, claims, &key).expect("JWT encoding should not fail")
    }

    /// Validate claims with secret
    pub fn validate_claims<T>(&self, token: &str) -> Result<T, jsonwebtoken::errors::Error>
    where
        T: DeserializeOwned,
    {
        let secret = self.expose().as_bytes();

        let (validation, key) = (Validation::default(), DecodingKey::from_secret(secret));

        jsonwebtoken::decode(token, &key, &validation).map(|token| token.claims)
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        let key = Sha256::digest(self.expose().as_bytes());
        Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| Error::InternalError)
    }

    /// Encrypt a plaintext, producing base64(nonce + ciphertext)
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| Error::InternalError)?;

        let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(sealed))
    }

    /// Decrypt a payload produced by [`Secret::seal`]
    pub fn open(&self, sealed: &str) -> Result<String> {
        let data = STANDARD.decode(sealed).map_err(|_| Error::InternalError)?;
        if data.len() < NONCE_LENGTH {
            return Err(Error::InternalError);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LENGTH);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher()?
            .decrypt(nonce, ciphertext)
            .map_err(|_| Error::InternalError)?;

        String::from_utf8(plaintext).map_err(|_| Error::InternalError)
    }
}

impl Pairlock {
    /// Fetch the server secret, generating one on first use
    pub async fn server_secret(&self) -> Result<Secret> {
        if let Some(secret) = self.database.find_secret().await? {
            Ok(secret)
        } else {
            let secret = Secret::generate();
            self.database.save_secret(&secret).await?;
            Ok(secret)
        }
    }
}
