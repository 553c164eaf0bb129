use std::ops::Add;
use std::time::Duration;

use iso8601_timestamp::Timestamp;
use ulid::Ulid;

use crate::models::SecretHandoff;
use crate::util;
use crate::{Error, Pairlock, Result};

impl SecretHandoff {
    /// Seal a secret for a one-time reveal by the given recipient
    pub async fn issue(
        pairlock: &Pairlock,
        account_id: &str,
        recipient_email: &str,
        plaintext: &str,
    ) -> Result<SecretHandoff> {
        let secret = pairlock.server_secret().await?;

        let handoff = SecretHandoff {
            id: Ulid::new().to_string(),
            token: nanoid!(64),
            account_id: account_id.to_string(),
            recipient_email: recipient_email.to_string(),
            ciphertext: secret.seal(plaintext)?,
            expires_at: Timestamp::now_utc()
                .add(Duration::from_secs(pairlock.config.expiry.expire_handoff)),
            used_at: None,
        };

        pairlock.database.save_secret_handoff(&handoff).await?;
        Ok(handoff)
    }

    /// Reveal a sealed secret, burning the token
    pub async fn reveal(pairlock: &Pairlock, token: &str) -> Result<String> {
        let handoff = pairlock
            .database
            .find_secret_handoff(token)
            .await?
            .ok_or(Error::NotFound)?;

        if handoff.used_at.is_some() {
            return Err(Error::AlreadyUsed);
        }

        if util::is_past(handoff.expires_at) {
            // burn it so later attempts read as consumed rather than stale
            pairlock
                .database
                .claim_secret_handoff(&handoff.id, Timestamp::now_utc())
                .await
                .ok();

            return Err(Error::Expired);
        }

        if !pairlock
            .database
            .claim_secret_handoff(&handoff.id, Timestamp::now_utc())
            .await?
        {
            return Err(Error::AlreadyUsed);
        }

        let secret = pairlock.server_secret().await?;
        secret.open(&handoff.ciphertext)
    }
}
