use iso8601_timestamp::Timestamp;

use crate::events::PairlockEvent;
use crate::models::{Account, OwnershipStatus, PartnerRole};
use crate::{Error, Pairlock, Result, Success};

/// Claims carried by a signed ownership token
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OwnershipClaims {
    /// Account id
    pub sub: String,
    /// Role being verified
    pub role: PartnerRole,
    /// Expiry as unix seconds
    pub exp: u64,
}

fn unix_now() -> u64 {
    (Timestamp::now_utc().to_unix_timestamp_ms() / 1000) as u64
}

impl Account {
    /// Email an ownership token for one of this account's addresses
    ///
    /// The token is a signed claim, nothing is persisted for it.
    pub async fn start_ownership_verification(
        &self,
        pairlock: &Pairlock,
        role: PartnerRole,
    ) -> Success {
        let email = self.email_for(role).ok_or(Error::ValidationError {
            with: "partner_email",
        })?;

        let secret = pairlock.server_secret().await?;
        let token = secret.sign_claims(&OwnershipClaims {
            sub: self.id.clone(),
            role,
            exp: unix_now() + pairlock.config.expiry.expire_ownership_token,
        });

        pairlock.mailer.send_ownership_link(email, &token, role)
    }

    /// Consume an emailed ownership token for the expected role
    ///
    /// Repeat consumption is a no-op success, so stale or double
    /// clicked links never surface an error.
    pub async fn consume_ownership_token(
        pairlock: &Pairlock,
        token: &str,
        expected_role: PartnerRole,
    ) -> Result<OwnershipStatus> {
        let secret = pairlock.server_secret().await?;

        let claims: OwnershipClaims =
            secret
                .validate_claims(token)
                .map_err(|error| match error.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => Error::Expired,
                    _ => Error::NotFound,
                })?;

        if claims.role != expected_role {
            return Err(Error::Unauthorized);
        }

        let mut account = pairlock.database.find_account(&claims.sub).await?;
        if account.email_for(claims.role).is_none() {
            // the address this token was minted for is no longer on file
            return Err(Error::NotFound);
        }

        if pairlock
            .database
            .mark_email_verified(&account.id, claims.role)
            .await?
        {
            pairlock
                .publish_event(PairlockEvent::EmailOwnershipVerified {
                    account_id: account.id.clone(),
                    role: claims.role,
                })
                .await;
        }

        match claims.role {
            PartnerRole::Primary => account.email_verified = true,
            PartnerRole::Partner => account.partner_email_verified = true,
        }

        Ok(account.ownership_status(claims.role))
    }
}
