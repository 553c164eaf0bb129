use crate::{
    models::{
        Account, ConsentRequest, ConsentStage, DeletionRequest, DeletionStage, PartnerRole,
        Secret, SecretHandoff,
    },
    util, Error, Result, Success,
};

use futures::lock::Mutex;
use iso8601_timestamp::Timestamp;
use std::collections::HashMap;
use std::sync::Arc;

use super::{definition::AbstractDatabase, Migration};

/// In-memory database
///
/// Methods taking several collections lock them in declaration order,
/// accounts first, handoffs last.
#[derive(Default, Clone)]
pub struct DummyDb {
    pub accounts: Arc<Mutex<HashMap<String, Account>>>,
    pub consent_requests: Arc<Mutex<HashMap<String, ConsentRequest>>>,
    pub deletion_requests: Arc<Mutex<HashMap<String, DeletionRequest>>>,
    pub handoffs: Arc<Mutex<HashMap<String, SecretHandoff>>>,
    pub secret: Arc<Mutex<Option<Secret>>>,
}

#[async_trait]
impl AbstractDatabase for DummyDb {
    /// Run a database migration
    async fn run_migration(&self, migration: Migration) -> Success {
        println!("skip migration {:?}", migration);
        Ok(())
    }

    /// Find account by id
    async fn find_account(&self, id: &str) -> Result<Account> {
        let accounts = self.accounts.lock().await;
        accounts.get(id).cloned().ok_or(Error::NotFound)
    }

    /// Find account by either party's normalised email
    async fn find_account_by_normalised_email(
        &self,
        normalised_email: &str,
    ) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .values()
            .find(|account| {
                account.email_normalised == normalised_email
                    || account.partner_email_normalised.as_deref() == Some(normalised_email)
            })
            .cloned())
    }

    /// Save account
    async fn save_account(&self, account: &Account) -> Success {
        let mut accounts = self.accounts.lock().await;
        accounts.insert(account.id.to_string(), account.clone());
        Ok(())
    }

    /// Flip a role's verified flag, returns false if it was already set
    async fn mark_email_verified(&self, account_id: &str, role: PartnerRole) -> Result<bool> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(account_id).ok_or(Error::NotFound)?;

        let flag = match role {
            PartnerRole::Primary => &mut account.email_verified,
            PartnerRole::Partner => &mut account.partner_email_verified,
        };

        if *flag {
            Ok(false)
        } else {
            *flag = true;
            Ok(true)
        }
    }

    /// Delete an account and everything it owns, atomically
    async fn delete_account_cascade(&self, account_id: &str) -> Success {
        let mut accounts = self.accounts.lock().await;
        let mut consent_requests = self.consent_requests.lock().await;
        let mut handoffs = self.handoffs.lock().await;

        accounts.remove(account_id);
        consent_requests.retain(|_, request| request.account_id != account_id);
        handoffs.retain(|_, handoff| handoff.account_id != account_id);

        Ok(())
    }

    /// Find consent request by id
    async fn find_consent_request(&self, id: &str) -> Result<Option<ConsentRequest>> {
        let requests = self.consent_requests.lock().await;
        Ok(requests.get(id).cloned())
    }

    /// Find consent request holding the given reset token
    async fn find_consent_request_by_reset_token(
        &self,
        reset_token: &str,
    ) -> Result<Option<ConsentRequest>> {
        let requests = self.consent_requests.lock().await;
        Ok(requests
            .values()
            .find(|request| match &request.stage {
                ConsentStage::Verified { reset_token: token, .. }
                | ConsentStage::Completed { reset_token: token, .. } => token == reset_token,
                _ => false,
            })
            .cloned())
    }

    /// Save consent request
    async fn save_consent_request(&self, request: &ConsentRequest) -> Success {
        let mut requests = self.consent_requests.lock().await;
        requests.insert(request.id.to_string(), request.clone());
        Ok(())
    }

    /// Delete all consent requests for an account
    async fn delete_consent_requests(&self, account_id: &str) -> Success {
        let mut requests = self.consent_requests.lock().await;
        requests.retain(|_, request| request.account_id != account_id);
        Ok(())
    }

    /// Move a consent request from code sent to verified
    async fn claim_consent_verification(&self, id: &str, stage: &ConsentStage) -> Result<bool> {
        let mut requests = self.consent_requests.lock().await;

        match requests.get_mut(id) {
            Some(request) => match &request.stage {
                ConsentStage::CodeSent { code_expiry, .. } if !util::is_past(*code_expiry) => {
                    request.stage = stage.clone();
                    Ok(true)
                }
                _ => Ok(false),
            },
            None => Ok(false),
        }
    }

    /// Complete a consent request and apply the new password hash
    async fn commit_password_change(
        &self,
        id: &str,
        account_id: &str,
        password_hash: &str,
        stage: &ConsentStage,
    ) -> Result<bool> {
        let mut accounts = self.accounts.lock().await;
        let mut requests = self.consent_requests.lock().await;

        match requests.get_mut(id) {
            Some(request) => match &request.stage {
                ConsentStage::Verified { reset_expiry, .. } if !util::is_past(*reset_expiry) => {
                    let account = accounts.get_mut(account_id).ok_or(Error::NotFound)?;
                    account.password = password_hash.to_string();
                    request.stage = stage.clone();
                    Ok(true)
                }
                _ => Ok(false),
            },
            None => Ok(false),
        }
    }

    /// Find deletion request by account id
    async fn find_deletion_request(&self, account_id: &str) -> Result<Option<DeletionRequest>> {
        let requests = self.deletion_requests.lock().await;
        Ok(requests
            .values()
            .find(|request| request.account_id == account_id)
            .cloned())
    }

    /// Save deletion request
    async fn save_deletion_request(&self, request: &DeletionRequest) -> Success {
        let mut requests = self.deletion_requests.lock().await;
        requests.insert(request.id.to_string(), request.clone());
        Ok(())
    }

    /// Delete all deletion requests for an account
    async fn delete_deletion_requests(&self, account_id: &str) -> Success {
        let mut requests = self.deletion_requests.lock().await;
        requests.retain(|_, request| request.account_id != account_id);
        Ok(())
    }

    /// Move a deletion request from code sent to verified
    async fn claim_deletion_verification(&self, id: &str, stage: &DeletionStage) -> Result<bool> {
        let mut requests = self.deletion_requests.lock().await;

        match requests.get_mut(id) {
            Some(request) => match &request.stage {
                DeletionStage::CodeSent { code_expiry, .. } if !util::is_past(*code_expiry) => {
                    request.stage = stage.clone();
                    Ok(true)
                }
                _ => Ok(false),
            },
            None => Ok(false),
        }
    }

    /// Find secret handoff by reveal token
    async fn find_secret_handoff(&self, token: &str) -> Result<Option<SecretHandoff>> {
        let handoffs = self.handoffs.lock().await;
        Ok(handoffs
            .values()
            .find(|handoff| handoff.token == token)
            .cloned())
    }

    /// Save secret handoff
    async fn save_secret_handoff(&self, handoff: &SecretHandoff) -> Success {
        let mut handoffs = self.handoffs.lock().await;
        handoffs.insert(handoff.id.to_string(), handoff.clone());
        Ok(())
    }

    /// Mark a handoff as used, returns false if someone else got there first
    async fn claim_secret_handoff(&self, id: &str, used_at: Timestamp) -> Result<bool> {
        let mut handoffs = self.handoffs.lock().await;

        match handoffs.get_mut(id) {
            Some(handoff) if handoff.used_at.is_none() => {
                handoff.used_at = Some(used_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Find server secret
    async fn find_secret(&self) -> Result<Option<Secret>> {
        let secret = self.secret.lock().await;
        Ok(secret.clone())
    }

    /// Save server secret
    async fn save_secret(&self, new_secret: &Secret) -> Success {
        let mut secret = self.secret.lock().await;
        *secret = Some(new_secret.clone());
        Ok(())
    }
}
