use iso8601_timestamp::Timestamp;

use crate::models::{
    Account, ConsentRequest, ConsentStage, DeletionRequest, DeletionStage, PartnerRole, Secret,
    SecretHandoff,
};
use crate::{Result, Success};

use super::Migration;

#[async_trait]
pub trait AbstractDatabase: std::marker::Sync {
    /// Run a database migration
    async fn run_migration(&self, migration: Migration) -> Success;

    /// Find account by id
    async fn find_account(&self, id: &str) -> Result<Account>;

    /// Find account by either party's normalised email
    async fn find_account_by_normalised_email(
        &self,
        normalised_email: &str,
    ) -> Result<Option<Account>>;

    /// Save account
    async fn save_account(&self, account: &Account) -> Success;

    /// Flip a role's verified flag, returns false if it was already set
    async fn mark_email_verified(&self, account_id: &str, role: PartnerRole) -> Result<bool>;

    /// Delete an account and everything it owns, atomically
    ///
    /// Completed deletion requests survive as audit records.
    async fn delete_account_cascade(&self, account_id: &str) -> Success;

    /// Find consent request by id
    async fn find_consent_request(&self, id: &str) -> Result<Option<ConsentRequest>>;

    /// Find consent request holding the given reset token
    async fn find_consent_request_by_reset_token(
        &self,
        reset_token: &str,
    ) -> Result<Option<ConsentRequest>>;

    /// Save consent request
    async fn save_consent_request(&self, request: &ConsentRequest) -> Success;

    /// Delete all consent requests for an account
    async fn delete_consent_requests(&self, account_id: &str) -> Success;

    /// Move a consent request from code sent to verified
    ///
    /// Conditioned on the request still holding an unexpired code, so
    /// only one caller can ever win. Returns whether we won.
    async fn claim_consent_verification(&self, id: &str, stage: &ConsentStage) -> Result<bool>;

    /// Complete a consent request and apply the new password hash
    ///
    /// Both writes happen atomically, conditioned on the request still
    /// holding an unexpired, unused reset token. Returns whether we won.
    async fn commit_password_change(
        &self,
        id: &str,
        account_id: &str,
        password_hash: &str,
        stage: &ConsentStage,
    ) -> Result<bool>;

    /// Find deletion request by account id
    async fn find_deletion_request(&self, account_id: &str) -> Result<Option<DeletionRequest>>;

    /// Save deletion request
    async fn save_deletion_request(&self, request: &DeletionRequest) -> Success;

    /// Delete all deletion requests for an account
    async fn delete_deletion_requests(&self, account_id: &str) -> Success;

    /// Move a deletion request from code sent to verified
    ///
    /// Same claim semantics as consent verification.
    async fn claim_deletion_verification(&self, id: &str, stage: &DeletionStage) -> Result<bool>;

    /// Find secret handoff by reveal token
    async fn find_secret_handoff(&self, token: &str) -> Result<Option<SecretHandoff>>;

    /// Save secret handoff
    async fn save_secret_handoff(&self, handoff: &SecretHandoff) -> Success;

    /// Mark a handoff as used, returns false if someone else got there first
    async fn claim_secret_handoff(&self, id: &str, used_at: Timestamp) -> Result<bool>;

    /// Find server secret
    async fn find_secret(&self) -> Result<Option<Secret>>;

    /// Save server secret
    async fn save_secret(&self, secret: &Secret) -> Success;
}
