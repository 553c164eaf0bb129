use iso8601_timestamp::Timestamp;

use crate::models::PartnerRole;
use crate::Success;

/// Email operations the consent flows rely on
pub trait AbstractMailer: std::marker::Sync + std::marker::Send {
    /// Send a one-time consent code to the approving party
    fn send_code(
        &self,
        to: &str,
        code: &str,
        expires_at: Timestamp,
        initiator_name: &str,
    ) -> Success;

    /// Send the password reset link back to the initiator
    fn send_finalize_link(&self, to: &str, reset_token: &str, expires_at: Timestamp) -> Success;

    /// Send a one-time secret reveal link
    fn send_handoff_link(&self, to: &str, token: &str, expires_at: Timestamp) -> Success;

    /// Send an email ownership verification link
    fn send_ownership_link(&self, to: &str, token: &str, role: PartnerRole) -> Success;

    /// Tell the other party that an account deletion is proceeding
    fn send_deletion_notice(&self, to: &str, partner_name: &str) -> Success;
}
