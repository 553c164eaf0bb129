use crate::models::PartnerRole;

/// Events which occur when something changes within pairlock
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event_type")]
pub enum PairlockEvent {
    /// A consented password reset went through
    PasswordChanged { account_id: String },
    /// An account and its belongings were removed
    AccountDeleted { account_id: String },
    /// A party proved ownership of their address
    EmailOwnershipVerified {
        account_id: String,
        role: PartnerRole,
    },
}
