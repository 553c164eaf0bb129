use iso8601_timestamp::Timestamp;

use super::PartnerRole;

/// Stage an account deletion request is in
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status")]
pub enum DeletionStage {
    /// Waiting for the approving party to submit the emailed code
    CodeSent {
        code_hash: String,
        code_expiry: Timestamp,
    },
    /// Code accepted, deletion is in progress
    Verified {
        verified_at: Timestamp,
        verified_by: PartnerRole,
    },
    /// Account and belongings removed
    Completed {
        verified_at: Timestamp,
        verified_by: PartnerRole,
        completed_at: Timestamp,
    },
}

/// Account deletion request
///
/// Kept around after the account itself is gone, as an audit record
/// of who approved the deletion and when.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeletionRequest {
    /// Unique id
    #[serde(rename = "_id")]
    pub id: String,

    /// Account this request belongs to
    pub account_id: String,

    /// Role that asked for the deletion
    pub initiated_by: PartnerRole,
    /// Role the confirmation code was sent to
    pub recipient: PartnerRole,
    /// Whether a second, distinct party has to approve
    pub requires_partner_approval: bool,

    /// Current stage
    pub stage: DeletionStage,
}

/// What the caller gets back from starting a deletion
#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "schemas", derive(JsonSchema))]
pub struct DeletionReceipt {
    /// Opaque request id
    pub request_id: String,
    /// Whether the other party holds the confirmation code
    pub requires_partner_approval: bool,
    /// Masked hint of the address the code went to
    pub recipient_hint: String,
}
