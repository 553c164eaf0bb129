use iso8601_timestamp::Timestamp;

use super::PartnerRole;

/// Stage a password reset request is in
///
/// The reset token only exists once the counterpart's code has been
/// accepted, so an unverified request structurally cannot finalise.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status")]
pub enum ConsentStage {
    /// Waiting for the counterpart to submit the emailed code
    CodeSent {
        code_hash: String,
        code_expiry: Timestamp,
    },
    /// Code accepted, reset token sent to the initiator
    Verified {
        verified_at: Timestamp,
        reset_token: String,
        reset_expiry: Timestamp,
    },
    /// Password change applied
    Completed {
        verified_at: Timestamp,
        reset_token: String,
        used_at: Timestamp,
    },
}

/// Two-party password reset request
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConsentRequest {
    /// Unique id
    #[serde(rename = "_id")]
    pub id: String,

    /// Account this request belongs to
    pub account_id: String,

    /// Address of the party that asked for the reset
    pub initiator_email: String,
    /// Address of the party that must approve it
    pub counterpart_email: String,
    /// Role that asked for the reset
    pub initiated_by: PartnerRole,

    /// Current stage
    pub stage: ConsentStage,
}

/// What the caller gets back from starting a reset
#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "schemas", derive(JsonSchema))]
pub struct ConsentReceipt {
    /// Opaque request id, used to submit the code
    pub request_id: String,
    /// Masked hint of the address the code went to
    pub counterpart_hint: String,
}
