use iso8601_timestamp::Timestamp;

/// One-time handoff of a secret to the other party
///
/// The secret itself is held AES-256-GCM encrypted, the plaintext is
/// recoverable exactly once through the reveal token.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SecretHandoff {
    /// Unique id
    #[serde(rename = "_id")]
    pub id: String,

    /// Unguessable reveal token
    pub token: String,

    /// Account this handoff belongs to
    pub account_id: String,
    /// Address the reveal link was sent to
    pub recipient_email: String,

    /// Base64 encoded nonce + ciphertext
    pub ciphertext: String,

    /// When the reveal token stops working
    pub expires_at: Timestamp,
    /// When the secret was revealed, if it has been
    pub used_at: Option<Timestamp>,
}
