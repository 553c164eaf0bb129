/// Which of the two linked parties an address belongs to
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "schemas", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum PartnerRole {
    Primary,
    Partner,
}

/// Whether an account is shared between two people
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Couple,
    Solo,
}

/// Account model
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Account {
    /// Unique id
    #[serde(rename = "_id")]
    pub id: String,

    /// Couple or solo account
    pub kind: AccountKind,

    /// Primary party's email
    pub email: String,
    /// Primary party's email (normalised)
    pub email_normalised: String,
    /// Primary party's display name
    pub display_name: String,

    /// Partner's email, if linked
    pub partner_email: Option<String>,
    /// Partner's email (normalised)
    pub partner_email_normalised: Option<String>,
    /// Partner's display name
    pub partner_display_name: Option<String>,

    /// Argon2 hashed password
    pub password: String,

    /// Whether the primary party proved ownership of their address
    #[serde(default)]
    pub email_verified: bool,
    /// Whether the partner proved ownership of their address
    #[serde(default)]
    pub partner_email_verified: bool,
}

/// Verification progress reported after consuming an ownership token
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemas", derive(JsonSchema))]
pub struct OwnershipStatus {
    /// Role that was just confirmed (or re-confirmed)
    pub verified_role: PartnerRole,
    /// Verification state of the other role, if one is linked
    pub counterpart_verified: Option<bool>,
    /// Whether every address on file has been verified
    pub fully_verified: bool,
}
