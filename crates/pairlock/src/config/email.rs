/// SMTP mail server settings
#[derive(Serialize, Deserialize, Clone)]
pub struct SmtpSettings {
    /// Sender address
    pub from: String,

    /// Reply-to address
    pub reply_to: Option<String>,

    /// SMTP host
    pub host: String,

    /// SMTP port
    pub port: Option<i32>,

    /// SMTP username
    pub username: String,

    /// SMTP password
    pub password: String,

    /// Whether to use TLS
    pub use_tls: Option<bool>,
}

/// Email template
#[derive(Serialize, Deserialize, Clone)]
pub struct Template {
    /// Title of the email
    pub title: String,

    /// Plain text version of this email
    pub text: String,

    /// HTML version of this email
    pub html: Option<String>,

    /// URL to prepend to tokens placed in emails
    pub url: String,
}

/// Email templates for every outgoing message
#[derive(Serialize, Deserialize, Clone)]
pub struct Templates {
    /// One-time consent code
    pub code: Template,

    /// Password reset link for the initiator
    pub reset: Template,

    /// One-time secret reveal link
    pub handoff: Template,

    /// Email ownership verification link
    pub verify: Template,

    /// Heads-up that a deletion is proceeding, skipped if unset
    pub deletion_notice: Option<Template>,
}

/// Lifetimes of one-time artifacts, in seconds
#[derive(Serialize, Deserialize, Clone)]
pub struct ExpiryConfig {
    /// How long a password reset consent code lasts
    pub expire_reset_code: u64,

    /// How long a deletion consent code lasts
    pub expire_deletion_code: u64,

    /// How long an issued reset token lasts
    pub expire_reset_token: u64,

    /// How long a secret reveal token lasts
    pub expire_handoff: u64,

    /// How long an email ownership token lasts
    pub expire_ownership_token: u64,
}

impl Default for ExpiryConfig {
    fn default() -> ExpiryConfig {
        ExpiryConfig {
            expire_reset_code: 600,
            expire_deletion_code: 1800,
            expire_reset_token: 3600,
            expire_handoff: 3600,
            expire_ownership_token: 3600 * 24,
        }
    }
}
