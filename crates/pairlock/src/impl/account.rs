use crate::models::{Account, AccountKind, OwnershipStatus, PartnerRole};
use crate::util::{hash_password, normalise_email, validate_email};
use crate::{Error, Pairlock, Result, Success};

impl PartnerRole {
    /// The other role of the pair
    pub fn counterpart(&self) -> PartnerRole {
        match self {
            PartnerRole::Primary => PartnerRole::Partner,
            PartnerRole::Partner => PartnerRole::Primary,
        }
    }

    /// Lowercase wire name, also used in verification URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerRole::Primary => "primary",
            PartnerRole::Partner => "partner",
        }
    }
}

impl std::str::FromStr for PartnerRole {
    type Err = ();

    fn from_str(value: &str) -> Result<PartnerRole, Self::Err> {
        match value {
            "primary" => Ok(PartnerRole::Primary),
            "partner" => Ok(PartnerRole::Partner),
            _ => Err(()),
        }
    }
}

impl Account {
    /// Create a new account
    ///
    /// Display names start out as the local part of each address, the
    /// platform lets people change them later.
    pub async fn new(
        pairlock: &Pairlock,
        kind: AccountKind,
        email: String,
        partner_email: Option<String>,
        plaintext_password: String,
    ) -> Result<Account> {
        validate_email(&email)?;
        if let Some(partner_email) = &partner_email {
            validate_email(partner_email)?;
        }

        if matches!(kind, AccountKind::Solo) && partner_email.is_some() {
            return Err(Error::ValidationError {
                with: "account_kind",
            });
        }

        pairlock
            .config
            .password_scanning
            .assert_safe(&plaintext_password)
            .await?;

        let email_normalised = normalise_email(email.clone());
        let partner_email_normalised = partner_email.clone().map(normalise_email);

        // both linked addresses must resolve to distinct mailboxes
        if partner_email_normalised.as_deref() == Some(email_normalised.as_str()) {
            return Err(Error::ValidationError {
                with: "partner_email",
            });
        }

        for normalised in std::iter::once(&email_normalised).chain(&partner_email_normalised) {
            if pairlock
                .database
                .find_account_by_normalised_email(normalised)
                .await?
                .is_some()
            {
                return Err(Error::ValidationError {
                    with: "email_in_use",
                });
            }
        }

        let account = Account {
            id: ulid::Ulid::new().to_string(),
            kind,
            display_name: local_part(&email),
            partner_display_name: partner_email.as_deref().map(local_part),
            email,
            email_normalised,
            partner_email,
            partner_email_normalised,
            password: hash_password(plaintext_password)?,
            email_verified: false,
            partner_email_verified: false,
        };

        account.save(pairlock).await?;
        Ok(account)
    }

    /// Save model
    pub async fn save(&self, pairlock: &Pairlock) -> Success {
        pairlock.database.save_account(self).await
    }

    /// Address on file for a role
    pub fn email_for(&self, role: PartnerRole) -> Option<&str> {
        match role {
            PartnerRole::Primary => Some(&self.email),
            PartnerRole::Partner => self.partner_email.as_deref(),
        }
    }

    /// Which role a normalised address belongs to
    pub fn role_for_normalised_email(&self, normalised_email: &str) -> Option<PartnerRole> {
        if self.email_normalised == normalised_email {
            Some(PartnerRole::Primary)
        } else if self.partner_email_normalised.as_deref() == Some(normalised_email) {
            Some(PartnerRole::Partner)
        } else {
            None
        }
    }

    /// Display name for a role, falling back to their address
    pub fn display_name_for(&self, role: PartnerRole) -> &str {
        match role {
            PartnerRole::Primary => &self.display_name,
            PartnerRole::Partner => self
                .partner_display_name
                .as_deref()
                .or(self.partner_email.as_deref())
                .unwrap_or(&self.display_name),
        }
    }

    /// Verified flag for a role
    pub fn email_verified_for(&self, role: PartnerRole) -> bool {
        match role {
            PartnerRole::Primary => self.email_verified,
            PartnerRole::Partner => self.partner_email_verified,
        }
    }

    /// Whether every address on file has been verified
    pub fn fully_verified(&self) -> bool {
        self.email_verified && (self.partner_email.is_none() || self.partner_email_verified)
    }

    /// Verification progress as seen after confirming the given role
    pub fn ownership_status(&self, verified_role: PartnerRole) -> OwnershipStatus {
        let counterpart = verified_role.counterpart();

        OwnershipStatus {
            verified_role,
            counterpart_verified: self
                .email_for(counterpart)
                .map(|_| self.email_verified_for(counterpart)),
            fully_verified: self.fully_verified(),
        }
    }
}

fn local_part(email: &str) -> String {
    email
        .split_once('@')
        .map(|(local, _)| local.to_string())
        .unwrap_or_else(|| email.to_string())
}
