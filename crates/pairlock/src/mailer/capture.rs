use std::sync::{Arc, Mutex};

use iso8601_timestamp::Timestamp;

use crate::mailer::definition::AbstractMailer;
use crate::models::PartnerRole;
use crate::Success;

/// Outgoing email, reduced to its meaningful parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingEmail {
    Code {
        code: String,
        initiator_name: String,
    },
    FinalizeLink {
        reset_token: String,
    },
    HandoffLink {
        token: String,
    },
    OwnershipLink {
        token: String,
        role: PartnerRole,
    },
    DeletionNotice {
        partner_name: String,
    },
}

/// Captured email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMail {
    pub to: String,
    pub email: OutgoingEmail,
}

/// Mailer that never talks to a mail server
///
/// Outgoing email lands on a shared in-memory outbox instead, which
/// tests and local development can read back.
#[derive(Default, Clone)]
pub struct CaptureMailer {
    outbox: Arc<Mutex<Vec<CapturedMail>>>,
}

impl CaptureMailer {
    fn push(&self, to: &str, email: OutgoingEmail) {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(CapturedMail {
                to: to.to_string(),
                email,
            });
        }
    }

    /// Drain everything captured so far
    pub fn take(&self) -> Vec<CapturedMail> {
        match self.outbox.lock() {
            Ok(mut outbox) => std::mem::take(&mut *outbox),
            Err(_) => Vec::new(),
        }
    }

    /// Latest email sent to the given address
    pub fn latest_for(&self, to: &str) -> Option<OutgoingEmail> {
        match self.outbox.lock() {
            Ok(outbox) => outbox
                .iter()
                .rev()
                .find(|mail| mail.to == to)
                .map(|mail| mail.email.clone()),
            Err(_) => None,
        }
    }

    /// Every email sent to the given address, oldest first
    pub fn all_for(&self, to: &str) -> Vec<OutgoingEmail> {
        match self.outbox.lock() {
            Ok(outbox) => outbox
                .iter()
                .filter(|mail| mail.to == to)
                .map(|mail| mail.email.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl AbstractMailer for CaptureMailer {
    fn send_code(
        &self,
        to: &str,
        code: &str,
        _expires_at: Timestamp,
        initiator_name: &str,
    ) -> Success {
        self.push(
            to,
            OutgoingEmail::Code {
                code: code.to_string(),
                initiator_name: initiator_name.to_string(),
            },
        );

        Ok(())
    }

    fn send_finalize_link(&self, to: &str, reset_token: &str, _expires_at: Timestamp) -> Success {
        self.push(
            to,
            OutgoingEmail::FinalizeLink {
                reset_token: reset_token.to_string(),
            },
        );

        Ok(())
    }

    fn send_handoff_link(&self, to: &str, token: &str, _expires_at: Timestamp) -> Success {
        self.push(
            to,
            OutgoingEmail::HandoffLink {
                token: token.to_string(),
            },
        );

        Ok(())
    }

    fn send_ownership_link(&self, to: &str, token: &str, role: PartnerRole) -> Success {
        self.push(
            to,
            OutgoingEmail::OwnershipLink {
                token: token.to_string(),
                role,
            },
        );

        Ok(())
    }

    fn send_deletion_notice(&self, to: &str, partner_name: &str) -> Success {
        self.push(
            to,
            OutgoingEmail::DeletionNotice {
                partner_name: partner_name.to_string(),
            },
        );

        Ok(())
    }
}
