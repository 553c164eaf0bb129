use std::ops::Deref;

pub mod definition;

mod capture;
mod smtp;

pub use capture::{CaptureMailer, CapturedMail, OutgoingEmail};
pub use smtp::SmtpMailer;

use definition::AbstractMailer;

/// Email dispatch
#[derive(Clone)]
pub enum Mailer {
    /// In-memory capture, for tests and local development
    Capture(CaptureMailer),
    /// Delivery through an SMTP relay
    Smtp(SmtpMailer),
}

impl Default for Mailer {
    fn default() -> Self {
        Self::Capture(Default::default())
    }
}

impl Deref for Mailer {
    type Target = dyn AbstractMailer;

    fn deref(&self) -> &Self::Target {
        match self {
            Mailer::Capture(mailer) => mailer,
            Mailer::Smtp(mailer) => mailer,
        }
    }
}
