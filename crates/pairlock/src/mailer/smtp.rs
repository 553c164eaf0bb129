use handlebars::Handlebars;
use iso8601_timestamp::Timestamp;
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::Tls;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::{SmtpSettings, Template, Templates};
use crate::mailer::definition::AbstractMailer;
use crate::models::PartnerRole;
use crate::{Error, Result, Success};

lazy_static! {
    static ref HANDLEBARS: Handlebars<'static> = Handlebars::new();
}

/// Mailer delivering through a real SMTP relay
#[derive(Serialize, Deserialize, Clone)]
pub struct SmtpMailer {
    /// Mail server settings
    pub smtp: SmtpSettings,

    /// Templates for outgoing email
    pub templates: Templates,
}

impl SmtpMailer {
    pub fn new(smtp: SmtpSettings, templates: Templates) -> SmtpMailer {
        SmtpMailer { smtp, templates }
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let mut relay = SmtpTransport::relay(&self.smtp.host).map_err(|_| Error::EmailFailed)?;

        if let Some(port) = self.smtp.port {
            relay = relay.port(port as u16);
        }

        if let Some(false) = self.smtp.use_tls {
            relay = relay.tls(Tls::None);
        }

        Ok(relay
            .credentials(Credentials::new(
                self.smtp.username.clone(),
                self.smtp.password.clone(),
            ))
            .build())
    }

    fn send(&self, to: &str, template: &Template, variables: serde_json::Value) -> Success {
        let text = HANDLEBARS
            .render_template(&template.text, &variables)
            .map_err(|_| Error::RenderFail)?;

        let html = match &template.html {
            Some(html) => Some(
                HANDLEBARS
                    .render_template(html, &variables)
                    .map_err(|_| Error::RenderFail)?,
            ),
            None => None,
        };

        let mut message = Message::builder()
            .from(
                self.smtp
                    .from
                    .parse::<Mailbox>()
                    .map_err(|_| Error::EmailFailed)?,
            )
            .to(to.parse::<Mailbox>().map_err(|_| Error::EmailFailed)?)
            .subject(template.title.clone());

        if let Some(reply_to) = &self.smtp.reply_to {
            message =
                message.reply_to(reply_to.parse::<Mailbox>().map_err(|_| Error::EmailFailed)?);
        }

        let mut multipart = MultiPart::alternative().singlepart(
            SinglePart::builder()
                .header(header::ContentType::TEXT_PLAIN)
                .body(text),
        );

        if let Some(html) = html {
            multipart = multipart.singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_HTML)
                    .body(html),
            );
        }

        let message = message
            .multipart(multipart)
            .map_err(|_| Error::EmailFailed)?;

        self.transport()?.send(&message).map_err(|error| {
            error!("Failed to send email to {}: {:?}", to, error);
            Error::EmailFailed
        })?;

        Ok(())
    }
}

impl AbstractMailer for SmtpMailer {
    fn send_code(
        &self,
        to: &str,
        code: &str,
        expires_at: Timestamp,
        initiator_name: &str,
    ) -> Success {
        self.send(
            to,
            &self.templates.code,
            json!({
                "code": code,
                "partner_name": initiator_name,
                "expires_at": expires_at.format().to_string(),
            }),
        )
    }

    fn send_finalize_link(&self, to: &str, reset_token: &str, expires_at: Timestamp) -> Success {
        let url = format!("{}{}", self.templates.reset.url, reset_token);

        self.send(
            to,
            &self.templates.reset,
            json!({
                "url": url,
                "expires_at": expires_at.format().to_string(),
            }),
        )
    }

    fn send_handoff_link(&self, to: &str, token: &str, expires_at: Timestamp) -> Success {
        let url = format!("{}{}", self.templates.handoff.url, token);

        self.send(
            to,
            &self.templates.handoff,
            json!({
                "url": url,
                "expires_at": expires_at.format().to_string(),
            }),
        )
    }

    fn send_ownership_link(&self, to: &str, token: &str, role: PartnerRole) -> Success {
        let url = format!("{}{}/{}", self.templates.verify.url, role.as_str(), token);

        self.send(
            to,
            &self.templates.verify,
            json!({
                "url": url,
                "role": role.as_str(),
            }),
        )
    }

    fn send_deletion_notice(&self, to: &str, partner_name: &str) -> Success {
        if let Some(template) = &self.templates.deletion_notice {
            self.send(
                to,
                template,
                json!({
                    "partner_name": partner_name,
                }),
            )
        } else {
            Ok(())
        }
    }
}
