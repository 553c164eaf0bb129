use std::ops::Add;
use std::time::Duration;

use iso8601_timestamp::Timestamp;
use ulid::Ulid;

use crate::events::PairlockEvent;
use crate::models::{DeletionReceipt, DeletionRequest, DeletionStage, PartnerRole};
use crate::util::{self, generate_code, hash_code, mask_email, normalise_email};
use crate::{Error, Pairlock, Result, Success};

impl DeletionRequest {
    /// Start an account deletion
    ///
    /// With a second linked address the code crosses over to the other
    /// party, otherwise the sole address self-approves.
    pub async fn initiate(
        pairlock: &Pairlock,
        account_id: &str,
        acting_email: Option<&str>,
    ) -> Result<DeletionReceipt> {
        let account = pairlock.database.find_account(account_id).await?;

        let initiated_by = match acting_email {
            Some(email) => account
                .role_for_normalised_email(&normalise_email(email.to_string()))
                .ok_or(Error::Unauthorized)?,
            None => PartnerRole::Primary,
        };

        let (recipient, requires_partner_approval) =
            match account.email_for(initiated_by.counterpart()) {
                Some(_) => (initiated_by.counterpart(), true),
                None => (initiated_by, false),
            };

        let recipient_email = account
            .email_for(recipient)
            .ok_or(Error::InternalError)?
            .to_string();

        // a new request supersedes anything still pending
        pairlock
            .database
            .delete_deletion_requests(&account.id)
            .await?;

        let code = generate_code(pairlock.config.code_length);
        let code_expiry = Timestamp::now_utc().add(Duration::from_secs(
            pairlock.config.expiry.expire_deletion_code,
        ));

        let request = DeletionRequest {
            id: Ulid::new().to_string(),
            account_id: account.id.clone(),
            initiated_by,
            recipient,
            requires_partner_approval,
            stage: DeletionStage::CodeSent {
                code_hash: hash_code(&code)?,
                code_expiry,
            },
        };

        pairlock.database.save_deletion_request(&request).await?;

        // an undeliverable code makes the whole request useless
        pairlock.mailer.send_code(
            &recipient_email,
            &code,
            code_expiry,
            account.display_name_for(initiated_by),
        )?;

        Ok(DeletionReceipt {
            request_id: request.id,
            requires_partner_approval,
            recipient_hint: mask_email(&recipient_email),
        })
    }

    /// Approve a deletion with the emailed code, removing the account
    ///
    /// The cascade removes the account together with its belongings and
    /// pending consent artifacts, the completed request itself stays as
    /// an audit record.
    pub async fn verify(pairlock: &Pairlock, account_id: &str, code: &str) -> Success {
        let mut request = pairlock
            .database
            .find_deletion_request(account_id)
            .await?
            .ok_or(Error::NotFound)?;

        // failure order: missing, then consumed, then expired, then wrong
        let (code_hash, code_expiry) = match &request.stage {
            DeletionStage::Verified { .. } | DeletionStage::Completed { .. } => {
                return Err(Error::AlreadyUsed)
            }
            DeletionStage::CodeSent {
                code_hash,
                code_expiry,
            } => (code_hash.clone(), *code_expiry),
        };

        if util::is_past(code_expiry) {
            return Err(Error::Expired);
        }

        if !util::code_matches(code, &code_hash) {
            return Err(Error::InvalidCode);
        }

        // needed for the notice below, the addresses disappear with the cascade
        let account = pairlock.database.find_account(account_id).await?;

        let verified_by = request.recipient;
        let verified_at = Timestamp::now_utc();
        let stage = DeletionStage::Verified {
            verified_at,
            verified_by,
        };

        if !pairlock
            .database
            .claim_deletion_verification(&request.id, &stage)
            .await?
        {
            return Err(Error::AlreadyUsed);
        }

        // a distinct counterpart gets a heads-up, best effort
        if let Some(notice_email) = account.email_for(verified_by.counterpart()) {
            if let Err(error) = pairlock
                .mailer
                .send_deletion_notice(notice_email, account.display_name_for(verified_by))
            {
                warn!(
                    "Failed to send the deletion notice for account {}: {:?}",
                    account.id, error
                );
            }
        }

        pairlock
            .database
            .delete_account_cascade(&account.id)
            .await?;

        request.stage = DeletionStage::Completed {
            verified_at,
            verified_by,
            completed_at: Timestamp::now_utc(),
        };
        pairlock.database.save_deletion_request(&request).await?;

        pairlock
            .publish_event(PairlockEvent::AccountDeleted {
                account_id: account.id.clone(),
            })
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use iso8601_timestamp::Timestamp;
    use ulid::Ulid;

    use crate::events::PairlockEvent;
    use crate::mailer::OutgoingEmail;
    use crate::models::{
        ConsentRequest, DeletionRequest, DeletionStage, PartnerRole, SecretHandoff,
    };
    use crate::test::*;
    use crate::util::hash_code;
    use crate::Error;

    #[async_std::test]
    async fn it_asks_the_partner_to_approve() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        let receipt = DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");

        assert!(receipt.requires_partner_approval);
        assert_eq!("r***@example.com", receipt.recipient_hint);
        sent_code(&pairlock, "robin@example.com");
    }

    #[async_std::test]
    async fn it_crosses_approval_over_when_the_partner_initiates() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        let receipt =
            DeletionRequest::initiate(&pairlock, &account.id, Some("robin@example.com"))
                .await
                .expect("`DeletionReceipt`");

        assert!(receipt.requires_partner_approval);
        assert_eq!("a***@example.com", receipt.recipient_hint);
        sent_code(&pairlock, "alex@example.com");
    }

    #[async_std::test]
    async fn it_self_approves_without_a_second_address() {
        let pairlock = for_test();
        let account = seed_couple_without_partner(&pairlock).await;

        let receipt = DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");

        assert!(!receipt.requires_partner_approval);
        assert_eq!("s***@example.com", receipt.recipient_hint);
        sent_code(&pairlock, "solo.half@example.com");
    }

    #[async_std::test]
    async fn it_rejects_unknown_acting_addresses() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        assert_eq!(
            Err(Error::Unauthorized),
            DeletionRequest::initiate(&pairlock, &account.id, Some("stranger@example.com")).await
        );
    }

    #[async_std::test]
    async fn it_removes_the_account_and_its_artifacts() {
        let (pairlock, events) = for_test_with_events();
        let account = seed_couple(&pairlock).await;

        // artifacts that must disappear with the account
        ConsentRequest::initiate(&pairlock, "alex@example.com")
            .await
            .expect("`ConsentReceipt`");
        let handoff = SecretHandoff::issue(&pairlock, &account.id, "robin@example.com", "sealed")
            .await
            .expect("`SecretHandoff`");

        let receipt = DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");
        let code = sent_code(&pairlock, "robin@example.com");

        DeletionRequest::verify(&pairlock, &account.id, &code)
            .await
            .expect("`verify`");

        assert_eq!(
            Err(Error::NotFound),
            pairlock.database.find_account(&account.id).await
        );
        assert_eq!(
            Ok(None),
            pairlock.database.find_secret_handoff(&handoff.token).await
        );

        // the completed request survives as an audit record
        let request = pairlock
            .database
            .find_deletion_request(&account.id)
            .await
            .expect("`find_deletion_request`")
            .expect("`DeletionRequest`");
        assert_eq!(receipt.request_id, request.id);
        assert!(matches!(
            request.stage,
            DeletionStage::Completed {
                verified_by: PartnerRole::Partner,
                ..
            }
        ));

        // the initiator hears that deletion went through
        assert!(matches!(
            outbox(&pairlock).latest_for("alex@example.com"),
            Some(OutgoingEmail::DeletionNotice { partner_name }) if partner_name == "robin"
        ));

        assert!(matches!(
            events.try_recv(),
            Ok(PairlockEvent::AccountDeleted { account_id }) if account_id == account.id
        ));
    }

    #[async_std::test]
    async fn it_rejects_wrong_codes() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");
        let code = sent_code(&pairlock, "robin@example.com");
        let wrong: String = code
            .chars()
            .map(|c| if c == '0' { '1' } else { '0' })
            .collect();

        assert_eq!(
            Err(Error::InvalidCode),
            DeletionRequest::verify(&pairlock, &account.id, &wrong).await
        );

        // nothing happened to the account
        assert!(pairlock.database.find_account(&account.id).await.is_ok());
    }

    #[async_std::test]
    async fn it_rejects_expired_codes() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        let request = DeletionRequest {
            id: Ulid::new().to_string(),
            account_id: account.id.clone(),
            initiated_by: PartnerRole::Primary,
            recipient: PartnerRole::Partner,
            requires_partner_approval: true,
            stage: DeletionStage::CodeSent {
                code_hash: hash_code("493024").expect("`hash`"),
                code_expiry: Timestamp::now_utc(),
            },
        };
        pairlock
            .database
            .save_deletion_request(&request)
            .await
            .expect("`save_deletion_request`");

        assert_eq!(
            Err(Error::Expired),
            DeletionRequest::verify(&pairlock, &account.id, "493024").await
        );
    }

    #[async_std::test]
    async fn it_reports_consumed_requests() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");
        let code = sent_code(&pairlock, "robin@example.com");

        DeletionRequest::verify(&pairlock, &account.id, &code)
            .await
            .expect("`verify`");

        // the audit record answers instead of a dangling lookup
        assert_eq!(
            Err(Error::AlreadyUsed),
            DeletionRequest::verify(&pairlock, &account.id, &code).await
        );
    }

    #[async_std::test]
    async fn it_supersedes_pending_requests() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        let first = DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");
        let second = DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");

        // only the fresh request is still on file
        let request = pairlock
            .database
            .find_deletion_request(&account.id)
            .await
            .expect("`find_deletion_request`")
            .expect("`DeletionRequest`");
        assert_ne!(first.request_id, request.id);
        assert_eq!(second.request_id, request.id);
    }
}
