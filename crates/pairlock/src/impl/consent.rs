use std::ops::Add;
use std::time::Duration;

use iso8601_timestamp::Timestamp;
use ulid::Ulid;

use crate::events::PairlockEvent;
use crate::models::{AccountKind, ConsentReceipt, ConsentRequest, ConsentStage, SecretHandoff};
use crate::util::{self, generate_code, hash_code, mask_email, normalise_email, validate_email};
use crate::{Error, Pairlock, Result, Success};

impl ConsentRequest {
    /// Start a two-party password reset
    ///
    /// Matches the address against either party, then emails a one-time
    /// code to the other one. The code itself only ever exists inside
    /// that email, we keep a hash.
    pub async fn initiate(pairlock: &Pairlock, email: &str) -> Result<ConsentReceipt> {
        validate_email(email)?;

        let normalised = normalise_email(email.to_string());
        let account = pairlock
            .database
            .find_account_by_normalised_email(&normalised)
            .await?
            .ok_or(Error::NotFound)?;

        if !matches!(account.kind, AccountKind::Couple) {
            return Err(Error::ValidationError {
                with: "account_kind",
            });
        }

        let initiated_by = account
            .role_for_normalised_email(&normalised)
            .ok_or(Error::InternalError)?;

        let counterpart = initiated_by.counterpart();
        let counterpart_email = account
            .email_for(counterpart)
            .ok_or(Error::ValidationError {
                with: "partner_email",
            })?
            .to_string();
        let initiator_email = account
            .email_for(initiated_by)
            .ok_or(Error::InternalError)?
            .to_string();

        // a new request supersedes anything still pending
        pairlock
            .database
            .delete_consent_requests(&account.id)
            .await?;

        let code = generate_code(pairlock.config.code_length);
        let code_expiry = Timestamp::now_utc().add(Duration::from_secs(
            pairlock.config.expiry.expire_reset_code,
        ));

        let request = ConsentRequest {
            id: Ulid::new().to_string(),
            account_id: account.id.clone(),
            initiator_email,
            counterpart_email: counterpart_email.clone(),
            initiated_by,
            stage: ConsentStage::CodeSent {
                code_hash: hash_code(&code)?,
                code_expiry,
            },
        };

        pairlock.database.save_consent_request(&request).await?;

        // an undeliverable code makes the whole request useless
        pairlock.mailer.send_code(
            &counterpart_email,
            &code,
            code_expiry,
            account.display_name_for(initiated_by),
        )?;

        Ok(ConsentReceipt {
            request_id: request.id,
            counterpart_hint: mask_email(&counterpart_email),
        })
    }

    /// Accept the counterpart's code, minting a reset token
    ///
    /// On success the reset link goes to the original initiator, never
    /// back to whoever typed the code.
    pub async fn verify(pairlock: &Pairlock, request_id: &str, code: &str) -> Success {
        let request = pairlock
            .database
            .find_consent_request(request_id)
            .await?
            .ok_or(Error::NotFound)?;

        // failure order: missing, then consumed, then expired, then wrong
        let (code_hash, code_expiry) = match &request.stage {
            ConsentStage::Verified { .. } | ConsentStage::Completed { .. } => {
                return Err(Error::AlreadyUsed)
            }
            ConsentStage::CodeSent {
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

        let reset_token = nanoid!(32);
        let reset_expiry = Timestamp::now_utc().add(Duration::from_secs(
            pairlock.config.expiry.expire_reset_token,
        ));

        let stage = ConsentStage::Verified {
            verified_at: Timestamp::now_utc(),
            reset_token: reset_token.clone(),
            reset_expiry,
        };

        if !pairlock
            .database
            .claim_consent_verification(&request.id, &stage)
            .await?
        {
            return Err(Error::AlreadyUsed);
        }

        // the transition stands even if this email fails
        if let Err(error) =
            pairlock
                .mailer
                .send_finalize_link(&request.initiator_email, &reset_token, reset_expiry)
        {
            warn!(
                "Failed to send the reset link for consent request {}: {:?}",
                request.id, error
            );
        }

        Ok(())
    }

    /// Apply a new password using an emailed reset token
    ///
    /// The stage transition and the password write commit atomically,
    /// concurrent calls race for a single winner. Afterwards the new
    /// password is offered to the counterpart through a one-time
    /// handoff, best effort.
    pub async fn finalize(pairlock: &Pairlock, reset_token: &str, new_password: &str) -> Success {
        let request = pairlock
            .database
            .find_consent_request_by_reset_token(reset_token)
            .await?
            .ok_or(Error::NotFound)?;

        let (verified_at, reset_expiry) = match &request.stage {
            ConsentStage::Completed { .. } => return Err(Error::AlreadyUsed),
            ConsentStage::Verified {
                verified_at,
                reset_expiry,
                ..
            } => (*verified_at, *reset_expiry),
            // no reset token exists before verification, a hit here means the lookup lied
            ConsentStage::CodeSent { .. } => return Err(Error::NotFound),
        };

        if util::is_past(reset_expiry) {
            return Err(Error::Expired);
        }

        pairlock
            .config
            .password_scanning
            .assert_safe(new_password)
            .await?;

        let password_hash = util::hash_password(new_password.to_string())?;
        let stage = ConsentStage::Completed {
            verified_at,
            reset_token: reset_token.to_string(),
            used_at: Timestamp::now_utc(),
        };

        if !pairlock
            .database
            .commit_password_change(&request.id, &request.account_id, &password_hash, &stage)
            .await?
        {
            return Err(Error::AlreadyUsed);
        }

        pairlock
            .publish_event(PairlockEvent::PasswordChanged {
                account_id: request.account_id.clone(),
            })
            .await;

        // best effort from here on, the password change already stands
        match SecretHandoff::issue(
            pairlock,
            &request.account_id,
            &request.counterpart_email,
            new_password,
        )
        .await
        {
            Ok(handoff) => {
                if let Err(error) = pairlock.mailer.send_handoff_link(
                    &request.counterpart_email,
                    &handoff.token,
                    handoff.expires_at,
                ) {
                    warn!(
                        "Failed to send the handoff link for consent request {}: {:?}",
                        request.id, error
                    );
                }
            }
            Err(error) => {
                warn!(
                    "Failed to issue a handoff for consent request {}: {:?}",
                    request.id, error
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use iso8601_timestamp::Timestamp;
    use ulid::Ulid;

    use crate::events::PairlockEvent;
    use crate::mailer::OutgoingEmail;
    use crate::models::{ConsentRequest, ConsentStage, PartnerRole, SecretHandoff};
    use crate::test::*;
    use crate::util::hash_code;
    use crate::{Error, Pairlock};

    async fn verified_reset_token(pairlock: &Pairlock) -> String {
        let receipt = ConsentRequest::initiate(pairlock, "alex@example.com")
            .await
            .expect("`ConsentReceipt`");

        let code = sent_code(pairlock, "robin@example.com");
        ConsentRequest::verify(pairlock, &receipt.request_id, &code)
            .await
            .expect("`verify`");

        sent_reset_token(pairlock, "alex@example.com")
    }

    fn flipped(code: &str) -> String {
        code.chars()
            .map(|c| if c == '0' { '1' } else { '0' })
            .collect()
    }

    #[async_std::test]
    async fn it_emails_the_counterpart_a_code() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;

        let receipt = ConsentRequest::initiate(&pairlock, "alex@example.com")
            .await
            .expect("`ConsentReceipt`");

        assert_eq!("r***@example.com", receipt.counterpart_hint);

        match outbox(&pairlock).latest_for("robin@example.com") {
            Some(OutgoingEmail::Code {
                code,
                initiator_name,
            }) => {
                assert_eq!(6, code.len());
                assert!(code.chars().all(|c| c.is_ascii_digit()));
                assert_eq!("alex", initiator_name);
            }
            other => panic!("expected a code email, got {:?}", other),
        }
    }

    #[async_std::test]
    async fn it_lets_either_party_initiate() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;

        let receipt = ConsentRequest::initiate(&pairlock, "Ro.Bin@example.com")
            .await
            .expect("`ConsentReceipt`");

        // the code crosses over to the primary address
        assert_eq!("a***@example.com", receipt.counterpart_hint);
        sent_code(&pairlock, "alex@example.com");
    }

    #[async_std::test]
    async fn it_rejects_unknown_emails() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;

        assert_eq!(
            Err(Error::NotFound),
            ConsentRequest::initiate(&pairlock, "stranger@example.com").await
        );
    }

    #[async_std::test]
    async fn it_rejects_solo_accounts() {
        let pairlock = for_test();
        seed_solo(&pairlock).await;

        assert_eq!(
            Err(Error::ValidationError {
                with: "account_kind"
            }),
            ConsentRequest::initiate(&pairlock, "loner@example.com").await
        );
    }

    #[async_std::test]
    async fn it_rejects_couples_without_a_second_address() {
        let pairlock = for_test();
        seed_couple_without_partner(&pairlock).await;

        assert_eq!(
            Err(Error::ValidationError {
                with: "partner_email"
            }),
            ConsentRequest::initiate(&pairlock, "solo.half@example.com").await
        );
    }

    #[async_std::test]
    async fn it_supersedes_pending_requests() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;

        let first = ConsentRequest::initiate(&pairlock, "alex@example.com")
            .await
            .expect("`ConsentReceipt`");
        let first_code = sent_code(&pairlock, "robin@example.com");

        ConsentRequest::initiate(&pairlock, "alex@example.com")
            .await
            .expect("`ConsentReceipt`");

        // the first request is gone, its code is worthless
        assert_eq!(
            Err(Error::NotFound),
            ConsentRequest::verify(&pairlock, &first.request_id, &first_code).await
        );
    }

    #[async_std::test]
    async fn it_rejects_wrong_codes() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        let receipt = ConsentRequest::initiate(&pairlock, "alex@example.com")
            .await
            .expect("`ConsentReceipt`");
        let code = sent_code(&pairlock, "robin@example.com");

        assert_eq!(
            Err(Error::InvalidCode),
            ConsentRequest::verify(&pairlock, &receipt.request_id, &flipped(&code)).await
        );

        // a failed attempt never advances the request
        let request = pairlock
            .database
            .find_consent_request(&receipt.request_id)
            .await
            .expect("`find_consent_request`")
            .expect("`ConsentRequest`");
        assert!(matches!(request.stage, ConsentStage::CodeSent { .. }));
        assert_eq!(account.id, request.account_id);
    }

    #[async_std::test]
    async fn it_rejects_expired_codes() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        let request = ConsentRequest {
            id: Ulid::new().to_string(),
            account_id: account.id.clone(),
            initiator_email: "alex@example.com".to_string(),
            counterpart_email: "robin@example.com".to_string(),
            initiated_by: PartnerRole::Primary,
            stage: ConsentStage::CodeSent {
                code_hash: hash_code("493024").expect("`hash`"),
                code_expiry: Timestamp::now_utc(),
            },
        };
        pairlock
            .database
            .save_consent_request(&request)
            .await
            .expect("`save_consent_request`");

        // expiry wins over the correctness of the code
        assert_eq!(
            Err(Error::Expired),
            ConsentRequest::verify(&pairlock, &request.id, "493024").await
        );
    }

    #[async_std::test]
    async fn it_issues_a_reset_token_to_the_initiator() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;

        let receipt = ConsentRequest::initiate(&pairlock, "alex@example.com")
            .await
            .expect("`ConsentReceipt`");
        let code = sent_code(&pairlock, "robin@example.com");

        ConsentRequest::verify(&pairlock, &receipt.request_id, &code)
            .await
            .expect("`verify`");

        let token = sent_reset_token(&pairlock, "alex@example.com");
        assert_ne!(token, code);

        let request = pairlock
            .database
            .find_consent_request(&receipt.request_id)
            .await
            .expect("`find_consent_request`")
            .expect("`ConsentRequest`");
        assert!(matches!(request.stage, ConsentStage::Verified { .. }));

        // the code is one-time, a second submission is rejected
        assert_eq!(
            Err(Error::AlreadyUsed),
            ConsentRequest::verify(&pairlock, &receipt.request_id, &code).await
        );
    }

    #[async_std::test]
    async fn it_changes_the_password_exactly_once() {
        let (pairlock, events) = for_test_with_events();
        let account = seed_couple(&pairlock).await;
        let token = verified_reset_token(&pairlock).await;

        ConsentRequest::finalize(&pairlock, &token, "a whole new password")
            .await
            .expect("`finalize`");

        let account = pairlock
            .database
            .find_account(&account.id)
            .await
            .expect("`Account`");
        assert!(
            argon2::verify_encoded(&account.password, b"a whole new password")
                .expect("`verify_encoded`")
        );

        assert!(matches!(
            events.try_recv(),
            Ok(PairlockEvent::PasswordChanged { account_id }) if account_id == account.id
        ));

        // the token burned with the first use
        assert_eq!(
            Err(Error::AlreadyUsed),
            ConsentRequest::finalize(&pairlock, &token, "yet another password").await
        );
    }

    #[async_std::test]
    async fn it_hands_the_new_password_to_the_counterpart() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;
        let token = verified_reset_token(&pairlock).await;

        ConsentRequest::finalize(&pairlock, &token, "a whole new password")
            .await
            .expect("`finalize`");

        let handoff_token = sent_handoff_token(&pairlock, "robin@example.com");
        assert_eq!(
            "a whole new password",
            SecretHandoff::reveal(&pairlock, &handoff_token)
                .await
                .expect("`reveal`")
        );

        // the reveal is one-time as well
        assert_eq!(
            Err(Error::AlreadyUsed),
            SecretHandoff::reveal(&pairlock, &handoff_token).await
        );
    }

    #[async_std::test]
    async fn it_rejects_weak_replacement_passwords() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;
        let token = verified_reset_token(&pairlock).await;

        assert_eq!(
            Err(Error::ValidationError {
                with: "short_password"
            }),
            ConsentRequest::finalize(&pairlock, &token, "short").await
        );

        // a rejected password leaves the token usable
        ConsentRequest::finalize(&pairlock, &token, "a whole new password")
            .await
            .expect("`finalize`");
    }

    #[async_std::test]
    async fn it_rejects_expired_reset_tokens() {
        let mut pairlock = for_test();
        pairlock.config.expiry.expire_reset_token = 0;
        seed_couple(&pairlock).await;

        let token = verified_reset_token(&pairlock).await;

        assert_eq!(
            Err(Error::Expired),
            ConsentRequest::finalize(&pairlock, &token, "a whole new password").await
        );
    }

    #[async_std::test]
    async fn it_admits_a_single_finalize_winner() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;
        let token = verified_reset_token(&pairlock).await;

        let first = async_std::task::spawn({
            let pairlock = pairlock.clone();
            let token = token.clone();
            async move { ConsentRequest::finalize(&pairlock, &token, "raced password one").await }
        });
        let second = async_std::task::spawn({
            let pairlock = pairlock.clone();
            let token = token.clone();
            async move { ConsentRequest::finalize(&pairlock, &token, "raced password two").await }
        });

        let outcomes = [first.await, second.await];
        assert_eq!(1, outcomes.iter().filter(|outcome| outcome.is_ok()).count());
        assert!(outcomes.contains(&Err(Error::AlreadyUsed)));

        // only the winner issued a handoff
        assert_eq!(
            1,
            outbox(&pairlock)
                .all_for("robin@example.com")
                .iter()
                .filter(|email| matches!(email, OutgoingEmail::HandoffLink { .. }))
                .count()
        );
    }
}
