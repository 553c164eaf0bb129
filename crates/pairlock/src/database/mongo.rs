use bson::{to_bson, to_document, Bson, Document};
use iso8601_timestamp::Timestamp;
use mongodb::options::{Collation, CollationStrength, FindOneOptions, ReadConcern, UpdateOptions};
use std::ops::Deref;

use crate::{
    models::{
        Account, ConsentRequest, ConsentStage, DeletionRequest, DeletionStage, PartnerRole,
        Secret, SecretHandoff,
    },
    Error, Result, Success,
};

use super::{definition::AbstractDatabase, Migration};

#[derive(Clone)]
pub struct MongoDb(pub mongodb::Database);

impl Deref for MongoDb {
    type Target = mongodb::Database;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn verified_flag_field(role: PartnerRole) -> &'static str {
    match role {
        PartnerRole::Primary => "email_verified",
        PartnerRole::Partner => "partner_email_verified",
    }
}

fn now_bson() -> Result<Bson> {
    to_bson(&Timestamp::now_utc()).map_err(|_| Error::DatabaseError {
        operation: "to_bson",
        with: "timestamp",
    })
}

#[async_trait]
impl AbstractDatabase for MongoDb {
    /// Run a database migration
    async fn run_migration(&self, migration: Migration) -> Success {
        // migrations are allowed to fail loudly
        match migration {
            #[cfg(debug_assertions)]
            Migration::WipeAll => {
                // Drop the entire database
                self.drop().await.unwrap();
            }
            Migration::M2026_04_02EnsureUpToSpec => {
                if self
                    .collection::<Document>("consent_requests")
                    .list_index_names()
                    .await
                    .unwrap_or_default()
                    .contains(&"reset_token".to_owned())
                {
                    return Ok(());
                }

                // Make sure all collections exist
                let list = self.list_collection_names().await.unwrap();
                let collections = ["accounts", "consent_requests", "deletion_requests"];

                for name in collections {
                    if !list.contains(&name.to_string()) {
                        self.create_collection(name).await.unwrap();
                    }
                }

                // Setup index for `accounts`
                let col = self.collection::<Document>("accounts");
                col.drop_indexes().await.unwrap();

                self.run_command(doc! {
                    "createIndexes": "accounts",
                    "indexes": [
                        {
                            "key": {
                                "email": 1
                            },
                            "name": "email",
                            "unique": true,
                            "collation": {
                                "locale": "en",
                                "strength": 2
                            }
                        },
                        {
                            "key": {
                                "email_normalised": 1
                            },
                            "name": "email_normalised",
                            "unique": true,
                            "collation": {
                                "locale": "en",
                                "strength": 2
                            }
                        },
                        {
                            "key": {
                                "partner_email_normalised": 1
                            },
                            "name": "partner_email_normalised",
                            "collation": {
                                "locale": "en",
                                "strength": 2
                            }
                        }
                    ]
                })
                .await
                .unwrap();

                // Setup index for `consent_requests`
                let col = self.collection::<Document>("consent_requests");
                col.drop_indexes().await.unwrap();

                self.run_command(doc! {
                    "createIndexes": "consent_requests",
                    "indexes": [
                        {
                            "key": {
                                "account_id": 1
                            },
                            "name": "account_id"
                        },
                        {
                            "key": {
                                "stage.reset_token": 1
                            },
                            "name": "reset_token"
                        }
                    ]
                })
                .await
                .unwrap();

                // Setup index for `deletion_requests`
                let col = self.collection::<Document>("deletion_requests");
                col.drop_indexes().await.unwrap();

                self.run_command(doc! {
                    "createIndexes": "deletion_requests",
                    "indexes": [
                        {
                            "key": {
                                "account_id": 1
                            },
                            "name": "account_id"
                        }
                    ]
                })
                .await
                .unwrap();
            }
            Migration::M2026_06_18AddHandoffIndexes => {
                if self
                    .collection::<Document>("secret_handoffs")
                    .list_index_names()
                    .await
                    .unwrap_or_default()
                    .contains(&"token".to_owned())
                {
                    return Ok(());
                }

                let list = self.list_collection_names().await.unwrap();
                if !list.contains(&"secret_handoffs".to_string()) {
                    self.create_collection("secret_handoffs").await.unwrap();
                }

                self.run_command(doc! {
                    "createIndexes": "secret_handoffs",
                    "indexes": [
                        {
                            "key": {
                                "token": 1
                            },
                            "name": "token",
                            "unique": true
                        },
                        {
                            "key": {
                                "account_id": 1
                            },
                            "name": "account_id"
                        }
                    ]
                })
                .await
                .unwrap();
            }
        }

        Ok(())
    }

    /// Find account by id
    async fn find_account(&self, id: &str) -> Result<Account> {
        self.collection("accounts")
            .find_one(doc! {
                "_id": id
            })
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "find_one",
                with: "account",
            })?
            .ok_or(Error::NotFound)
    }

    /// Find account by either party's normalised email
    async fn find_account_by_normalised_email(
        &self,
        normalised_email: &str,
    ) -> Result<Option<Account>> {
        self.collection("accounts")
            .find_one(doc! {
                "$or": [
                    {
                        "email_normalised": normalised_email
                    },
                    {
                        "partner_email_normalised": normalised_email
                    }
                ]
            })
            .with_options(
                FindOneOptions::builder()
                    .collation(
                        Collation::builder()
                            .locale("en")
                            .strength(CollationStrength::Secondary)
                            .build(),
                    )
                    .build(),
            )
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "find_one",
                with: "account",
            })
    }

    /// Save account
    async fn save_account(&self, account: &Account) -> Success {
        self.collection::<Account>("accounts")
            .update_one(
                doc! {
                    "_id": &account.id
                },
                doc! {
                    "$set": to_document(account).map_err(|_| Error::DatabaseError {
                        operation: "to_document",
                        with: "account",
                    })?
                },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "upsert_one",
                with: "account",
            })
            .map(|_| ())
    }

    /// Flip a role's verified flag, returns false if it was already set
    async fn mark_email_verified(&self, account_id: &str, role: PartnerRole) -> Result<bool> {
        let field = verified_flag_field(role);

        let mut query = doc! {
            "_id": account_id
        };
        query.insert(field, doc! { "$ne": true });

        let mut set = Document::new();
        set.insert(field, true);

        let result = self
            .collection::<Account>("accounts")
            .update_one(
                query,
                doc! {
                    "$set": set
                },
            )
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "update_one",
                with: "account",
            })?;

        Ok(result.modified_count == 1)
    }

    /// Delete an account and everything it owns, atomically
    async fn delete_account_cascade(&self, account_id: &str) -> Success {
        let mut session = self.client().start_session().await.map_err(|_| {
            Error::DatabaseError {
                operation: "start_session",
                with: "account",
            }
        })?;

        session
            .start_transaction()
            .read_concern(ReadConcern::snapshot())
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "start_transaction",
                with: "account",
            })?;

        // belongings plus pending consent artifacts, all keyed by account id
        for name in [
            "photos",
            "messages",
            "shares",
            "favorites",
            "notifications",
            "consent_requests",
            "secret_handoffs",
        ] {
            if self
                .collection::<Document>(name)
                .delete_many(doc! {
                    "account_id": account_id
                })
                .session(&mut session)
                .await
                .is_err()
            {
                session.abort_transaction().await.ok();
                return Err(Error::DatabaseError {
                    operation: "delete_many",
                    with: name,
                });
            }
        }

        if self
            .collection::<Account>("accounts")
            .delete_one(doc! {
                "_id": account_id
            })
            .session(&mut session)
            .await
            .is_err()
        {
            session.abort_transaction().await.ok();
            return Err(Error::DatabaseError {
                operation: "delete_one",
                with: "account",
            });
        }

        session
            .commit_transaction()
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "commit_transaction",
                with: "account",
            })
    }

    /// Find consent request by id
    async fn find_consent_request(&self, id: &str) -> Result<Option<ConsentRequest>> {
        self.collection("consent_requests")
            .find_one(doc! {
                "_id": id
            })
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "find_one",
                with: "consent_request",
            })
    }

    /// Find consent request holding the given reset token
    async fn find_consent_request_by_reset_token(
        &self,
        reset_token: &str,
    ) -> Result<Option<ConsentRequest>> {
        self.collection("consent_requests")
            .find_one(doc! {
                "stage.reset_token": reset_token
            })
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "find_one",
                with: "consent_request",
            })
    }

    /// Save consent request
    async fn save_consent_request(&self, request: &ConsentRequest) -> Success {
        self.collection::<ConsentRequest>("consent_requests")
            .update_one(
                doc! {
                    "_id": &request.id
                },
                doc! {
                    "$set": to_document(request).map_err(|_| Error::DatabaseError {
                        operation: "to_document",
                        with: "consent_request",
                    })?
                },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "upsert_one",
                with: "consent_request",
            })
            .map(|_| ())
    }

    /// Delete all consent requests for an account
    async fn delete_consent_requests(&self, account_id: &str) -> Success {
        self.collection::<ConsentRequest>("consent_requests")
            .delete_many(doc! {
                "account_id": account_id
            })
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "delete_many",
                with: "consent_request",
            })
            .map(|_| ())
    }

    /// Move a consent request from code sent to verified
    async fn claim_consent_verification(&self, id: &str, stage: &ConsentStage) -> Result<bool> {
        let result = self
            .collection::<ConsentRequest>("consent_requests")
            .update_one(
                doc! {
                    "_id": id,
                    "stage.status": "CodeSent",
                    "stage.code_expiry": {
                        "$gt": now_bson()?
                    }
                },
                doc! {
                    "$set": {
                        "stage": to_document(stage).map_err(|_| Error::DatabaseError {
                            operation: "to_document",
                            with: "consent_request",
                        })?
                    }
                },
            )
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "update_one",
                with: "consent_request",
            })?;

        Ok(result.modified_count == 1)
    }

    /// Complete a consent request and apply the new password hash
    async fn commit_password_change(
        &self,
        id: &str,
        account_id: &str,
        password_hash: &str,
        stage: &ConsentStage,
    ) -> Result<bool> {
        let stage = to_document(stage).map_err(|_| Error::DatabaseError {
            operation: "to_document",
            with: "consent_request",
        })?;

        let mut session = self.client().start_session().await.map_err(|_| {
            Error::DatabaseError {
                operation: "start_session",
                with: "consent_request",
            }
        })?;

        session
            .start_transaction()
            .read_concern(ReadConcern::snapshot())
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "start_transaction",
                with: "consent_request",
            })?;

        let result = self
            .collection::<ConsentRequest>("consent_requests")
            .update_one(
                doc! {
                    "_id": id,
                    "stage.status": "Verified",
                    "stage.reset_expiry": {
                        "$gt": now_bson()?
                    }
                },
                doc! {
                    "$set": {
                        "stage": stage
                    }
                },
            )
            .session(&mut session)
            .await;

        let claimed = match result {
            Ok(result) => result.modified_count == 1,
            Err(_) => {
                session.abort_transaction().await.ok();
                return Err(Error::DatabaseError {
                    operation: "update_one",
                    with: "consent_request",
                });
            }
        };

        if !claimed {
            session.abort_transaction().await.ok();
            return Ok(false);
        }

        if self
            .collection::<Account>("accounts")
            .update_one(
                doc! {
                    "_id": account_id
                },
                doc! {
                    "$set": {
                        "password": password_hash
                    }
                },
            )
            .session(&mut session)
            .await
            .is_err()
        {
            session.abort_transaction().await.ok();
            return Err(Error::DatabaseError {
                operation: "update_one",
                with: "account",
            });
        }

        session
            .commit_transaction()
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "commit_transaction",
                with: "consent_request",
            })?;

        Ok(true)
    }

    /// Find deletion request by account id
    async fn find_deletion_request(&self, account_id: &str) -> Result<Option<DeletionRequest>> {
        self.collection("deletion_requests")
            .find_one(doc! {
                "account_id": account_id
            })
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "find_one",
                with: "deletion_request",
            })
    }

    /// Save deletion request
    async fn save_deletion_request(&self, request: &DeletionRequest) -> Success {
        self.collection::<DeletionRequest>("deletion_requests")
            .update_one(
                doc! {
                    "_id": &request.id
                },
                doc! {
                    "$set": to_document(request).map_err(|_| Error::DatabaseError {
                        operation: "to_document",
                        with: "deletion_request",
                    })?
                },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "upsert_one",
                with: "deletion_request",
            })
            .map(|_| ())
    }

    /// Delete all deletion requests for an account
    async fn delete_deletion_requests(&self, account_id: &str) -> Success {
        self.collection::<DeletionRequest>("deletion_requests")
            .delete_many(doc! {
                "account_id": account_id
            })
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "delete_many",
                with: "deletion_request",
            })
            .map(|_| ())
    }

    /// Move a deletion request from code sent to verified
    async fn claim_deletion_verification(&self, id: &str, stage: &DeletionStage) -> Result<bool> {
        let result = self
            .collection::<DeletionRequest>("deletion_requests")
            .update_one(
                doc! {
                    "_id": id,
                    "stage.status": "CodeSent",
                    "stage.code_expiry": {
                        "$gt": now_bson()?
                    }
                },
                doc! {
                    "$set": {
                        "stage": to_document(stage).map_err(|_| Error::DatabaseError {
                            operation: "to_document",
                            with: "deletion_request",
                        })?
                    }
                },
            )
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "update_one",
                with: "deletion_request",
            })?;

        Ok(result.modified_count == 1)
    }

    /// Find secret handoff by reveal token
    async fn find_secret_handoff(&self, token: &str) -> Result<Option<SecretHandoff>> {
        self.collection("secret_handoffs")
            .find_one(doc! {
                "token": token
            })
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "find_one",
                with: "secret_handoff",
            })
    }

    /// Save secret handoff
    async fn save_secret_handoff(&self, handoff: &SecretHandoff) -> Success {
        self.collection::<SecretHandoff>("secret_handoffs")
            .update_one(
                doc! {
                    "_id": &handoff.id
                },
                doc! {
                    "$set": to_document(handoff).map_err(|_| Error::DatabaseError {
                        operation: "to_document",
                        with: "secret_handoff",
                    })?
                },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "upsert_one",
                with: "secret_handoff",
            })
            .map(|_| ())
    }

    /// Mark a handoff as used, returns false if someone else got there first
    async fn claim_secret_handoff(&self, id: &str, used_at: Timestamp) -> Result<bool> {
        let result = self
            .collection::<SecretHandoff>("secret_handoffs")
            .update_one(
                doc! {
                    "_id": id,
                    "used_at": Bson::Null
                },
                doc! {
                    "$set": {
                        "used_at": to_bson(&used_at).map_err(|_| Error::DatabaseError {
                            operation: "to_bson",
                            with: "secret_handoff",
                        })?
                    }
                },
            )
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "update_one",
                with: "secret_handoff",
            })?;

        Ok(result.modified_count == 1)
    }

    /// Find server secret
    async fn find_secret(&self) -> Result<Option<Secret>> {
        self.collection("secret")
            .find_one(doc! {})
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "find_one",
                with: "secret",
            })
    }

    /// Save server secret
    async fn save_secret(&self, secret: &Secret) -> Success {
        self.collection::<Secret>("secret")
            .update_one(
                doc! {},
                doc! {
                    "$set": to_document(secret).map_err(|_| Error::DatabaseError {
                        operation: "to_document",
                        with: "secret",
                    })?
                },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await
            .map_err(|_| Error::DatabaseError {
                operation: "upsert_one",
                with: "secret",
            })
            .map(|_| ())
    }
}
