//! Approve an account deletion with the emailed code
//! PUT /delete
use pairlock::models::DeletionRequest;
use pairlock::{Pairlock, Result};
use rocket::serde::json::Json;
use rocket::State;
use rocket_empty::EmptyResponse;

/// # Deletion Code
#[derive(Serialize, Deserialize, JsonSchema)]
pub struct DataVerifyDeletion {
    /// Id of the account to delete
    pub account_id: String,
    /// Code from the approval email
    pub code: String,
}

/// # Confirm Account Deletion
///
/// Approve the deletion with the emailed code, which removes the
/// account and everything it owns.
#[openapi(tag = "Deletion")]
#[put("/", data = "<data>")]
pub async fn verify(
    pairlock: &State<Pairlock>,
    data: Json<DataVerifyDeletion>,
) -> Result<EmptyResponse> {
    let data = data.into_inner();

    DeletionRequest::verify(pairlock, &data.account_id, &data.code)
        .await
        .map(|_| EmptyResponse)
}

#[cfg(test)]
mod tests {
    use crate::test::*;

    #[async_std::test]
    async fn success() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");
        let code = sent_code(&pairlock, "robin@example.com");

        let client = bootstrap_rocket(
            pairlock.clone(),
            routes![crate::routes::deletion::verify::verify],
        )
        .await;

        let res = client
            .put("/")
            .header(ContentType::JSON)
            .body(
                json!({
                    "account_id": account.id,
                    "code": code,
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(res.status(), Status::NoContent);
        assert_eq!(
            Err(Error::NotFound),
            pairlock.database.find_account(&account.id).await
        );
    }

    #[async_std::test]
    async fn fail_wrong_code() {
        let pairlock = for_test();
        let account = seed_couple(&pairlock).await;

        DeletionRequest::initiate(&pairlock, &account.id, None)
            .await
            .expect("`DeletionReceipt`");

        let client = bootstrap_rocket(
            pairlock.clone(),
            routes![crate::routes::deletion::verify::verify],
        )
        .await;

        let res = client
            .put("/")
            .header(ContentType::JSON)
            .body(
                json!({
                    "account_id": account.id,
                    "code": "this is not the code",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(res.status(), Status::Unauthorized);
        assert_eq!(
            res.into_string().await,
            Some("{\"type\":\"InvalidCode\"}".into())
        );

        // the account is untouched
        assert!(pairlock.database.find_account(&account.id).await.is_ok());
    }
}
