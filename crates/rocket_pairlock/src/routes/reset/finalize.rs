//! Apply a new password using a reset token
//! PATCH /reset
use pairlock::models::ConsentRequest;
use pairlock::{Pairlock, Result};
use rocket::serde::json::Json;
use rocket::State;
use rocket_empty::EmptyResponse;

/// # Reset Token
#[derive(Serialize, Deserialize, JsonSchema)]
pub struct DataFinalizeReset {
    /// Token from the reset link
    pub token: String,
    /// New password for the account
    pub password: String,
}

/// # Finalize Password Reset
///
/// Change the shared password using the token from the reset link. The
/// new password is offered to the other party through a one-time
/// handoff link.
#[openapi(tag = "Reset")]
#[patch("/", data = "<data>")]
pub async fn finalize(
    pairlock: &State<Pairlock>,
    data: Json<DataFinalizeReset>,
) -> Result<EmptyResponse> {
    let data = data.into_inner();

    ConsentRequest::finalize(pairlock, &data.token, &data.password)
        .await
        .map(|_| EmptyResponse)
}

#[cfg(test)]
mod tests {
    use crate::test::*;

    async fn reset_token(pairlock: &Pairlock) -> String {
        let receipt = ConsentRequest::initiate(pairlock, "alex@example.com")
            .await
            .expect("`ConsentReceipt`");
        let code = sent_code(pairlock, "robin@example.com");

        ConsentRequest::verify(pairlock, &receipt.request_id, &code)
            .await
            .expect("`verify`");

        sent_reset_token(pairlock, "alex@example.com")
    }

    #[async_std::test]
    async fn success() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;
        let token = reset_token(&pairlock).await;

        let client = bootstrap_rocket(
            pairlock.clone(),
            routes![crate::routes::reset::finalize::finalize],
        )
        .await;

        let res = client
            .patch("/")
            .header(ContentType::JSON)
            .body(
                json!({
                    "token": token,
                    "password": "a whole new password",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(res.status(), Status::NoContent);

        // the counterpart received a handoff link for the new password
        sent_handoff_token(&pairlock, "robin@example.com");
    }

    #[async_std::test]
    async fn fail_used_token() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;
        let token = reset_token(&pairlock).await;

        ConsentRequest::finalize(&pairlock, &token, "a whole new password")
            .await
            .expect("`finalize`");

        let client = bootstrap_rocket(
            pairlock,
            routes![crate::routes::reset::finalize::finalize],
        )
        .await;

        let res = client
            .patch("/")
            .header(ContentType::JSON)
            .body(
                json!({
                    "token": token,
                    "password": "yet another password",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(res.status(), Status::Gone);
        assert_eq!(
            res.into_string().await,
            Some("{\"type\":\"AlreadyUsed\"}".into())
        );
    }

    #[async_std::test]
    async fn fail_short_password() {
        let pairlock = for_test();
        seed_couple(&pairlock).await;
        let token = reset_token(&pairlock).await;

        let client = bootstrap_rocket(
            pairlock,
            routes![crate::routes::reset::finalize::finalize],
        )
        .await;

        let res = client
            .patch("/")
            .header(ContentType::JSON)
            .body(
                json!({
                    "token": token,
                    "password": "short",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(res.status(), Status::BadRequest);
        assert_eq!(
            res.into_string().await,
            Some("{\"type\":\"ValidationError\",\"with\":\"short_password\"}".into())
        );
    }
}
