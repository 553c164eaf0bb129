//! Verify a password reset with the counterpart's code
//! POST /reset/verify
use pairlock::models::ConsentRequest;
use pairlock::{Pairlock, Result};
use rocket::serde::json::Json;
use rocket::State;
use rocket_empty::EmptyResponse;

/// # Consent Code
#[derive(Serialize, Deserialize, JsonSchema)]
pub struct DataVerifyReset {
    /// Id of the consent request
    pub request_id: String,
    /// Code from the consent email
    pub code: String,
}

/// # Verify Password Reset
///
/// Submit the emailed consent code, which sends a reset link to the
/// initiating party.
#[openapi(tag = "Reset")]
#[post("/verify", data = "<data>")]
pub async fn verify(
    pairlock: &State<Pairlock>,
    data: Json<DataVerifyReset>,
) -> Result<EmptyResponse> {
    let data = data.into_inner();

    ConsentRequest::verify(pairlock, &data.request_id, &data.code)
        .await
        .map(|_| EmptyResponse)
}
