//! Start a two-party password reset
//! POST /reset
use pairlock::models::{ConsentReceipt, ConsentRequest};
use pairlock::{Pairlock, Result};
use rocket::serde::json::Json;
use rocket::State;

/// # Reset Information
#[derive(Serialize, Deserialize, JsonSchema)]
pub struct DataInitiateReset {
    /// Email of either party on the account
    pub email: String,
}

/// # Initiate Password Reset
///
/// Start a password reset by emailing a consent code to the other party.
#[openapi(tag = "Reset")]
#[post("/", data = "<data>")]
pub async fn initiate(
    pairlock: &State<Pairlock>,
    data: Json<DataInitiateReset>,
) -> Result<Json<ConsentReceipt>> {
    let data = data.into_inner();

    ConsentRequest::initiate(pairlock, &data.email)
        .await
        .map(Json)
}
