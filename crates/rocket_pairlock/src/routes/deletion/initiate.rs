//! Start an account deletion
//! POST /delete
use pairlock::models::{DeletionReceipt, DeletionRequest};
use pairlock::{Pairlock, Result};
use rocket::serde::json::Json;
use rocket::State;

/// # Deletion Information
#[derive(Serialize, Deserialize, JsonSchema)]
pub struct DataInitiateDeletion {
    /// Id of the account to delete
    pub account_id: String,
    /// Email of the party asking for deletion, defaults to the primary
    pub email: Option<String>,
}

/// # Initiate Account Deletion
///
/// Start an account deletion by emailing an approval code. With a
/// second linked address the code goes to the other party, otherwise
/// the sole address approves for itself.
#[openapi(tag = "Deletion")]
#[post("/", data = "<data>")]
pub async fn initiate(
    pairlock: &State<Pairlock>,
    data: Json<DataInitiateDeletion>,
) -> Result<Json<DeletionReceipt>> {
    let data = data.into_inner();

    DeletionRequest::initiate(pairlock, &data.account_id, data.email.as_deref())
        .await
        .map(Json)
}
