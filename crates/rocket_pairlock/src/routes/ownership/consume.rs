//! Verify ownership of one party's email address
//! POST /verify/<role>/<token>
use pairlock::models::{Account, OwnershipStatus};
use pairlock::{Error, Pairlock, Result};
use rocket::serde::json::Json;
use rocket::State;

/// # Verify Email Ownership
///
/// Consume a signed link from an ownership email, marking that party's
/// address as verified. Safe to repeat.
#[openapi(tag = "Ownership")]
#[post("/<role>/<token>")]
pub async fn consume(
    pairlock: &State<Pairlock>,
    role: String,
    token: String,
) -> Result<Json<OwnershipStatus>> {
    let role = role.parse().map_err(|_| Error::NotFound)?;

    Account::consume_ownership_token(pairlock, &token, role)
        .await
        .map(Json)
}
