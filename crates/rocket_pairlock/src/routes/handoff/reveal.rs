//! Reveal a handed-off secret, once
//! GET /handoff/<token>
use pairlock::models::SecretHandoff;
use pairlock::{Pairlock, Result};
use rocket::serde::json::Json;
use rocket::State;

/// # Revealed Secret
#[derive(Serialize, Deserialize, JsonSchema)]
pub struct ResponseReveal {
    /// The handed-off secret
    pub secret: String,
}

/// # Reveal Secret
///
/// Fetch the secret behind a handoff link. The token burns with the
/// first successful reveal.
#[openapi(tag = "Handoff")]
#[get("/<token>")]
pub async fn reveal(pairlock: &State<Pairlock>, token: String) -> Result<Json<ResponseReveal>> {
    SecretHandoff::reveal(pairlock, &token)
        .await
        .map(|secret| Json(ResponseReveal { secret }))
}
