#[derive(Serialize, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "schemas", derive(JsonSchema))]
#[serde(tag = "type")]
pub enum Error {
    NotFound,
    AlreadyUsed,
    Expired,
    InvalidCode,
    Unauthorized,
    ValidationError {
        with: &'static str,
    },

    DatabaseError {
        operation: &'static str,
        with: &'static str,
    },
    InternalError,
    RenderFail,
    EmailFailed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
pub type Success = Result<()>;
