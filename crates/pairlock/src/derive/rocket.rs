use rocket::{
    http::{ContentType, Status},
    response::{self, Responder},
    Request, Response,
};

use crate::Error;

/// HTTP response builder for Error enum
impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = match self {
            Error::NotFound => Status::NotFound,
            Error::AlreadyUsed => Status::Gone,
            Error::Expired => Status::Gone,
            Error::InvalidCode => Status::Unauthorized,
            Error::Unauthorized => Status::Unauthorized,
            Error::ValidationError { .. } => Status::BadRequest,
            Error::DatabaseError { .. } => Status::InternalServerError,
            Error::InternalError => Status::InternalServerError,
            Error::RenderFail => Status::InternalServerError,
            Error::EmailFailed => Status::InternalServerError,
        };

        // Serialize the error data structure into JSON.
        let string = json!(self).to_string();

        // Build and send the request.
        Response::build()
            .sized_body(string.len(), std::io::Cursor::new(string))
            .header(ContentType::new("application", "json"))
            .status(status)
            .ok()
    }
}
