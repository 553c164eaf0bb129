use rocket::Route;
use rocket_okapi::okapi::openapi3::OpenApi;

pub mod initiate;
pub mod verify;

pub fn routes() -> (Vec<Route>, OpenApi) {
    openapi_get_routes_spec![initiate::initiate, verify::verify]
}
