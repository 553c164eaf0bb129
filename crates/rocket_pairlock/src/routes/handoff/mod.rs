use rocket::Route;
use rocket_okapi::okapi::openapi3::OpenApi;

pub mod reveal;

pub fn routes() -> (Vec<Route>, OpenApi) {
    openapi_get_routes_spec![reveal::reveal]
}
