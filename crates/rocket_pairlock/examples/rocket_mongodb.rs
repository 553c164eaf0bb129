//! Run example with `cargo run --example rocket_mongodb --features example`

use rocket_okapi::okapi::openapi3::OpenApi;

#[macro_use]
extern crate rocket;

#[cfg(feature = "example")]
#[launch]
async fn rocket() -> _ {
    use mongodb::{options::ClientOptions, Client};
    use pairlock::database::MongoDb;
    use pairlock::Migration;
    use rocket_okapi::{mount_endpoints_and_merged_docs, settings::OpenApiSettings};

    let client_options = ClientOptions::parse("mongodb://localhost:27017")
        .await
        .expect("Valid connection URL");

    let client = Client::with_options(client_options).expect("MongoDB server");
    let database = pairlock::Database::MongoDb(MongoDb(client.database("pairlock")));

    for migration in [
        Migration::WipeAll,
        Migration::M2026_04_02EnsureUpToSpec,
        Migration::M2026_06_18AddHandoffIndexes,
    ] {
        database.run_migration(migration).await.unwrap();
    }

    let pairlock = pairlock::Pairlock {
        database,
        ..Default::default()
    };

    let mut rocket = rocket::build();
    let settings = OpenApiSettings::default();

    mount_endpoints_and_merged_docs! {
        rocket, "/".to_owned(), settings,
        "/" => (vec![], custom_openapi_spec()),
        "/reset" => rocket_pairlock::routes::reset::routes(),
        "/delete" => rocket_pairlock::routes::deletion::routes(),
        "/handoff" => rocket_pairlock::routes::handoff::routes(),
        "/verify" => rocket_pairlock::routes::ownership::routes(),
    };

    rocket.manage(pairlock).mount(
        "/swagger/",
        rocket_okapi::swagger_ui::make_swagger_ui(&rocket_okapi::swagger_ui::SwaggerUIConfig {
            url: "../openapi.json".to_owned(),
            ..Default::default()
        }),
    )
}

#[cfg(not(feature = "example"))]
fn main() {
    panic!("Enable `example` feature to run this example!");
}

fn custom_openapi_spec() -> OpenApi {
    OpenApi {
        openapi: OpenApi::default_version(),
        ..Default::default()
    }
}
