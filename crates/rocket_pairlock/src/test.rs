pub use pairlock::config::Config;
pub use pairlock::mailer::{CaptureMailer, Mailer, OutgoingEmail};
pub use pairlock::models::*;
pub use pairlock::{Database, Error, Pairlock, PairlockEvent};

pub use rocket::http::{ContentType, Status};

use rocket::Route;

pub fn for_test_with_config(config: Config) -> Pairlock {
    Pairlock {
        database: Database::Dummy(Default::default()),
        mailer: Mailer::Capture(Default::default()),
        config,
        event_channel: None,
    }
}

pub fn for_test() -> Pairlock {
    for_test_with_config(Config::default())
}

/// Outbox of the capture mailer behind the given instance
pub fn outbox(pairlock: &Pairlock) -> CaptureMailer {
    match &pairlock.mailer {
        Mailer::Capture(mailer) => mailer.clone(),
        Mailer::Smtp(_) => unreachable!("tests run on the capture mailer"),
    }
}

pub fn sent_code(pairlock: &Pairlock, to: &str) -> String {
    match outbox(pairlock).latest_for(to) {
        Some(OutgoingEmail::Code { code, .. }) => code,
        other => panic!("expected a code for {}, got {:?}", to, other),
    }
}

pub fn sent_reset_token(pairlock: &Pairlock, to: &str) -> String {
    match outbox(pairlock).latest_for(to) {
        Some(OutgoingEmail::FinalizeLink { reset_token }) => reset_token,
        other => panic!("expected a finalize link for {}, got {:?}", to, other),
    }
}

pub fn sent_handoff_token(pairlock: &Pairlock, to: &str) -> String {
    match outbox(pairlock).latest_for(to) {
        Some(OutgoingEmail::HandoffLink { token }) => token,
        other => panic!("expected a handoff link for {}, got {:?}", to, other),
    }
}

pub fn sent_ownership_token(pairlock: &Pairlock, to: &str) -> String {
    match outbox(pairlock).latest_for(to) {
        Some(OutgoingEmail::OwnershipLink { token, .. }) => token,
        other => panic!("expected an ownership link for {}, got {:?}", to, other),
    }
}

pub async fn seed_couple(pairlock: &Pairlock) -> Account {
    Account::new(
        pairlock,
        AccountKind::Couple,
        "alex@example.com".into(),
        Some("robin@example.com".into()),
        "original password".into(),
    )
    .await
    .expect("`Account`")
}

pub async fn bootstrap_rocket(
    pairlock: Pairlock,
    routes: Vec<Route>,
) -> rocket::local::asynchronous::Client {
    let rocket = rocket::build().manage(pairlock).mount("/", routes);

    rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .expect("valid `Rocket`")
}
