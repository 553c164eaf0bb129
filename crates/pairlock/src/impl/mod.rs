mod account;
mod consent;
mod deletion;
mod handoff;
pub mod ownership;
mod secret;
