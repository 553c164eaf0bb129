pub mod deletion;
pub mod handoff;
pub mod ownership;
pub mod reset;
