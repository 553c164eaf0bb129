mod account;
mod consent;
mod deletion;
mod handoff;
mod secret;

pub use account::*;
pub use consent::*;
pub use deletion::*;
pub use handoff::*;
pub use secret::*;
