#[cfg(feature = "rocket-impl")]
pub mod rocket;
