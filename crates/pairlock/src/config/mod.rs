mod email;
mod passwords;

pub use email::*;
pub use passwords::*;

/// Pairlock configuration
#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Password scanning strategy
    pub password_scanning: PasswordScanning,

    /// Lifetimes of one-time artifacts
    pub expiry: ExpiryConfig,

    /// Length of generated one-time codes
    pub code_length: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            password_scanning: Default::default(),
            expiry: Default::default(),
            code_length: 6,
        }
    }
}
