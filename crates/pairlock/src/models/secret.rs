/// Server-held secret material
///
/// Signs ownership tokens and seals handoff ciphertexts. Generated on
/// first use and persisted, so tokens survive restarts.
#[derive(Serialize, Deserialize, Clone)]
pub struct Secret {
    key: String,
}

impl Secret {
    /// Generate fresh secret material
    pub fn generate() -> Secret {
        Secret { key: nanoid!(64) }
    }

    /// Access the raw key material
    pub fn expose(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never log key material
        write!(f, "Secret {{ key: \"{}\" }}", "*".repeat(self.key.len()))
    }
}
