use std::collections::HashSet;

use crate::{Error, Result};

/// Password scanning strategies
#[derive(Default, Serialize, Deserialize, Clone)]
pub enum PasswordScanning {
    /// Only enforce a minimum length
    #[default]
    None,
    /// Additionally block a custom password list
    Custom { passwords: HashSet<String> },
}

impl PasswordScanning {
    /// Check whether a password can be used
    pub async fn assert_safe(&self, password: &str) -> Result<()> {
        // Make sure the password is long enough
        if password.len() < 8 {
            return Err(Error::ValidationError {
                with: "short_password",
            });
        }

        match self {
            PasswordScanning::None => Ok(()),
            PasswordScanning::Custom { passwords } => {
                if passwords.contains(password) {
                    Err(Error::ValidationError {
                        with: "compromised_password",
                    })
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PasswordScanning;
    use crate::Error;

    #[async_std::test]
    async fn it_accepts_long_enough_passwords() {
        let scanning = PasswordScanning::None;
        assert_eq!(scanning.assert_safe("sensible password").await, Ok(()));
    }

    #[async_std::test]
    async fn it_rejects_short_passwords() {
        let scanning = PasswordScanning::None;
        assert_eq!(
            scanning.assert_safe("short").await,
            Err(Error::ValidationError {
                with: "short_password"
            })
        );
    }

    #[async_std::test]
    async fn it_rejects_listed_passwords() {
        let scanning = PasswordScanning::Custom {
            passwords: ["correct horse battery staple".to_string()]
                .into_iter()
                .collect(),
        };

        assert_eq!(
            scanning.assert_safe("correct horse battery staple").await,
            Err(Error::ValidationError {
                with: "compromised_password"
            })
        );

        assert_eq!(
            scanning.assert_safe("definitely unlisted").await,
            Ok(())
        );
    }
}
