use iso8601_timestamp::Timestamp;
use regex::Regex;

use crate::{Error, Result, Success};

lazy_static! {
    static ref ARGON_CONFIG: argon2::Config<'static> = argon2::Config::default();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex");
    static ref SPLIT_RE: Regex = Regex::new("([^@]+)(@.+)").expect("valid regex");
    static ref SYMBOL_RE: Regex = Regex::new("\\+.+|\\.").expect("valid regex");
}

/// Alphabet used for one-time codes
static CODE_ALPHABET: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Check if a given email is syntactically valid
pub fn validate_email(email: &str) -> Success {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(Error::ValidationError { with: "email" })
    }
}

/// Normalise a given email for comparison purposes
///
/// Lower-cases the whole address and strips dots and plus-aliases
/// from the local part, so that `John.Doe+tag@example.com` and
/// `johndoe@example.com` resolve to the same mailbox.
pub fn normalise_email(original: String) -> String {
    let lowercase = original.to_lowercase();
    if let Some(captures) = SPLIT_RE.captures(&lowercase) {
        let mut clean = SYMBOL_RE.replace_all(&captures[1], "").to_string();
        clean.push_str(&captures[2]);
        clean
    } else {
        lowercase
    }
}

/// Mask an email for display, keeping the first character and the domain
pub fn mask_email(email: &str) -> String {
    if let Some((local, domain)) = email.split_once('@') {
        if let Some(first) = local.chars().next() {
            return format!("{}***@{}", first, domain);
        }
    }

    "***".to_string()
}

/// Generate a numeric one-time code
pub fn generate_code(length: usize) -> String {
    nanoid!(length, &CODE_ALPHABET)
}

/// Hash a password using argon2
pub fn hash_password(plaintext_password: String) -> Result<String> {
    argon2::hash_encoded(
        plaintext_password.as_bytes(),
        nanoid!(24).as_bytes(),
        &ARGON_CONFIG,
    )
    .map_err(|_| Error::InternalError)
}

/// Hash a one-time code using argon2
///
/// Codes are stored hashed only, the raw code lives in the
/// outgoing email and nowhere else.
pub fn hash_code(code: &str) -> Result<String> {
    argon2::hash_encoded(code.as_bytes(), nanoid!(24).as_bytes(), &ARGON_CONFIG)
        .map_err(|_| Error::InternalError)
}

/// Check a submitted code against a stored hash
pub fn code_matches(code: &str, code_hash: &str) -> bool {
    argon2::verify_encoded(code_hash, code.as_bytes()).unwrap_or(false)
}

/// Check whether a timestamp lies in the past
pub fn is_past(timestamp: Timestamp) -> bool {
    timestamp.to_unix_timestamp_ms() <= Timestamp::now_utc().to_unix_timestamp_ms()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_normalises_emails() {
        assert_eq!(
            "johndoe@example.com",
            normalise_email("John.Doe+spam@Example.com".to_string())
        );

        assert_eq!(
            "sharedinbox@pair.example",
            normalise_email("shared.inbox+couple@pair.example".to_string())
        );

        // not an email, returned lower-cased as-is
        assert_eq!("notanemail", normalise_email("NotAnEmail".to_string()));
    }

    #[test]
    fn it_masks_emails() {
        assert_eq!("p***@example.com", mask_email("partner@example.com"));
        assert_eq!("***", mask_email("@example.com"));
        assert_eq!("***", mask_email("invalid"));
    }

    #[test]
    fn it_validates_emails() {
        assert_eq!(Ok(()), validate_email("valid@example.com"));
        assert_eq!(
            Err(Error::ValidationError { with: "email" }),
            validate_email("invalid")
        );
        assert_eq!(
            Err(Error::ValidationError { with: "email" }),
            validate_email("spaces in@example.com")
        );
    }

    #[test]
    fn it_generates_numeric_codes() {
        let code = generate_code(6);
        assert_eq!(6, code.len());
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn it_verifies_hashed_codes() {
        let hash = hash_code("493024").expect("`hash`");
        assert!(code_matches("493024", &hash));
        assert!(!code_matches("493025", &hash));
    }
}
