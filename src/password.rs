//! Password strength rating, validation and hashing.
//!
//! `ValidatedPassword` wraps a string and ensures it is a strong password.
//! `PasswordHash` is the bcrypt hash of a `ValidatedPassword`.

use std::fmt::Display;

use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// The special characters a password must contain one of.
const SPECIAL_CHARACTERS: &str = "@$!%*?&";

const MIN_COMPLEX_LENGTH: usize = 8;

/// Whether `password` meets the complexity rule: at least eight characters
/// from letters, digits and `@$!%*?&`, with at least one lowercase letter,
/// uppercase letter, digit and special character.
pub fn is_complex(password: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || SPECIAL_CHARACTERS.contains(c);

    password.chars().count() >= MIN_COMPLEX_LENGTH
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARACTERS.contains(c))
}

/// A rough rating of a password shown while the user types it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    /// Nothing has been typed.
    None,
    /// Shorter than six characters.
    Weak,
    /// Shorter than ten characters, or longer but not complex.
    Moderate,
    /// At least ten characters and complex.
    Strong,
}

/// Rate `password` by its length and complexity.
pub fn password_strength(password: &str) -> PasswordStrength {
    match password.chars().count() {
        0 => PasswordStrength::None,
        1..6 => PasswordStrength::Weak,
        6..10 => PasswordStrength::Moderate,
        _ if is_complex(password) => PasswordStrength::Strong,
        _ => PasswordStrength::Moderate,
    }
}

/// A password that has been validated, but not yet hashed.
///
/// This struct can be used to construct a [PasswordHash].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] if the password does not meet the complexity
    /// rule or is too easy to guess. The error message explains why and how to
    /// make the password stronger.
    pub fn new(raw_password_string: &str) -> Result<Self, Error> {
        if !is_complex(raw_password_string) {
            return Err(Error::TooWeak(format!(
                "use at least {MIN_COMPLEX_LENGTH} characters with a lowercase letter, an \
                 uppercase letter, a digit and one of {SPECIAL_CHARACTERS}"
            )));
        }

        let password_analysis = zxcvbn(raw_password_string, &[]);

        match password_analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password_string.to_string())),
            _ => Err(Error::TooWeak(
                password_analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// The bcrypt hash of a [ValidatedPassword], salt included.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The cost bcrypt recommends.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds of bcrypt.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt rejects the cost.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Whether `raw_password` hashes to this hash.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
