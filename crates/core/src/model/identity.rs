use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("identity cannot be empty")]
    Empty,

    #[error("identity contains an invalid character: {0:?}")]
    InvalidCharacter(char),
}

/// Normalized user identity used as the storage key.
///
/// Lower-cased and whitespace-trimmed in the constructor so every store and
/// read path resolves differently-cased input to the same history. This is a
/// free-text identifier, not a verified identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserIdentity(String);

impl UserIdentity {
    /// Creates a normalized identity.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Empty` for blank input and
    /// `IdentityError::InvalidCharacter` for characters that cannot appear in
    /// a storage key (path separators, NUL).
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let raw = value.into();
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IdentityError::Empty);
        }
        if let Some(invalid) = normalized.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
            return Err(IdentityError::InvalidCharacter(invalid));
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
