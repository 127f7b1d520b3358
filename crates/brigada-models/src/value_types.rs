//! Validated domain primitives.
//!
//! [`Email`] and [`Dni`] can only be built through their validating
//! constructors, so a value that reaches a service is always well formed.
//! Both deserialize through `TryFrom<String>` and are stored as plain text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeError {
    InvalidEmail(String),
    InvalidDni(String),
}

impl std::error::Error for ValueTypeError {}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            Self::InvalidDni(msg) => write!(f, "Invalid DNI/NIE: {}", msg),
        }
    }
}

// ============================================================================
// Email
// ============================================================================

/// A validated, lower-cased email address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(try_from = "String")]
#[sqlx(transparent)]
#[schema(value_type = String, format = "email", example = "bombero@parque.es")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, ValueTypeError> {
        let email = email.into().trim().to_lowercase();
        if email.is_empty() {
            return Err(ValueTypeError::InvalidEmail(
                "email cannot be empty".to_string(),
            ));
        }
        if !email.validate_email() {
            return Err(ValueTypeError::InvalidEmail(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        Ok(Self(email))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Email {
    type Error = ValueTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Email {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// DNI / NIE
// ============================================================================

const CONTROL_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";

/// Spanish national identity number (DNI) or foreigner number (NIE).
///
/// Accepted forms are `12345678Z` and `X1234567L`. Spaces and dashes are
/// stripped and the letters upper-cased before the control letter is
/// checked.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(try_from = "String")]
#[sqlx(transparent)]
#[schema(value_type = String, example = "12345678Z")]
pub struct Dni(String);

impl Dni {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValueTypeError> {
        let normalized: String = raw
            .as_ref()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.len() != 9 || !normalized.is_ascii() {
            return Err(ValueTypeError::InvalidDni(format!(
                "'{}' must have 8 digits and a letter",
                raw.as_ref()
            )));
        }

        let (body, letter) = normalized.split_at(8);
        let digits = match body.as_bytes()[0] {
            b'X' => format!("0{}", &body[1..]),
            b'Y' => format!("1{}", &body[1..]),
            b'Z' => format!("2{}", &body[1..]),
            _ => body.to_string(),
        };

        let number: u32 = digits
            .parse()
            .ok()
            .filter(|_| digits.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| {
                ValueTypeError::InvalidDni(format!("'{}' has a malformed number", raw.as_ref()))
            })?;

        let expected = CONTROL_LETTERS[(number % 23) as usize] as char;
        if letter.chars().next() != Some(expected) {
            return Err(ValueTypeError::InvalidDni(format!(
                "'{}' has the wrong control letter",
                raw.as_ref()
            )));
        }

        Ok(Self(normalized))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a foreigner number (NIE) rather than a DNI.
    pub fn is_nie(&self) -> bool {
        matches!(self.0.as_bytes()[0], b'X' | b'Y' | b'Z')
    }

    /// Builds a valid DNI for a number below 10^8. Used by the seeder.
    pub fn from_number(number: u32) -> Self {
        let number = number % 100_000_000;
        let letter = CONTROL_LETTERS[(number % 23) as usize] as char;
        Self(format!("{:08}{}", number, letter))
    }
}

impl TryFrom<String> for Dni {
    type Error = ValueTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Dni {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for Dni {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dni({})", self.0)
    }
}

impl fmt::Display for Dni {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let email = Email::new("  Jefe@Parque.ES ").unwrap();
        assert_eq!(email.as_str(), "jefe@parque.es");
    }

    #[test]
    fn email_rejects_garbage() {
        assert!(Email::new("").is_err());
        assert!(Email::new("no-at-sign").is_err());
        assert!("@parque.es".parse::<Email>().is_err());
    }

    #[test]
    fn email_deserializes_with_validation() {
        let ok: Email = serde_json::from_str("\"bombero@parque.es\"").unwrap();
        assert_eq!(ok.to_string(), "bombero@parque.es");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }

    #[test]
    fn valid_dni() {
        let dni = Dni::new("12345678Z").unwrap();
        assert_eq!(dni.as_str(), "12345678Z");
        assert!(!dni.is_nie());
    }

    #[test]
    fn dni_is_normalized() {
        assert_eq!(Dni::new("12345678-z").unwrap().as_str(), "12345678Z");
        assert_eq!(Dni::new("1234 5678 z").unwrap().as_str(), "12345678Z");
    }

    #[test]
    fn wrong_control_letter() {
        assert!(matches!(
            Dni::new("12345678A"),
            Err(ValueTypeError::InvalidDni(_))
        ));
    }

    #[test]
    fn valid_nie() {
        // X1234567 -> 01234567 % 23 = 19 -> L
        let nie = Dni::new("X1234567L").unwrap();
        assert!(nie.is_nie());
        assert!(Dni::new("X1234567T").is_err());
    }

    #[test]
    fn malformed_lengths_and_digits() {
        assert!(Dni::new("1234567Z").is_err());
        assert!(Dni::new("1234567AZ").is_err());
        assert!(Dni::new("").is_err());
        assert!(Dni::new("ñ2345678Z").is_err());
    }

    #[test]
    fn from_number_round_trips_through_validation() {
        for n in [0, 1, 12_345_678, 99_999_999] {
            let dni = Dni::from_number(n);
            assert_eq!(Dni::new(dni.as_str()).unwrap(), dni);
        }
    }

    #[test]
    fn dni_deserializes_with_validation() {
        assert!(serde_json::from_str::<Dni>("\"12345678Z\"").is_ok());
        assert!(serde_json::from_str::<Dni>("\"12345678Q\"").is_err());
    }
}
