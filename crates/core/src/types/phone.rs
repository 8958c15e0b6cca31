//! Mobile phone numbers (bundle recipients, store contacts, payout accounts).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("phone number may only contain digits, spaces, dashes and a leading +")]
    InvalidCharacters,
    #[error("phone number must be 10 digits starting with 0, or 12 digits starting with 233")]
    InvalidLength,
}

/// A Ghanaian mobile number in local `0XXXXXXXXX` form.
///
/// Accepted inputs: `0241234567`, `233241234567`, `+233 24 123 4567`,
/// `024-123-4567`. Everything is normalized to the ten-digit local form that
/// the bundle vendor expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const COUNTRY_CODE: &'static str = "233";

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] when the input is empty, has stray characters,
    /// or does not have a valid length for local or international form.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if !body
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        {
            return Err(PhoneError::InvalidCharacters);
        }

        let digits: String = body.chars().filter(char::is_ascii_digit).collect();

        let international_rest = digits
            .strip_prefix(Self::COUNTRY_CODE)
            .filter(|_| digits.len() == 12)
            .map(str::to_owned);

        let local = match international_rest {
            Some(rest) => format!("0{rest}"),
            None if digits.len() == 10 && digits.starts_with('0') => digits,
            None => return Err(PhoneError::InvalidLength),
        };

        // 00 would be an international dialling prefix, not a mobile number
        if local.starts_with("00") {
            return Err(PhoneError::InvalidLength);
        }

        Ok(Self(local))
    }

    /// The local ten-digit form (`0241234567`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The international form without the plus (`233241234567`).
    #[must_use]
    pub fn international(&self) -> String {
        format!(
            "{}{}",
            Self::COUNTRY_CODE,
            self.0.get(1..).unwrap_or_default()
        )
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for PhoneNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PhoneNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for PhoneNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_local_form_is_kept() {
        assert_eq!(PhoneNumber::parse("0241234567").unwrap().as_str(), "0241234567");
    }

    #[test]
    fn test_international_forms_normalize() {
        for input in ["233241234567", "+233241234567", "+233 24 123 4567"] {
            assert_eq!(PhoneNumber::parse(input).unwrap().as_str(), "0241234567");
        }
    }

    #[test]
    fn test_separators_are_stripped() {
        assert_eq!(PhoneNumber::parse("024-123-4567").unwrap().as_str(), "0241234567");
    }

    #[test]
    fn test_international_output() {
        let phone = PhoneNumber::parse("0501234567").unwrap();
        assert_eq!(phone.international(), "233501234567");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::parse("024abc4567"), Err(PhoneError::InvalidCharacters));
        assert_eq!(PhoneNumber::parse("02412345"), Err(PhoneError::InvalidLength));
        assert_eq!(PhoneNumber::parse("1241234567"), Err(PhoneError::InvalidLength));
        assert_eq!(PhoneNumber::parse("0041234567"), Err(PhoneError::InvalidLength));
        assert_eq!(PhoneNumber::parse("234241234567"), Err(PhoneError::InvalidLength));
    }
}
