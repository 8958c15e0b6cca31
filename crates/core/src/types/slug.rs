//! Store slugs (the `/{slug}` part of a shop URL).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug must be between {min} and {max} characters")]
    Length { min: usize, max: usize },
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacters,
    #[error("slug cannot start or end with a hyphen or contain consecutive hyphens")]
    MisplacedHyphen,
    #[error("slug '{0}' is reserved")]
    Reserved(String),
}

/// Path segments the platform itself routes, so no store may claim them.
const RESERVED: &[&str] = &[
    "admin", "agent", "api", "auth", "dashboard", "health", "login", "logout", "orders",
    "register", "shop", "static", "support", "wallet", "webhooks",
];

/// A validated, lowercase store slug.
///
/// ```
/// use bundlehub_core::Slug;
///
/// assert_eq!(Slug::parse("Kwame-Data").unwrap().as_str(), "kwame-data");
/// assert!(Slug::parse("-oops").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 48;

    /// Parse a slug, lowercasing ASCII letters first.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError`] for bad length, characters, hyphen placement, or
    /// a reserved word.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        let s = s.trim().to_ascii_lowercase();

        if s.len() < Self::MIN_LENGTH || s.len() > Self::MAX_LENGTH {
            return Err(SlugError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SlugError::InvalidCharacters);
        }

        if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::MisplacedHyphen);
        }

        if RESERVED.contains(&s.as_str()) {
            return Err(SlugError::Reserved(s));
        }

        Ok(Self(s))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
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
    fn test_valid_slugs() {
        assert_eq!(Slug::parse("abc").unwrap().as_str(), "abc");
        assert_eq!(Slug::parse("kofi-bundles-24").unwrap().as_str(), "kofi-bundles-24");
        assert_eq!(Slug::parse("  MixedCase ").unwrap().as_str(), "mixedcase");
    }

    #[test]
    fn test_length_bounds() {
        assert!(matches!(Slug::parse("ab"), Err(SlugError::Length { .. })));
        assert!(matches!(
            Slug::parse(&"a".repeat(49)),
            Err(SlugError::Length { .. })
        ));
        assert!(Slug::parse(&"a".repeat(48)).is_ok());
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(Slug::parse("my_shop"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("my shop"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("café"), Err(SlugError::InvalidCharacters));
    }

    #[test]
    fn test_hyphen_placement() {
        assert_eq!(Slug::parse("-shop"), Err(SlugError::MisplacedHyphen));
        assert_eq!(Slug::parse("shop-"), Err(SlugError::MisplacedHyphen));
        assert_eq!(Slug::parse("my--shop"), Err(SlugError::MisplacedHyphen));
    }

    #[test]
    fn test_reserved_words() {
        assert_eq!(Slug::parse("Admin"), Err(SlugError::Reserved("admin".to_owned())));
        assert!(matches!(Slug::parse("api"), Err(SlugError::Reserved(_))));
    }
}
