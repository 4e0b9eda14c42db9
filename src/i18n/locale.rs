//! Locale type: validated language/region/variant identifier.
//!
//! A `Locale` is an immutable value parsed from user input (`lang=fr_FR`),
//! configuration (`DEFAULT_LOCALE=en`) or bundle file names
//! (`messages_fr_FR.properties`). Both `_` and `-` are accepted as separators.
//! Parsing, validation and canonical casing are done by `unic_langid`; this
//! type adds the bundle-suffix projection used to pick `.properties` files.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use unic_langid::{langid, LanguageIdentifier, LanguageIdentifierError};

/// Errors produced when a locale string cannot be parsed.
#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("locale string is empty")]
    Empty,

    #[error("invalid locale '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: LanguageIdentifierError,
    },
}

/// A validated locale.
///
/// Subtags are stored in canonical case (language lowercase, region
/// uppercase, variants lowercase), so `fr-fr`, `fr_FR` and `FR-FR` all
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    id: LanguageIdentifier,
}

impl Locale {
    /// English, the default locale of the application.
    pub fn english() -> Self {
        Self { id: langid!("en") }
    }

    /// Parse a locale from a string such as `en`, `fr-FR` or `de_AT_POSIX`.
    ///
    /// # Example
    /// ```
    /// use eucaptcha_web::i18n::Locale;
    ///
    /// let locale = Locale::parse("fr_fr").unwrap();
    /// assert_eq!(locale.to_string(), "fr-FR");
    /// ```
    pub fn parse(value: &str) -> Result<Self, LocaleError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(LocaleError::Empty);
        }

        let id = LanguageIdentifier::from_str(value).map_err(|source| {
            LocaleError::Invalid {
                input: value.to_string(),
                source,
            }
        })?;

        Ok(Self { id })
    }

    /// The lowercase language code.
    pub fn language(&self) -> &str {
        self.id.language.as_str()
    }

    /// The uppercase region code, if any.
    pub fn region(&self) -> Option<&str> {
        self.id.region.as_ref().map(|region| region.as_str())
    }

    /// The variants joined with `_`, if any.
    pub fn variant(&self) -> Option<String> {
        let variants: Vec<&str> = self.id.variants().map(|v| v.as_str()).collect();
        (!variants.is_empty()).then(|| variants.join("_"))
    }

    /// The underlying language identifier.
    pub fn language_identifier(&self) -> &LanguageIdentifier {
        &self.id
    }

    /// BCP 47 tag used for the `Content-Language` header (`fr-FR`).
    pub fn to_tag(&self) -> String {
        self.id.to_string()
    }

    /// Suffix used in bundle file names (`fr_FR` in `messages_fr_FR.properties`).
    pub fn bundle_suffix(&self) -> String {
        self.subtags().join("_")
    }

    /// Bundle suffixes from most to least specific: `fr_FR_posix`, `fr_FR`, `fr`.
    pub fn candidate_suffixes(&self) -> Vec<String> {
        let subtags = self.subtags();
        (1..=subtags.len())
            .rev()
            .map(|len| subtags[..len].join("_"))
            .collect()
    }

    /// Language, region and variants; the script takes no part in bundle
    /// names. A variant without a region keeps an empty region slot
    /// (`de__posix`).
    fn subtags(&self) -> Vec<&str> {
        let mut subtags = vec![self.language()];
        let variants: Vec<&str> = self.id.variants().map(|v| v.as_str()).collect();
        match self.region() {
            Some(region) => subtags.push(region),
            None if !variants.is_empty() => subtags.push(""),
            None => {}
        }
        subtags.extend(variants);
        subtags
    }
}

impl From<LanguageIdentifier> for Locale {
    fn from(id: LanguageIdentifier) -> Self {
        Self { id }
    }
}

impl PartialOrd for Locale {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Locale {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_tag().cmp(&other.to_tag())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::english()
    }
}
