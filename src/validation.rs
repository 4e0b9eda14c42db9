//! Constraint validation with localized messages.
//!
//! Types describe their own constraints by implementing [`Validate`]. The
//! [`LocalizedValidator`] runs them and resolves each violation's message
//! template through the message catalog in the request's locale.
//!
//! Message templates use the `{message.key}` form. Named attributes of the
//! constraint (`{min}`, `{max}`) are interpolated into the resolved text.

use crate::i18n::{Locale, MessageCatalog};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A failed constraint, before localization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub field: String,

    /// `{key}` to look up in the catalog, or a literal message
    pub message_template: String,

    /// Used when the catalog has no entry for the template key
    pub default_message: String,

    /// Named attributes available for interpolation (`min`, `max`, ...)
    pub attributes: Vec<(String, String)>,
}

impl ConstraintViolation {
    pub fn new(
        field: impl Into<String>,
        message_template: impl Into<String>,
        default_message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message_template: message_template.into(),
            default_message: default_message.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl ToString) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    /// Replace the message template (e.g. a field-specific key).
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    /// Catalog key named by the template, if it has the `{key}` form.
    pub fn message_key(&self) -> Option<&str> {
        self.message_template
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .filter(|key| !key.is_empty())
    }
}

/// A localized violation, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Violation {
    pub field: String,
    pub message_key: String,
    pub resolved_message: String,
}

/// Types whose instances can be checked against constraints.
pub trait Validate {
    fn validate(&self) -> Vec<ConstraintViolation>;
}

/// Built-in constraints. Each returns `None` when the value is valid.
pub mod constraints {
    use super::ConstraintViolation;
    use regex::Regex;

    pub const NOT_BLANK: &str = "{validation.not_blank}";
    pub const SIZE: &str = "{validation.size}";
    pub const PATTERN: &str = "{validation.pattern}";

    /// Value must contain at least one non-whitespace character.
    pub fn not_blank(field: &str, value: &str) -> Option<ConstraintViolation> {
        value
            .trim()
            .is_empty()
            .then(|| ConstraintViolation::new(field, NOT_BLANK, "must not be blank"))
    }

    /// Value length in characters must be within `min..=max`.
    pub fn size(field: &str, value: &str, min: usize, max: usize) -> Option<ConstraintViolation> {
        let len = value.chars().count();
        (len < min || len > max).then(|| {
            ConstraintViolation::new(field, SIZE, "size must be between {min} and {max}")
                .with_attribute("min", min)
                .with_attribute("max", max)
        })
    }

    /// Value must fully match `regex`.
    pub fn pattern(field: &str, value: &str, regex: &Regex) -> Option<ConstraintViolation> {
        let full_match = Regex::new(&format!(r"\A(?:{})\z", regex.as_str()))
            .map(|anchored| anchored.is_match(value))
            .unwrap_or(false);
        (!full_match).then(|| {
            ConstraintViolation::new(field, PATTERN, "must match \"{regexp}\"")
                .with_attribute("regexp", regex.as_str())
        })
    }
}

/// Validation engine wired to the message catalog.
pub struct LocalizedValidator {
    catalog: Arc<MessageCatalog>,
}

impl LocalizedValidator {
    pub fn new(catalog: Arc<MessageCatalog>) -> Self {
        Self { catalog }
    }

    /// Validate `target` and localize every violation for `locale`.
    pub fn validate<T: Validate>(&self, target: &T, locale: &Locale) -> BTreeSet<Violation> {
        target
            .validate()
            .into_iter()
            .map(|violation| self.localize(&violation, locale))
            .collect()
    }

    fn localize(&self, violation: &ConstraintViolation, locale: &Locale) -> Violation {
        let (message_key, template) = match violation.message_key() {
            Some(key) => {
                let template = self
                    .catalog
                    .find(key, locale)
                    .unwrap_or(&violation.default_message);
                (key.to_string(), template.to_string())
            }
            None => (
                violation.message_template.clone(),
                violation.message_template.clone(),
            ),
        };

        Violation {
            field: violation.field.clone(),
            message_key,
            resolved_message: interpolate(&template, &violation.attributes),
        }
    }
}

/// Replace `{name}` with the matching attribute; unknown names stay as-is.
fn interpolate(template: &str, attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
}
