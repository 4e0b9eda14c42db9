//! Catalog consistency audit.
//!
//! Compares every locale bundle against the base bundle so that translation
//! gaps are reported at startup (and by the `check-messages` binary) rather
//! than discovered as raw keys on a rendered page.

use crate::i18n::MessageCatalog;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Audit report containing errors and warnings about a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Problems that break message rendering (e.g. placeholder mismatches)
    pub errors: Vec<String>,

    /// Gaps that degrade gracefully through the fallback chain
    pub warnings: Vec<String>,
}

impl AuditReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for AuditReport {
    fn default() -> Self {
        Self::new()
    }
}

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

pub struct CatalogAudit;

impl CatalogAudit {
    /// Audit a catalog against its base bundle.
    ///
    /// Checks that:
    /// - the base bundle exists
    /// - language-level bundles (`fr`, not `fr_CA`) translate every base key
    /// - no bundle defines keys unknown to the base bundle
    /// - translations keep the same `{n}` placeholders as the base message
    pub fn audit(catalog: &MessageCatalog) -> AuditReport {
        let mut report = AuditReport::new();

        let Some(base) = catalog.bundle("") else {
            report.errors.push(format!(
                "Base bundle '{}.properties' is missing",
                catalog.basename()
            ));
            return report;
        };

        for locale in catalog.locales() {
            let suffix = locale.bundle_suffix();
            let Some(bundle) = catalog.bundle(&suffix) else {
                continue;
            };

            if locale.region().is_none() {
                let missing: BTreeSet<&str> = base
                    .keys()
                    .filter(|key| !bundle.contains_key(*key))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    report.warnings.push(format!(
                        "Locale '{}' is missing {} key(s): {:?}",
                        locale,
                        missing.len(),
                        missing
                    ));
                }
            }

            let orphans: BTreeSet<&str> = bundle
                .keys()
                .filter(|key| !base.contains_key(*key))
                .map(String::as_str)
                .collect();
            if !orphans.is_empty() {
                report.warnings.push(format!(
                    "Locale '{}' defines key(s) absent from the base bundle: {:?}",
                    locale, orphans
                ));
            }

            let mut keys: Vec<&String> = bundle.keys().collect();
            keys.sort();
            for key in keys {
                let Some(base_value) = base.get(key) else {
                    continue;
                };
                let expected = Self::extract_placeholders(base_value);
                let actual = Self::extract_placeholders(&bundle[key]);
                if expected != actual {
                    report.errors.push(format!(
                        "Placeholder mismatch for '{}' in locale '{}': base has {:?}, translation has {:?}",
                        key, locale, expected, actual
                    ));
                }
            }
        }

        report
    }

    /// Extract the distinct positional placeholders (`{0}`, `{1}`) of a message.
    fn extract_placeholders(text: &str) -> BTreeSet<usize> {
        let regex = PLACEHOLDER_REGEX
            .get_or_init(|| Regex::new(r"\{\s*(\d+)\s*\}").expect("placeholder regex is valid"));

        regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).and_then(|m| m.as_str().parse().ok()))
            .collect()
    }
}
