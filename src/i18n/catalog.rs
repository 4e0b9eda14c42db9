//! Message catalog: locale-keyed message bundles loaded once at startup.
//!
//! Bundles follow the `<basename>[_<locale>].properties` naming convention and
//! are read as UTF-8. After loading, the catalog is immutable; share it behind
//! an `Arc` and look messages up from any number of requests without locking.
//!
//! # Fallback chain
//!
//! A lookup for `fr_FR` tries `fr_FR`, then `fr`, then the candidates of the
//! fallback locale (normally `en`), then the base bundle. A key that exists
//! nowhere resolves to the key itself.

use crate::i18n::metrics::LookupMetrics;
use crate::i18n::properties::{self, PropertiesError};
use crate::i18n::Locale;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const BUNDLE_EXTENSION: &str = ".properties";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read message directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read bundle {path}: {source}")]
    ReadBundle {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bundle {path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    #[error("bundle {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: PropertiesError,
    },
}

type Bundle = HashMap<String, String>;

/// Immutable set of message bundles sharing one basename.
#[derive(Debug)]
pub struct MessageCatalog {
    basename: String,
    fallback_locale: Locale,

    /// Bundle suffix ("" for the base bundle, "fr_FR" otherwise) to entries
    bundles: HashMap<String, Bundle>,

    metrics: LookupMetrics,
}

impl MessageCatalog {
    /// Load every `<basename>[_<locale>].properties` file found in `dir`.
    ///
    /// Files whose suffix is not a valid locale are skipped with a warning.
    /// An empty directory yields an empty catalog in which every lookup
    /// resolves to its key.
    pub fn load(dir: &Path, basename: &str, fallback_locale: Locale) -> Result<Self, CatalogError> {
        let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut bundles = HashMap::new();

        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(suffix) = bundle_suffix(file_name, basename) else {
                continue;
            };

            let suffix = if suffix.is_empty() {
                String::new()
            } else {
                match Locale::parse(suffix) {
                    Ok(locale) => locale.bundle_suffix(),
                    Err(e) => {
                        warn!("Skipping bundle {}: {}", path.display(), e);
                        continue;
                    }
                }
            };

            let bundle = read_bundle(&path)?;
            debug!("Loaded {} messages from {}", bundle.len(), path.display());
            bundles.insert(suffix, bundle);
        }

        if bundles.is_empty() {
            warn!(
                "No '{}' bundles found in {}; messages will resolve to their keys",
                basename,
                dir.display()
            );
        } else {
            info!(
                "Loaded {} '{}' bundle(s) from {}",
                bundles.len(),
                basename,
                dir.display()
            );
        }

        Ok(Self {
            basename: basename.to_string(),
            fallback_locale,
            bundles,
            metrics: LookupMetrics::new(),
        })
    }

    /// Build a catalog from in-memory bundles. `None` is the base bundle.
    pub fn from_bundles<I, K, V>(basename: &str, fallback_locale: Locale, bundles: I) -> Self
    where
        I: IntoIterator<Item = (Option<Locale>, Vec<(K, V)>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let bundles = bundles
            .into_iter()
            .map(|(locale, entries)| {
                let suffix = locale.map(|l| l.bundle_suffix()).unwrap_or_default();
                let entries = entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect();
                (suffix, entries)
            })
            .collect();

        Self {
            basename: basename.to_string(),
            fallback_locale,
            bundles,
            metrics: LookupMetrics::new(),
        }
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn fallback_locale(&self) -> &Locale {
        &self.fallback_locale
    }

    pub fn metrics(&self) -> &LookupMetrics {
        &self.metrics
    }

    /// Locales that have their own bundle, sorted.
    pub fn locales(&self) -> Vec<Locale> {
        let mut locales: Vec<Locale> = self
            .bundles
            .keys()
            .filter(|suffix| !suffix.is_empty())
            .filter_map(|suffix| Locale::parse(suffix).ok())
            .collect();
        locales.sort();
        locales
    }

    /// Entries of one bundle, by suffix ("" for the base bundle).
    pub fn bundle(&self, suffix: &str) -> Option<&HashMap<String, String>> {
        self.bundles.get(suffix)
    }

    /// Bundle suffixes consulted for `locale`, most specific first.
    pub fn fallback_chain(&self, locale: &Locale) -> Vec<String> {
        let mut chain = locale.candidate_suffixes();
        for suffix in self.fallback_locale.candidate_suffixes() {
            if !chain.contains(&suffix) {
                chain.push(suffix);
            }
        }
        chain.push(String::new());
        chain
    }

    /// Find the template for `key`, walking the fallback chain.
    pub fn find(&self, key: &str, locale: &Locale) -> Option<&str> {
        let requested = locale.candidate_suffixes();

        for suffix in self.fallback_chain(locale) {
            let Some(value) = self.bundles.get(&suffix).and_then(|b| b.get(key)) else {
                continue;
            };
            if requested.contains(&suffix) {
                self.metrics.record_direct_hit();
            } else {
                self.metrics.record_fallback_hit();
            }
            return Some(value.as_str());
        }

        self.metrics.record_miss();
        debug!("No message for key '{}' in locale {}", key, locale);
        None
    }

    /// Resolve `key` for `locale`; a key with no entry resolves to itself.
    pub fn message(&self, key: &str, locale: &Locale) -> String {
        self.find(key, locale).unwrap_or(key).to_string()
    }

    /// Resolve `key` and substitute `{0}`, `{1}`, ... with `args`.
    ///
    /// Without arguments the template is returned verbatim, so a literal `'`
    /// or `{` in a plain message needs no escaping.
    pub fn message_with_args(&self, key: &str, args: &[&str], locale: &Locale) -> String {
        let template = self.find(key, locale).unwrap_or(key);
        if args.is_empty() {
            template.to_string()
        } else {
            format_message(template, args)
        }
    }
}

/// `messages_fr.properties` -> `Some("fr")`, `messages.properties` -> `Some("")`.
fn bundle_suffix<'a>(file_name: &'a str, basename: &str) -> Option<&'a str> {
    let stem = file_name.strip_suffix(BUNDLE_EXTENSION)?;
    let rest = stem.strip_prefix(basename)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('_').filter(|suffix| !suffix.is_empty())
}

fn read_bundle(path: &Path) -> Result<Bundle, CatalogError> {
    let bytes = std::fs::read(path).map_err(|source| CatalogError::ReadBundle {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| CatalogError::Encoding {
        path: path.to_path_buf(),
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    properties::parse(text).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// MessageFormat-style positional substitution.
///
/// `{n}` is replaced by `args[n]`; `''` is a literal quote and text between
/// single quotes is copied without substitution. Placeholders that are not a
/// valid index are kept as written.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    quoted = !quoted;
                }
            }
            '{' if !quoted => {
                let mut field = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    field.push(inner);
                }

                let arg = field
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| args.get(idx));
                match arg {
                    Some(arg) if closed => out.push_str(arg),
                    _ => {
                        out.push('{');
                        out.push_str(&field);
                        if closed {
                            out.push('}');
                        }
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}
