//! Internationalization (i18n) module.
//!
//! Everything that decides which language a response is rendered in, and
//! which text it contains, lives here.
//!
//! # Architecture
//!
//! - `locale`: validated `Locale` value type
//! - `properties`: `.properties` bundle parser
//! - `catalog`: immutable, UTF-8 message catalog with a locale fallback chain
//! - `resolver`: session-backed locale resolution with a configured default
//! - `interceptor`: `lang` parameter handling before handler dispatch
//! - `audit`: catalog consistency checks
//! - `metrics`: lookup hit/fallback/miss counters
//!
//! # Example
//!
//! ```rust
//! use eucaptcha_web::i18n::{Locale, MessageCatalog};
//!
//! let catalog = MessageCatalog::from_bundles(
//!     "messages",
//!     Locale::english(),
//!     vec![(None, vec![("title", "EU CAPTCHA")])],
//! );
//!
//! let french = Locale::parse("fr").unwrap();
//! assert_eq!(catalog.message("title", &french), "EU CAPTCHA");
//! assert_eq!(catalog.message("missing.key", &french), "missing.key");
//! ```

mod audit;
mod catalog;
mod interceptor;
mod locale;
mod metrics;
mod properties;
mod resolver;

pub use audit::{AuditReport, CatalogAudit};
pub use catalog::{format_message, CatalogError, MessageCatalog};
pub use interceptor::LocaleChangeInterceptor;
pub use locale::{Locale, LocaleError};
pub use metrics::{LookupMetrics, MetricsReport};
pub use properties::PropertiesError;
pub use resolver::SessionLocaleResolver;
