//! Request-locale and view-resolution pipeline for the EU CAPTCHA web front end.
//!
//! A request passes through session lookup, the `lang` parameter interceptor
//! and the session locale resolver before its handler runs. Handlers name a
//! logical view that is resolved to a template under `/WEB-INF/pages/` and
//! rendered with messages from the catalog. Stylesheets, scripts and vendored
//! web assets are served straight from disk.

pub mod config;
pub mod i18n;
pub mod interceptor;
pub mod params;
pub mod scheduler;
pub mod session;
pub mod static_routes;
pub mod validation;
pub mod view;
pub mod web;
