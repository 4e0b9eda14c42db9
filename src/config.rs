use crate::i18n::Locale;
use anyhow::{ensure, Context, Result};
use axum::http::Method;
use chrono::TimeDelta;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Web root (contains WEB-INF/pages)
    pub web_root: PathBuf,

    // Message catalog
    pub messages_dir: PathBuf,
    pub messages_basename: String,

    // Locale handling; None means "use Accept-Language"
    pub default_locale: Option<Locale>,
    pub locale_param: String,
    pub locale_change_methods: Vec<Method>,

    // Views
    pub view_prefix: String,
    pub view_suffix: String,

    // Static assets
    pub webjars_dir: PathBuf,

    // Sessions
    pub session_cookie: String,
    pub session_idle_timeout: TimeDelta,
    pub session_reaper_cron: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let web_root = PathBuf::from(lookup("WEB_ROOT").unwrap_or_else(|| "web".to_string()));

        let default_locale = match lookup("DEFAULT_LOCALE") {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(
                Locale::parse(&value)
                    .with_context(|| format!("DEFAULT_LOCALE '{}' is not a valid locale", value))?,
            ),
            None => Some(Locale::english()),
        };

        let locale_change_methods = lookup("LOCALE_CHANGE_METHODS")
            .map(|value| parse_methods(&value))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            // Server
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", lookup("PORT"), 8080)?,

            // Message catalog
            messages_dir: lookup("MESSAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| web_root.join("WEB-INF/classes")),
            messages_basename: lookup("MESSAGES_BASENAME")
                .unwrap_or_else(|| "messages".to_string()),

            // Locale handling
            default_locale,
            locale_param: lookup("LOCALE_PARAM").unwrap_or_else(|| "lang".to_string()),
            locale_change_methods,

            // Views
            view_prefix: lookup("VIEW_PREFIX").unwrap_or_else(|| "/WEB-INF/pages/".to_string()),
            view_suffix: lookup("VIEW_SUFFIX").unwrap_or_else(|| ".jsp".to_string()),

            // Static assets
            webjars_dir: lookup("WEBJARS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| web_root.join("webjars")),

            // Sessions
            session_cookie: lookup("SESSION_COOKIE")
                .unwrap_or_else(|| "EUCAPTCHA_SESSION".to_string()),
            session_idle_timeout: parse_idle_timeout(lookup("SESSION_IDLE_MINUTES"))?,
            session_reaper_cron: lookup("SESSION_REAPER_CRON")
                .unwrap_or_else(|| "0 * * * * *".to_string()),

            web_root,
        })
    }

    /// Defaults rooted at `web_root`, without consulting the environment.
    pub fn with_web_root(web_root: impl Into<PathBuf>) -> Self {
        let web_root = web_root.into().display().to_string();
        // Only WEB_ROOT is set, so every other value is a known-good default.
        Self::from_lookup(|key| (key == "WEB_ROOT").then(|| web_root.clone()))
            .expect("default configuration is valid")
    }

    /// Locale used when neither the session nor the request picks one; also
    /// the catalog's fallback locale.
    pub fn fallback_locale(&self) -> Locale {
        self.default_locale.clone().unwrap_or_else(Locale::english)
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("{} has an invalid value: '{}'", name, value)),
        None => Ok(default),
    }
}

fn parse_idle_timeout(value: Option<String>) -> Result<TimeDelta> {
    let minutes: i64 = parse_or("SESSION_IDLE_MINUTES", value, 30)?;
    ensure!(
        minutes > 0,
        "SESSION_IDLE_MINUTES must be a positive number of minutes, got {}",
        minutes
    );
    TimeDelta::try_minutes(minutes)
        .with_context(|| format!("SESSION_IDLE_MINUTES is out of range: {}", minutes))
}

fn parse_methods(value: &str) -> Result<Vec<Method>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .map(|method| {
            Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("LOCALE_CHANGE_METHODS has an invalid method: '{}'", method))
        })
        .collect()
}
