//! In-memory session store.
//!
//! A session is keyed by an opaque random token that travels in a cookie. It
//! holds at most one locale. Sessions are created on first request, refreshed
//! on every access and destroyed on idle expiry or explicit invalidation.

use crate::i18n::Locale;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Server-side state for one user agent.
#[derive(Debug, Clone)]
struct SessionData {
    locale: Option<Locale>,
    last_accessed: DateTime<Utc>,
}

/// Per-request view of a session, carried through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,

    /// True when the session was created by this request
    pub is_new: bool,

    /// Locale stored in the session when the request started
    pub locale: Option<Locale>,
}

/// Process-wide session store. Share behind an `Arc`.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Resume the session named by `id`, or start a new one.
    ///
    /// Unknown and expired ids get a fresh session with a new id; the client's
    /// token is never adopted, so ids are always server-generated.
    pub fn open(&self, id: Option<&str>) -> Session {
        self.open_at(id, Utc::now())
    }

    fn open_at(&self, id: Option<&str>, now: DateTime<Utc>) -> Session {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(id) = id {
            match sessions.get_mut(id) {
                Some(data) if !self.is_expired(data, now) => {
                    data.last_accessed = now;
                    return Session {
                        id: id.to_string(),
                        is_new: false,
                        locale: data.locale.clone(),
                    };
                }
                Some(_) => {
                    debug!("Session expired, starting a new one");
                    sessions.remove(id);
                }
                None => {}
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        sessions.insert(
            id.clone(),
            SessionData {
                locale: None,
                last_accessed: now,
            },
        );
        debug!("Created session ({} active)", sessions.len());

        Session {
            id,
            is_new: true,
            locale: None,
        }
    }

    /// Current locale of a session, if the session exists and has one.
    pub fn locale(&self, id: &str) -> Option<Locale> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).and_then(|data| data.locale.clone())
    }

    /// Store (or clear) the locale of a session. Last write wins.
    ///
    /// Returns false if the session no longer exists.
    pub fn set_locale(&self, id: &str, locale: Option<Locale>) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(id) {
            Some(data) => {
                data.locale = locale;
                true
            }
            None => false,
        }
    }

    /// Destroy a session. Returns true if it existed.
    pub fn invalidate(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(id).is_some()
    }

    /// Remove all sessions idle for longer than the timeout.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, data| !self.is_expired(data, now));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, data: &SessionData, now: DateTime<Utc>) -> bool {
        now - data.last_accessed > self.idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::minutes(30))
    }

    // ==================== Open Tests ====================

    #[test]
    fn test_open_without_id_creates_session() {
        let store = store();
        let session = store.open(None);

        assert!(session.is_new);
        assert!(session.locale.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_open_existing_session() {
        let store = store();
        let first = store.open(None);
        let second = store.open(Some(&first.id));

        assert!(!second.is_new);
        assert_eq!(second.id, first.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_open_unknown_id_is_not_adopted() {
        let store = store();
        let session = store.open(Some("forged-token"));

        assert!(session.is_new);
        assert_ne!(session.id, "forged-token");
    }

    #[test]
    fn test_open_expired_session_starts_fresh() {
        let store = store();
        let start = Utc::now();
        let first = store.open_at(None, start);
        store.set_locale(&first.id, Some(Locale::parse("fr").unwrap()));

        let later = start + Duration::minutes(31);
        let second = store.open_at(Some(&first.id), later);

        assert!(second.is_new);
        assert_ne!(second.id, first.id);
        assert!(second.locale.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_access_refreshes_idle_timer() {
        let store = store();
        let start = Utc::now();
        let session = store.open_at(None, start);

        store.open_at(Some(&session.id), start + Duration::minutes(20));
        let resumed = store.open_at(Some(&session.id), start + Duration::minutes(40));

        assert!(!resumed.is_new);
    }

    // ==================== Locale Tests ====================

    #[test]
    fn test_set_and_read_locale() {
        let store = store();
        let session = store.open(None);
        let french = Locale::parse("fr").unwrap();

        assert!(store.set_locale(&session.id, Some(french.clone())));
        assert_eq!(store.locale(&session.id), Some(french.clone()));
        assert_eq!(store.open(Some(&session.id)).locale, Some(french));
    }

    #[test]
    fn test_set_locale_last_write_wins() {
        let store = store();
        let session = store.open(None);

        store.set_locale(&session.id, Some(Locale::parse("fr").unwrap()));
        store.set_locale(&session.id, Some(Locale::parse("es").unwrap()));

        assert_eq!(store.locale(&session.id), Some(Locale::parse("es").unwrap()));
    }

    #[test]
    fn test_clear_locale() {
        let store = store();
        let session = store.open(None);
        store.set_locale(&session.id, Some(Locale::parse("fr").unwrap()));
        store.set_locale(&session.id, None);

        assert_eq!(store.locale(&session.id), None);
    }

    #[test]
    fn test_set_locale_unknown_session() {
        let store = store();
        assert!(!store.set_locale("missing", Some(Locale::english())));
    }

    // ==================== Lifecycle Tests ====================

    #[test]
    fn test_invalidate() {
        let store = store();
        let session = store.open(None);

        assert!(store.invalidate(&session.id));
        assert!(!store.invalidate(&session.id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let store = store();
        let start = Utc::now();
        let old = store.open_at(None, start);
        let fresh = store.open_at(None, start + Duration::minutes(25));

        let purged = store.purge_expired_at(start + Duration::minutes(35));

        assert_eq!(purged, 1);
        assert!(store.locale(&old.id).is_none());
        assert_eq!(store.len(), 1);
        assert!(!store.open_at(Some(&fresh.id), start + Duration::minutes(36)).is_new);
    }
}
