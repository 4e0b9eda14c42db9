//! Request parameters from the query string and url-encoded form bodies.

use tracing::warn;

/// Ordered request parameters. Repeated names keep every value; lookups
/// return the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(Vec<(String, String)>);

impl RequestParams {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        if let Some(query) = query {
            params.extend_from_urlencoded(query.as_bytes());
        }
        params
    }

    /// Append parameters from an `application/x-www-form-urlencoded` payload.
    /// Malformed input adds nothing.
    pub fn extend_from_urlencoded(&mut self, input: &[u8]) {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(input) {
            Ok(pairs) => self.0.extend(pairs),
            Err(e) => warn!("Ignoring malformed url-encoded parameters: {}", e),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
