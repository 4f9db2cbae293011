//! Authorization header ownership

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::sync::Arc;

use crate::Result;

/// Format a token as a bearer credential header value.
///
/// Fails without side effects when the token cannot be sent as a header.
pub fn bearer_value(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Write handle for the `authorization` default header.
///
/// Created together with its [`ApiClient`](crate::ApiClient) and deliberately
/// not `Clone`: whoever holds it is the only component that can change the
/// credential attached to outgoing requests.
pub struct BearerAuth {
    headers: Arc<RwLock<HeaderMap>>,
}

impl BearerAuth {
    pub(crate) fn new(headers: Arc<RwLock<HeaderMap>>) -> Self {
        Self { headers }
    }

    pub fn set(&self, value: HeaderValue) {
        self.headers.write().insert(AUTHORIZATION, value);
    }

    /// Remove the header entirely (not an empty value)
    pub fn clear(&self) {
        self.headers.write().remove(AUTHORIZATION);
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("is_set", &self.headers.read().contains_key(AUTHORIZATION))
            .finish()
    }
}
