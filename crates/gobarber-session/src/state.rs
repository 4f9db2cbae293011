//! Authentication state

use serde::Deserialize;

use crate::user::UserProfile;

/// Token and user of a signed-in session.
///
/// Also the body of a successful `POST sessions` response.
#[derive(Clone, PartialEq, Deserialize)]
pub struct Authenticated {
    pub token: String,
    pub user: UserProfile,
}

impl std::fmt::Debug for Authenticated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticated")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Either signed out, or a token together with its user. Never one without
/// the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    session: Option<Authenticated>,
}

impl AuthState {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn authenticated(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            session: Some(Authenticated {
                token: token.into(),
                user,
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn session(&self) -> Option<&Authenticated> {
        self.session.as_ref()
    }
}

impl From<Authenticated> for AuthState {
    fn from(session: Authenticated) -> Self {
        Self {
            session: Some(session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn user() -> UserProfile {
        UserProfile {
            id: "user-123".to_string(),
            name: "John Doe".to_string(),
            email: "johndoe@example.com".to_string(),
            avatar_url: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_token_and_user_travel_together() {
        let empty = AuthState::signed_out();
        assert!(!empty.is_authenticated());
        assert_eq!(empty.token(), None);
        assert_eq!(empty.user(), None);

        let state = AuthState::authenticated("token-123", user());
        assert_eq!(state.token(), Some("token-123"));
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("user-123"));
    }

    #[test]
    fn test_debug_hides_token() {
        let state = AuthState::authenticated("token-123", user());
        let rendered = format!("{:?}", state);

        assert!(!rendered.contains("token-123"));
        assert!(rendered.contains("John Doe"));
    }
}
