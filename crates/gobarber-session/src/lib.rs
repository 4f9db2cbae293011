//! GoBarber Session Management
//!
//! Tracks whether the user is signed in and keeps three stores in step:
//! - in-memory `AuthState`
//! - the persisted token and user entries
//! - the API client's `authorization` header
//!
//! `SessionManager` is the only writer of all three. UI code reads through
//! `SessionReader` and is told about changes via `subscribe`.

mod error;
mod manager;
mod observable;
mod profile;
mod state;
mod user;

pub use error::SessionError;
pub use manager::SessionManager;
pub use observable::{SessionReader, Subscription};
pub use profile::{AvatarUpload, PasswordChange, ProfileUpdate};
pub use state::{AuthState, Authenticated};
pub use user::{Credentials, UserProfile};

/// Storage key holding the raw bearer token
pub const TOKEN_KEY: &str = "@GoBarber:token";
/// Storage key holding the JSON-serialized `UserProfile`
pub const USER_KEY: &str = "@GoBarber:user";

pub type Result<T> = std::result::Result<T, SessionError>;
