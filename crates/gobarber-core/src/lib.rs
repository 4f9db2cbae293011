//! GoBarber Core
//!
//! Wires storage, the API client and the session manager together and
//! restores the previous session before the UI gets to issue requests.

mod app;
mod config;
mod error;

pub use app::App;
pub use config::Config;
pub use error::CoreError;

// Re-export the pieces UI code works with
pub use gobarber_api::{
    ApiClient, ApiError, Appointment, AppointmentCustomer, DayAvailability, PasswordReset,
};
pub use gobarber_session::{
    AuthState, AvatarUpload, Credentials, PasswordChange, ProfileUpdate, SessionError,
    SessionManager, SessionReader, Subscription, UserProfile,
};
pub use gobarber_storage::StorageError;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
