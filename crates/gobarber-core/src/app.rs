//! Application state container
//!
//! Owns the storage and the API client on behalf of the session manager.
//! UI code gets the session and a read-only API client, never the store.

use chrono::NaiveDate;
use std::sync::Arc;
use url::Url;

use gobarber_api::{ApiClient, Appointment, DayAvailability, PasswordReset};
use gobarber_session::{AuthState, Credentials, SessionManager, SessionReader};
use gobarber_storage::Database;

use crate::config::Config;
use crate::Result;

pub struct App {
    config: Config,
    session: SessionManager,
}

impl App {
    /// Open the database under the configured path and build the client
    pub fn new(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db)
    }

    pub fn with_database(config: Config, db: Database) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)?;
        let (api, auth) = ApiClient::new(api_url, config.request_timeout())?;
        let session = SessionManager::new(Arc::new(db), api, auth);

        Ok(Self { config, session })
    }

    /// Cold start: restore the persisted session before any request goes out
    pub fn initialize(&self) -> AuthState {
        let state = self.session.initialize();

        tracing::info!(
            authenticated = state.is_authenticated(),
            api_url = %self.session.api().base_url(),
            "GoBarber client initialized"
        );

        state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_reader(&self) -> SessionReader {
        self.session.reader()
    }

    /// Client for authenticated API calls; carries the session's credential
    pub fn api(&self) -> &ApiClient {
        self.session.api()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthState> {
        Ok(self
            .session
            .sign_in(&Credentials::new(email, password))
            .await?)
    }

    pub fn sign_out(&self) -> Result<()> {
        Ok(self.session.sign_out()?)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        Ok(gobarber_api::forgot_password(self.api(), email).await?)
    }

    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<()> {
        Ok(gobarber_api::reset_password(self.api(), reset).await?)
    }

    pub async fn month_availability(
        &self,
        provider_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<DayAvailability>> {
        Ok(gobarber_api::month_availability(self.api(), provider_id, year, month).await?)
    }

    pub async fn appointments_for_day(&self, date: NaiveDate) -> Result<Vec<Appointment>> {
        Ok(gobarber_api::appointments_for_day(self.api(), date).await?)
    }
}
