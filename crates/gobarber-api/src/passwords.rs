//! Password recovery endpoints
//!
//! Both calls work without a session; any authorization header present is
//! sent as usual but the server ignores it.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::ApiClient;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordReset {
    /// Single-use token from the recovery e-mail link
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Ask the server to e-mail a recovery link
pub async fn forgot_password(api: &ApiClient, email: &str) -> Result<()> {
    api.post("passwords/forgot", &json!({ "email": email })).await?;

    tracing::info!("Requested password recovery e-mail");

    Ok(())
}

pub async fn reset_password(api: &ApiClient, reset: &PasswordReset) -> Result<()> {
    api.post("passwords/reset", reset).await?;

    tracing::info!("Password reset completed");

    Ok(())
}
