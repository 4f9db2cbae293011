//! Profile edits sent to the API

use gobarber_api::multipart::{Form, Part};
use serde::Serialize;

/// Body of `PUT profile`
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    /// Sent only when the user is changing their password
    #[serde(flatten)]
    pub password: Option<PasswordChange>,
}

#[derive(Clone, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub password: String,
    pub password_confirmation: String,
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

/// New avatar image, sent as the `avatar` field of a multipart form
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl AvatarUpload {
    pub(crate) fn into_form(self) -> gobarber_api::Result<Form> {
        let mut part = Part::bytes(self.bytes).file_name(self.file_name);
        if let Some(content_type) = self.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        Ok(Form::new().part("avatar", part))
    }
}
