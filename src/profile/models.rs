// src/profile/models.rs

use serde::Deserialize;

/// PATCH /api/user-profile request body
#[derive(Deserialize, Debug, Default)]
pub struct UpdateProfilePayload {
    #[serde(default)]
    pub name: Option<String>,
}

/// POST /api/user-settings/change-password request body
#[derive(Deserialize, Debug, Default)]
pub struct ChangePasswordPayload {
    #[serde(default, rename = "currentPassword")]
    pub current_password: Option<String>,
    #[serde(default, rename = "newPassword")]
    pub new_password: Option<String>,
}
