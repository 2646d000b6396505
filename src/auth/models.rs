use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Login/register payload. Unset optional fields are omitted from the body.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LoginRequest {
    pub telegram_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LoginStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restriction_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_step_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_label: Option<String>,
}

impl LoginRequest {
    pub fn new(telegram_id: impl Into<String>) -> Self {
        Self {
            telegram_id: telegram_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LoginStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAppStatus {
    pub id: String,
    pub user_id: String,
    pub app_launch_count: i64,
    pub last_launch_at: Option<Timestamp>,
    pub last_app_version: Option<String>,
    pub country_iso: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub telegram_id: String,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_small: Option<String>,
    pub photo_big: Option<String>,
    pub referral_code: Option<String>,
    pub current_gem_balance: i64,
    pub subscription_period_end: Option<Timestamp>,
    pub subscription_status: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub app_status: Option<UserAppStatus>,
    pub auth_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Clone, Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct LogoutRequest<'a> {
    pub refresh_token: &'a str,
}
