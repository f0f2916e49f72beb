use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::contactmodel::ContactStatus;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateContactDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ContactStatusDto {
    pub status: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ContactQueryDto {
    pub status: Option<String>,
}

impl ContactQueryDto {
    pub fn status_filter(&self) -> Result<Option<ContactStatus>, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") | Some("All") => Ok(None),
            Some(value) => ContactStatus::parse(value)
                .map(Some)
                .ok_or_else(|| format!("Unknown message status '{}'", value)),
        }
    }
}
