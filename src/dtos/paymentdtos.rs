use serde::{Deserialize, Serialize};

use crate::models::paymentmodel::*;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InitiateStkDto {
    pub phone: String,
}

impl InitiateStkDto {
    /// Returns the trimmed number when it is a 2547XXXXXXXX style MSISDN.
    pub fn validate_phone(&self) -> Result<String, String> {
        let phone = self.phone.trim();
        let phone_regex = regex::Regex::new(r"^254\d{9}$")
            .map_err(|_| "Invalid phone regex".to_string())?;

        if !phone_regex.is_match(phone) {
            return Err("Phone must be in format 2547XXXXXXXX".to_string());
        }
        Ok(phone.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StkInitiatedDto {
    pub success: bool,
    pub message: String,
    pub payment_id: String,
    #[serde(rename = "checkoutRequestID")]
    pub checkout_request_id: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PaymentQueryDto {
    pub status: Option<String>,
    pub q: Option<String>,
}

impl PaymentQueryDto {
    pub fn status_filter(&self) -> Result<Option<PaymentStatus>, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") | Some("All") => Ok(None),
            Some(value) => PaymentStatus::parse(value)
                .map(Some)
                .ok_or_else(|| format!("Unknown payment status '{}'", value)),
        }
    }

    pub fn search(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CallbackQueryDto {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackAckDto {
    pub ok: bool,
}
