use serde::{Deserialize, Serialize};
use validator::Validate;

/// Partial update of the settings row. Absent fields are left as they are.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsDto {
    #[validate(length(min = 1, message = "Store name cannot be empty"))]
    pub store_name: Option<String>,
    #[validate(email(message = "Invalid store email"))]
    pub store_email: Option<String>,
    pub store_phone: Option<String>,
    pub whatsapp_number: Option<String>,
    pub address: Option<String>,
    pub tagline: Option<String>,

    #[validate(range(min = 0, message = "Low stock threshold cannot be negative"))]
    pub low_stock_threshold: Option<i32>,
    #[validate(range(min = 1, message = "Expiring soon days must be at least 1"))]
    pub expiring_soon_days: Option<i32>,
    pub auto_deactivate_expired: Option<bool>,
    pub require_rx_approval_before_dispatch: Option<bool>,

    pub delivery_enabled: Option<bool>,
    #[validate(range(min = 0.0, message = "Delivery fee cannot be negative"))]
    pub delivery_fee: Option<f64>,
    #[validate(range(min = 0.0, message = "Free delivery minimum cannot be negative"))]
    pub free_delivery_min: Option<f64>,

    pub mpesa_enabled: Option<bool>,
    pub mpesa_short_code: Option<String>,
    pub mpesa_passkey: Option<String>,
    pub mpesa_callback_url: Option<String>,
    pub payment_notes: Option<String>,
}
