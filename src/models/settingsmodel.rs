use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-wide singleton. The row is created with column defaults on first read.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub store_name: String,
    pub store_email: String,
    pub store_phone: String,
    pub whatsapp_number: String,
    pub address: String,
    pub tagline: String,

    pub low_stock_threshold: i32,
    pub expiring_soon_days: i32,
    pub auto_deactivate_expired: bool,
    pub require_rx_approval_before_dispatch: bool,

    pub delivery_enabled: bool,
    pub delivery_fee: f64,
    pub free_delivery_min: f64,

    pub mpesa_enabled: bool,
    pub mpesa_short_code: String,
    pub mpesa_passkey: String,
    pub mpesa_callback_url: String,
    pub payment_notes: String,

    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store_name: "Pharmacy Store".to_string(),
            store_email: String::new(),
            store_phone: String::new(),
            whatsapp_number: "254719583400".to_string(),
            address: "Nairobi, Kenya".to_string(),
            tagline: "Get Medicines With Ease".to_string(),
            low_stock_threshold: 5,
            expiring_soon_days: 30,
            auto_deactivate_expired: true,
            require_rx_approval_before_dispatch: true,
            delivery_enabled: true,
            delivery_fee: 0.0,
            free_delivery_min: 0.0,
            mpesa_enabled: false,
            mpesa_short_code: String::new(),
            mpesa_passkey: String::new(),
            mpesa_callback_url: String::new(),
            payment_notes: "Cash on delivery and Card supported.".to_string(),
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

impl Settings {
    /// Delivery fee for a basket worth `items_price`.
    pub fn shipping_price_for(&self, items_price: f64) -> f64 {
        if !self.delivery_enabled || self.delivery_fee <= 0.0 {
            return 0.0;
        }
        if self.free_delivery_min > 0.0 && items_price >= self.free_delivery_min {
            return 0.0;
        }
        self.delivery_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_ship_for_free() {
        assert_eq!(Settings::default().shipping_price_for(200.0), 0.0);
    }

    #[test]
    fn delivery_fee_until_free_threshold() {
        let settings = Settings {
            delivery_fee: 150.0,
            free_delivery_min: 1000.0,
            ..Settings::default()
        };
        assert_eq!(settings.shipping_price_for(999.0), 150.0);
        assert_eq!(settings.shipping_price_for(1000.0), 0.0);

        let disabled = Settings {
            delivery_enabled: false,
            ..settings.clone()
        };
        assert_eq!(disabled.shipping_price_for(10.0), 0.0);

        let no_threshold = Settings {
            free_delivery_min: 0.0,
            ..settings
        };
        assert_eq!(no_threshold.shipping_price_for(5000.0), 150.0);
    }
}
