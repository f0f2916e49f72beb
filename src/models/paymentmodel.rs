use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use super::ordermodel::OrderStatus;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<PaymentStatus> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Identifiers and outcome fields reported by M-Pesa.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MpesaDetails {
    #[serde(rename = "merchantRequestID")]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "checkoutRequestID")]
    pub checkout_request_id: Option<String>,
    pub result_code: Option<String>,
    pub result_desc: Option<String>,
    pub receipt: Option<String>,
    pub transaction_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    #[serde(rename = "order")]
    pub order_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub provider: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
    pub phone: String,
    #[sqlx(flatten)]
    pub mpesa: MpesaDetails,
    pub raw: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment joined with its order summary and payer for the admin list.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub order_total_price: Option<f64>,
    pub order_is_paid: Option<bool>,
    pub order_status: Option<OrderStatus>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub phone: String,
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub result_desc: String,
    pub raw: serde_json::Value,
}

/// Outcome fields written back when the provider callback arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentResult {
    pub result_code: String,
    pub result_desc: String,
    pub receipt: Option<String>,
    pub transaction_date: Option<String>,
    pub raw: serde_json::Value,
}
