use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Dispatched,
    Delivered,
}

impl OrderStatus {
    pub fn to_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Delivered => "delivered",
        }
    }

    pub fn parse(value: &str) -> Option<OrderStatus> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "approved" => Some(OrderStatus::Approved),
            "rejected" => Some(OrderStatus::Rejected),
            "dispatched" => Some(OrderStatus::Dispatched),
            "delivered" => Some(OrderStatus::Delivered),
            _ => None,
        }
    }

    /// pending -> approved | rejected, approved -> dispatched, dispatched -> delivered.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Approved)
                | (OrderStatus::Pending, OrderStatus::Rejected)
                | (OrderStatus::Approved, OrderStatus::Dispatched)
                | (OrderStatus::Dispatched, OrderStatus::Delivered)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Delivered)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cod,
    Card,
    Mpesa,
}

impl PaymentMethod {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Card => "card",
            PaymentMethod::Mpesa => "mpesa",
        }
    }
}

/// Product snapshot taken when the order is placed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: Uuid,
    pub name: String,
    pub price: f64,
    pub qty: i32,
    pub prescription_required: bool,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.qty as f64
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ShippingAddress {
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    pub city: String,
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[sqlx(rename = "prescription_url")]
    pub url: Option<String>,
    #[sqlx(rename = "prescription_uploaded_at")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Prescription {
    pub fn is_uploaded(&self) -> bool {
        self.url.as_deref().map(|url| !url.is_empty()).unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub order_items: Json<Vec<OrderItem>>,
    pub shipping_address: Json<ShippingAddress>,
    pub payment_method: PaymentMethod,
    pub items_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
    pub requires_prescription: bool,
    #[sqlx(flatten)]
    pub prescription: Prescription,
    pub status: OrderStatus,
    pub pharmacist_note: String,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_receipt: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order joined with the owner's contact details for staff screens.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Everything needed to insert an order; prices are already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub items_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
    pub requires_prescription: bool,
}

/// Result of trying to write an order while reserving its stock.
#[derive(Debug, Clone)]
pub enum PlacedOrder {
    Placed(Order),
    OutOfStock { product: Uuid, name: String },
}
